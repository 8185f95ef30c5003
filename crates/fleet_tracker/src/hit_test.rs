use crate::config::InteractionConfig;
use crate::models::{HubId, UnitId};
use crate::render::FeatureRef;

/// At most one unit or one hub is selected, never both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Selection {
    #[default]
    None,
    Unit(UnitId),
    Hub(HubId),
}

impl Selection {
    pub fn is_none(&self) -> bool {
        matches!(self, Selection::None)
    }

    pub fn is_unit(&self, unit_id: &str) -> bool {
        matches!(self, Selection::Unit(id) if id == unit_id)
    }

    pub fn is_hub(&self, hub_id: &str) -> bool {
        matches!(self, Selection::Hub(id) if id == hub_id)
    }

    pub fn unit_id(&self) -> Option<&str> {
        match self {
            Selection::Unit(id) => Some(id),
            _ => None,
        }
    }

    pub fn hub_id(&self) -> Option<&str> {
        match self {
            Selection::Hub(id) => Some(id),
            _ => None,
        }
    }
}

/// Surface pixel, origin at the viewport centre, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: ScreenPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Implemented by rendering surfaces. Hits come back in draw order, bottom
/// first.
pub trait HitTestProvider {
    fn features_at_pixel(&self, pixel: ScreenPoint, tolerance_px: f64) -> Vec<FeatureRef>;
}

/// The selection a list of hits resolves to: the topmost point, or nothing.
pub fn topmost_selection(hits: &[FeatureRef]) -> Selection {
    hits.iter()
        .rev()
        .find_map(|hit| match hit {
            FeatureRef::Unit(id) => Some(Selection::Unit(id.clone())),
            FeatureRef::Hub(id) => Some(Selection::Hub(id.clone())),
            FeatureRef::Route(_) => None,
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTestDispatcher {
    tolerance_px: f64,
}

impl HitTestDispatcher {
    pub fn new(tolerance_px: f64) -> Self {
        Self {
            tolerance_px: tolerance_px.max(0.0),
        }
    }

    pub fn from_config(config: &InteractionConfig) -> Self {
        Self::new(config.hit_tolerance_px)
    }

    pub fn tolerance_px(&self) -> f64 {
        self.tolerance_px
    }

    /// Replaces `selection` with whatever sits on top at `pixel`. Returns
    /// whether the selection changed.
    pub fn on_pointer(
        &self,
        provider: &dyn HitTestProvider,
        pixel: ScreenPoint,
        selection: &mut Selection,
    ) -> bool {
        let hits = provider.features_at_pixel(pixel, self.tolerance_px);
        let next = topmost_selection(&hits);
        tracing::debug!(x = pixel.x, y = pixel.y, hits = hits.len(), selection = ?next, "pointer hit test");
        replace(selection, next)
    }

    pub fn close(&self, selection: &mut Selection) -> bool {
        replace(selection, Selection::None)
    }
}

fn replace(selection: &mut Selection, next: Selection) -> bool {
    if *selection == next {
        return false;
    }
    *selection = next;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CannedHits {
        hits: Vec<FeatureRef>,
        seen_tolerance: Cell<f64>,
    }

    impl CannedHits {
        fn new(hits: Vec<FeatureRef>) -> Self {
            Self {
                hits,
                seen_tolerance: Cell::new(-1.0),
            }
        }
    }

    impl HitTestProvider for CannedHits {
        fn features_at_pixel(&self, _pixel: ScreenPoint, tolerance_px: f64) -> Vec<FeatureRef> {
            self.seen_tolerance.set(tolerance_px);
            self.hits.clone()
        }
    }

    fn unit(id: &str) -> FeatureRef {
        FeatureRef::Unit(id.to_string())
    }

    fn hub(id: &str) -> FeatureRef {
        FeatureRef::Hub(id.to_string())
    }

    fn route(id: &str) -> FeatureRef {
        FeatureRef::Route(id.to_string())
    }

    #[test]
    fn unit_hit_replaces_hub_selection() {
        let dispatcher = HitTestDispatcher::new(6.0);
        let provider = CannedHits::new(vec![route("route-1"), unit("bus-1")]);
        let mut selection = Selection::Hub("hub-1".to_string());

        assert!(dispatcher.on_pointer(&provider, ScreenPoint::new(3.0, 4.0), &mut selection));
        assert_eq!(selection, Selection::Unit("bus-1".to_string()));
        assert_eq!(provider.seen_tolerance.get(), 6.0);
    }

    #[test]
    fn topmost_point_wins_and_routes_are_skipped() {
        assert_eq!(
            topmost_selection(&[unit("bus-1"), hub("hub-1"), unit("bus-2"), route("route-1")]),
            Selection::Unit("bus-2".to_string())
        );
        assert_eq!(
            topmost_selection(&[unit("bus-1"), hub("hub-1")]),
            Selection::Hub("hub-1".to_string())
        );
    }

    #[test]
    fn empty_area_and_route_only_hits_clear_selection() {
        let dispatcher = HitTestDispatcher::new(6.0);
        let mut selection = Selection::Unit("bus-1".to_string());

        let nothing = CannedHits::new(Vec::new());
        assert!(dispatcher.on_pointer(&nothing, ScreenPoint::default(), &mut selection));
        assert!(selection.is_none());

        selection = Selection::Hub("hub-1".to_string());
        let line_only = CannedHits::new(vec![route("route-1")]);
        dispatcher.on_pointer(&line_only, ScreenPoint::default(), &mut selection);
        assert_eq!(selection, Selection::None);
    }

    #[test]
    fn repeated_hit_and_close_report_changes_once() {
        let dispatcher = HitTestDispatcher::from_config(&InteractionConfig::default());
        let provider = CannedHits::new(vec![hub("hub-1")]);
        let mut selection = Selection::None;

        assert!(dispatcher.on_pointer(&provider, ScreenPoint::default(), &mut selection));
        assert!(!dispatcher.on_pointer(&provider, ScreenPoint::default(), &mut selection));
        assert!(selection.is_hub("hub-1"));
        assert!(!selection.is_unit("hub-1"));

        assert!(dispatcher.close(&mut selection));
        assert!(!dispatcher.close(&mut selection));
        assert_eq!(selection.hub_id(), None);
    }
}
