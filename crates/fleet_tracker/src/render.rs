//! Render sync: turns the visible fleet into drawable features.
//!
//! Building features is pure. Surfaces receive a complete [`FeatureSet`]
//! through [`FeatureSink::replace_features`] and must drop whatever they drew
//! before, so nothing stale survives a recompute.

use crate::config::StatusPalette;
use crate::filter::VisibleSet;
use crate::geometry::GeoPoint;
use crate::hit_test::Selection;
use crate::models::{Hub, HubId, RouteId, UnitId, UnitStatus};
use crate::route_table::RouteTable;
use crate::simulator::{resolve_position, MovementStore};

#[derive(Debug, Clone, PartialEq)]
pub enum PointKind {
    Unit {
        status: UnitStatus,
        heading_deg: f64,
        selected: bool,
    },
    Hub {
        selected: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    Route { color: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawableFeature {
    Point {
        kind: PointKind,
        id: String,
        at: GeoPoint,
        color: String,
    },
    Line {
        kind: LineKind,
        id: String,
        path: Vec<GeoPoint>,
    },
}

/// Identity of a feature, as returned by hit testing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureRef {
    Unit(UnitId),
    Hub(HubId),
    Route(RouteId),
}

impl DrawableFeature {
    pub fn feature_ref(&self) -> FeatureRef {
        match self {
            DrawableFeature::Point {
                kind: PointKind::Unit { .. },
                id,
                ..
            } => FeatureRef::Unit(id.clone()),
            DrawableFeature::Point {
                kind: PointKind::Hub { .. },
                id,
                ..
            } => FeatureRef::Hub(id.clone()),
            DrawableFeature::Line {
                kind: LineKind::Route { .. },
                id,
                ..
            } => FeatureRef::Route(id.clone()),
        }
    }

    pub fn is_point(&self) -> bool {
        matches!(self, DrawableFeature::Point { .. })
    }
}

/// Features in draw order, bottom first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureSet {
    features: Vec<DrawableFeature>,
}

impl FeatureSet {
    pub fn new(features: Vec<DrawableFeature>) -> Self {
        Self { features }
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &DrawableFeature> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn find(&self, feature: &FeatureRef) -> Option<&DrawableFeature> {
        self.features
            .iter()
            .find(|candidate| candidate.feature_ref() == *feature)
    }

    pub fn into_vec(self) -> Vec<DrawableFeature> {
        self.features
    }
}

pub trait FeatureSink {
    fn replace_features(&mut self, features: FeatureSet);
}

pub struct RenderInput<'a> {
    pub visible: &'a VisibleSet<'a>,
    pub hubs: &'a [Hub],
    pub routes: &'a RouteTable,
    pub store: &'a MovementStore,
    pub selection: &'a Selection,
    pub palette: &'a StatusPalette,
}

/// Route lines first, then hubs, then units on top.
pub fn build_features(input: &RenderInput<'_>) -> FeatureSet {
    let visible = input.visible;
    let mut features =
        Vec::with_capacity(visible.routes.len() + input.hubs.len() + visible.units.len());

    for route in &visible.routes {
        features.push(DrawableFeature::Line {
            kind: LineKind::Route {
                color: route.color.clone(),
            },
            id: route.id.clone(),
            path: route.path.clone(),
        });
    }

    for hub in input.hubs {
        let selected = input.selection.is_hub(&hub.id);
        features.push(DrawableFeature::Point {
            kind: PointKind::Hub { selected },
            id: hub.id.clone(),
            at: hub.location,
            color: hub_color(input.palette, selected).to_string(),
        });
    }

    for unit in &visible.units {
        let selected = input.selection.is_unit(&unit.id);
        let at = resolve_position(
            input.routes.get(&unit.route_id),
            input.store.get(&unit.id),
            unit.canonical_point(),
        );
        features.push(DrawableFeature::Point {
            kind: PointKind::Unit {
                status: unit.status,
                heading_deg: unit.location.heading_deg,
                selected,
            },
            id: unit.id.clone(),
            at,
            color: status_color(input.palette, unit.status, selected).to_string(),
        });
    }

    FeatureSet::new(features)
}

/// Selected units use the darker variant of their status colour.
pub fn status_color(palette: &StatusPalette, status: UnitStatus, selected: bool) -> &str {
    match (status, selected) {
        (UnitStatus::Active, false) => &palette.active,
        (UnitStatus::Active, true) => &palette.active_selected,
        (UnitStatus::Maintenance, false) => &palette.maintenance,
        (UnitStatus::Maintenance, true) => &palette.maintenance_selected,
        (UnitStatus::Offline, false) => &palette.offline,
        (UnitStatus::Offline, true) => &palette.offline_selected,
    }
}

pub fn hub_color(palette: &StatusPalette, selected: bool) -> &str {
    if selected {
        &palette.hub_selected
    } else {
        &palette.hub
    }
}

/// Parses `#rrggbb` or `#rgb`.
pub fn parse_hex_rgb(raw: &str) -> Option<[u8; 3]> {
    let hex = raw.trim().strip_prefix('#')?;
    let channel = |digits: &str| u8::from_str_radix(digits, 16).ok();
    match hex.len() {
        6 => Some([
            channel(hex.get(0..2)?)?,
            channel(hex.get(2..4)?)?,
            channel(hex.get(4..6)?)?,
        ]),
        3 => {
            let mut rgb = [0u8; 3];
            for (slot, index) in rgb.iter_mut().zip(0..3) {
                let nibble = channel(hex.get(index..index + 1)?)?;
                *slot = nibble * 17;
            }
            Some(rgb)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{filter_visible, TagSelector};
    use crate::geometry::midpoint;
    use crate::models::{MobileUnit, Route};
    use crate::simulator::MovementState;

    struct Fixture {
        units: Vec<MobileUnit>,
        routes: RouteTable,
        hubs: Vec<Hub>,
        store: MovementStore,
        palette: StatusPalette,
    }

    fn fixture() -> Fixture {
        let p0 = GeoPoint::new(51.0, -114.0);
        let p1 = GeoPoint::new(51.002, -114.0);
        let routes = RouteTable::new(vec![
            Route::new("route-a", vec![p0, p1, p0])
                .with_tags(["Asian"])
                .with_color("#3b82f6"),
            Route::new("route-b", vec![p0]).with_tags(["Local"]),
        ]);
        let mut maintenance = MobileUnit::new("bus-2", "route-b", UnitStatus::Maintenance, p1);
        maintenance.location.heading_deg = 45.0;
        let units = vec![
            MobileUnit::new("bus-1", "route-a", UnitStatus::Active, GeoPoint::default()),
            maintenance,
        ];
        let hubs = vec![Hub {
            id: "hub-1".to_string(),
            name: "Hub".to_string(),
            location: p0,
            open_time: String::new(),
            close_time: String::new(),
            stock: Vec::new(),
        }];
        let mut store = MovementStore::new();
        store.insert_state("bus-1", "route-a", MovementState::new(0, 0.5, 0.001, 0.0));
        Fixture {
            units,
            routes,
            hubs,
            store,
            palette: StatusPalette::default(),
        }
    }

    #[test]
    fn draw_order_is_routes_hubs_units() {
        let fx = fixture();
        let visible = filter_visible(&fx.units, fx.routes.as_slice(), &TagSelector::All);
        let selection = Selection::None;
        let features = build_features(&RenderInput {
            visible: &visible,
            hubs: &fx.hubs,
            routes: &fx.routes,
            store: &fx.store,
            selection: &selection,
            palette: &fx.palette,
        });

        let refs: Vec<FeatureRef> = features.iter().map(DrawableFeature::feature_ref).collect();
        assert_eq!(
            refs,
            vec![
                FeatureRef::Route("route-a".to_string()),
                FeatureRef::Route("route-b".to_string()),
                FeatureRef::Hub("hub-1".to_string()),
                FeatureRef::Unit("bus-1".to_string()),
                FeatureRef::Unit("bus-2".to_string()),
            ]
        );
    }

    #[test]
    fn units_use_resolved_or_canonical_position_and_status_colours() {
        let fx = fixture();
        let visible = filter_visible(&fx.units, fx.routes.as_slice(), &TagSelector::All);
        let selection = Selection::Unit("bus-2".to_string());
        let features = build_features(&RenderInput {
            visible: &visible,
            hubs: &fx.hubs,
            routes: &fx.routes,
            store: &fx.store,
            selection: &selection,
            palette: &fx.palette,
        });

        let Some(DrawableFeature::Point { at, color, .. }) =
            features.find(&FeatureRef::Unit("bus-1".to_string()))
        else {
            panic!("bus-1 point missing");
        };
        assert_eq!(
            *at,
            midpoint(GeoPoint::new(51.0, -114.0), GeoPoint::new(51.002, -114.0))
        );
        assert_eq!(color, "#10b981");

        // route-b has a single waypoint, so bus-2 stays on its canonical point
        let Some(DrawableFeature::Point { at, color, kind, .. }) =
            features.find(&FeatureRef::Unit("bus-2".to_string()))
        else {
            panic!("bus-2 point missing");
        };
        assert_eq!(*at, GeoPoint::new(51.002, -114.0));
        assert_eq!(color, "#d97706");
        assert_eq!(
            *kind,
            PointKind::Unit {
                status: UnitStatus::Maintenance,
                heading_deg: 45.0,
                selected: true,
            }
        );
    }

    #[test]
    fn filtered_out_units_and_routes_are_absent() {
        let fx = fixture();
        let visible = filter_visible(&fx.units, fx.routes.as_slice(), &TagSelector::parse("Asian"));
        let selection = Selection::Hub("hub-1".to_string());
        let features = build_features(&RenderInput {
            visible: &visible,
            hubs: &fx.hubs,
            routes: &fx.routes,
            store: &fx.store,
            selection: &selection,
            palette: &fx.palette,
        });

        assert_eq!(features.len(), 3);
        assert!(features.find(&FeatureRef::Unit("bus-2".to_string())).is_none());
        assert!(features.find(&FeatureRef::Route("route-b".to_string())).is_none());
        let Some(DrawableFeature::Point { color, .. }) =
            features.find(&FeatureRef::Hub("hub-1".to_string()))
        else {
            panic!("hub point missing");
        };
        assert_eq!(color, "#9d174d");
    }

    #[test]
    fn hex_colours_parse_in_long_and_short_form() {
        assert_eq!(parse_hex_rgb("#3b82f6"), Some([0x3b, 0x82, 0xf6]));
        assert_eq!(parse_hex_rgb("#fff"), Some([255, 255, 255]));
        assert_eq!(parse_hex_rgb("3b82f6"), None);
        assert_eq!(parse_hex_rgb("#12345"), None);
        assert_eq!(parse_hex_rgb("#zzzzzz"), None);
    }
}
