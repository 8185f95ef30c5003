use std::collections::BTreeMap;

use crate::models::{MobileUnit, Route, RouteId, UnitId, UnitStatus};
use crate::route_table::RouteTable;

use super::speed_policy::SpeedPolicy;

/// Milliseconds on the host's frame clock.
pub type Millis = f64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementState {
    /// Index of the segment start waypoint, `0..=path.len() - 2`.
    pub segment_index: usize,
    /// Fraction of the current segment traversed, `0.0..1.0`.
    pub progress: f64,
    /// Progress units per millisecond. Zero means frozen.
    pub speed: f64,
    pub last_tick_ms: Millis,
}

impl MovementState {
    pub fn new(segment_index: usize, progress: f64, speed: f64, last_tick_ms: Millis) -> Self {
        Self {
            segment_index,
            progress,
            speed,
            last_tick_ms,
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.speed <= 0.0
    }

    fn advance(&mut self, now: Millis, segment_count: usize) {
        if self.segment_index >= segment_count {
            self.segment_index = 0;
            self.progress = 0.0;
        }
        let elapsed = (now - self.last_tick_ms).max(0.0);
        self.progress += self.speed * elapsed;
        if self.progress >= 1.0 {
            self.progress = 0.0;
            self.segment_index = (self.segment_index + 1) % segment_count;
        }
        self.last_tick_ms = now;
    }
}

/// A unit as first observed by the store.
#[derive(Debug, Clone, Copy)]
pub struct Sighting<'a> {
    pub unit_id: &'a str,
    pub route_id: &'a str,
    pub route: Option<&'a Route>,
    pub status: UnitStatus,
    /// Position of the unit in the delivering snapshot.
    pub batch_index: usize,
}

impl<'a> Sighting<'a> {
    pub fn of(unit: &'a MobileUnit, route: Option<&'a Route>, batch_index: usize) -> Self {
        Self {
            unit_id: &unit.id,
            route_id: &unit.route_id,
            route,
            status: unit.status,
            batch_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct TrackedMotion {
    route_id: RouteId,
    state: MovementState,
}

/// Sole owner of per-unit kinematic state.
#[derive(Debug, Clone, Default)]
pub struct MovementStore {
    entries: BTreeMap<UnitId, TrackedMotion>,
}

impl MovementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates state for the sighted unit unless it already exists. Returns
    /// whether a new state was created.
    pub fn ensure(
        &mut self,
        sighting: Sighting<'_>,
        now: Millis,
        policy: &mut dyn SpeedPolicy,
    ) -> bool {
        if self.entries.contains_key(sighting.unit_id) {
            return false;
        }
        let speed = policy
            .speed_for(sighting.batch_index, sighting.status)
            .max(0.0);
        let segment_index = match sighting.route {
            Some(route) if route.is_traversable() => {
                let segments = route.segment_count();
                policy.start_segment(segments).min(segments - 1)
            }
            _ => 0,
        };
        self.entries.insert(
            sighting.unit_id.to_string(),
            TrackedMotion {
                route_id: sighting.route_id.to_string(),
                state: MovementState::new(segment_index, 0.0, speed, now),
            },
        );
        true
    }

    /// Advances every moving unit to `now`. Returns how many states changed.
    pub fn tick(&mut self, now: Millis, routes: &RouteTable) -> usize {
        let mut advanced = 0;
        for motion in self.entries.values_mut() {
            if motion.state.is_frozen() {
                continue;
            }
            let Some(route) = routes.get(&motion.route_id) else {
                continue;
            };
            if !route.is_traversable() {
                continue;
            }
            motion.state.advance(now, route.segment_count());
            advanced += 1;
        }
        advanced
    }

    pub fn get(&self, unit_id: &str) -> Option<&MovementState> {
        self.entries.get(unit_id).map(|motion| &motion.state)
    }

    pub fn route_of(&self, unit_id: &str) -> Option<&str> {
        self.entries
            .get(unit_id)
            .map(|motion| motion.route_id.as_str())
    }

    /// Points an existing state at a different route without touching motion.
    pub fn rebind_route(&mut self, unit_id: &str, route_id: &str) {
        if let Some(motion) = self.entries.get_mut(unit_id) {
            if motion.route_id != route_id {
                motion.route_id = route_id.to_string();
            }
        }
    }

    pub fn remove(&mut self, unit_id: &str) -> Option<MovementState> {
        self.entries.remove(unit_id).map(|motion| motion.state)
    }

    /// Drops every state whose id fails `keep`. Returns the removed ids.
    pub fn retain_ids<F>(&mut self, mut keep: F) -> Vec<UnitId>
    where
        F: FnMut(&str) -> bool,
    {
        let removed: Vec<UnitId> = self
            .entries
            .keys()
            .filter(|id| !keep(id.as_str()))
            .cloned()
            .collect();
        for id in &removed {
            self.entries.remove(id);
        }
        removed
    }

    pub fn contains(&self, unit_id: &str) -> bool {
        self.entries.contains_key(unit_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub(crate) fn insert_state(&mut self, unit_id: &str, route_id: &str, state: MovementState) {
        self.entries.insert(
            unit_id.to_string(),
            TrackedMotion {
                route_id: route_id.to_string(),
                state,
            },
        );
    }
}
