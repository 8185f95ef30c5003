//! Reconciles full canonical snapshots against the simulated fleet.

use std::collections::BTreeSet;

use crate::models::{MobileUnit, UnitId};
use crate::route_table::RouteTable;
use crate::simulator::{Millis, MovementStore, Sighting, SpeedPolicy};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: Vec<UnitId>,
    pub removed: Vec<UnitId>,
    pub refreshed: usize,
    /// Ids seen more than once in one snapshot; only the first copy is kept.
    pub duplicates: Vec<UnitId>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Owns the canonical unit list and keeps the movement store's lifecycle in
/// step with it.
pub struct LiveDataBridge {
    policy: Box<dyn SpeedPolicy>,
    units: Vec<MobileUnit>,
}

impl LiveDataBridge {
    pub fn new(policy: Box<dyn SpeedPolicy>) -> Self {
        Self {
            policy,
            units: Vec::new(),
        }
    }

    pub fn units(&self) -> &[MobileUnit] {
        &self.units
    }

    pub fn unit(&self, unit_id: &str) -> Option<&MobileUnit> {
        self.units.iter().find(|unit| unit.id == unit_id)
    }

    /// Applies one delivery. New ids get fresh movement state, vanished ids
    /// lose theirs, and ids present in both keep their motion untouched.
    pub fn reconcile(
        &mut self,
        snapshot: &[MobileUnit],
        store: &mut MovementStore,
        routes: &RouteTable,
        now: Millis,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut next: Vec<MobileUnit> = Vec::with_capacity(snapshot.len());

        for (batch_index, incoming) in snapshot.iter().enumerate() {
            if !seen.insert(incoming.id.as_str()) {
                report.duplicates.push(incoming.id.clone());
                continue;
            }
            let sighting = Sighting::of(incoming, routes.get(&incoming.route_id), batch_index);
            let created = store.ensure(sighting, now, self.policy.as_mut());
            if created {
                report.added.push(incoming.id.clone());
                next.push(incoming.clone());
                continue;
            }
            store.rebind_route(&incoming.id, &incoming.route_id);
            let mut unit = match self.units.iter().find(|unit| unit.id == incoming.id) {
                Some(existing) => existing.clone(),
                None => incoming.clone(),
            };
            unit.refresh_canonical(incoming);
            next.push(unit);
            report.refreshed += 1;
        }

        report.removed = store.retain_ids(|id| seen.contains(id));
        self.units = next;

        if !report.duplicates.is_empty() {
            tracing::warn!(duplicates = ?report.duplicates, "snapshot repeated unit ids");
        }
        tracing::debug!(
            added = report.added.len(),
            removed = report.removed.len(),
            refreshed = report.refreshed,
            "reconciled fleet snapshot"
        );
        report
    }

    /// Forgets every unit and its motion.
    pub fn clear(&mut self, store: &mut MovementStore) {
        self.units.clear();
        store.clear();
    }
}
