use std::cell::RefCell;
use std::rc::Rc;

use crate::bridge::{LiveDataBridge, ReconcileReport};
use crate::config::TrackerConfig;
use crate::error::FeedError;
use crate::feed::{CanonicalFeed, RouteSource, Subscription};
use crate::filter::{available_tags, filter_visible, TagSelector};
use crate::hit_test::{HitTestDispatcher, HitTestProvider, ScreenPoint, Selection};
use crate::models::{Hub, MobileUnit, Route, UnitStatus};
use crate::render::{build_features, FeatureSet, FeatureSink, RenderInput};
use crate::route_table::RouteTable;
use crate::simulator::{Millis, MovementStore, SpeedPolicy, TieredSpeedPolicy};

type Mailbox = Rc<RefCell<Option<Vec<MobileUnit>>>>;

/// One tracking session: routes, the simulated fleet, the filter and the
/// selection, driven from a single frame loop.
///
/// Feed deliveries land in a latest-wins mailbox and are reconciled by
/// [`pump`](Self::pump); call it before [`tick`](Self::tick) on every frame.
pub struct FleetTracker {
    config: TrackerConfig,
    routes: RouteTable,
    hubs: Vec<Hub>,
    store: MovementStore,
    bridge: LiveDataBridge,
    selector: TagSelector,
    selection: Selection,
    dispatcher: HitTestDispatcher,
    mailbox: Mailbox,
    subscription: Option<Subscription>,
    disposed: bool,
}

impl FleetTracker {
    pub fn new(config: TrackerConfig, routes: Vec<Route>) -> Self {
        let policy = TieredSpeedPolicy::from_config(&config);
        Self::with_policy(config, routes, Box::new(policy))
    }

    pub fn with_policy(
        config: TrackerConfig,
        routes: Vec<Route>,
        policy: Box<dyn SpeedPolicy>,
    ) -> Self {
        let dispatcher = HitTestDispatcher::from_config(&config.interaction);
        Self {
            config,
            routes: RouteTable::new(routes),
            hubs: Vec::new(),
            store: MovementStore::new(),
            bridge: LiveDataBridge::new(policy),
            selector: TagSelector::All,
            selection: Selection::None,
            dispatcher,
            mailbox: Rc::new(RefCell::new(None)),
            subscription: None,
            disposed: false,
        }
    }

    /// Fetches routes once from `source` and starts an empty session.
    pub fn from_route_source(
        config: TrackerConfig,
        source: &dyn RouteSource,
    ) -> Result<Self, FeedError> {
        let routes = source.fetch_routes()?;
        tracing::info!(routes = routes.len(), "fetched fleet routes");
        Ok(Self::new(config, routes))
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Subscribes to `feed`, replacing any earlier subscription.
    pub fn attach(&mut self, feed: &mut dyn CanonicalFeed) -> Result<(), FeedError> {
        if self.disposed {
            return Err(FeedError::SubscriptionClosed);
        }
        let mailbox = Rc::clone(&self.mailbox);
        let subscription = feed
            .subscribe(Box::new(move |units: &[MobileUnit]| {
                *mailbox.borrow_mut() = Some(units.to_vec());
            }))
            .map_err(|err| {
                tracing::warn!(error = %err, "fleet feed subscription failed");
                err
            })?;
        if let Some(previous) = self.subscription.replace(subscription) {
            previous.close();
        }
        Ok(())
    }

    /// Queues a snapshot as if a feed had delivered it.
    pub fn deliver(&mut self, units: Vec<MobileUnit>) {
        if self.disposed {
            return;
        }
        *self.mailbox.borrow_mut() = Some(units);
    }

    pub fn has_pending_delivery(&self) -> bool {
        self.mailbox.borrow().is_some()
    }

    /// Reconciles the newest queued snapshot, if any.
    pub fn pump(&mut self, now: Millis) -> Option<ReconcileReport> {
        if self.disposed {
            return None;
        }
        let snapshot = self.mailbox.borrow_mut().take()?;
        let report = self
            .bridge
            .reconcile(&snapshot, &mut self.store, &self.routes, now);
        if let Selection::Unit(id) = &self.selection {
            if report.removed.contains(id) {
                self.selection = Selection::None;
            }
        }
        Some(report)
    }

    /// Advances every moving unit to `now`.
    pub fn tick(&mut self, now: Millis) -> usize {
        if self.disposed {
            return 0;
        }
        self.store.tick(now, &self.routes)
    }

    /// Convenience for one frame: pump then tick.
    pub fn frame(&mut self, now: Millis) -> Option<ReconcileReport> {
        let report = self.pump(now);
        self.tick(now);
        report
    }

    pub fn set_hubs(&mut self, hubs: Vec<Hub>) {
        if let Selection::Hub(id) = &self.selection {
            if !hubs.iter().any(|hub| &hub.id == id) {
                self.selection = Selection::None;
            }
        }
        self.hubs = hubs;
    }

    pub fn set_filter(&mut self, selector: TagSelector) {
        self.selector = selector;
    }

    pub fn filter(&self) -> &TagSelector {
        &self.selector
    }

    pub fn available_tags(&self) -> Vec<String> {
        available_tags(self.routes.as_slice())
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn pointer(&mut self, provider: &dyn HitTestProvider, pixel: ScreenPoint) -> bool {
        self.dispatcher
            .on_pointer(provider, pixel, &mut self.selection)
    }

    pub fn close_selection(&mut self) -> bool {
        self.dispatcher.close(&mut self.selection)
    }

    pub fn features(&self) -> FeatureSet {
        let visible = filter_visible(self.bridge.units(), self.routes.as_slice(), &self.selector);
        build_features(&RenderInput {
            visible: &visible,
            hubs: &self.hubs,
            routes: &self.routes,
            store: &self.store,
            selection: &self.selection,
            palette: &self.config.palette,
        })
    }

    /// Rebuilds features and hands them to `sink` as a full replacement.
    pub fn render_into(&self, sink: &mut dyn FeatureSink) {
        sink.replace_features(self.features());
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn hubs(&self) -> &[Hub] {
        &self.hubs
    }

    pub fn units(&self) -> &[MobileUnit] {
        self.bridge.units()
    }

    pub fn store(&self) -> &MovementStore {
        &self.store
    }

    pub fn selected_unit(&self) -> Option<&MobileUnit> {
        self.selection
            .unit_id()
            .and_then(|id| self.bridge.unit(id))
    }

    pub fn selected_hub(&self) -> Option<&Hub> {
        let id = self.selection.hub_id()?;
        self.hubs.iter().find(|hub| hub.id == id)
    }

    pub fn active_unit_count(&self) -> usize {
        self.bridge
            .units()
            .iter()
            .filter(|unit| unit.status == UnitStatus::Active)
            .count()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Closes the feed subscription and stops ticking. Safe to call twice.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(subscription) = self.subscription.take() {
            subscription.close();
        }
        self.mailbox.borrow_mut().take();
        tracing::debug!("fleet tracker disposed");
    }
}

impl Drop for FleetTracker {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
