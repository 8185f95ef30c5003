use bevy::prelude::*;
use fleet_tracker::{
    ChannelFeed, FeedError, FleetDataset, FleetTracker, InMemoryFeed, MobileUnit, TrackerConfig,
};

use crate::viewer_config::resolve_session_tracker_config;
use crate::{HeadlessStatus, OfflineConfig, ViewerConfig};

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub(crate) enum ConnectionStatus {
    #[default]
    Connecting,
    Connected,
    Offline,
    Error(String),
}

impl ConnectionStatus {
    pub(crate) fn label(&self) -> String {
        match self {
            ConnectionStatus::Connecting => "connecting".to_string(),
            ConnectionStatus::Connected => "connected".to_string(),
            ConnectionStatus::Offline => "offline (demo fleet)".to_string(),
            ConnectionStatus::Error(message) => format!("error: {message}"),
        }
    }
}

#[derive(Resource, Default)]
pub(crate) struct ViewerStatus {
    pub status: ConnectionStatus,
    pub fleet_id: Option<String>,
}

enum FeedSource {
    Live(ChannelFeed),
    Offline(InMemoryFeed),
}

/// Feed plus tracker. Lives as a non-send resource because the tracker's
/// subscription mailbox is single-threaded.
pub(crate) struct FleetSession {
    config: TrackerConfig,
    source: FeedSource,
    tracker: Option<FleetTracker>,
}

impl FleetSession {
    pub(crate) fn live(config: TrackerConfig, feed: ChannelFeed) -> Self {
        Self {
            config,
            source: FeedSource::Live(feed),
            tracker: None,
        }
    }

    /// Tracks the built-in demo fleet without a server.
    pub(crate) fn offline(config: TrackerConfig) -> Result<Self, FeedError> {
        let dataset = FleetDataset::demo();
        let mut tracker = FleetTracker::from_route_source(config.clone(), &dataset)?;
        tracker.set_hubs(dataset.hubs.clone());
        let mut feed = InMemoryFeed::with_units(dataset.units);
        tracker.attach(&mut feed)?;
        Ok(Self {
            config,
            source: FeedSource::Offline(feed),
            tracker: Some(tracker),
        })
    }

    pub(crate) fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub(crate) fn tracker(&self) -> Option<&FleetTracker> {
        self.tracker.as_ref()
    }

    pub(crate) fn tracker_mut(&mut self) -> Option<&mut FleetTracker> {
        self.tracker.as_mut()
    }

    pub(crate) fn is_offline(&self) -> bool {
        matches!(self.source, FeedSource::Offline(_))
    }

    /// Drains the live feed and starts tracking once routes have arrived.
    /// Returns the status to show, if it changed.
    pub(crate) fn poll_feed(&mut self) -> Option<ConnectionStatus> {
        let FeedSource::Live(feed) = &mut self.source else {
            return None;
        };
        let poll = feed.poll();

        if self.tracker.is_none() && feed.routes().is_some() {
            match FleetTracker::from_route_source(self.config.clone(), &*feed) {
                Ok(mut tracker) => {
                    if let Some(hubs) = feed.hubs() {
                        tracker.set_hubs(hubs.to_vec());
                    }
                    if let Err(err) = tracker.attach(feed) {
                        return Some(ConnectionStatus::Error(err.to_string()));
                    }
                    self.tracker = Some(tracker);
                }
                Err(err) => return Some(ConnectionStatus::Error(err.to_string())),
            }
        } else if poll.hubs_changed {
            if let (Some(tracker), Some(hubs)) = (self.tracker.as_mut(), feed.hubs()) {
                tracker.set_hubs(hubs.to_vec());
            }
        }

        if let Some(err) = poll.errors.last() {
            return Some(ConnectionStatus::Error(err.to_string()));
        }
        if poll.units_delivered || poll.routes_changed || poll.hubs_changed {
            return Some(ConnectionStatus::Connected);
        }
        None
    }

    pub(crate) fn fleet_id(&self) -> Option<&str> {
        match &self.source {
            FeedSource::Live(feed) => feed.fleet_id(),
            FeedSource::Offline(_) => None,
        }
    }

    /// Applies pending deliveries and advances motion to `now_ms`.
    pub(crate) fn advance(&mut self, now_ms: f64) {
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.frame(now_ms);
        }
    }

    /// Re-publishes a unit list on the offline feed.
    pub(crate) fn publish_offline(&mut self, units: Vec<MobileUnit>) -> usize {
        match &mut self.source {
            FeedSource::Offline(feed) => feed.publish(units),
            FeedSource::Live(_) => 0,
        }
    }
}

pub(crate) fn setup_startup_state(world: &mut World) {
    let offline = world
        .get_resource::<OfflineConfig>()
        .map(|config| config.offline)
        .unwrap_or(false);
    let addr = world
        .get_resource::<ViewerConfig>()
        .map(|config| config.addr.clone())
        .unwrap_or_default();
    let config = resolve_session_tracker_config();

    let (session, status) = if offline {
        match FleetSession::offline(config) {
            Ok(session) => (session, ConnectionStatus::Offline),
            Err(err) => {
                warn!("offline fleet could not start: {err}");
                (
                    FleetSession::live(TrackerConfig::default(), ChannelFeed::connect(addr)),
                    ConnectionStatus::Error(err.to_string()),
                )
            }
        }
    } else {
        info!("connecting to fleet feed at {addr}");
        (
            FleetSession::live(config, ChannelFeed::connect(addr)),
            ConnectionStatus::Connecting,
        )
    };

    world.insert_non_send_resource(session);
    world.insert_resource(ViewerStatus {
        status,
        fleet_id: None,
    });
}

pub(crate) fn poll_fleet_feed(
    session: Option<NonSendMut<FleetSession>>,
    mut status: ResMut<ViewerStatus>,
) {
    let Some(mut session) = session else {
        return;
    };
    if let Some(next) = session.poll_feed() {
        if status.status != next {
            status.status = next;
        }
    }
    if status.fleet_id.is_none() {
        status.fleet_id = session.fleet_id().map(str::to_string);
    }
}

pub(crate) fn advance_fleet(time: Res<Time>, session: Option<NonSendMut<FleetSession>>) {
    let Some(mut session) = session else {
        return;
    };
    session.advance(time.elapsed_secs_f64() * 1000.0);
}

pub(crate) fn headless_report(
    mut report: ResMut<HeadlessStatus>,
    status: Res<ViewerStatus>,
    session: Option<NonSend<FleetSession>>,
) {
    if report.last_status.as_ref() != Some(&status.status) {
        eprintln!("viewer status: {}", status.status.label());
        report.last_status = Some(status.status.clone());
    }

    let units = session
        .as_ref()
        .and_then(|session| session.tracker())
        .map(|tracker| tracker.units().len())
        .unwrap_or(0);
    if units != report.last_units {
        eprintln!("viewer units: {units}");
        report.last_units = units;
    }
}
