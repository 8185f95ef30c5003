//! Canonical feeds: where authoritative unit snapshots come from.
//!
//! A feed pushes the complete unit list to its subscribers whenever it
//! changes. [`InMemoryFeed`] publishes synchronously; [`ChannelFeed`] is fed by
//! a background TCP client talking to [`FeedServer`] and delivers on `poll`.

use fleet_proto::FeedResponse;

use crate::error::FeedError;
use crate::models::{Hub, MobileUnit, Route};

mod channel;
mod dataset;
mod memory;
mod server;
mod subscription;


pub use channel::{spawn_feed_client, ChannelFeed, FeedMessage, FeedPoll, FEED_CLIENT_NAME};
pub use dataset::{FleetDataset, DEMO_FLEET_ID};
pub use memory::InMemoryFeed;
pub use server::{
    FeedServer, FeedServerConfig, FeedServerError, DEFAULT_FEED_ADDR, FEED_SERVER_NAME,
};
pub use subscription::{Subscription, UnitsCallback};

pub type FleetFeedResponse = FeedResponse<MobileUnit, Route, Hub>;

pub trait CanonicalFeed {
    /// Registers `on_change` for every future snapshot. Implementations may
    /// deliver the current snapshot before returning.
    fn subscribe(&mut self, on_change: UnitsCallback) -> Result<Subscription, FeedError>;
}

/// One-shot route fetch at session start.
pub trait RouteSource {
    fn fetch_routes(&self) -> Result<Vec<Route>, FeedError>;
}
