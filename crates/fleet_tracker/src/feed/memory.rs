use crate::error::FeedError;
use crate::models::MobileUnit;

use super::subscription::{SubscriberList, Subscription, UnitsCallback};
use super::CanonicalFeed;

/// Push-based feed held in memory. New subscribers receive the latest
/// published snapshot immediately.
#[derive(Default)]
pub struct InMemoryFeed {
    latest: Option<Vec<MobileUnit>>,
    subscribers: SubscriberList,
}

impl InMemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_units(units: Vec<MobileUnit>) -> Self {
        Self {
            latest: Some(units),
            subscribers: SubscriberList::default(),
        }
    }

    /// Replaces the authoritative list and notifies every open subscriber.
    pub fn publish(&mut self, units: Vec<MobileUnit>) -> usize {
        let delivered = self.subscribers.deliver(&units);
        self.latest = Some(units);
        delivered
    }

    pub fn latest(&self) -> Option<&[MobileUnit]> {
        self.latest.as_deref()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.open_count()
    }
}

impl CanonicalFeed for InMemoryFeed {
    fn subscribe(&mut self, mut on_change: UnitsCallback) -> Result<Subscription, FeedError> {
        if let Some(units) = &self.latest {
            on_change(units);
        }
        Ok(self.subscribers.add(on_change))
    }
}
