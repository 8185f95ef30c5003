use std::cell::Cell;
use std::rc::Rc;

use crate::models::MobileUnit;

/// Callback receiving every full unit snapshot.
pub type UnitsCallback = Box<dyn FnMut(&[MobileUnit])>;

/// Handle returned by [`CanonicalFeed::subscribe`](super::CanonicalFeed::subscribe).
/// Closing it stops further deliveries; closing twice is harmless.
#[derive(Debug, Clone)]
pub struct Subscription {
    closed: Rc<Cell<bool>>,
}

impl Subscription {
    fn new(closed: Rc<Cell<bool>>) -> Self {
        Self { closed }
    }

    pub fn close(&self) {
        self.closed.set(true);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

struct Subscriber {
    closed: Rc<Cell<bool>>,
    on_change: UnitsCallback,
}

/// Callbacks registered on a feed, shared by the feed implementations.
#[derive(Default)]
pub(crate) struct SubscriberList {
    subscribers: Vec<Subscriber>,
}

impl SubscriberList {
    pub(crate) fn add(&mut self, on_change: UnitsCallback) -> Subscription {
        let closed = Rc::new(Cell::new(false));
        self.subscribers.push(Subscriber {
            closed: Rc::clone(&closed),
            on_change,
        });
        Subscription::new(closed)
    }

    /// Delivers `units` to every open subscriber and forgets closed ones.
    /// Returns how many callbacks ran.
    pub(crate) fn deliver(&mut self, units: &[MobileUnit]) -> usize {
        self.subscribers.retain(|subscriber| !subscriber.closed.get());
        for subscriber in &mut self.subscribers {
            (subscriber.on_change)(units);
        }
        self.subscribers.len()
    }

    pub(crate) fn open_count(&self) -> usize {
        self.subscribers
            .iter()
            .filter(|subscriber| !subscriber.closed.get())
            .count()
    }
}
