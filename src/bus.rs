//! Snapshot fan-out from the ticker store to its consumers.
//!
//! Built on a `tokio::sync::watch` channel: every publish replaces the
//! current value and wakes all subscribers, and a subscriber that falls
//! behind simply observes the newest snapshot next time it looks. Dropping
//! the receiver unsubscribes.

use std::sync::Arc;

use tokio::sync::watch;

use crate::store::MarketSnapshot;

/// Publishes immutable [`MarketSnapshot`]s to any number of subscribers.
#[derive(Clone)]
pub struct NotificationBus {
    tx: watch::Sender<Arc<MarketSnapshot>>,
}

impl NotificationBus {
    /// Creates a bus holding an empty, not-yet-loaded snapshot.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Arc::new(MarketSnapshot::default()));
        Self { tx }
    }

    /// Subscribes to snapshot updates.
    ///
    /// The receiver starts with the current snapshot marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<Arc<MarketSnapshot>> {
        self.tx.subscribe()
    }

    /// Replaces the current snapshot and notifies subscribers.
    ///
    /// Succeeds even when nobody is subscribed.
    pub fn publish(&self, snapshot: Arc<MarketSnapshot>) {
        self.tx.send_replace(snapshot);
    }

    /// Returns the most recently published snapshot.
    pub fn latest(&self) -> Arc<MarketSnapshot> {
        self.tx.borrow().clone()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}
