//! Typed multi-subscriber feeds.
//!
//! Delivery is best-effort: a subscriber that falls behind its channel
//! capacity loses the oldest events. Consumers that need completeness (the
//! verifier, the notification RPC) treat the durable store as the source of
//! truth and use the feeds only as a wake-up signal carrying the fresh item.

use orchestrator_types::{EpochInfo, PendingHeader, ShardInfo, SlotVerdict};
use tokio::sync::broadcast;

/// Per-subscriber channel capacity of the feeds.
pub const DEFAULT_FEED_CAPACITY: usize = 512;

/// A typed fan-out channel.
#[derive(Debug, Clone)]
pub struct Feed<T> {
    tx: broadcast::Sender<T>,
}

impl<T: Clone> Feed<T> {
    /// Creates a feed whose subscribers buffer up to `capacity` events.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Registers a new subscriber.
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.tx.subscribe()
    }

    /// Sends `value` to all current subscribers, returning how many received
    /// it. Sending without subscribers is not an error.
    pub fn send(&self, value: T) -> usize {
        self.tx.send(value).unwrap_or_default()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T: Clone> Default for Feed<T> {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

/// The four feeds wiring the orchestrator together.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorFeeds {
    /// New epoch consensus schedules from Vanguard.
    pub consensus_info: Feed<EpochInfo>,
    /// Pending execution headers from Pandora.
    pub pending_pan_header: Feed<PendingHeader>,
    /// Pending shard infos extracted from Vanguard blocks.
    pub pending_van_shard: Feed<ShardInfo>,
    /// Slot verdicts written by the verifier.
    pub verdict: Feed<SlotVerdict>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_reports_delivered_count() {
        let feed: Feed<u64> = Feed::new(4);
        assert_eq!(feed.send(1), 0);

        let mut first = feed.subscribe();
        let mut second = feed.subscribe();
        assert_eq!(feed.send(2), 2);
        assert_eq!(first.try_recv().unwrap(), 2);
        assert_eq!(second.try_recv().unwrap(), 2);
    }

    #[test]
    fn dropped_subscriber_stops_counting() {
        let feed: Feed<u64> = Feed::new(4);
        let first = feed.subscribe();
        let _second = feed.subscribe();
        drop(first);
        assert_eq!(feed.send(7), 1);
    }

    #[test]
    fn slow_subscriber_loses_oldest_events() {
        let feed: Feed<u64> = Feed::new(2);
        let mut rx = feed.subscribe();
        for i in 0..5 {
            feed.send(i);
        }
        // The receiver lagged; after the lag notification it sees the newest
        // two events only.
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(_))
        ));
        assert_eq!(rx.try_recv().unwrap(), 3);
        assert_eq!(rx.try_recv().unwrap(), 4);
    }
}
