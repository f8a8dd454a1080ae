//! The live broadcast feed: one fleet-wide publish/subscribe channel.
//!
//! Built on a bounded `tokio::sync::broadcast` channel. Publishing never
//! blocks and never fails the publisher; a subscriber that falls further
//! behind than the channel capacity loses the overwritten messages and
//! keeps receiving from the oldest retained one. Subscribers receive only
//! messages published after they attached.
//!
//! The feed is created once at startup and handed to the pipeline and the
//! stream endpoint through `AppState`; it is a value with a lifecycle, not
//! ambient global state.

use tokio::sync::broadcast;
use tracing::{debug, warn};

use domain::models::BroadcastMessage;

/// Cloneable publish handle for the fleet-wide feed.
#[derive(Clone)]
pub struct LiveFeed {
    tx: broadcast::Sender<BroadcastMessage>,
}

impl LiveFeed {
    /// Create a feed retaining at most `capacity` undelivered messages per
    /// subscriber before older ones are dropped.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish a message to all current subscribers. Fire-and-forget: with
    /// no subscribers attached the message is simply dropped.
    pub fn publish(&self, message: BroadcastMessage) {
        match self.tx.send(message) {
            Ok(delivered) => debug!(subscribers = delivered, "Broadcast message published"),
            Err(_) => debug!("Broadcast message dropped, no live subscribers"),
        }
    }

    /// Attach a new subscriber. It will see only messages published from
    /// this point on.
    pub fn subscribe(&self) -> FeedSubscription {
        FeedSubscription {
            rx: Some(self.tx.subscribe()),
        }
    }

    /// Number of currently attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Per-session receive handle.
pub struct FeedSubscription {
    rx: Option<broadcast::Receiver<BroadcastMessage>>,
}

impl FeedSubscription {
    /// Wait for the next message. Skips over gaps created by lagging and
    /// returns `None` once the subscription is closed.
    pub async fn next(&mut self) -> Option<BroadcastMessage> {
        let rx = self.rx.as_mut()?;
        loop {
            match rx.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Live feed subscriber lagged, missed updates dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.rx = None;
                    return None;
                }
            }
        }
    }

    /// Non-blocking variant of [`next`](Self::next): returns `None` when no
    /// message is currently queued.
    pub fn try_next(&mut self) -> Option<BroadcastMessage> {
        let rx = self.rx.as_mut()?;
        loop {
            match rx.try_recv() {
                Ok(message) => return Some(message),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Live feed subscriber lagged, missed updates dropped");
                    continue;
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Closed) => {
                    self.rx = None;
                    return None;
                }
            }
        }
    }

    /// Deregister from the feed. Idempotent; no further deliveries are
    /// attempted after the first call.
    pub fn close(&mut self) {
        self.rx = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(device_id: i64, bus_id: Option<i64>) -> BroadcastMessage {
        BroadcastMessage {
            device_id,
            bus_id,
            latitude: 45.46,
            longitude: 9.19,
            speed: Some(12.0),
            heading: None,
            battery_level: Some(70),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_subscriber_receives_message_published_after_attach() {
        let feed = LiveFeed::new(8);
        let mut subscription = feed.subscribe();

        feed.publish(message(1, Some(7)));

        let received = subscription.next().await.unwrap();
        assert_eq!(received.device_id, 1);
        assert_eq!(received.bus_id, Some(7));
    }

    #[tokio::test]
    async fn test_no_backfill_for_late_subscriber() {
        let feed = LiveFeed::new(8);
        feed.publish(message(1, Some(7)));

        let mut late = feed.subscribe();
        assert!(late.try_next().is_none());
    }

    #[tokio::test]
    async fn test_each_subscriber_gets_each_message_once() {
        let feed = LiveFeed::new(8);
        let mut first = feed.subscribe();
        let mut second = feed.subscribe();

        feed.publish(message(1, None));

        assert_eq!(first.next().await.unwrap().device_id, 1);
        assert_eq!(second.next().await.unwrap().device_id, 1);
        assert!(first.try_next().is_none());
        assert!(second.try_next().is_none());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_silent() {
        let feed = LiveFeed::new(8);
        feed.publish(message(1, None));
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_lagged_subscriber_drops_oldest_and_continues() {
        let feed = LiveFeed::new(2);
        let mut slow = feed.subscribe();

        for i in 0..5 {
            feed.publish(message(i, None));
        }

        // Only the newest two fit in the channel; the rest were dropped.
        assert_eq!(slow.try_next().unwrap().device_id, 3);
        assert_eq!(slow.try_next().unwrap().device_id, 4);
        assert!(slow.try_next().is_none());
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_deregisters() {
        let feed = LiveFeed::new(8);
        let mut subscription = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);

        subscription.close();
        subscription.close();
        assert_eq!(feed.subscriber_count(), 0);
        assert!(subscription.try_next().is_none());
        assert!(subscription.next().await.is_none());
    }

    #[tokio::test]
    async fn test_drop_deregisters_subscriber() {
        let feed = LiveFeed::new(8);
        let subscription = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);
        drop(subscription);
        assert_eq!(feed.subscriber_count(), 0);
    }
}
