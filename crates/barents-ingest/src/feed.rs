//! Live-feed subscriber registry.
//!
//! Tracks the currently-connected viewers and fans each accepted sighting
//! out to all of them. Delivery is best effort and at most once per
//! broadcast: there is no buffering, no replay for late joiners, and no
//! delivery guarantee. A subscriber whose channel has closed is treated
//! as disconnected and pruned during the broadcast itself, so the
//! registry heals without ever needing an external disconnect signal
//! (though the WebSocket handler also unregisters eagerly on close).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Identity of one registered live viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

/// Registry of connected live viewers. Cheap to clone; all clones share
/// the same membership.
#[derive(Clone, Default)]
pub struct FeedRegistry {
    subscribers: Arc<RwLock<HashMap<Uuid, mpsc::Sender<String>>>>,
}

impl FeedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a new viewer. The returned id is the handle for removal.
    pub async fn register(&self, sender: mpsc::Sender<String>) -> SubscriberId {
        let id = Uuid::new_v4();
        self.subscribers.write().await.insert(id, sender);
        tracing::debug!(subscriber = %id, "live viewer registered");
        SubscriberId(id)
    }

    /// Removes a viewer. Idempotent: an absent id is a no-op.
    pub async fn unregister(&self, id: SubscriberId) {
        if self.subscribers.write().await.remove(&id.0).is_some() {
            tracing::debug!(subscriber = %id.0, "live viewer unregistered");
        }
    }

    /// Number of currently-registered viewers.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Delivers `payload` to every registered viewer.
    ///
    /// Membership is snapshotted first so no lock is held while sending,
    /// and one viewer's failure never blocks delivery to another. A closed
    /// channel is disconnect evidence and removes that viewer; a full
    /// channel only costs that viewer this one message.
    pub async fn broadcast(&self, payload: &str) {
        let snapshot: Vec<(Uuid, mpsc::Sender<String>)> = self
            .subscribers
            .read()
            .await
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut disconnected = Vec::new();
        for (id, tx) in snapshot {
            match tx.try_send(payload.to_string()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(subscriber = %id, "dropping sighting for slow viewer");
                }
                Err(TrySendError::Closed(_)) => {
                    disconnected.push(id);
                }
            }
        }

        if !disconnected.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for id in disconnected {
                if subscribers.remove(&id).is_some() {
                    tracing::info!(subscriber = %id, "pruned disconnected viewer during broadcast");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (mpsc::Sender<String>, mpsc::Receiver<String>) {
        mpsc::channel(16)
    }

    #[tokio::test]
    async fn broadcast_reaches_every_registered_viewer() {
        let feed = FeedRegistry::new();
        let (tx_a, mut rx_a) = channel();
        let (tx_b, mut rx_b) = channel();
        feed.register(tx_a).await;
        feed.register(tx_b).await;

        feed.broadcast("sighting").await;

        assert_eq!(rx_a.recv().await.as_deref(), Some("sighting"));
        assert_eq!(rx_b.recv().await.as_deref(), Some("sighting"));
    }

    #[tokio::test]
    async fn closed_viewer_is_pruned_and_does_not_block_healthy_one() {
        let feed = FeedRegistry::new();

        let (tx_dead, rx_dead) = channel();
        drop(rx_dead); // every send to this viewer now fails
        feed.register(tx_dead).await;

        let (tx_live, mut rx_live) = channel();
        feed.register(tx_live).await;

        feed.broadcast("sighting").await;

        assert_eq!(
            rx_live.recv().await.as_deref(),
            Some("sighting"),
            "healthy viewer must still receive the broadcast"
        );
        assert_eq!(
            feed.subscriber_count().await,
            1,
            "failed viewer must be removed from the registry"
        );
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let feed = FeedRegistry::new();
        let (tx, _rx) = channel();
        let id = feed.register(tx).await;

        feed.unregister(id).await;
        assert_eq!(feed.subscriber_count().await, 0);

        // Removing again, or removing an id that was never registered,
        // must be a silent no-op.
        feed.unregister(id).await;
        let (other_tx, _other_rx) = channel();
        let other = FeedRegistry::new().register(other_tx).await;
        feed.unregister(other).await;
        assert_eq!(feed.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn late_joiner_receives_nothing_retroactively() {
        let feed = FeedRegistry::new();
        feed.broadcast("before join").await;

        let (tx, mut rx) = channel();
        feed.register(tx).await;
        feed.broadcast("after join").await;

        assert_eq!(rx.recv().await.as_deref(), Some("after join"));
        assert!(rx.try_recv().is_err(), "no replay of earlier broadcasts");
    }

    #[tokio::test]
    async fn full_channel_drops_message_but_keeps_viewer() {
        let feed = FeedRegistry::new();
        let (tx, mut rx) = mpsc::channel(1);
        feed.register(tx).await;

        feed.broadcast("first").await;
        feed.broadcast("second").await; // buffer full, dropped

        assert_eq!(rx.recv().await.as_deref(), Some("first"));
        assert_eq!(feed.subscriber_count().await, 1, "slow viewer stays registered");

        // Once drained, later broadcasts flow again.
        feed.broadcast("third").await;
        assert_eq!(rx.recv().await.as_deref(), Some("third"));
    }
}
