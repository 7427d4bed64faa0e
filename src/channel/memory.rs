//! In-process broker.
//!
//! Connections created from the same [`MemoryBroker`] share topics. Every
//! subscription owns an unbounded queue drained by its own tokio task, so
//! handlers run off the publisher's call path and see messages in publish
//! order.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{topic_matches, Channel, MessageHandler};
use crate::error::{Error, Result};

type Delivery = (String, Vec<u8>);

struct Subscription {
    connection_id: u64,
    filter: String,
    queue: mpsc::UnboundedSender<Delivery>,
}

#[derive(Default)]
struct BrokerState {
    next_connection_id: AtomicU64,
    subscriptions: RwLock<Vec<Subscription>>,
}

/// A broker living inside the current process.
///
/// Cloning is cheap; clones refer to the same broker.
///
/// # Example
///
/// ```
/// use platoon::channel::{Channel, MemoryBroker};
///
/// # tokio_test::block_on(async {
/// let broker = MemoryBroker::new();
/// let leader = broker.connect("memory://leader");
///
/// // Nobody subscribed yet: the message is simply dropped
/// leader.publish("platoon/speed", b"{}".to_vec()).await.unwrap();
/// # });
/// ```
#[derive(Clone, Default)]
pub struct MemoryBroker {
    state: Arc<BrokerState>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new session on this broker.
    pub fn connect(&self, endpoint: &str) -> MemoryConnection {
        let id = self.state.next_connection_id.fetch_add(1, Ordering::Relaxed);
        info!("Memory connection {} opened: {}", id, endpoint);
        MemoryConnection {
            broker: self.clone(),
            id,
            description: format!("memory: {}", endpoint),
            connected: AtomicBool::new(true),
        }
    }

    /// Number of live subscriptions across all connections.
    pub fn subscription_count(&self) -> usize {
        self.state.subscriptions.read().len()
    }

    fn route(&self, topic: &str, payload: &[u8]) -> usize {
        let subscriptions = self.state.subscriptions.read();
        let mut delivered = 0;
        for subscription in subscriptions.iter() {
            if !topic_matches(&subscription.filter, topic) {
                continue;
            }
            if subscription.queue.send((topic.to_string(), payload.to_vec())).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    fn drop_connection(&self, connection_id: u64) {
        self.state
            .subscriptions
            .write()
            .retain(|s| s.connection_id != connection_id);
    }
}

impl fmt::Debug for MemoryBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBroker")
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}

/// A session on a [`MemoryBroker`].
pub struct MemoryConnection {
    broker: MemoryBroker,
    id: u64,
    description: String,
    connected: AtomicBool,
}

impl MemoryConnection {
    /// Close the session. Its subscriptions stop after delivering what was
    /// already queued, and further publishes fail.
    pub fn close(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            info!("Memory connection {} closed", self.id);
            self.broker.drop_connection(self.id);
        }
    }
}

impl fmt::Debug for MemoryConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryConnection")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.close();
    }
}

#[async_trait]
impl Channel for MemoryConnection {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::Transport(format!(
                "{} is not connected",
                self.description
            )));
        }
        let delivered = self.broker.route(topic, &payload);
        debug!("Published {} bytes on {} to {} subscribers", payload.len(), topic, delivered);
        Ok(())
    }

    async fn subscribe(&self, topic: &str, handler: Arc<dyn MessageHandler>) -> Result<()> {
        {
            // close() flips the flag before purging under this lock, so the
            // check must happen while holding it
            let mut subscriptions = self.broker.state.subscriptions.write();
            if !self.is_connected() {
                return Err(Error::Transport(format!(
                    "cannot subscribe to {}: {} is not connected",
                    topic, self.description
                )));
            }

            let (tx, mut rx) = mpsc::unbounded_channel::<Delivery>();
            // Ends once the queue sender is dropped and the backlog is drained
            tokio::spawn(async move {
                while let Some((topic, payload)) = rx.recv().await {
                    handler.on_message(&topic, &payload);
                }
            });

            subscriptions.push(Subscription {
                connection_id: self.id,
                filter: topic.to_string(),
                queue: tx,
            });
        }
        info!("Subscribed to {} on {}", topic, self.description);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn shutdown(&self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;

    fn collector() -> (Arc<Mutex<Vec<Vec<u8>>>>, Arc<dyn MessageHandler>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handler: Arc<dyn MessageHandler> =
            Arc::new(move |_topic: &str, payload: &[u8]| sink.lock().push(payload.to_vec()));
        (seen, handler)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers_in_order() {
        let broker = MemoryBroker::new();
        let leader = broker.connect("leader");
        let follower_a = broker.connect("follower-a");
        let follower_b = broker.connect("follower-b");

        let (seen_a, handler_a) = collector();
        let (seen_b, handler_b) = collector();
        follower_a.subscribe("platoon/speed", handler_a).await.unwrap();
        follower_b.subscribe("platoon/+", handler_b).await.unwrap();

        for i in 0..20u8 {
            leader.publish("platoon/speed", vec![i]).await.unwrap();
        }
        settle().await;

        let expected: Vec<Vec<u8>> = (0..20u8).map(|i| vec![i]).collect();
        assert_eq!(*seen_a.lock(), expected);
        assert_eq!(*seen_b.lock(), expected);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let broker = MemoryBroker::new();
        let leader = broker.connect("leader");

        assert!(leader.publish("platoon/speed", b"{}".to_vec()).await.is_ok());
        assert_eq!(broker.subscription_count(), 0);
    }

    #[tokio::test]
    async fn test_other_topics_not_delivered() {
        let broker = MemoryBroker::new();
        let leader = broker.connect("leader");
        let follower = broker.connect("follower");

        let (seen, handler) = collector();
        follower.subscribe("platoon/speed", handler).await.unwrap();
        leader.publish("platoon/other", b"x".to_vec()).await.unwrap();
        settle().await;

        assert!(seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_publish_after_close_fails() {
        let broker = MemoryBroker::new();
        let leader = broker.connect("leader");
        leader.close();

        assert!(!leader.is_connected());
        assert!(matches!(
            leader.publish("platoon/speed", b"{}".to_vec()).await,
            Err(Error::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_closed_follower_stops_receiving() {
        let broker = MemoryBroker::new();
        let leader = broker.connect("leader");
        let follower = broker.connect("follower");

        let (seen, handler) = collector();
        follower.subscribe("platoon/speed", handler).await.unwrap();
        follower.shutdown().await;
        leader.publish("platoon/speed", b"late".to_vec()).await.unwrap();
        settle().await;

        assert!(seen.lock().is_empty());
        assert_eq!(broker.subscription_count(), 0);
        assert!(matches!(
            follower.subscribe("platoon/speed", collector().1).await,
            Err(Error::Transport(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_subscribe_racing_close_leaves_nothing_registered() {
        let broker = MemoryBroker::new();

        for _ in 0..200 {
            let connection = Arc::new(broker.connect("follower"));

            let subscriber = connection.clone();
            let subscribe = tokio::spawn(async move {
                let _ = subscriber.subscribe("platoon/speed", collector().1).await;
            });
            let closer = connection.clone();
            let close = tokio::spawn(async move { closer.close() });

            subscribe.await.unwrap();
            close.await.unwrap();
            assert_eq!(broker.subscription_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_description() {
        let broker = MemoryBroker::new();
        let connection = broker.connect("loopback");
        assert_eq!(connection.description(), "memory: loopback");
    }
}
