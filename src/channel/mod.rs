//! Coordinator channel: the pub/sub transport between leader and follower.
//!
//! A [`Channel`] is an established session with a broker. Publishing is
//! best-effort; subscribing registers a [`MessageHandler`] that the channel
//! invokes once per delivered message on its own delivery task, so handlers
//! race with whatever else reads the state they update.
//!
//! Within one connection messages reach a handler in publish order. Nothing
//! is guaranteed across reconnects.
//!
//! ## Implementations
//!
//! - [`MemoryBroker`]: in-process broker, one delivery task per subscription
//! - [`MqttChannel`]: MQTT broker via `rumqttc` (requires the `mqtt` feature)

mod memory;
#[cfg(feature = "mqtt")]
mod mqtt;

pub use memory::{MemoryBroker, MemoryConnection};
#[cfg(feature = "mqtt")]
pub use mqtt::MqttChannel;

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Callback invoked for each message delivered on a subscribed topic.
///
/// Called from the channel's delivery task, never concurrently for the same
/// subscription. Implementations must not block for long.
pub trait MessageHandler: Send + Sync {
    fn on_message(&self, topic: &str, payload: &[u8]);
}

impl<F> MessageHandler for F
where
    F: Fn(&str, &[u8]) + Send + Sync,
{
    fn on_message(&self, topic: &str, payload: &[u8]) {
        self(topic, payload)
    }
}

/// An established session with a pub/sub broker.
#[async_trait]
pub trait Channel: Send + Sync + Debug {
    /// Send `payload` on `topic` without waiting for any acknowledgment.
    ///
    /// Fails with [`Error::Transport`](crate::Error::Transport) when the
    /// connection is not live.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()>;

    /// Register `handler` for messages on `topic` (MQTT-style filters with
    /// `+` and `#` are accepted).
    async fn subscribe(&self, topic: &str, handler: Arc<dyn MessageHandler>) -> Result<()>;

    /// Whether the session is currently established.
    fn is_connected(&self) -> bool;

    /// Human-readable endpoint, used in logs and the status bar.
    fn description(&self) -> &str;

    /// Tear the session down. Further publishes fail.
    async fn shutdown(&self) {}
}

/// Match a concrete `topic` against a subscription `filter`.
///
/// `+` matches exactly one level, a trailing `#` matches any remainder
/// (including the parent level itself).
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return filter_levels.next().is_none(),
            (Some("+"), Some(_)) => {}
            (Some(f), Some(t)) if f == t => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_matches_exact() {
        assert!(topic_matches("platoon/speed", "platoon/speed"));
        assert!(!topic_matches("platoon/speed", "platoon/speeds"));
        assert!(!topic_matches("platoon/speed", "platoon"));
        assert!(!topic_matches("platoon", "platoon/speed"));
    }

    #[test]
    fn test_topic_matches_wildcards() {
        assert!(topic_matches("platoon/+", "platoon/speed"));
        assert!(!topic_matches("platoon/+", "platoon/speed/raw"));
        assert!(topic_matches("platoon/#", "platoon/speed/raw"));
        assert!(topic_matches("platoon/#", "platoon"));
        assert!(topic_matches("#", "anything/at/all"));
        assert!(!topic_matches("platoon/#/raw", "platoon/speed/raw"));
    }

    #[test]
    fn test_closure_handler() {
        let seen = parking_lot::Mutex::new(Vec::new());
        let handler = |topic: &str, payload: &[u8]| {
            seen.lock().push((topic.to_string(), payload.to_vec()));
        };

        handler.on_message("platoon/speed", b"{}");
        assert_eq!(seen.lock().len(), 1);
    }
}
