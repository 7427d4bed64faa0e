//! Follower side: subscribe and keep the latest record for display.

use std::sync::Arc;

use tracing::info;

use crate::channel::Channel;
use crate::display::{DisplayState, Receiver, View};
use crate::error::Result;

/// A subscribed follower.
///
/// Owns the [`DisplayState`] the channel's delivery task writes into; the
/// presentation surface reads it through [`Follower::current_view`].
#[derive(Debug)]
pub struct Follower {
    channel: Arc<dyn Channel>,
    state: Arc<DisplayState>,
    topic: String,
}

impl Follower {
    /// Subscribe a fresh display state to `topic` on `channel`.
    pub async fn start(channel: Arc<dyn Channel>, topic: impl Into<String>) -> Result<Self> {
        let topic = topic.into();
        let state = Arc::new(DisplayState::new());
        let receiver = Arc::new(Receiver::new(state.clone()));

        channel.subscribe(&topic, receiver).await?;
        info!("Follower listening on {} via {}", topic, channel.description());

        Ok(Self {
            channel,
            state,
            topic,
        })
    }

    pub fn state(&self) -> &Arc<DisplayState> {
        &self.state
    }

    pub fn channel(&self) -> &Arc<dyn Channel> {
        &self.channel
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn current_view(&self) -> View {
        self.state.current_view()
    }

    /// Disconnect from the broker. The last view remains readable.
    pub async fn shutdown(&self) {
        self.channel.shutdown().await;
    }
}
