//! Delivery callback that feeds inbound payloads into a [`DisplayState`].

use std::sync::Arc;

use tracing::{debug, warn};

use super::DisplayState;
use crate::channel::MessageHandler;
use crate::error::Result;
use crate::wire;

/// Decodes records delivered by the channel and applies them to the state.
///
/// Malformed payloads are logged and dropped; the previously held record
/// stays in place and the receiver keeps running.
#[derive(Debug, Clone)]
pub struct Receiver {
    state: Arc<DisplayState>,
}

impl Receiver {
    pub fn new(state: Arc<DisplayState>) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &Arc<DisplayState> {
        &self.state
    }

    /// Decode `payload` and replace the held record.
    ///
    /// # Errors
    ///
    /// [`Error::Decode`](crate::Error::Decode) if the payload is not a valid
    /// record. The state is not modified apart from its last error.
    pub fn handle(&self, payload: &[u8]) -> Result<()> {
        match wire::decode(payload) {
            Ok(record) => {
                debug!(
                    "Applied record: congestion={}% lane={}",
                    record.congestion_level(),
                    record.lane_suggestion()
                );
                self.state.replace(record);
                Ok(())
            }
            Err(e) => {
                self.state.record_error(e.to_string());
                Err(e)
            }
        }
    }
}

impl MessageHandler for Receiver {
    fn on_message(&self, topic: &str, payload: &[u8]) {
        if let Err(e) = self.handle(payload) {
            warn!("Dropped message on {}: {}", topic, e);
        }
    }
}
