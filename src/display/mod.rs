//! Follower-side display state.
//!
//! [`DisplayState`] holds the most recent [`TelemetryRecord`] received from
//! the leader. It starts empty ("Waiting for data..."), is replaced by the
//! [`Receiver`] each time a valid record arrives, and is read by the
//! presentation surface on its own refresh cadence. Reads and writes go
//! through a lock, so a reader sees either the previous or the new record.
//!
//! ```text
//! Uninitialized ──valid record──▶ Populated ──valid record──▶ Populated
//!       │                             │
//!       └──malformed (no change)      └──malformed (no change)
//! ```

mod receiver;

pub use receiver::Receiver;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use platoon_types::TelemetryRecord;

/// Sentinel shown in both fields before the first record arrives.
pub const WAITING_FOR_DATA: &str = "Waiting for data...";

/// The two text fields presented to the follower.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub traffic_level: String,
    pub lane_suggestion: String,
}

impl View {
    /// The "no data yet" view.
    pub fn waiting() -> Self {
        Self {
            traffic_level: WAITING_FOR_DATA.to_string(),
            lane_suggestion: WAITING_FOR_DATA.to_string(),
        }
    }

    pub fn from_record(record: &TelemetryRecord) -> Self {
        Self {
            traffic_level: format!("🚦 Traffic Level: {}%", record.congestion_level()),
            lane_suggestion: format!("🚗 Lane Suggestion: {}", record.lane_suggestion()),
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.traffic_level == WAITING_FOR_DATA && self.lane_suggestion == WAITING_FOR_DATA
    }
}

#[derive(Debug, Clone, Copy)]
struct Reading {
    record: TelemetryRecord,
    received_at: Instant,
}

/// Latest-value-wins holder for the follower's view.
#[derive(Debug, Default)]
pub struct DisplayState {
    reading: RwLock<Option<Reading>>,
    /// Number of valid records applied so far.
    generation: AtomicU64,
    last_error: RwLock<Option<String>>,
}

impl DisplayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held record with `record`.
    pub fn replace(&self, record: TelemetryRecord) {
        self.replace_at(record, Instant::now());
    }

    fn replace_at(&self, record: TelemetryRecord, received_at: Instant) {
        *self.reading.write() = Some(Reading {
            record,
            received_at,
        });
        *self.last_error.write() = None;
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Remember why the last inbound message was rejected. The held record
    /// is left untouched.
    pub fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write() = Some(message.into());
    }

    /// The most recent record, if any.
    pub fn latest(&self) -> Option<TelemetryRecord> {
        self.reading.read().map(|r| r.record)
    }

    /// The texts to present right now.
    pub fn current_view(&self) -> View {
        match self.latest() {
            Some(record) => View::from_record(&record),
            None => View::waiting(),
        }
    }

    /// Count of valid records applied; changes whenever the view may have.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Error from the most recent rejected message, cleared by the next
    /// valid one.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    /// Time since the current record arrived.
    pub fn age(&self) -> Option<Duration> {
        self.reading.read().map(|r| r.received_at.elapsed())
    }

    /// Whether the held record is older than `max_age`.
    ///
    /// A state still waiting for its first record is not stale.
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.age().is_some_and(|age| age > max_age)
    }
}
