//! Leader side: estimate, decide and publish.

use std::sync::Arc;

use platoon_types::TelemetryRecord;
use tracing::info;

use crate::channel::Channel;
use crate::error::Result;
use crate::estimator::Estimator;
use crate::wire;

/// Publishes one telemetry record per reading on the shared topic.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use platoon::channel::MemoryBroker;
/// use platoon::{Estimator, Leader};
///
/// # tokio_test::block_on(async {
/// let broker = MemoryBroker::new();
/// let leader = Leader::new(
///     Estimator::calibrated().unwrap(),
///     Arc::new(broker.connect("leader")),
///     "platoon/speed",
/// );
///
/// let record = leader.send(30.0, 35.0).await.unwrap();
/// assert_eq!(record.congestion_level().get(), 35);
/// # });
/// ```
#[derive(Debug)]
pub struct Leader {
    estimator: Estimator,
    channel: Arc<dyn Channel>,
    topic: String,
}

impl Leader {
    pub fn new(estimator: Estimator, channel: Arc<dyn Channel>, topic: impl Into<String>) -> Self {
        Self {
            estimator,
            channel,
            topic: topic.into(),
        }
    }

    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    pub fn channel(&self) -> &Arc<dyn Channel> {
        &self.channel
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Build a record from `speed` and `distance` and publish it.
    ///
    /// Nothing is published when the inputs are invalid.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`](crate::Error::InvalidInput) for negative or
    ///   non-finite inputs
    /// - [`Error::Transport`](crate::Error::Transport) when the channel is
    ///   not connected
    pub async fn send(&self, speed: f64, distance: f64) -> Result<TelemetryRecord> {
        let record = self.estimator.build_record(speed, distance)?;
        self.publish(&record).await?;
        Ok(record)
    }

    /// Serialize and publish an already built record.
    pub async fn publish(&self, record: &TelemetryRecord) -> Result<()> {
        let payload = wire::encode(record)?;
        self.channel.publish(&self.topic, payload).await?;
        info!(
            "Published speed={} distance={} congestion={}% lane={} on {}",
            record.speed(),
            record.distance(),
            record.congestion_level(),
            record.lane_suggestion(),
            self.topic
        );
        Ok(())
    }
}

/// One-line confirmation shown to the leader after a successful send.
pub fn confirmation(record: &TelemetryRecord) -> String {
    format!(
        "📡 Sent: Speed={} km/h, Distance={} m, Traffic={}%, Lane={}",
        record.speed(),
        record.distance(),
        record.congestion_level(),
        record.lane_suggestion()
    )
}

/// Parse a `speed distance` pair typed by the operator.
///
/// Accepts whitespace or comma separation, e.g. `30 35` or `30, 35`.
pub fn parse_reading(line: &str) -> std::result::Result<(f64, f64), String> {
    let parts: Vec<&str> = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();

    let [speed, distance] = parts.as_slice() else {
        return Err(format!(
            "expected `<speed> <distance>`, got {:?}",
            line.trim()
        ));
    };

    let speed = speed
        .parse::<f64>()
        .map_err(|e| format!("invalid speed {:?}: {}", speed, e))?;
    let distance = distance
        .parse::<f64>()
        .map_err(|e| format!("invalid distance {:?}: {}", distance, e))?;
    Ok((speed, distance))
}
