//! Leader-side congestion estimation and lane decision.
//!
//! ```text
//! (speed, distance) ──▶ predict ──▶ CongestionLevel ──▶ decide_lane ──▶ LaneSuggestion
//!                                         │                                  │
//!                                         └──────────▶ TelemetryRecord ◀─────┘
//! ```

mod calibration;
mod model;

pub use calibration::{calibration_samples, CALIBRATION_TABLE};
pub use model::{RegressionTree, Sample, FEATURE_COUNT};

use platoon_types::{check_measurement, CongestionLevel, LaneSuggestion, TelemetryRecord};
use tracing::debug;

use crate::error::{Error, Result};

/// Congestion percentage at or above which the follower is told to move right.
pub const LANE_CHANGE_THRESHOLD: u8 = 40;

/// Turns raw leader telemetry into congestion estimates and records.
///
/// The model is fitted once when the estimator is built and never changes.
#[derive(Debug, Clone)]
pub struct Estimator {
    model: RegressionTree,
}

impl Estimator {
    /// Build an estimator fitted on the built-in calibration table.
    pub fn calibrated() -> Result<Self> {
        Self::from_samples(&calibration_samples())
    }

    /// Build an estimator fitted on custom samples.
    pub fn from_samples(samples: &[Sample]) -> Result<Self> {
        let model = RegressionTree::fit(samples)?;
        debug!(
            "Fitted congestion model on {} samples ({} leaves, depth {})",
            samples.len(),
            model.leaf_count(),
            model.depth()
        );
        Ok(Self { model })
    }

    /// Estimate congestion for the given speed (km/h) and distance (m).
    ///
    /// The raw model output is truncated toward zero and clamped to
    /// `[0, 100]`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if either value is negative or not finite.
    pub fn predict(&self, speed: f64, distance: f64) -> Result<CongestionLevel> {
        check_measurement("speed", speed)?;
        check_measurement("distance", distance)?;

        let raw = self.model.predict([speed, distance]);
        if !raw.is_finite() {
            return Err(Error::Model(format!(
                "prediction for speed={} distance={} is not finite",
                speed, distance
            )));
        }

        Ok(CongestionLevel::saturating(raw.trunc() as i64))
    }

    /// Predict, decide and assemble an immutable record.
    pub fn build_record(&self, speed: f64, distance: f64) -> Result<TelemetryRecord> {
        let level = self.predict(speed, distance)?;
        Ok(TelemetryRecord::new(
            speed,
            distance,
            level,
            decide_lane(level),
        ))
    }
}

/// `Stay` below [`LANE_CHANGE_THRESHOLD`], `GoRight` otherwise.
pub fn decide_lane(level: CongestionLevel) -> LaneSuggestion {
    if level.get() < LANE_CHANGE_THRESHOLD {
        LaneSuggestion::Stay
    } else {
        LaneSuggestion::GoRight
    }
}
