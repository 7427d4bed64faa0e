//! TelemetryRecord - one leader reading.

use core::fmt;

use crate::{CongestionLevel, LaneSuggestion};

/// A single reading published by the leader.
///
/// Records are immutable: fields are only readable through accessors.
/// Congestion level and lane suggestion are computed by the leader from
/// `speed` and `distance` before the record is built.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TelemetryRecord {
    /// Leader speed in km/h.
    speed: f64,
    /// Distance to the vehicle ahead in meters.
    distance: f64,
    congestion_level: CongestionLevel,
    lane_suggestion: LaneSuggestion,
}

impl TelemetryRecord {
    /// Assemble a record from its parts.
    pub fn new(
        speed: f64,
        distance: f64,
        congestion_level: CongestionLevel,
        lane_suggestion: LaneSuggestion,
    ) -> Self {
        Self {
            speed,
            distance,
            congestion_level,
            lane_suggestion,
        }
    }

    /// Speed in km/h.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Distance to the vehicle ahead in meters.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn congestion_level(&self) -> CongestionLevel {
        self.congestion_level
    }

    pub fn lane_suggestion(&self) -> LaneSuggestion {
        self.lane_suggestion
    }

    /// Check that speed and distance are finite and non-negative.
    pub fn validate(&self) -> Result<(), InvalidMeasurement> {
        check_measurement("speed", self.speed)?;
        check_measurement("distance", self.distance)
    }
}

/// A speed or distance that is negative, NaN or infinite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidMeasurement {
    /// Name of the offending field.
    pub field: &'static str,
    /// The rejected value.
    pub value: f64,
}

impl fmt::Display for InvalidMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} must be a finite, non-negative number (got {})",
            self.field, self.value
        )
    }
}

impl std::error::Error for InvalidMeasurement {}

/// Validate a single measurement.
pub fn check_measurement(field: &'static str, value: f64) -> Result<(), InvalidMeasurement> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(InvalidMeasurement { field, value })
    }
}
