//! Error types for the platoon coordination core.

use platoon_types::InvalidMeasurement;
use thiserror::Error;

/// Errors raised by the estimator, channel, receiver and configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// Speed or distance was negative or not a finite number.
    #[error("Invalid input: {field} must be a finite, non-negative number (got {value})")]
    InvalidInput { field: &'static str, value: f64 },

    /// A transport session could not be established.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Publish or subscribe attempted without a live connection.
    #[error("Transport error: {0}")]
    Transport(String),

    /// An inbound payload could not be decoded into a record.
    #[error("Failed to decode payload: {0}")]
    Decode(String),

    /// Configuration could not be loaded or failed validation.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The predictive model could not be fitted or produced an unusable value.
    #[error("Model error: {0}")]
    Model(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl From<InvalidMeasurement> for Error {
    fn from(err: InvalidMeasurement) -> Self {
        Error::InvalidInput {
            field: err.field,
            value: err.value,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(feature = "mqtt")]
impl From<rumqttc::ClientError> for Error {
    fn from(err: rumqttc::ClientError) -> Self {
        Error::Transport(err.to_string())
    }
}

#[cfg(feature = "mqtt")]
impl From<rumqttc::ConnectionError> for Error {
    fn from(err: rumqttc::ConnectionError) -> Self {
        Error::Connection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_measurement_conversion() {
        let err: Error = InvalidMeasurement {
            field: "speed",
            value: -5.0,
        }
        .into();

        assert!(matches!(err, Error::InvalidInput { field: "speed", .. }));
        assert!(err.to_string().contains("-5"));
    }
}
