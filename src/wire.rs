//! JSON wire format for records published on the platoon topic.
//!
//! ```json
//! {"speed":30.0,"distance":35.0,"congestion_level":35,"lane_suggestion":"Stay"}
//! ```

use platoon_types::TelemetryRecord;

use crate::error::{Error, Result};

/// Serialize a record to its UTF-8 JSON payload.
pub fn encode(record: &TelemetryRecord) -> Result<Vec<u8>> {
    serde_json::to_vec(record).map_err(|e| Error::Transport(format!("encode failed: {}", e)))
}

/// Parse a payload into a record, rejecting out-of-range measurements.
pub fn decode(payload: &[u8]) -> Result<TelemetryRecord> {
    let record: TelemetryRecord = serde_json::from_slice(payload)?;
    record
        .validate()
        .map_err(|e| Error::Decode(e.to_string()))?;
    Ok(record)
}
