//! # platoon-types
//!
//! Core types exchanged between a platoon leader and its follower. The leader
//! publishes one [`TelemetryRecord`] per reading; the follower keeps the most
//! recent one for display.
//!
//! ## Features
//!
//! - `serde`: JSON (or any serde format) support using the platoon wire field
//!   names (`speed`, `distance`, `congestion_level`, `lane_suggestion`)
//!
//! ## Example
//!
//! ```rust
//! use platoon_types::{CongestionLevel, LaneSuggestion, TelemetryRecord};
//!
//! let level = CongestionLevel::new(35).unwrap();
//! let record = TelemetryRecord::new(30.0, 35.0, level, LaneSuggestion::Stay);
//!
//! assert_eq!(record.congestion_level().get(), 35);
//! assert_eq!(record.lane_suggestion().as_str(), "Stay");
//! ```

mod congestion;
mod lane;
mod record;

pub use congestion::*;
pub use lane::*;
pub use record::*;

/// Topic the leader publishes records on unless configured otherwise.
pub const DEFAULT_TOPIC: &str = "platoon/speed";
