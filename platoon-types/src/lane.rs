//! Lane recommendation sent from leader to follower.

use core::fmt;
use core::str::FromStr;

/// Lane-change recommendation.
///
/// The serialized strings (`"Stay"` and `"Go Right"`) are part of the wire
/// format and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LaneSuggestion {
    /// Keep the current lane.
    Stay,
    /// Move one lane to the right.
    #[cfg_attr(feature = "serde", serde(rename = "Go Right"))]
    GoRight,
}

impl LaneSuggestion {
    /// Returns the display/wire label.
    pub fn as_str(&self) -> &'static str {
        match self {
            LaneSuggestion::Stay => "Stay",
            LaneSuggestion::GoRight => "Go Right",
        }
    }

    /// Whether this suggestion asks the driver to change lanes.
    pub fn is_lane_change(&self) -> bool {
        matches!(self, LaneSuggestion::GoRight)
    }
}

impl fmt::Display for LaneSuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown lane label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLane(pub String);

impl fmt::Display for UnknownLane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown lane suggestion: {:?}", self.0)
    }
}

impl std::error::Error for UnknownLane {}

impl FromStr for LaneSuggestion {
    type Err = UnknownLane;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Stay" => Ok(LaneSuggestion::Stay),
            "Go Right" => Ok(LaneSuggestion::GoRight),
            other => Err(UnknownLane(other.to_string())),
        }
    }
}
