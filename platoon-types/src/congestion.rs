//! Congestion level - a percentage in `[0, 100]`.

use core::fmt;

/// Estimated road congestion as a whole percentage.
///
/// The value is always within `0..=100`; there is no way to construct an
/// out-of-range level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub struct CongestionLevel(u8);

impl CongestionLevel {
    /// Lowest level (free-flowing traffic).
    pub const MIN: Self = Self(0);
    /// Highest level (fully congested).
    pub const MAX: Self = Self(100);

    /// Create a level, returning `None` if `percent` exceeds 100.
    pub const fn new(percent: u8) -> Option<Self> {
        if percent <= Self::MAX.0 {
            Some(Self(percent))
        } else {
            None
        }
    }

    /// Create a level, clamping `percent` into `[0, 100]`.
    pub fn saturating(percent: i64) -> Self {
        Self(percent.clamp(0, Self::MAX.0 as i64) as u8)
    }

    /// The percentage value.
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for CongestionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a percentage above 100 is converted to a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelOutOfRange(pub u8);

impl fmt::Display for LevelOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "congestion level {} is outside 0..=100", self.0)
    }
}

impl std::error::Error for LevelOutOfRange {}

impl TryFrom<u8> for CongestionLevel {
    type Error = LevelOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(LevelOutOfRange(value))
    }
}

impl From<CongestionLevel> for u8 {
    fn from(level: CongestionLevel) -> Self {
        level.0
    }
}
