//! Time descriptors and their resolution into concrete fire times.
//!
//! A [`TimeDescriptor`] is the structured form of an informal time expression. It is produced
//! by the intent resolver and turned into a local wall-clock instant by [`resolve`].

pub mod resolve;

pub use resolve::{relative_secs, resolve, resolve_clock_time, MAX_RELATIVE_SECS};

use serde::{Deserialize, Serialize};

/// Unit of a relative ("in N ...") time expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeUnit {
    Minute,
    Hour,
    Day,
}

impl RelativeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }

    /// Length of one unit in seconds.
    pub fn seconds(&self) -> i64 {
        match self {
            Self::Minute => 60,
            Self::Hour => 3_600,
            Self::Day => 86_400,
        }
    }
}

impl std::fmt::Display for RelativeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which day an absolute clock time refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOffset {
    Today,
    Tomorrow,
    DayAfterTomorrow,
}

impl DayOffset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Tomorrow => "tomorrow",
            Self::DayAfterTomorrow => "day_after_tomorrow",
        }
    }

    /// Number of calendar days after today.
    pub fn days(&self) -> u64 {
        match self {
            Self::Today => 0,
            Self::Tomorrow => 1,
            Self::DayAfterTomorrow => 2,
        }
    }
}

impl std::fmt::Display for DayOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An hour/minute on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockTime {
    pub day: DayOffset,
    /// 0..=23. For a bare hour this is the number as spoken (1..=12).
    pub hour: u32,
    /// 0..=59.
    pub minute: u32,
    /// The hour was spoken without a morning/afternoon marker and is in 1..=12,
    /// so it may mean either half of the day.
    pub bare_hour: bool,
}

impl ClockTime {
    pub fn new(day: DayOffset, hour: u32, minute: u32, bare_hour: bool) -> Self {
        Self {
            day,
            hour,
            minute,
            bare_hour,
        }
    }
}

/// Structured time expression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeDescriptor {
    /// `amount` units from now. Fractional amounts are allowed ("half an hour").
    Relative { amount: f64, unit: RelativeUnit },
    /// A clock time on a given day.
    Absolute(ClockTime),
}

impl TimeDescriptor {
    pub fn relative(amount: f64, unit: RelativeUnit) -> Self {
        Self::Relative { amount, unit }
    }

    pub fn at(day: DayOffset, hour: u32, minute: u32, bare_hour: bool) -> Self {
        Self::Absolute(ClockTime::new(day, hour, minute, bare_hour))
    }
}
