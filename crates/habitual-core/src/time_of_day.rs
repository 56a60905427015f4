//! Time-of-day and feedback value types, plus the injectable clock.

use chrono::{DateTime, Local, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// First hour (inclusive) that counts as morning.
pub const MORNING_START_HOUR: u32 = 5;
/// First hour (inclusive) that counts as evening.
pub const EVENING_START_HOUR: u32 = 18;

/// One of the two periods a habit or suggestion belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Evening,
}

impl TimeOfDay {
    /// 05:00–17:59 is morning, everything else evening.
    pub fn from_hour(hour: u32) -> Self {
        if (MORNING_START_HOUR..EVENING_START_HOUR).contains(&hour) {
            TimeOfDay::Morning
        } else {
            TimeOfDay::Evening
        }
    }

    /// Period for the clock's current local hour.
    pub fn current(clock: &dyn Clock) -> Self {
        Self::from_hour(clock.now().hour())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Evening => "evening",
        }
    }

    /// Label used inside generation prompts.
    pub fn display_name(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "朝",
            TimeOfDay::Evening => "夜",
        }
    }

    pub fn english_display_name(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "Morning",
            TimeOfDay::Evening => "Evening",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "morning" => Ok(TimeOfDay::Morning),
            "evening" => Ok(TimeOfDay::Evening),
            other => Err(ValidationError::InvalidValue {
                field: "timeOfDay".to_string(),
                message: format!("must be either \"morning\" or \"evening\", got \"{other}\""),
            }),
        }
    }
}

/// User reaction to a surfaced suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    Accept,
    Maybe,
    Reject,
}

impl FeedbackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackType::Accept => "accept",
            FeedbackType::Maybe => "maybe",
            FeedbackType::Reject => "reject",
        }
    }

    /// Name of the counter column this feedback increments.
    pub fn counter_column(&self) -> &'static str {
        match self {
            FeedbackType::Accept => "accept_count",
            FeedbackType::Maybe => "maybe_count",
            FeedbackType::Reject => "reject_count",
        }
    }
}

impl fmt::Display for FeedbackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(FeedbackType::Accept),
            "maybe" => Ok(FeedbackType::Maybe),
            "reject" => Ok(FeedbackType::Reject),
            other => Err(ValidationError::InvalidValue {
                field: "feedbackType".to_string(),
                message: format!("must be one of accept, maybe, reject; got \"{other}\""),
            }),
        }
    }
}

/// Source of "now" for time-of-day defaulting and timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl FixedClock {
    /// Today's date at `hour:00` local time.
    pub fn at_hour(hour: u32) -> Self {
        let now = Local::now();
        let pinned = now
            .with_hour(hour)
            .and_then(|t| t.with_minute(0))
            .and_then(|t| t.with_second(0))
            .unwrap_or(now);
        Self(pinned)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}
