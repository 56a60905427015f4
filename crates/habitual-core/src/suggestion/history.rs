//! Per-user record of which suggestions were served and answered.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::time_of_day::TimeOfDay;

/// One history entry: a suggestion shown to a user, or the feedback they gave on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionLog {
    /// Store-assigned id; empty until appended.
    #[serde(default)]
    pub log_id: String,
    pub user_id: String,
    pub suggestion_id: String,
    /// Set when the entry records a feedback submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_id: Option<String>,
    /// Local calendar date the entry belongs to.
    pub date: NaiveDate,
    pub time_of_day: TimeOfDay,
    pub created_at: DateTime<Utc>,
}

/// Narrows a user's history to one date and/or one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HistoryFilter {
    pub date: Option<NaiveDate>,
    pub time_of_day: Option<TimeOfDay>,
}

impl HistoryFilter {
    /// Every entry for the user.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn time_of_day(mut self, time_of_day: TimeOfDay) -> Self {
        self.time_of_day = Some(time_of_day);
        self
    }

    pub fn matches(&self, log: &SuggestionLog) -> bool {
        self.date.map_or(true, |d| log.date == d)
            && self.time_of_day.map_or(true, |t| log.time_of_day == t)
    }
}
