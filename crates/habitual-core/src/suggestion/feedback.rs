//! Per-user feedback entries and the statistics derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time_of_day::{FeedbackType, TimeOfDay};

/// One accept/maybe/reject reaction by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFeedback {
    /// Store-assigned id; empty until appended.
    #[serde(default)]
    pub feedback_id: String,
    pub user_id: String,
    pub suggestion_id: String,
    pub feedback_type: FeedbackType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub time_of_day: TimeOfDay,
}

/// Counts and rates over a user's feedback history.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeedbackStatistics {
    pub total_feedbacks: u64,
    pub accept_count: u64,
    pub maybe_count: u64,
    pub reject_count: u64,
    pub acceptance_rate: f64,
    pub maybe_rate: f64,
    pub rejection_rate: f64,
}

impl FeedbackStatistics {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a UserFeedback>) -> Self {
        let mut stats = Self::default();
        for entry in entries {
            stats.total_feedbacks += 1;
            match entry.feedback_type {
                FeedbackType::Accept => stats.accept_count += 1,
                FeedbackType::Maybe => stats.maybe_count += 1,
                FeedbackType::Reject => stats.reject_count += 1,
            }
        }

        if stats.total_feedbacks > 0 {
            let total = stats.total_feedbacks as f64;
            stats.acceptance_rate = stats.accept_count as f64 / total;
            stats.maybe_rate = stats.maybe_count as f64 / total;
            stats.rejection_rate = stats.reject_count as f64 / total;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(feedback_type: FeedbackType) -> UserFeedback {
        UserFeedback {
            feedback_id: String::new(),
            user_id: "u1".into(),
            suggestion_id: "s1".into(),
            feedback_type,
            comment: None,
            timestamp: Utc::now(),
            time_of_day: TimeOfDay::Morning,
        }
    }

    #[test]
    fn empty_history_has_zero_rates() {
        let stats = FeedbackStatistics::from_entries(&Vec::new());
        assert_eq!(stats, FeedbackStatistics::default());
    }

    #[test]
    fn rates_are_share_of_total() {
        let entries = vec![
            entry(FeedbackType::Accept),
            entry(FeedbackType::Accept),
            entry(FeedbackType::Maybe),
            entry(FeedbackType::Reject),
        ];
        let stats = FeedbackStatistics::from_entries(&entries);
        assert_eq!(stats.total_feedbacks, 4);
        assert_eq!(stats.accept_count, 2);
        assert!((stats.acceptance_rate - 0.5).abs() < f64::EPSILON);
        assert!((stats.maybe_rate - 0.25).abs() < f64::EPSILON);
        assert!((stats.rejection_rate - 0.25).abs() < f64::EPSILON);
    }
}
