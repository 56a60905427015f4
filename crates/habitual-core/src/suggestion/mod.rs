//! Suggestion records and their feedback counters.
//!
//! A [`Suggestion`] is immutable by convention apart from its feedback
//! tail: `accept_count`, `maybe_count`, `reject_count` and the stored
//! `total_feedback`. Counters only ever grow.

mod feedback;
mod history;
mod query;

pub use feedback::{FeedbackStatistics, UserFeedback};
pub use history::{HistoryFilter, SuggestionLog};
pub use query::{SuggestionOrder, SuggestionQuery};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::generator::GeneratedSuggestion;
use crate::time_of_day::{FeedbackType, TimeOfDay};

/// A habit suggestion as persisted by the suggestion store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Store-assigned id; empty until persisted.
    #[serde(default)]
    pub suggestion_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub time_of_day: TimeOfDay,
    pub priority: u8,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub accept_count: u64,
    #[serde(default)]
    pub maybe_count: u64,
    #[serde(default)]
    pub reject_count: u64,
    #[serde(default)]
    pub total_feedback: u64,
}

impl Suggestion {
    /// A fresh, active, not-yet-persisted suggestion with zero counters.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        time_of_day: TimeOfDay,
        priority: u8,
        tags: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            suggestion_id: String::new(),
            title: title.into(),
            description: description.into(),
            category: category.into(),
            time_of_day,
            priority,
            tags,
            is_active: true,
            created_at: now,
            updated_at: now,
            accept_count: 0,
            maybe_count: 0,
            reject_count: 0,
            total_feedback: 0,
        }
    }

    /// Build an unsaved suggestion from generator output.
    pub fn from_generated(generated: GeneratedSuggestion, now: DateTime<Utc>) -> Self {
        Self::new(
            generated.title,
            generated.description,
            generated.category,
            generated.time_of_day,
            generated.priority,
            generated.tags,
            now,
        )
    }

    /// `(accept + 0.5 * maybe) / total_feedback`, or 0 without feedback.
    pub fn acceptance_rate(&self) -> f64 {
        if self.total_feedback == 0 {
            return 0.0;
        }
        (self.accept_count as f64 + self.maybe_count as f64 * 0.5) / self.total_feedback as f64
    }

    /// Sum of the three individual counters.
    pub fn counted_feedback(&self) -> u64 {
        self.accept_count + self.maybe_count + self.reject_count
    }

    /// Copy with the matching counter and `total_feedback` bumped.
    pub fn with_feedback(&self, feedback: FeedbackType, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.apply_feedback(feedback, now);
        next
    }

    pub(crate) fn apply_feedback(&mut self, feedback: FeedbackType, now: DateTime<Utc>) {
        match feedback {
            FeedbackType::Accept => self.accept_count += 1,
            FeedbackType::Maybe => self.maybe_count += 1,
            FeedbackType::Reject => self.reject_count += 1,
        }
        self.total_feedback += 1;
        self.updated_at = now;
    }

    /// Active with a non-empty title and description.
    pub fn is_valid(&self) -> bool {
        self.is_active && !self.title.is_empty() && !self.description.is_empty()
    }

    pub fn matches_time_of_day(&self, time_of_day: TimeOfDay) -> bool {
        self.time_of_day == time_of_day
    }

    pub fn matches_category(&self, category: &str) -> bool {
        self.category == category
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Suggestion {
        Suggestion::new(
            "Stretch",
            "Five minutes of light stretching",
            "health",
            TimeOfDay::Morning,
            6,
            vec!["body".into(), "quick".into()],
            Utc::now(),
        )
    }

    fn with_counts(accept: u64, maybe: u64, reject: u64) -> Suggestion {
        let mut s = sample();
        s.accept_count = accept;
        s.maybe_count = maybe;
        s.reject_count = reject;
        s.total_feedback = accept + maybe + reject;
        s
    }

    #[test]
    fn new_suggestion_is_active_with_zero_counters() {
        let s = sample();
        assert!(s.is_active);
        assert!(s.suggestion_id.is_empty());
        assert_eq!(s.counted_feedback(), 0);
        assert_eq!(s.total_feedback, 0);
        assert_eq!(s.acceptance_rate(), 0.0);
    }

    #[test]
    fn acceptance_rate_weights_maybe_by_half() {
        let s = with_counts(3, 2, 5);
        assert_eq!(s.total_feedback, 10);
        assert!((s.acceptance_rate() - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn accept_feedback_only_touches_accept_counter() {
        let s = with_counts(2, 1, 0);
        let next = s.with_feedback(FeedbackType::Accept, Utc::now());
        assert_eq!(
            (next.accept_count, next.maybe_count, next.reject_count),
            (3, 1, 0)
        );
        assert_eq!(next.total_feedback, s.total_feedback + 1);
    }

    #[test]
    fn with_feedback_refreshes_updated_at() {
        let s = sample();
        let later = s.updated_at + chrono::Duration::minutes(5);
        let next = s.with_feedback(FeedbackType::Reject, later);
        assert_eq!(next.updated_at, later);
        assert_eq!(next.created_at, s.created_at);
    }

    #[test]
    fn matching_helpers() {
        let s = sample();
        assert!(s.is_valid());
        assert!(s.matches_time_of_day(TimeOfDay::Morning));
        assert!(!s.matches_time_of_day(TimeOfDay::Evening));
        assert!(s.matches_category("health"));
        assert!(s.has_tag("quick"));
        assert!(!s.has_tag("slow"));
    }

    #[test]
    fn inactive_suggestion_is_not_valid() {
        let mut s = sample();
        s.is_active = false;
        assert!(!s.is_valid());
    }

    #[test]
    fn missing_counters_deserialize_as_zero() {
        let json = serde_json::json!({
            "suggestion_id": "abc",
            "title": "Walk",
            "description": "A short evening walk outside",
            "category": "health",
            "time_of_day": "evening",
            "priority": 4,
            "is_active": true,
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        });
        let s: Suggestion = serde_json::from_value(json).unwrap();
        assert_eq!(s.accept_count, 0);
        assert_eq!(s.total_feedback, 0);
        assert!(s.tags.is_empty());
    }
}
