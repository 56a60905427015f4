//! Filter and ordering for suggestion lookups.

use serde::{Deserialize, Serialize};

use super::Suggestion;
use crate::time_of_day::TimeOfDay;

/// Sort key for suggestion listings; always descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SuggestionOrder {
    /// Store-native order
    #[default]
    Unordered,
    Priority,
    TotalFeedback,
}

/// Filters understood by every [`SuggestionStore`](crate::storage::SuggestionStore).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SuggestionQuery {
    pub time_of_day: Option<TimeOfDay>,
    pub category: Option<String>,
    pub active_only: bool,
    /// Keep rows whose `total_feedback` is strictly greater than this.
    pub min_total_feedback: Option<u64>,
    pub order: SuggestionOrder,
    pub limit: Option<usize>,
}

impl SuggestionQuery {
    /// Active suggestions, any period or category.
    pub fn active() -> Self {
        Self {
            active_only: true,
            ..Default::default()
        }
    }

    pub fn time_of_day(mut self, time_of_day: TimeOfDay) -> Self {
        self.time_of_day = Some(time_of_day);
        self
    }

    pub fn maybe_time_of_day(mut self, time_of_day: Option<TimeOfDay>) -> Self {
        self.time_of_day = time_of_day;
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn total_feedback_above(mut self, floor: u64) -> Self {
        self.min_total_feedback = Some(floor);
        self
    }

    pub fn order_by(mut self, order: SuggestionOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `suggestion` passes every filter (ordering and limit aside).
    pub fn matches(&self, suggestion: &Suggestion) -> bool {
        if self.active_only && !suggestion.is_active {
            return false;
        }
        if let Some(tod) = self.time_of_day {
            if suggestion.time_of_day != tod {
                return false;
            }
        }
        if let Some(ref category) = self.category {
            if &suggestion.category != category {
                return false;
            }
        }
        if let Some(floor) = self.min_total_feedback {
            if suggestion.total_feedback <= floor {
                return false;
            }
        }
        true
    }

    /// Filter, sort and truncate an in-memory collection.
    ///
    /// The sort is stable, so ties keep their incoming order.
    pub fn apply(&self, suggestions: impl IntoIterator<Item = Suggestion>) -> Vec<Suggestion> {
        let mut rows: Vec<Suggestion> = suggestions
            .into_iter()
            .filter(|s| self.matches(s))
            .collect();

        match self.order {
            SuggestionOrder::Unordered => {}
            SuggestionOrder::Priority => rows.sort_by(|a, b| b.priority.cmp(&a.priority)),
            SuggestionOrder::TotalFeedback => {
                rows.sort_by(|a, b| b.total_feedback.cmp(&a.total_feedback))
            }
        }

        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }
        rows
    }
}
