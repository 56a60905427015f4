//! In-memory backend for all three store traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use std::sync::{Mutex, MutexGuard};

use super::{new_id, FeedbackLog, HabitStore, SuggestionStore};
use crate::error::StoreError;
use crate::habits::UserIdealHabits;
use crate::suggestion::{HistoryFilter, Suggestion, SuggestionLog, SuggestionQuery, UserFeedback};
use crate::time_of_day::FeedbackType;

#[derive(Default)]
struct Inner {
    /// Insertion order doubles as store-native order.
    suggestions: Vec<Suggestion>,
    habits: Vec<UserIdealHabits>,
    feedback: Vec<UserFeedback>,
    logs: Vec<SuggestionLog>,
}

/// Mutex-guarded store, shared freely behind an `Arc`.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with suggestions, keeping any ids they carry.
    pub fn with_suggestions(suggestions: Vec<Suggestion>) -> Self {
        let store = Self::new();
        if let Ok(mut inner) = store.inner.lock() {
            for mut s in suggestions {
                if s.suggestion_id.is_empty() {
                    s.suggestion_id = new_id();
                }
                inner.suggestions.push(s);
            }
        }
        store
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Number of suggestion records, active or not.
    pub fn suggestion_count(&self) -> usize {
        self.inner.lock().map(|i| i.suggestions.len()).unwrap_or(0)
    }
}

#[async_trait]
impl SuggestionStore for MemoryStore {
    async fn get(&self, suggestion_id: &str) -> Result<Suggestion, StoreError> {
        let inner = self.lock()?;
        inner
            .suggestions
            .iter()
            .find(|s| s.suggestion_id == suggestion_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Suggestion '{suggestion_id}'")))
    }

    async fn list(&self, query: &SuggestionQuery) -> Result<Vec<Suggestion>, StoreError> {
        let inner = self.lock()?;
        Ok(query.apply(inner.suggestions.iter().cloned()))
    }

    async fn random(&self, query: &SuggestionQuery) -> Result<Option<Suggestion>, StoreError> {
        let candidates = self.list(query).await?;
        let mut rng = rand::thread_rng();
        Ok(candidates.choose(&mut rng).cloned())
    }

    async fn create(&self, mut suggestion: Suggestion) -> Result<Suggestion, StoreError> {
        let mut inner = self.lock()?;
        suggestion.suggestion_id = new_id();
        inner.suggestions.push(suggestion.clone());
        Ok(suggestion)
    }

    async fn update(&self, suggestion: &Suggestion) -> Result<Suggestion, StoreError> {
        let mut inner = self.lock()?;
        let stored = inner
            .suggestions
            .iter_mut()
            .find(|s| s.suggestion_id == suggestion.suggestion_id)
            .ok_or_else(|| {
                StoreError::NotFound(format!("Suggestion '{}'", suggestion.suggestion_id))
            })?;

        stored.title = suggestion.title.clone();
        stored.description = suggestion.description.clone();
        stored.category = suggestion.category.clone();
        stored.time_of_day = suggestion.time_of_day;
        stored.priority = suggestion.priority;
        stored.tags = suggestion.tags.clone();
        stored.is_active = suggestion.is_active;
        stored.updated_at = suggestion.updated_at;
        Ok(stored.clone())
    }

    async fn delete(&self, suggestion_id: &str) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let before = inner.suggestions.len();
        inner.suggestions.retain(|s| s.suggestion_id != suggestion_id);
        if inner.suggestions.len() == before {
            return Err(StoreError::NotFound(format!("Suggestion '{suggestion_id}'")));
        }
        Ok(())
    }

    async fn increment_feedback(
        &self,
        suggestion_id: &str,
        feedback: FeedbackType,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let stored = inner
            .suggestions
            .iter_mut()
            .find(|s| s.suggestion_id == suggestion_id)
            .ok_or_else(|| StoreError::NotFound(format!("Suggestion '{suggestion_id}'")))?;
        stored.apply_feedback(feedback, at);
        Ok(())
    }
}

#[async_trait]
impl HabitStore for MemoryStore {
    async fn get_by_user(&self, user_id: &str) -> Result<Option<UserIdealHabits>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.habits.iter().find(|h| h.user_id == user_id).cloned())
    }

    async fn create(&self, mut habits: UserIdealHabits) -> Result<UserIdealHabits, StoreError> {
        let mut inner = self.lock()?;
        if inner.habits.iter().any(|h| h.user_id == habits.user_id) {
            return Err(StoreError::Conflict(format!(
                "Habits for user '{}'",
                habits.user_id
            )));
        }
        habits.habit_id = new_id();
        inner.habits.push(habits.clone());
        Ok(habits)
    }

    async fn update(&self, habits: &UserIdealHabits) -> Result<UserIdealHabits, StoreError> {
        let mut inner = self.lock()?;
        let stored = inner
            .habits
            .iter_mut()
            .find(|h| h.habit_id == habits.habit_id)
            .ok_or_else(|| StoreError::NotFound(format!("Habits '{}'", habits.habit_id)))?;
        *stored = habits.clone();
        Ok(stored.clone())
    }

    async fn delete_by_user(&self, user_id: &str) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let before = inner.habits.len();
        inner.habits.retain(|h| h.user_id != user_id);
        if inner.habits.len() == before {
            return Err(StoreError::NotFound(format!("Habits for user '{user_id}'")));
        }
        Ok(())
    }
}

#[async_trait]
impl FeedbackLog for MemoryStore {
    async fn append(&self, mut feedback: UserFeedback) -> Result<UserFeedback, StoreError> {
        let mut inner = self.lock()?;
        feedback.feedback_id = new_id();
        inner.feedback.push(feedback.clone());
        Ok(feedback)
    }

    async fn get_feedback(&self, feedback_id: &str) -> Result<UserFeedback, StoreError> {
        let inner = self.lock()?;
        inner
            .feedback
            .iter()
            .find(|f| f.feedback_id == feedback_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Feedback '{feedback_id}'")))
    }

    async fn update_feedback(&self, feedback: &UserFeedback) -> Result<UserFeedback, StoreError> {
        let mut inner = self.lock()?;
        let stored = inner
            .feedback
            .iter_mut()
            .find(|f| f.feedback_id == feedback.feedback_id)
            .ok_or_else(|| StoreError::NotFound(format!("Feedback '{}'", feedback.feedback_id)))?;
        stored.comment = feedback.comment.clone();
        Ok(stored.clone())
    }

    async fn delete_feedback(&self, feedback_id: &str) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let before = inner.feedback.len();
        inner.feedback.retain(|f| f.feedback_id != feedback_id);
        if inner.feedback.len() == before {
            return Err(StoreError::NotFound(format!("Feedback '{feedback_id}'")));
        }
        Ok(())
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<UserFeedback>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .feedback
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_by_suggestion(
        &self,
        suggestion_id: &str,
    ) -> Result<Vec<UserFeedback>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .feedback
            .iter()
            .filter(|f| f.suggestion_id == suggestion_id)
            .cloned()
            .collect())
    }

    async fn append_log(&self, mut log: SuggestionLog) -> Result<SuggestionLog, StoreError> {
        let mut inner = self.lock()?;
        log.log_id = new_id();
        inner.logs.push(log.clone());
        Ok(log)
    }

    async fn list_logs(
        &self,
        user_id: &str,
        filter: &HistoryFilter,
    ) -> Result<Vec<SuggestionLog>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .logs
            .iter()
            .filter(|l| l.user_id == user_id && filter.matches(l))
            .cloned()
            .collect())
    }
}
