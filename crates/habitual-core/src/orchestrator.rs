//! Serve an existing suggestion or generate, persist and return a new one.
//!
//! Every operation reports through [`ApiResponse`]. Stores, generator and
//! clock are all injected so the whole flow runs against in-memory fakes.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::{CoreError, Result, StoreError};
use crate::generator::SuggestionGenerator;
use crate::response::ApiResponse;
use crate::storage::{FeedbackLog, HabitStore, SuggestionStore};
use crate::suggestion::{
    FeedbackStatistics, HistoryFilter, Suggestion, SuggestionLog, SuggestionOrder,
    SuggestionQuery, UserFeedback,
};
use crate::time_of_day::{Clock, FeedbackType, TimeOfDay};

pub const DEFAULT_HIGH_ACCEPTANCE_LIMIT: usize = 10;

pub struct SuggestionOrchestrator {
    suggestions: Arc<dyn SuggestionStore>,
    habits: Arc<dyn HabitStore>,
    feedback: Arc<dyn FeedbackLog>,
    generator: SuggestionGenerator,
    clock: Arc<dyn Clock>,
}

/// Store misses on a suggestion id become the user-facing not-found error.
fn suggestion_lookup(err: StoreError) -> CoreError {
    match err {
        StoreError::NotFound(_) => CoreError::suggestion_not_found(),
        other => other.into(),
    }
}

fn feedback_lookup(err: StoreError) -> CoreError {
    match err {
        StoreError::NotFound(_) => CoreError::feedback_not_found(),
        other => other.into(),
    }
}

impl SuggestionOrchestrator {
    pub fn new(
        suggestions: Arc<dyn SuggestionStore>,
        habits: Arc<dyn HabitStore>,
        feedback: Arc<dyn FeedbackLog>,
        generator: SuggestionGenerator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            suggestions,
            habits,
            feedback,
            generator,
            clock,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now().with_timezone(&Utc)
    }

    async fn habits_for(&self, user_id: &str, time_of_day: TimeOfDay) -> Result<Vec<String>> {
        let habits = self
            .habits
            .get_by_user(user_id)
            .await?
            .ok_or_else(CoreError::habits_not_found)?;
        Ok(habits.habits_for(time_of_day).to_vec())
    }

    async fn generate_and_save(
        &self,
        user_id: &str,
        time_of_day: TimeOfDay,
        preferences: Option<&[String]>,
    ) -> Result<Suggestion> {
        let habits = self.habits_for(user_id, time_of_day).await?;
        let generated = match preferences {
            Some(prefs) => {
                self.generator
                    .generate_personalized(&habits, time_of_day, prefs)
                    .await?
            }
            None => self.generator.generate(&habits, time_of_day, None).await?,
        };

        let suggestion = Suggestion::from_generated(generated, self.now());
        let saved = self.suggestions.create(suggestion).await?;
        tracing::info!(
            user_id,
            suggestion_id = %saved.suggestion_id,
            %time_of_day,
            "generated new suggestion"
        );
        Ok(saved)
    }

    /// Append a history entry for `suggestion_id`.
    ///
    /// A failed write is logged and otherwise ignored.
    async fn log_history(
        &self,
        user_id: &str,
        suggestion_id: &str,
        time_of_day: TimeOfDay,
        feedback_id: Option<String>,
    ) {
        let now = self.clock.now();
        let entry = SuggestionLog {
            log_id: String::new(),
            user_id: user_id.to_string(),
            suggestion_id: suggestion_id.to_string(),
            feedback_id,
            date: now.date_naive(),
            time_of_day,
            created_at: now.with_timezone(&Utc),
        };
        if let Err(e) = self.feedback.append_log(entry).await {
            tracing::warn!(user_id, suggestion_id, error = %e, "suggestion history not recorded");
        }
    }

    /// Reuse a random active suggestion, or generate one.
    ///
    /// Without `time_of_day` any active suggestion may be reused; a new one
    /// is generated for the clock's current period.
    pub async fn get_or_create_suggestion(
        &self,
        user_id: &str,
        time_of_day: Option<TimeOfDay>,
    ) -> ApiResponse<Suggestion> {
        let result: Result<Suggestion> = async {
            let query = SuggestionQuery::active().maybe_time_of_day(time_of_day);

            let served = match self.suggestions.random(&query).await? {
                Some(existing) => {
                    tracing::info!(
                        user_id,
                        suggestion_id = %existing.suggestion_id,
                        "reusing stored suggestion"
                    );
                    existing
                }
                None => {
                    let time_of_day =
                        time_of_day.unwrap_or_else(|| TimeOfDay::current(self.clock.as_ref()));
                    tracing::debug!(user_id, %time_of_day, "no stored suggestion, generating");
                    self.generate_and_save(user_id, time_of_day, None).await?
                }
            };
            self.log_history(user_id, &served.suggestion_id, served.time_of_day, None)
                .await;
            Ok(served)
        }
        .await;
        ApiResponse::from_result(result, "Failed to get random suggestion")
    }

    /// Always generate, steering the model with the user's preferences.
    pub async fn get_personalized_suggestion(
        &self,
        user_id: &str,
        time_of_day: TimeOfDay,
        preferences: &[String],
    ) -> ApiResponse<Suggestion> {
        let result = self
            .generate_and_save(user_id, time_of_day, Some(preferences))
            .await;
        if let Ok(ref served) = result {
            self.log_history(user_id, &served.suggestion_id, time_of_day, None)
                .await;
        }
        ApiResponse::from_result(result, "Failed to get personalized suggestion")
    }

    /// Generate `count` new suggestions in one go and persist those that
    /// came back.
    pub async fn generate_suggestions(
        &self,
        user_id: &str,
        time_of_day: TimeOfDay,
        count: usize,
    ) -> ApiResponse<Vec<Suggestion>> {
        let result: Result<Vec<Suggestion>> = async {
            let habits = self.habits_for(user_id, time_of_day).await?;
            let batch = self
                .generator
                .generate_multiple(&habits, time_of_day, count)
                .await;
            if batch.is_empty() {
                return Err(CoreError::NotFound("No suggestions found".to_string()));
            }

            let mut saved = Vec::with_capacity(batch.len());
            for generated in batch {
                let suggestion = Suggestion::from_generated(generated, self.now());
                saved.push(self.suggestions.create(suggestion).await?);
            }
            tracing::info!(user_id, count = saved.len(), "generated suggestion batch");
            Ok(saved)
        }
        .await;
        ApiResponse::from_result(result, "Failed to generate suggestions")
    }

    /// Add one to the matching counter and to `total_feedback`.
    pub async fn record_feedback(
        &self,
        suggestion_id: &str,
        feedback_type: FeedbackType,
    ) -> ApiResponse<bool> {
        let result = self
            .suggestions
            .increment_feedback(suggestion_id, feedback_type, self.now())
            .await
            .map(|()| true)
            .map_err(suggestion_lookup);
        if result.is_ok() {
            tracing::debug!(suggestion_id, %feedback_type, "feedback counted");
        }
        ApiResponse::from_result(result, "Failed to update suggestion statistics")
    }

    /// Count the feedback and keep it in the user's history.
    ///
    /// The counter is bumped first. If the entry cannot be appended after
    /// that, the envelope fails but the bump stays.
    pub async fn submit_feedback(
        &self,
        user_id: &str,
        suggestion_id: &str,
        feedback_type: FeedbackType,
        comment: Option<String>,
    ) -> ApiResponse<UserFeedback> {
        let result: Result<UserFeedback> = async {
            let suggestion = self
                .suggestions
                .get(suggestion_id)
                .await
                .map_err(suggestion_lookup)?;
            let now = self.now();
            self.suggestions
                .increment_feedback(suggestion_id, feedback_type, now)
                .await
                .map_err(suggestion_lookup)?;

            let entry = UserFeedback {
                feedback_id: String::new(),
                user_id: user_id.to_string(),
                suggestion_id: suggestion_id.to_string(),
                feedback_type,
                comment: comment.filter(|c| !c.trim().is_empty()),
                timestamp: now,
                time_of_day: suggestion.time_of_day,
            };
            let stored = self.feedback.append(entry).await.map_err(|e| {
                tracing::warn!(
                    user_id,
                    suggestion_id,
                    error = %e,
                    "counter bumped but feedback entry not stored"
                );
                e
            })?;
            tracing::info!(user_id, suggestion_id, %feedback_type, "feedback submitted");
            self.log_history(
                user_id,
                suggestion_id,
                suggestion.time_of_day,
                Some(stored.feedback_id.clone()),
            )
            .await;
            Ok(stored)
        }
        .await;
        ApiResponse::from_result(result, "Failed to submit feedback")
    }

    /// Replace the comment on a submitted feedback entry; blank clears it.
    pub async fn update_feedback_comment(
        &self,
        feedback_id: &str,
        comment: Option<String>,
    ) -> ApiResponse<UserFeedback> {
        let result: Result<UserFeedback> = async {
            let mut entry = self
                .feedback
                .get_feedback(feedback_id)
                .await
                .map_err(feedback_lookup)?;
            entry.comment = comment.filter(|c| !c.trim().is_empty());
            self.feedback
                .update_feedback(&entry)
                .await
                .map_err(feedback_lookup)
        }
        .await;
        ApiResponse::from_result(result, "Failed to update feedback")
    }

    /// Remove a feedback entry. Suggestion counters are left as they are.
    pub async fn delete_feedback(&self, feedback_id: &str) -> ApiResponse<bool> {
        let result = self
            .feedback
            .delete_feedback(feedback_id)
            .await
            .map(|()| true)
            .map_err(feedback_lookup);
        ApiResponse::from_result(result, "Failed to delete feedback")
    }

    /// Suggestions served to and answered by a user, oldest first.
    pub async fn suggestion_history(
        &self,
        user_id: &str,
        filter: HistoryFilter,
    ) -> ApiResponse<Vec<SuggestionLog>> {
        let result = self
            .feedback
            .list_logs(user_id, &filter)
            .await
            .map_err(CoreError::from);
        ApiResponse::from_result(result, "Failed to get suggestion history")
    }

    /// Every active suggestion in store order.
    pub async fn list_active(&self) -> ApiResponse<Vec<Suggestion>> {
        self.list(&SuggestionQuery::active(), "Failed to get active suggestions")
            .await
    }

    /// Active suggestions for a period, highest priority first.
    pub async fn list_by_time_of_day(&self, time_of_day: TimeOfDay) -> ApiResponse<Vec<Suggestion>> {
        let query = SuggestionQuery::active()
            .time_of_day(time_of_day)
            .order_by(SuggestionOrder::Priority);
        self.list(&query, "Failed to get suggestions by time of day")
            .await
    }

    /// Active suggestions in a category, highest priority first.
    pub async fn list_by_category(&self, category: &str) -> ApiResponse<Vec<Suggestion>> {
        let query = SuggestionQuery::active()
            .category(category)
            .order_by(SuggestionOrder::Priority);
        self.list(&query, "Failed to get suggestions by category")
            .await
    }

    /// Active suggestions that received feedback, most-rated first.
    pub async fn list_high_acceptance(&self, limit: usize) -> ApiResponse<Vec<Suggestion>> {
        let query = SuggestionQuery::active()
            .total_feedback_above(0)
            .order_by(SuggestionOrder::TotalFeedback)
            .limit(limit);
        self.list(&query, "Failed to get high acceptance suggestions")
            .await
    }

    async fn list(&self, query: &SuggestionQuery, context: &str) -> ApiResponse<Vec<Suggestion>> {
        tracing::debug!(?query, "listing suggestions");
        let result = self.suggestions.list(query).await.map_err(CoreError::from);
        ApiResponse::from_result(result, context)
    }

    pub async fn get_suggestion(&self, suggestion_id: &str) -> ApiResponse<Suggestion> {
        let result = self
            .suggestions
            .get(suggestion_id)
            .await
            .map_err(suggestion_lookup);
        ApiResponse::from_result(result, "Failed to get suggestion")
    }

    /// Soft delete: the record stays but is no longer served.
    pub async fn deactivate_suggestion(&self, suggestion_id: &str) -> ApiResponse<bool> {
        let result: Result<bool> = async {
            let mut suggestion = self
                .suggestions
                .get(suggestion_id)
                .await
                .map_err(suggestion_lookup)?;
            suggestion.is_active = false;
            suggestion.updated_at = self.now();
            self.suggestions
                .update(&suggestion)
                .await
                .map_err(suggestion_lookup)?;
            tracing::info!(suggestion_id, "suggestion deactivated");
            Ok(true)
        }
        .await;
        ApiResponse::from_result(result, "Failed to deactivate suggestion")
    }

    pub async fn delete_suggestion(&self, suggestion_id: &str) -> ApiResponse<bool> {
        let result = self
            .suggestions
            .delete(suggestion_id)
            .await
            .map(|()| true)
            .map_err(suggestion_lookup);
        ApiResponse::from_result(result, "Failed to delete suggestion")
    }

    /// Rates over everything the user has submitted.
    pub async fn feedback_statistics(&self, user_id: &str) -> ApiResponse<FeedbackStatistics> {
        let result = self
            .feedback
            .list_by_user(user_id)
            .await
            .map(|entries| FeedbackStatistics::from_entries(&entries))
            .map_err(CoreError::from);
        ApiResponse::from_result(result, "Failed to get feedback statistics")
    }
}
