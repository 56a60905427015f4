//! Persistence for habits, suggestions and feedback.
//!
//! The orchestrator only sees the [`SuggestionStore`], [`HabitStore`] and
//! [`FeedbackLog`] traits. Two backends implement all three:
//! [`MemoryStore`] for tests and throwaway runs, [`SqliteStore`] for the
//! on-disk database.

mod config;
pub mod memory;
pub mod sqlite;

pub use config::{Config, GeneratorConfig, SuggestionsConfig, UserConfig};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

use crate::error::{ConfigError, StoreError};
use crate::habits::UserIdealHabits;
use crate::suggestion::{HistoryFilter, Suggestion, SuggestionLog, SuggestionQuery, UserFeedback};
use crate::time_of_day::FeedbackType;

/// Returns `~/.config/habitual[-dev|-demo]/` based on HABITUAL_ENV.
///
/// Set HABITUAL_ENV=dev or HABITUAL_ENV=demo to use a separate data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let dir = match Environment::current() {
        Environment::Development => base_dir.join("habitual-dev"),
        Environment::Demo => base_dir.join("habitual-demo"),
        Environment::Production => base_dir.join("habitual"),
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(e.to_string()))?;
    Ok(dir)
}

/// Deployment environment selected by HABITUAL_ENV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Demo,
    Production,
}

impl Environment {
    pub fn current() -> Self {
        Self::parse(&std::env::var("HABITUAL_ENV").unwrap_or_default())
    }

    /// Unknown values fall back to production.
    pub fn parse(value: &str) -> Self {
        match value {
            "dev" | "development" => Environment::Development,
            "demo" => Environment::Demo,
            _ => Environment::Production,
        }
    }
}

/// Suggestion records and their feedback counters.
#[async_trait]
pub trait SuggestionStore: Send + Sync {
    async fn get(&self, suggestion_id: &str) -> Result<Suggestion, StoreError>;

    async fn list(&self, query: &SuggestionQuery) -> Result<Vec<Suggestion>, StoreError>;

    /// Uniformly random pick among the rows `query` matches.
    ///
    /// `Ok(None)` when nothing matches.
    async fn random(&self, query: &SuggestionQuery) -> Result<Option<Suggestion>, StoreError>;

    /// Persist a new record, returning it with its assigned id.
    async fn create(&self, suggestion: Suggestion) -> Result<Suggestion, StoreError>;

    /// Overwrite the content and flags of an existing record.
    ///
    /// Feedback counters are left as stored; use
    /// [`increment_feedback`](Self::increment_feedback) for those.
    async fn update(&self, suggestion: &Suggestion) -> Result<Suggestion, StoreError>;

    async fn delete(&self, suggestion_id: &str) -> Result<(), StoreError>;

    /// Atomically add one to the matching counter and to `total_feedback`.
    ///
    /// Concurrent calls must all be retained.
    async fn increment_feedback(
        &self,
        suggestion_id: &str,
        feedback: FeedbackType,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

/// One habit record per user.
#[async_trait]
pub trait HabitStore: Send + Sync {
    async fn get_by_user(&self, user_id: &str) -> Result<Option<UserIdealHabits>, StoreError>;

    /// Persist a new record, returning it with its assigned id.
    ///
    /// Fails with [`StoreError::Conflict`] if the user already has one.
    async fn create(&self, habits: UserIdealHabits) -> Result<UserIdealHabits, StoreError>;

    async fn update(&self, habits: &UserIdealHabits) -> Result<UserIdealHabits, StoreError>;

    async fn delete_by_user(&self, user_id: &str) -> Result<(), StoreError>;
}

/// Individual feedback submissions and the per-user suggestion history.
#[async_trait]
pub trait FeedbackLog: Send + Sync {
    async fn append(&self, feedback: UserFeedback) -> Result<UserFeedback, StoreError>;

    async fn get_feedback(&self, feedback_id: &str) -> Result<UserFeedback, StoreError>;

    /// Overwrite the comment of an existing entry.
    ///
    /// Type, suggestion and timestamp are fixed once appended.
    async fn update_feedback(&self, feedback: &UserFeedback) -> Result<UserFeedback, StoreError>;

    async fn delete_feedback(&self, feedback_id: &str) -> Result<(), StoreError>;

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<UserFeedback>, StoreError>;

    async fn list_by_suggestion(&self, suggestion_id: &str)
        -> Result<Vec<UserFeedback>, StoreError>;

    /// Persist a history entry, returning it with its assigned id.
    async fn append_log(&self, log: SuggestionLog) -> Result<SuggestionLog, StoreError>;

    /// A user's history in insertion order, narrowed by `filter`.
    async fn list_logs(
        &self,
        user_id: &str,
        filter: &HistoryFilter,
    ) -> Result<Vec<SuggestionLog>, StoreError>;
}

/// Fresh store-assigned identifier.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parse_falls_back_to_production() {
        assert_eq!(Environment::parse("dev"), Environment::Development);
        assert_eq!(Environment::parse("development"), Environment::Development);
        assert_eq!(Environment::parse("demo"), Environment::Demo);
        assert_eq!(Environment::parse(""), Environment::Production);
        assert_eq!(Environment::parse("staging"), Environment::Production);
    }

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(new_id(), new_id());
    }
}
