//! # Habitual Core Library
//!
//! This library provides the core logic for Habitual, a habit suggestion
//! service. A user records their ideal morning and evening habits; the
//! library serves a stored suggestion for the current period or asks a
//! language model for a new one, persists it, and tracks how users react.
//!
//! ## Architecture
//!
//! - **Orchestrator**: reuse-or-generate flow, feedback counters, listings,
//!   per-user suggestion history
//! - **Habits**: per-user habit lists with upsert and versioning
//! - **Generator**: prompt building, chat completion and response validation
//!   with a fixed fallback
//! - **Storage**: in-memory and SQLite stores behind async traits, plus
//!   TOML-based configuration
//!
//! ## Key Components
//!
//! - [`SuggestionOrchestrator`]: Entry point for suggestion operations
//! - [`HabitService`]: Habit CRUD
//! - [`SuggestionGenerator`]: Model-backed generation
//! - [`ApiResponse`]: `{ success, data?, error? }` envelope every operation returns

pub mod credentials;
pub mod error;
pub mod generator;
pub mod habits;
pub mod orchestrator;
pub mod response;
pub mod storage;
pub mod suggestion;
pub mod time_of_day;

pub use error::{ConfigError, CoreError, GenerationError, StoreError, ValidationError};
pub use generator::{CompletionClient, GeneratedSuggestion, OpenAiClient, SuggestionGenerator};
pub use habits::{HabitService, UserIdealHabits};
pub use orchestrator::SuggestionOrchestrator;
pub use response::ApiResponse;
pub use storage::{
    Config, FeedbackLog, HabitStore, MemoryStore, SqliteStore, SuggestionStore,
};
pub use suggestion::{
    FeedbackStatistics, HistoryFilter, Suggestion, SuggestionLog, SuggestionOrder, SuggestionQuery,
    UserFeedback,
};
pub use time_of_day::{Clock, FeedbackType, FixedClock, SystemClock, TimeOfDay};
