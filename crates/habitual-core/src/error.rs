//! Core error types for habitual-core.
//!
//! Internal operations return [`Result`] with a [`CoreError`]; the public
//! service surface converts these into an [`ApiResponse`](crate::ApiResponse)
//! so nothing escapes as a fault across a component boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for habitual-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A record the operation depends on does not exist
    #[error("{0}")]
    NotFound(String),

    /// The value is already present
    #[error("{0}")]
    Duplicate(String),

    /// Storage-related errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Suggestion generation errors
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn habits_not_found() -> Self {
        CoreError::NotFound("User habits not found".to_string())
    }

    pub fn suggestion_not_found() -> Self {
        CoreError::NotFound("Suggestion not found".to_string())
    }

    pub fn feedback_not_found() -> Self {
        CoreError::NotFound("Feedback not found".to_string())
    }

    pub fn duplicate_habit() -> Self {
        CoreError::Duplicate("Habit already exists".to_string())
    }

    /// Whether this is a lookup miss rather than a real failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::NotFound(_) | CoreError::Store(StoreError::NotFound(_))
        )
    }
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The requested record does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// A record with the same unique key already exists
    #[error("{0} already exists")]
    Conflict(String),

    /// The data directory holding the database is unusable
    #[error("Data directory unavailable: {0}")]
    DataDir(#[from] ConfigError),

    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// A stored row could not be decoded
    #[error("Corrupt record '{id}': {message}")]
    Corrupt { id: String, message: String },

    /// The connection mutex was poisoned by a panicking holder
    #[error("Store lock poisoned")]
    Poisoned,
}

/// Errors raised while talking to the completion backend.
///
/// Malformed model output is never reported through this type; the generator
/// substitutes its fallback suggestion instead.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// No API key is configured
    #[error("No API key configured for {service}")]
    MissingCredentials { service: String },

    /// The HTTP request could not be sent or read
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("API error (HTTP {status}): {body}")]
    Http { status: u16, body: String },

    /// The backend answered without any completion text
    #[error("No response from completion backend")]
    EmptyResponse,

    /// The configured endpoint is not a valid URL
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// The data directory could not be resolved or created
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required text field is empty
    #[error("'{0}' must not be empty")]
    Empty(String),

    /// A text field is shorter than allowed
    #[error("'{field}' must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// A number falls outside its range
    #[error("'{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: String,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                match inner.code {
                    rusqlite::ErrorCode::DatabaseLocked => StoreError::Locked,
                    rusqlite::ErrorCode::ConstraintViolation => {
                        StoreError::Conflict(err.to_string())
                    }
                    _ => StoreError::QueryFailed(err.to_string()),
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Store(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_messages_match_envelope_text() {
        assert_eq!(CoreError::habits_not_found().to_string(), "User habits not found");
        assert_eq!(CoreError::suggestion_not_found().to_string(), "Suggestion not found");
        assert_eq!(CoreError::duplicate_habit().to_string(), "Habit already exists");
    }

    #[test]
    fn store_not_found_counts_as_miss() {
        let err = CoreError::Store(StoreError::NotFound("suggestion".into()));
        assert!(err.is_not_found());
        assert!(!CoreError::Store(StoreError::Locked).is_not_found());
    }

    #[test]
    fn data_dir_failure_is_not_a_query_failure() {
        let err = StoreError::from(ConfigError::DataDir("permission denied".into()));
        assert!(matches!(err, StoreError::DataDir(_)));
        assert_eq!(
            err.to_string(),
            "Data directory unavailable: Failed to access data directory: permission denied"
        );
    }

    #[test]
    fn unique_violation_maps_to_conflict() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (k TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err: StoreError = conn
            .execute("INSERT INTO t VALUES ('a')", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn validation_error_reads_naturally() {
        let err = ValidationError::OutOfRange {
            field: "priority".into(),
            min: 1,
            max: 10,
            actual: "11".into(),
        };
        assert_eq!(err.to_string(), "'priority' must be between 1 and 10, got 11");
    }
}
