//! SQLite-based storage for habits, suggestions and feedback.
//!
//! Provides persistent storage for:
//! - Suggestion records with their feedback counters
//! - One ideal-habits record per user
//! - The per-user feedback entries and suggestion history
//!
//! Feedback counters are bumped with a single `UPDATE ... SET n = n + 1`
//! so concurrent submissions never overwrite each other.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::{data_dir, new_id, FeedbackLog, HabitStore, SuggestionStore};
use crate::error::StoreError;
use crate::habits::UserIdealHabits;
use crate::suggestion::{
    HistoryFilter, Suggestion, SuggestionLog, SuggestionOrder, SuggestionQuery, UserFeedback,
};
use crate::time_of_day::{FeedbackType, TimeOfDay};

const SUGGESTION_COLUMNS: &str = "suggestion_id, title, description, category, time_of_day, \
     priority, tags, is_active, created_at, updated_at, \
     accept_count, maybe_count, reject_count, total_feedback";

/// SQLite database backing every store trait.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open the database at `~/.config/habitual/habitual.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let path = data_dir()?.join("habitual.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "opened database");
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn query_suggestions(&self, query: &SuggestionQuery) -> Result<Vec<Suggestion>, StoreError> {
        let mut sql = format!("SELECT {SUGGESTION_COLUMNS} FROM suggestions WHERE 1 = 1");
        let mut args: Vec<rusqlite::types::Value> = Vec::new();

        if query.active_only {
            sql.push_str(" AND is_active = 1");
        }
        if let Some(tod) = query.time_of_day {
            sql.push_str(" AND time_of_day = ?");
            args.push(tod.as_str().to_string().into());
        }
        if let Some(ref category) = query.category {
            sql.push_str(" AND category = ?");
            args.push(category.clone().into());
        }
        if let Some(floor) = query.min_total_feedback {
            sql.push_str(" AND total_feedback > ?");
            args.push((floor as i64).into());
        }
        match query.order {
            SuggestionOrder::Unordered => sql.push_str(" ORDER BY rowid"),
            SuggestionOrder::Priority => sql.push_str(" ORDER BY priority DESC, rowid"),
            SuggestionOrder::TotalFeedback => sql.push_str(" ORDER BY total_feedback DESC, rowid"),
        }
        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            args.push((limit as i64).into());
        }

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args), RawSuggestion::from_row)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?.decode()?);
        }
        Ok(out)
    }
}

fn migrate(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS suggestions (
            suggestion_id  TEXT PRIMARY KEY,
            title          TEXT NOT NULL,
            description    TEXT NOT NULL,
            category       TEXT NOT NULL DEFAULT '',
            time_of_day    TEXT NOT NULL,
            priority       INTEGER NOT NULL,
            tags           TEXT NOT NULL DEFAULT '[]',
            is_active      INTEGER NOT NULL DEFAULT 1,
            created_at     TEXT NOT NULL,
            updated_at     TEXT NOT NULL,
            accept_count   INTEGER DEFAULT 0,
            maybe_count    INTEGER DEFAULT 0,
            reject_count   INTEGER DEFAULT 0,
            total_feedback INTEGER DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS user_ideal_habits (
            habit_id       TEXT PRIMARY KEY,
            user_id        TEXT NOT NULL UNIQUE,
            morning_habits TEXT NOT NULL DEFAULT '[]',
            evening_habits TEXT NOT NULL DEFAULT '[]',
            created_at     TEXT NOT NULL,
            updated_at     TEXT NOT NULL,
            version        INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS user_feedback (
            feedback_id   TEXT PRIMARY KEY,
            user_id       TEXT NOT NULL,
            suggestion_id TEXT NOT NULL,
            feedback_type TEXT NOT NULL,
            comment       TEXT,
            timestamp     TEXT NOT NULL,
            time_of_day   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS suggestion_logs (
            log_id        TEXT PRIMARY KEY,
            user_id       TEXT NOT NULL,
            suggestion_id TEXT NOT NULL,
            feedback_id   TEXT,
            date          TEXT NOT NULL,
            time_of_day   TEXT NOT NULL,
            created_at    TEXT NOT NULL
        );

        -- Indexes for the selection and listing queries
        CREATE INDEX IF NOT EXISTS idx_suggestions_active_tod ON suggestions(is_active, time_of_day);
        CREATE INDEX IF NOT EXISTS idx_suggestions_category ON suggestions(category);
        CREATE INDEX IF NOT EXISTS idx_suggestions_total_feedback ON suggestions(total_feedback);
        CREATE INDEX IF NOT EXISTS idx_feedback_user ON user_feedback(user_id);
        CREATE INDEX IF NOT EXISTS idx_feedback_suggestion ON user_feedback(suggestion_id);
        CREATE INDEX IF NOT EXISTS idx_logs_user_date ON suggestion_logs(user_id, date);",
    )
}

/// Column values as stored, before text fields are decoded.
struct RawSuggestion {
    suggestion_id: String,
    title: String,
    description: String,
    category: String,
    time_of_day: String,
    priority: i64,
    tags: String,
    is_active: bool,
    created_at: String,
    updated_at: String,
    accept_count: Option<i64>,
    maybe_count: Option<i64>,
    reject_count: Option<i64>,
    total_feedback: Option<i64>,
}

impl RawSuggestion {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            suggestion_id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            category: row.get(3)?,
            time_of_day: row.get(4)?,
            priority: row.get(5)?,
            tags: row.get(6)?,
            is_active: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
            accept_count: row.get(10)?,
            maybe_count: row.get(11)?,
            reject_count: row.get(12)?,
            total_feedback: row.get(13)?,
        })
    }

    fn decode(self) -> Result<Suggestion, StoreError> {
        let id = self.suggestion_id.clone();
        let corrupt = |message: String| StoreError::Corrupt {
            id: id.clone(),
            message,
        };

        let time_of_day: TimeOfDay = self
            .time_of_day
            .parse()
            .map_err(|e: crate::error::ValidationError| corrupt(e.to_string()))?;
        let tags: Vec<String> =
            serde_json::from_str(&self.tags).map_err(|e| corrupt(format!("tags: {e}")))?;
        let priority = u8::try_from(self.priority)
            .map_err(|_| corrupt(format!("priority out of range: {}", self.priority)))?;

        Ok(Suggestion {
            suggestion_id: self.suggestion_id,
            title: self.title,
            description: self.description,
            category: self.category,
            time_of_day,
            priority,
            tags,
            is_active: self.is_active,
            created_at: parse_timestamp(&self.created_at).map_err(&corrupt)?,
            updated_at: parse_timestamp(&self.updated_at).map_err(&corrupt)?,
            accept_count: counter(self.accept_count),
            maybe_count: counter(self.maybe_count),
            reject_count: counter(self.reject_count),
            total_feedback: counter(self.total_feedback),
        })
    }
}

/// Missing or negative counters read as zero.
fn counter(value: Option<i64>) -> u64 {
    value.and_then(|v| u64::try_from(v).ok()).unwrap_or(0)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("timestamp '{value}': {e}"))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::QueryFailed(e.to_string()))
}

fn habits_from_row(row: &Row<'_>) -> rusqlite::Result<(String, String, String, String, String, String, i64)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn decode_habits(
    raw: (String, String, String, String, String, String, i64),
) -> Result<UserIdealHabits, StoreError> {
    let (habit_id, user_id, morning, evening, created_at, updated_at, version) = raw;
    let corrupt = |message: String| StoreError::Corrupt {
        id: habit_id.clone(),
        message,
    };
    let morning_habits: Vec<String> =
        serde_json::from_str(&morning).map_err(|e| corrupt(format!("morning_habits: {e}")))?;
    let evening_habits: Vec<String> =
        serde_json::from_str(&evening).map_err(|e| corrupt(format!("evening_habits: {e}")))?;

    Ok(UserIdealHabits {
        habit_id: habit_id.clone(),
        user_id,
        morning_habits,
        evening_habits,
        created_at: parse_timestamp(&created_at).map_err(&corrupt)?,
        updated_at: parse_timestamp(&updated_at).map_err(&corrupt)?,
        version: u64::try_from(version).unwrap_or(1).max(1),
    })
}

fn feedback_from_row(row: &Row<'_>) -> rusqlite::Result<(String, String, String, String, Option<String>, String, String)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn decode_feedback(
    raw: (String, String, String, String, Option<String>, String, String),
) -> Result<UserFeedback, StoreError> {
    let (feedback_id, user_id, suggestion_id, feedback_type, comment, timestamp, time_of_day) = raw;
    let corrupt = |message: String| StoreError::Corrupt {
        id: feedback_id.clone(),
        message,
    };

    Ok(UserFeedback {
        feedback_id: feedback_id.clone(),
        user_id,
        suggestion_id,
        feedback_type: feedback_type
            .parse::<FeedbackType>()
            .map_err(|e| corrupt(e.to_string()))?,
        comment,
        timestamp: parse_timestamp(&timestamp).map_err(&corrupt)?,
        time_of_day: time_of_day
            .parse::<TimeOfDay>()
            .map_err(|e| corrupt(e.to_string()))?,
    })
}

type RawLog = (String, String, String, Option<String>, String, String, String);

fn log_from_row(row: &Row<'_>) -> rusqlite::Result<RawLog> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn decode_log(raw: RawLog) -> Result<SuggestionLog, StoreError> {
    let (log_id, user_id, suggestion_id, feedback_id, date, time_of_day, created_at) = raw;
    let corrupt = |message: String| StoreError::Corrupt {
        id: log_id.clone(),
        message,
    };

    Ok(SuggestionLog {
        log_id: log_id.clone(),
        user_id,
        suggestion_id,
        feedback_id,
        date: date
            .parse::<NaiveDate>()
            .map_err(|e| corrupt(format!("date '{date}': {e}")))?,
        time_of_day: time_of_day
            .parse::<TimeOfDay>()
            .map_err(|e| corrupt(e.to_string()))?,
        created_at: parse_timestamp(&created_at).map_err(&corrupt)?,
    })
}

#[async_trait]
impl SuggestionStore for SqliteStore {
    async fn get(&self, suggestion_id: &str) -> Result<Suggestion, StoreError> {
        let raw = {
            let conn = self.conn()?;
            conn.query_row(
                &format!("SELECT {SUGGESTION_COLUMNS} FROM suggestions WHERE suggestion_id = ?1"),
                params![suggestion_id],
                RawSuggestion::from_row,
            )
            .optional()?
        };
        raw.ok_or_else(|| StoreError::NotFound(format!("Suggestion '{suggestion_id}'")))?
            .decode()
    }

    async fn list(&self, query: &SuggestionQuery) -> Result<Vec<Suggestion>, StoreError> {
        self.query_suggestions(query)
    }

    async fn random(&self, query: &SuggestionQuery) -> Result<Option<Suggestion>, StoreError> {
        let mut candidates = self.query_suggestions(query)?;
        if candidates.is_empty() {
            return Ok(None);
        }
        let index = rand::thread_rng().gen_range(0..candidates.len());
        Ok(Some(candidates.swap_remove(index)))
    }

    async fn create(&self, mut suggestion: Suggestion) -> Result<Suggestion, StoreError> {
        suggestion.suggestion_id = new_id();
        let tags = to_json(&suggestion.tags)?;
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO suggestions ({SUGGESTION_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
            ),
            params![
                suggestion.suggestion_id,
                suggestion.title,
                suggestion.description,
                suggestion.category,
                suggestion.time_of_day.as_str(),
                suggestion.priority as i64,
                tags,
                suggestion.is_active,
                suggestion.created_at.to_rfc3339(),
                suggestion.updated_at.to_rfc3339(),
                suggestion.accept_count as i64,
                suggestion.maybe_count as i64,
                suggestion.reject_count as i64,
                suggestion.total_feedback as i64,
            ],
        )?;
        Ok(suggestion)
    }

    async fn update(&self, suggestion: &Suggestion) -> Result<Suggestion, StoreError> {
        let tags = to_json(&suggestion.tags)?;
        let changed = {
            let conn = self.conn()?;
            conn.execute(
                "UPDATE suggestions
                 SET title = ?2, description = ?3, category = ?4, time_of_day = ?5,
                     priority = ?6, tags = ?7, is_active = ?8, updated_at = ?9
                 WHERE suggestion_id = ?1",
                params![
                    suggestion.suggestion_id,
                    suggestion.title,
                    suggestion.description,
                    suggestion.category,
                    suggestion.time_of_day.as_str(),
                    suggestion.priority as i64,
                    tags,
                    suggestion.is_active,
                    suggestion.updated_at.to_rfc3339(),
                ],
            )?
        };
        if changed == 0 {
            return Err(StoreError::NotFound(format!(
                "Suggestion '{}'",
                suggestion.suggestion_id
            )));
        }
        self.get(&suggestion.suggestion_id).await
    }

    async fn delete(&self, suggestion_id: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM suggestions WHERE suggestion_id = ?1",
            params![suggestion_id],
        )?;
        if changed == 0 {
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
        let column = feedback.counter_column();
        let conn = self.conn()?;
        let changed = conn.execute(
            &format!(
                "UPDATE suggestions
                 SET {column} = COALESCE({column}, 0) + 1,
                     total_feedback = COALESCE(total_feedback, 0) + 1,
                     updated_at = ?2
                 WHERE suggestion_id = ?1"
            ),
            params![suggestion_id, at.to_rfc3339()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("Suggestion '{suggestion_id}'")));
        }
        Ok(())
    }
}

#[async_trait]
impl HabitStore for SqliteStore {
    async fn get_by_user(&self, user_id: &str) -> Result<Option<UserIdealHabits>, StoreError> {
        let raw = {
            let conn = self.conn()?;
            conn.query_row(
                "SELECT habit_id, user_id, morning_habits, evening_habits, created_at, updated_at, version
                 FROM user_ideal_habits WHERE user_id = ?1",
                params![user_id],
                habits_from_row,
            )
            .optional()?
        };
        raw.map(decode_habits).transpose()
    }

    async fn create(&self, mut habits: UserIdealHabits) -> Result<UserIdealHabits, StoreError> {
        habits.habit_id = new_id();
        let morning = to_json(&habits.morning_habits)?;
        let evening = to_json(&habits.evening_habits)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO user_ideal_habits
                (habit_id, user_id, morning_habits, evening_habits, created_at, updated_at, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                habits.habit_id,
                habits.user_id,
                morning,
                evening,
                habits.created_at.to_rfc3339(),
                habits.updated_at.to_rfc3339(),
                habits.version as i64,
            ],
        )?;
        Ok(habits)
    }

    async fn update(&self, habits: &UserIdealHabits) -> Result<UserIdealHabits, StoreError> {
        let morning = to_json(&habits.morning_habits)?;
        let evening = to_json(&habits.evening_habits)?;
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE user_ideal_habits
             SET morning_habits = ?2, evening_habits = ?3, updated_at = ?4, version = ?5
             WHERE habit_id = ?1",
            params![
                habits.habit_id,
                morning,
                evening,
                habits.updated_at.to_rfc3339(),
                habits.version as i64,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("Habits '{}'", habits.habit_id)));
        }
        Ok(habits.clone())
    }

    async fn delete_by_user(&self, user_id: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM user_ideal_habits WHERE user_id = ?1",
            params![user_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("Habits for user '{user_id}'")));
        }
        Ok(())
    }
}

#[async_trait]
impl FeedbackLog for SqliteStore {
    async fn append(&self, mut feedback: UserFeedback) -> Result<UserFeedback, StoreError> {
        feedback.feedback_id = new_id();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO user_feedback
                (feedback_id, user_id, suggestion_id, feedback_type, comment, timestamp, time_of_day)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                feedback.feedback_id,
                feedback.user_id,
                feedback.suggestion_id,
                feedback.feedback_type.as_str(),
                feedback.comment,
                feedback.timestamp.to_rfc3339(),
                feedback.time_of_day.as_str(),
            ],
        )?;
        Ok(feedback)
    }

    async fn get_feedback(&self, feedback_id: &str) -> Result<UserFeedback, StoreError> {
        let raw = {
            let conn = self.conn()?;
            conn.query_row(
                "SELECT feedback_id, user_id, suggestion_id, feedback_type, comment, timestamp, time_of_day
                 FROM user_feedback WHERE feedback_id = ?1",
                params![feedback_id],
                feedback_from_row,
            )
            .optional()?
        };
        decode_feedback(raw.ok_or_else(|| StoreError::NotFound(format!("Feedback '{feedback_id}'")))?)
    }

    async fn update_feedback(&self, feedback: &UserFeedback) -> Result<UserFeedback, StoreError> {
        let changed = {
            let conn = self.conn()?;
            conn.execute(
                "UPDATE user_feedback SET comment = ?2 WHERE feedback_id = ?1",
                params![feedback.feedback_id, feedback.comment],
            )?
        };
        if changed == 0 {
            return Err(StoreError::NotFound(format!(
                "Feedback '{}'",
                feedback.feedback_id
            )));
        }
        self.get_feedback(&feedback.feedback_id).await
    }

    async fn delete_feedback(&self, feedback_id: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM user_feedback WHERE feedback_id = ?1",
            params![feedback_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("Feedback '{feedback_id}'")));
        }
        Ok(())
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<UserFeedback>, StoreError> {
        let conn = self.conn()?;
        list_feedback(&conn, "user_id", user_id)
    }

    async fn list_by_suggestion(
        &self,
        suggestion_id: &str,
    ) -> Result<Vec<UserFeedback>, StoreError> {
        let conn = self.conn()?;
        list_feedback(&conn, "suggestion_id", suggestion_id)
    }

    async fn append_log(&self, mut log: SuggestionLog) -> Result<SuggestionLog, StoreError> {
        log.log_id = new_id();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO suggestion_logs
                (log_id, user_id, suggestion_id, feedback_id, date, time_of_day, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                log.log_id,
                log.user_id,
                log.suggestion_id,
                log.feedback_id,
                log.date.to_string(),
                log.time_of_day.as_str(),
                log.created_at.to_rfc3339(),
            ],
        )?;
        Ok(log)
    }

    async fn list_logs(
        &self,
        user_id: &str,
        filter: &HistoryFilter,
    ) -> Result<Vec<SuggestionLog>, StoreError> {
        let mut sql = String::from(
            "SELECT log_id, user_id, suggestion_id, feedback_id, date, time_of_day, created_at
             FROM suggestion_logs WHERE user_id = ?",
        );
        let mut args: Vec<rusqlite::types::Value> = vec![user_id.to_string().into()];
        if let Some(date) = filter.date {
            sql.push_str(" AND date = ?");
            args.push(date.to_string().into());
        }
        if let Some(tod) = filter.time_of_day {
            sql.push_str(" AND time_of_day = ?");
            args.push(tod.as_str().to_string().into());
        }
        sql.push_str(" ORDER BY rowid");

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args), log_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(decode_log(row?)?);
        }
        Ok(out)
    }
}

fn list_feedback(conn: &Connection, column: &str, value: &str) -> Result<Vec<UserFeedback>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT feedback_id, user_id, suggestion_id, feedback_type, comment, timestamp, time_of_day
         FROM user_feedback WHERE {column} = ?1 ORDER BY timestamp, rowid"
    ))?;
    let rows = stmt.query_map(params![value], feedback_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(decode_feedback(row?)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(title: &str, tod: TimeOfDay, priority: u8) -> Suggestion {
        Suggestion::new(
            title,
            "A description long enough",
            "health",
            tod,
            priority,
            vec!["body".into(), "quick".into()],
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn create_and_get_round_trip() {
        let store = SqliteStore::open_memory().unwrap();
        let created = SuggestionStore::create(&store, suggestion("walk", TimeOfDay::Morning, 7))
            .await
            .unwrap();
        let fetched = store.get(&created.suggestion_id).await.unwrap();
        assert_eq!(fetched.title, "walk");
        assert_eq!(fetched.tags, vec!["body".to_string(), "quick".to_string()]);
        assert_eq!(fetched.priority, 7);
        assert!(fetched.is_active);
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = SqliteStore::open_memory().unwrap();
        assert!(matches!(
            store.get("nope").await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn null_counters_increment_from_zero() {
        let store = SqliteStore::open_memory().unwrap();
        let created = SuggestionStore::create(&store, suggestion("walk", TimeOfDay::Morning, 5))
            .await
            .unwrap();
        store
            .conn()
            .unwrap()
            .execute(
                "UPDATE suggestions SET maybe_count = NULL, total_feedback = NULL WHERE suggestion_id = ?1",
                params![created.suggestion_id],
            )
            .unwrap();

        store
            .increment_feedback(&created.suggestion_id, FeedbackType::Maybe, Utc::now())
            .await
            .unwrap();
        let s = store.get(&created.suggestion_id).await.unwrap();
        assert_eq!(s.maybe_count, 1);
        assert_eq!(s.total_feedback, 1);
    }

    #[tokio::test]
    async fn listing_filters_and_orders() {
        let store = SqliteStore::open_memory().unwrap();
        for (title, tod, priority) in [
            ("low", TimeOfDay::Morning, 2),
            ("night", TimeOfDay::Evening, 9),
            ("high", TimeOfDay::Morning, 8),
        ] {
            SuggestionStore::create(&store, suggestion(title, tod, priority))
                .await
                .unwrap();
        }

        let rows = store
            .list(
                &SuggestionQuery::active()
                    .time_of_day(TimeOfDay::Morning)
                    .order_by(SuggestionOrder::Priority),
            )
            .await
            .unwrap();
        let titles: Vec<_> = rows.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["high", "low"]);
    }

    #[tokio::test]
    async fn habits_upsert_cycle() {
        let store = SqliteStore::open_memory().unwrap();
        let created = HabitStore::create(
            &store,
            UserIdealHabits::new("u1", vec!["run".into()], vec!["read".into()], Utc::now()),
        )
        .await
        .unwrap();

        let mut edited = created.clone();
        edited.add_habit("yoga", TimeOfDay::Morning, Utc::now());
        HabitStore::update(&store, &edited).await.unwrap();

        let loaded = store.get_by_user("u1").await.unwrap().unwrap();
        assert_eq!(loaded.morning_habits, vec!["run".to_string(), "yoga".to_string()]);
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.habit_id, created.habit_id);
    }

    #[tokio::test]
    async fn second_habit_record_for_user_conflicts() {
        let store = SqliteStore::open_memory().unwrap();
        HabitStore::create(&store, UserIdealHabits::new("u1", vec![], vec![], Utc::now()))
            .await
            .unwrap();
        let err = HabitStore::create(&store, UserIdealHabits::new("u1", vec![], vec![], Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn history_filters_by_date_and_period() {
        let store = SqliteStore::open_memory().unwrap();
        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        for (user, date, tod, feedback_id) in [
            ("u1", monday, TimeOfDay::Morning, None),
            ("u1", monday, TimeOfDay::Evening, Some("f1")),
            ("u1", tuesday, TimeOfDay::Morning, None),
            ("u2", monday, TimeOfDay::Morning, None),
        ] {
            store
                .append_log(SuggestionLog {
                    log_id: String::new(),
                    user_id: user.into(),
                    suggestion_id: "s1".into(),
                    feedback_id: feedback_id.map(str::to_string),
                    date,
                    time_of_day: tod,
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        assert_eq!(store.list_logs("u1", &HistoryFilter::all()).await.unwrap().len(), 3);
        let on_monday = store
            .list_logs("u1", &HistoryFilter::all().on(monday))
            .await
            .unwrap();
        assert_eq!(on_monday.len(), 2);
        assert_eq!(on_monday[1].feedback_id.as_deref(), Some("f1"));
        assert_eq!(on_monday[1].date, monday);

        let mornings = store
            .list_logs("u1", &HistoryFilter::all().time_of_day(TimeOfDay::Morning))
            .await
            .unwrap();
        assert_eq!(mornings.len(), 2);
        assert!(mornings.iter().all(|l| !l.log_id.is_empty()));
    }

    #[tokio::test]
    async fn feedback_log_lists_by_user_and_suggestion() {
        let store = SqliteStore::open_memory().unwrap();
        for (user, suggestion_id, kind) in [
            ("u1", "s1", FeedbackType::Accept),
            ("u1", "s2", FeedbackType::Reject),
            ("u2", "s1", FeedbackType::Maybe),
        ] {
            store
                .append(UserFeedback {
                    feedback_id: String::new(),
                    user_id: user.into(),
                    suggestion_id: suggestion_id.into(),
                    feedback_type: kind,
                    comment: None,
                    timestamp: Utc::now(),
                    time_of_day: TimeOfDay::Morning,
                })
                .await
                .unwrap();
        }

        assert_eq!(store.list_by_user("u1").await.unwrap().len(), 2);
        let for_s1 = store.list_by_suggestion("s1").await.unwrap();
        assert_eq!(for_s1.len(), 2);
        assert!(for_s1.iter().all(|f| !f.feedback_id.is_empty()));

        let mut edited = for_s1[0].clone();
        edited.comment = Some("tried it".into());
        let updated = store.update_feedback(&edited).await.unwrap();
        assert_eq!(updated.comment.as_deref(), Some("tried it"));
        assert_eq!(updated.feedback_type, for_s1[0].feedback_type);

        store.delete_feedback(&edited.feedback_id).await.unwrap();
        assert_eq!(store.list_by_suggestion("s1").await.unwrap().len(), 1);
        assert!(matches!(
            store.delete_feedback(&edited.feedback_id).await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }
}
