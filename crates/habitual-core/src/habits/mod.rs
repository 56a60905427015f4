//! A user's ideal morning and evening habits.

mod service;

pub use service::HabitService;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time_of_day::TimeOfDay;

/// The single habit record kept per user.
///
/// `version` starts at 1 and is bumped by every mutation. It is an
/// optimistic marker only; conflicting writers are not rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdealHabits {
    /// Store-assigned id; empty until persisted.
    #[serde(default)]
    pub habit_id: String,
    pub user_id: String,
    #[serde(default)]
    pub morning_habits: Vec<String>,
    #[serde(default)]
    pub evening_habits: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "default_version")]
    pub version: u64,
}

fn default_version() -> u64 {
    1
}

impl UserIdealHabits {
    /// A new, unsaved record at version 1.
    pub fn new(
        user_id: impl Into<String>,
        morning_habits: Vec<String>,
        evening_habits: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            habit_id: String::new(),
            user_id: user_id.into(),
            morning_habits: normalize_habits(morning_habits),
            evening_habits: normalize_habits(evening_habits),
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    pub fn habits_for(&self, time_of_day: TimeOfDay) -> &[String] {
        match time_of_day {
            TimeOfDay::Morning => &self.morning_habits,
            TimeOfDay::Evening => &self.evening_habits,
        }
    }

    fn habits_for_mut(&mut self, time_of_day: TimeOfDay) -> &mut Vec<String> {
        match time_of_day {
            TimeOfDay::Morning => &mut self.morning_habits,
            TimeOfDay::Evening => &mut self.evening_habits,
        }
    }

    pub fn contains(&self, habit: &str, time_of_day: TimeOfDay) -> bool {
        self.habits_for(time_of_day).iter().any(|h| h == habit)
    }

    /// Append `habit` to the list for `time_of_day`.
    ///
    /// Returns `false` and leaves the record untouched when the habit is
    /// already present.
    pub fn add_habit(&mut self, habit: &str, time_of_day: TimeOfDay, now: DateTime<Utc>) -> bool {
        if self.contains(habit, time_of_day) {
            return false;
        }
        self.habits_for_mut(time_of_day).push(habit.to_string());
        self.touch(now);
        true
    }

    /// Remove every occurrence of `habit`. Bumps the version even when
    /// nothing matched.
    pub fn remove_habit(&mut self, habit: &str, time_of_day: TimeOfDay, now: DateTime<Utc>) {
        self.habits_for_mut(time_of_day).retain(|h| h != habit);
        self.touch(now);
    }

    /// Replace the list for one period.
    pub fn replace_habits(&mut self, time_of_day: TimeOfDay, habits: Vec<String>, now: DateTime<Utc>) {
        *self.habits_for_mut(time_of_day) = normalize_habits(habits);
        self.touch(now);
    }

    /// Replace both lists at once.
    pub fn replace_all(&mut self, morning: Vec<String>, evening: Vec<String>, now: DateTime<Utc>) {
        self.morning_habits = normalize_habits(morning);
        self.evening_habits = normalize_habits(evening);
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.version += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.morning_habits.is_empty() && self.evening_habits.is_empty()
    }

    pub fn morning_habits_count(&self) -> usize {
        self.morning_habits.len()
    }

    pub fn evening_habits_count(&self) -> usize {
        self.evening_habits.len()
    }

    pub fn total_habits_count(&self) -> usize {
        self.morning_habits_count() + self.evening_habits_count()
    }
}

/// Trim entries, drop empty ones and keep the first of any duplicates.
pub fn normalize_habits(habits: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(habits.len());
    for habit in habits {
        let trimmed = habit.trim();
        if trimmed.is_empty() || out.iter().any(|h| h == trimmed) {
            continue;
        }
        out.push(trimmed.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn habits() -> UserIdealHabits {
        UserIdealHabits::new(
            "user-1",
            vec!["stretch".into(), "drink water".into()],
            vec!["read".into()],
            Utc::now(),
        )
    }

    #[test]
    fn new_record_starts_at_version_one() {
        let h = habits();
        assert_eq!(h.version, 1);
        assert_eq!(h.created_at, h.updated_at);
        assert_eq!(h.total_habits_count(), 3);
    }

    #[test]
    fn normalize_drops_blank_and_duplicate_entries() {
        let out = normalize_habits(vec![
            " run ".into(),
            "".into(),
            "run".into(),
            "yoga".into(),
            "   ".into(),
        ]);
        assert_eq!(out, vec!["run".to_string(), "yoga".to_string()]);
    }

    #[test]
    fn add_habit_rejects_duplicate_without_bumping_version() {
        let mut h = habits();
        let now = Utc::now();
        assert!(h.add_habit("run", TimeOfDay::Morning, now));
        assert_eq!(h.version, 2);
        assert!(!h.add_habit("run", TimeOfDay::Morning, now));
        assert_eq!(h.version, 2);
        assert_eq!(h.morning_habits_count(), 3);
    }

    #[test]
    fn remove_missing_habit_still_bumps_version() {
        let mut h = habits();
        h.remove_habit("swim", TimeOfDay::Evening, Utc::now());
        assert_eq!(h.evening_habits, vec!["read".to_string()]);
        assert_eq!(h.version, 2);
    }

    #[test]
    fn remove_drops_every_occurrence() {
        let mut h = habits();
        h.evening_habits.push("read".into());
        h.remove_habit("read", TimeOfDay::Evening, Utc::now());
        assert!(h.evening_habits.is_empty());
    }

    #[test]
    fn replace_keeps_created_at() {
        let mut h = habits();
        let created = h.created_at;
        let later = created + chrono::Duration::hours(1);
        h.replace_habits(TimeOfDay::Morning, vec!["walk".into()], later);
        assert_eq!(h.morning_habits, vec!["walk".to_string()]);
        assert_eq!(h.created_at, created);
        assert_eq!(h.updated_at, later);
        assert_eq!(h.version, 2);
    }
}
