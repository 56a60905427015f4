//! Habit CRUD over a [`HabitStore`], reported through [`ApiResponse`].

use std::sync::Arc;

use super::{normalize_habits, UserIdealHabits};
use crate::error::{CoreError, Result};
use crate::response::ApiResponse;
use crate::storage::HabitStore;
use crate::time_of_day::{Clock, TimeOfDay};

pub struct HabitService {
    store: Arc<dyn HabitStore>,
    clock: Arc<dyn Clock>,
}

impl HabitService {
    pub fn new(store: Arc<dyn HabitStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now().with_timezone(&chrono::Utc)
    }

    async fn load(&self, user_id: &str) -> Result<UserIdealHabits> {
        self.store
            .get_by_user(user_id)
            .await?
            .ok_or_else(CoreError::habits_not_found)
    }

    /// Create or replace both habit lists for a user.
    pub async fn save_habits(
        &self,
        user_id: &str,
        morning_habits: Vec<String>,
        evening_habits: Vec<String>,
    ) -> ApiResponse<UserIdealHabits> {
        let result: Result<UserIdealHabits> = async {
            let now = self.now();
            match self.store.get_by_user(user_id).await? {
                Some(mut existing) => {
                    existing.replace_all(morning_habits, evening_habits, now);
                    let saved = self.store.update(&existing).await?;
                    tracing::info!(user_id, version = saved.version, "habits replaced");
                    Ok(saved)
                }
                None => {
                    let fresh = UserIdealHabits::new(user_id, morning_habits, evening_habits, now);
                    let saved = self.store.create(fresh).await?;
                    tracing::info!(user_id, "habits created");
                    Ok(saved)
                }
            }
        }
        .await;
        ApiResponse::from_result(result, "Failed to save habits")
    }

    pub async fn get_habits(&self, user_id: &str) -> ApiResponse<UserIdealHabits> {
        ApiResponse::from_result(self.load(user_id).await, "Failed to get habits")
    }

    /// Append one habit. Fails with `Habit already exists` on duplicates.
    pub async fn add_habit(
        &self,
        user_id: &str,
        habit: &str,
        time_of_day: TimeOfDay,
    ) -> ApiResponse<UserIdealHabits> {
        let result: Result<UserIdealHabits> = async {
            let habit = validated_habit(habit)?;
            let mut habits = self.load(user_id).await?;
            if !habits.add_habit(&habit, time_of_day, self.now()) {
                return Err(CoreError::duplicate_habit());
            }
            Ok(self.store.update(&habits).await?)
        }
        .await;
        ApiResponse::from_result(result, "Failed to add habit")
    }

    /// Remove every occurrence of a habit; succeeds even if it was absent.
    pub async fn remove_habit(
        &self,
        user_id: &str,
        habit: &str,
        time_of_day: TimeOfDay,
    ) -> ApiResponse<UserIdealHabits> {
        let result: Result<UserIdealHabits> = async {
            let mut habits = self.load(user_id).await?;
            habits.remove_habit(habit.trim(), time_of_day, self.now());
            Ok(self.store.update(&habits).await?)
        }
        .await;
        ApiResponse::from_result(result, "Failed to remove habit")
    }

    /// Replace the list for one time of day.
    pub async fn update_habits(
        &self,
        user_id: &str,
        time_of_day: TimeOfDay,
        habits: Vec<String>,
    ) -> ApiResponse<UserIdealHabits> {
        let result: Result<UserIdealHabits> = async {
            let mut record = self.load(user_id).await?;
            record.replace_habits(time_of_day, habits, self.now());
            Ok(self.store.update(&record).await?)
        }
        .await;
        ApiResponse::from_result(result, "Failed to update habits")
    }

    pub async fn habit_exists(
        &self,
        user_id: &str,
        habit: &str,
        time_of_day: TimeOfDay,
    ) -> ApiResponse<bool> {
        let result = self
            .load(user_id)
            .await
            .map(|h| h.contains(habit.trim(), time_of_day));
        ApiResponse::from_result(result, "Failed to check habit")
    }

    pub async fn delete_habits(&self, user_id: &str) -> ApiResponse<bool> {
        let result: Result<bool> = async {
            self.load(user_id).await?;
            self.store.delete_by_user(user_id).await?;
            tracing::info!(user_id, "habits deleted");
            Ok(true)
        }
        .await;
        ApiResponse::from_result(result, "Failed to delete habits")
    }
}

fn validated_habit(habit: &str) -> Result<String> {
    normalize_habits(vec![habit.to_string()])
        .into_iter()
        .next()
        .ok_or_else(|| crate::error::ValidationError::Empty("habit".to_string()).into())
}
