use clap::Subcommand;
use habitual_core::TimeOfDay;

use super::{print_response, AppContext, CommandResult};

#[derive(Subcommand)]
pub enum HabitsAction {
    /// Show the user's habits
    Show {
        #[arg(long)]
        user: Option<String>,
    },
    /// Replace both habit lists
    Set {
        #[arg(long)]
        user: Option<String>,
        /// Morning habit (repeatable)
        #[arg(long = "morning")]
        morning: Vec<String>,
        /// Evening habit (repeatable)
        #[arg(long = "evening")]
        evening: Vec<String>,
    },
    /// Add one habit
    Add {
        /// "morning" or "evening"
        time_of_day: TimeOfDay,
        habit: String,
        #[arg(long)]
        user: Option<String>,
    },
    /// Remove a habit
    Remove {
        time_of_day: TimeOfDay,
        habit: String,
        #[arg(long)]
        user: Option<String>,
    },
    /// Replace the list for one time of day
    Replace {
        time_of_day: TimeOfDay,
        habits: Vec<String>,
        #[arg(long)]
        user: Option<String>,
    },
    /// Check whether a habit is present
    Exists {
        time_of_day: TimeOfDay,
        habit: String,
        #[arg(long)]
        user: Option<String>,
    },
    /// Delete the user's habit record
    Delete {
        #[arg(long)]
        user: Option<String>,
    },
}

pub async fn run(action: HabitsAction, ctx: &AppContext) -> CommandResult {
    let service = ctx.habit_service();

    match action {
        HabitsAction::Show { user } => print_response(service.get_habits(&ctx.user_id(user)).await),
        HabitsAction::Set {
            user,
            morning,
            evening,
        } => print_response(
            service
                .save_habits(&ctx.user_id(user), morning, evening)
                .await,
        ),
        HabitsAction::Add {
            time_of_day,
            habit,
            user,
        } => print_response(
            service
                .add_habit(&ctx.user_id(user), &habit, time_of_day)
                .await,
        ),
        HabitsAction::Remove {
            time_of_day,
            habit,
            user,
        } => print_response(
            service
                .remove_habit(&ctx.user_id(user), &habit, time_of_day)
                .await,
        ),
        HabitsAction::Replace {
            time_of_day,
            habits,
            user,
        } => print_response(
            service
                .update_habits(&ctx.user_id(user), time_of_day, habits)
                .await,
        ),
        HabitsAction::Exists {
            time_of_day,
            habit,
            user,
        } => print_response(
            service
                .habit_exists(&ctx.user_id(user), &habit, time_of_day)
                .await,
        ),
        HabitsAction::Delete { user } => {
            print_response(service.delete_habits(&ctx.user_id(user)).await)
        }
    }
}
