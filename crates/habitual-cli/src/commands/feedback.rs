use chrono::NaiveDate;
use clap::Subcommand;
use habitual_core::{FeedbackType, HistoryFilter, TimeOfDay};

use super::{print_response, AppContext, CommandResult};

#[derive(Subcommand)]
pub enum FeedbackAction {
    /// React to a suggestion (accept, maybe, reject)
    Submit {
        suggestion_id: String,
        feedback_type: FeedbackType,
        #[arg(long)]
        comment: Option<String>,
        #[arg(long)]
        user: Option<String>,
    },
    /// Bump a suggestion's counter without recording history
    Count {
        suggestion_id: String,
        feedback_type: FeedbackType,
    },
    /// Feedback rates for a user
    Stats {
        #[arg(long)]
        user: Option<String>,
    },
    /// Replace the comment on a feedback entry (omit --comment to clear it)
    Edit {
        feedback_id: String,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Delete a feedback entry
    Remove { feedback_id: String },
    /// Suggestions served to and answered by a user
    History {
        /// Only entries from this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        time_of_day: Option<TimeOfDay>,
        #[arg(long)]
        user: Option<String>,
    },
}

pub async fn run(action: FeedbackAction, ctx: &AppContext) -> CommandResult {
    let orchestrator = ctx.orchestrator()?;

    match action {
        FeedbackAction::Submit {
            suggestion_id,
            feedback_type,
            comment,
            user,
        } => print_response(
            orchestrator
                .submit_feedback(&ctx.user_id(user), &suggestion_id, feedback_type, comment)
                .await,
        ),
        FeedbackAction::Count {
            suggestion_id,
            feedback_type,
        } => print_response(
            orchestrator
                .record_feedback(&suggestion_id, feedback_type)
                .await,
        ),
        FeedbackAction::Stats { user } => {
            print_response(orchestrator.feedback_statistics(&ctx.user_id(user)).await)
        }
        FeedbackAction::Edit {
            feedback_id,
            comment,
        } => print_response(
            orchestrator
                .update_feedback_comment(&feedback_id, comment)
                .await,
        ),
        FeedbackAction::Remove { feedback_id } => {
            print_response(orchestrator.delete_feedback(&feedback_id).await)
        }
        FeedbackAction::History {
            date,
            time_of_day,
            user,
        } => {
            let filter = HistoryFilter { date, time_of_day };
            print_response(
                orchestrator
                    .suggestion_history(&ctx.user_id(user), filter)
                    .await,
            )
        }
    }
}
