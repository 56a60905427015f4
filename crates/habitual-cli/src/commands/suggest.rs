use clap::Subcommand;
use habitual_core::{SuggestionGenerator, TimeOfDay};

use super::{print_response, AppContext, CommandResult};

#[derive(Subcommand)]
pub enum SuggestAction {
    /// Serve a stored suggestion, generating one if none match
    Get {
        /// Defaults to the current time of day
        #[arg(long)]
        time_of_day: Option<TimeOfDay>,
        #[arg(long)]
        user: Option<String>,
    },
    /// Always generate, guided by preferences
    Personalized {
        time_of_day: TimeOfDay,
        /// Preference keyword (repeatable)
        #[arg(long = "prefer")]
        preferences: Vec<String>,
        #[arg(long)]
        user: Option<String>,
    },
    /// Generate and store several suggestions
    Batch {
        time_of_day: TimeOfDay,
        #[arg(long, default_value_t = SuggestionGenerator::DEFAULT_BATCH)]
        count: usize,
        #[arg(long)]
        user: Option<String>,
    },
    /// Show one suggestion
    Show { id: String },
    /// List active suggestions, optionally by time of day or category
    List {
        #[arg(long, conflicts_with = "category")]
        time_of_day: Option<TimeOfDay>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Suggestions with the most feedback
    Top {
        /// Defaults to suggestions.high_acceptance_limit
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Stop serving a suggestion
    Deactivate { id: String },
    /// Delete a suggestion
    Delete { id: String },
}

pub async fn run(action: SuggestAction, ctx: &AppContext) -> CommandResult {
    let orchestrator = ctx.orchestrator()?;

    match action {
        SuggestAction::Get { time_of_day, user } => print_response(
            orchestrator
                .get_or_create_suggestion(&ctx.user_id(user), time_of_day)
                .await,
        ),
        SuggestAction::Personalized {
            time_of_day,
            preferences,
            user,
        } => print_response(
            orchestrator
                .get_personalized_suggestion(&ctx.user_id(user), time_of_day, &preferences)
                .await,
        ),
        SuggestAction::Batch {
            time_of_day,
            count,
            user,
        } => print_response(
            orchestrator
                .generate_suggestions(&ctx.user_id(user), time_of_day, count)
                .await,
        ),
        SuggestAction::Show { id } => print_response(orchestrator.get_suggestion(&id).await),
        SuggestAction::List {
            time_of_day,
            category,
        } => match (time_of_day, category) {
            (_, Some(category)) => print_response(orchestrator.list_by_category(&category).await),
            (Some(tod), None) => print_response(orchestrator.list_by_time_of_day(tod).await),
            (None, None) => print_response(orchestrator.list_active().await),
        },
        SuggestAction::Top { limit } => {
            let limit = limit.unwrap_or(ctx.config.suggestions.high_acceptance_limit);
            print_response(orchestrator.list_high_acceptance(limit).await)
        }
        SuggestAction::Deactivate { id } => {
            print_response(orchestrator.deactivate_suggestion(&id).await)
        }
        SuggestAction::Delete { id } => print_response(orchestrator.delete_suggestion(&id).await),
    }
}
