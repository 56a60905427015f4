pub mod auth;
pub mod config;
pub mod feedback;
pub mod habits;
pub mod suggest;

use async_trait::async_trait;
use habitual_core::storage::{FeedbackLog, HabitStore, SuggestionStore};
use habitual_core::{
    ApiResponse, CompletionClient, Config, GenerationError, HabitService, MemoryStore,
    OpenAiClient, SqliteStore, SuggestionGenerator, SuggestionOrchestrator, SystemClock,
};
use serde::Serialize;
use std::sync::Arc;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Stands in for the OpenAI client when no key is configured, so commands
/// that never generate still work.
struct MissingKeyClient;

#[async_trait]
impl CompletionClient for MissingKeyClient {
    async fn complete(
        &self,
        _system: &str,
        _user: &str,
        _max_tokens: u32,
        _temperature: f32,
    ) -> Result<String, GenerationError> {
        Err(GenerationError::MissingCredentials {
            service: "openai".to_string(),
        })
    }
}

/// Everything a command needs, resolved once per invocation.
pub struct AppContext {
    pub config: Config,
    suggestions: Arc<dyn SuggestionStore>,
    habits: Arc<dyn HabitStore>,
    feedback: Arc<dyn FeedbackLog>,
}

impl AppContext {
    /// Load config and open the store (`--memory` skips the database file).
    pub fn open(memory: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        if memory {
            let store = Arc::new(MemoryStore::new());
            return Ok(Self {
                config,
                suggestions: store.clone(),
                habits: store.clone(),
                feedback: store,
            });
        }

        let store = Arc::new(SqliteStore::open()?);
        Ok(Self {
            config,
            suggestions: store.clone(),
            habits: store.clone(),
            feedback: store,
        })
    }

    /// `--user` if given, otherwise the configured user id.
    pub fn user_id(&self, user: Option<String>) -> String {
        user.unwrap_or_else(|| self.config.user.user_id.clone())
    }

    pub fn habit_service(&self) -> HabitService {
        HabitService::new(self.habits.clone(), Arc::new(SystemClock))
    }

    pub fn orchestrator(&self) -> Result<SuggestionOrchestrator, Box<dyn std::error::Error>> {
        let client: Arc<dyn CompletionClient> =
            match OpenAiClient::from_config(&self.config.generator) {
                Ok(client) => Arc::new(client),
                Err(e @ GenerationError::MissingCredentials { .. }) => {
                    tracing::debug!(error = %e, "no API key, generation disabled");
                    Arc::new(MissingKeyClient)
                }
                Err(e) => return Err(e.into()),
            };
        let generator = SuggestionGenerator::from_config(client, &self.config.generator);

        Ok(SuggestionOrchestrator::new(
            self.suggestions.clone(),
            self.habits.clone(),
            self.feedback.clone(),
            generator,
            Arc::new(SystemClock),
        ))
    }
}

/// Print the payload as pretty JSON, or turn a failed envelope into an error.
pub fn print_response<T: Serialize>(response: ApiResponse<T>) -> CommandResult {
    let data = response.into_result()?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}
