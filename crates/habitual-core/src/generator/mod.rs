//! Suggestion generation through a chat-completion backend.
//!
//! [`SuggestionGenerator`] builds the prompt, calls a [`CompletionClient`]
//! and turns the reply into a [`GeneratedSuggestion`]. Transport failures
//! are returned as [`GenerationError`]; unusable replies become the fallback
//! suggestion instead.

pub mod openai;
mod parse;
mod prompt;

pub use openai::OpenAiClient;
pub use parse::{
    extract_json_payload, fallback_suggestion, parse_suggestion_response, try_parse_suggestion,
    validate_payload, ParseFailure,
};
pub use prompt::{build_prompt, preferences_context, NO_HABITS_PLACEHOLDER, SYSTEM_PROMPT};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::GenerationError;
use crate::storage::GeneratorConfig;
use crate::time_of_day::TimeOfDay;

/// Validated generator output, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedSuggestion {
    pub title: String,
    pub description: String,
    pub category: String,
    pub time_of_day: TimeOfDay,
    pub priority: u8,
    pub tags: Vec<String>,
}

/// A chat-completion backend: one system and one user message in, text out.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerationError>;
}

pub struct SuggestionGenerator {
    client: Arc<dyn CompletionClient>,
    max_tokens: u32,
    temperature: f32,
}

impl SuggestionGenerator {
    pub const DEFAULT_MAX_TOKENS: u32 = 500;
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;
    pub const DEFAULT_BATCH: usize = 3;

    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            temperature: Self::DEFAULT_TEMPERATURE,
        }
    }

    /// Generator with sampling settings taken from config.
    pub fn from_config(client: Arc<dyn CompletionClient>, config: &GeneratorConfig) -> Self {
        Self::new(client)
            .with_max_tokens(config.max_tokens)
            .with_temperature(config.temperature)
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Ask the backend for one suggestion.
    ///
    /// # Errors
    /// Only transport failures are returned. A reply that does not parse or
    /// validate yields the fallback suggestion.
    pub async fn generate(
        &self,
        habits: &[String],
        time_of_day: TimeOfDay,
        context: Option<&str>,
    ) -> Result<GeneratedSuggestion, GenerationError> {
        let prompt = build_prompt(habits, time_of_day, context);
        tracing::debug!(
            %time_of_day,
            habits = habits.len(),
            has_context = context.is_some(),
            "requesting suggestion"
        );

        let content = self
            .client
            .complete(SYSTEM_PROMPT, &prompt, self.max_tokens, self.temperature)
            .await?;
        Ok(parse_suggestion_response(&content, time_of_day))
    }

    /// Generate with the user's preferences as context.
    pub async fn generate_personalized(
        &self,
        habits: &[String],
        time_of_day: TimeOfDay,
        preferences: &[String],
    ) -> Result<GeneratedSuggestion, GenerationError> {
        let context = preferences_context(preferences);
        self.generate(habits, time_of_day, context.as_deref()).await
    }

    /// Run `count` generations one after another, keeping the ones that
    /// succeeded. Failed attempts are logged and skipped.
    pub async fn generate_multiple(
        &self,
        habits: &[String],
        time_of_day: TimeOfDay,
        count: usize,
    ) -> Vec<GeneratedSuggestion> {
        let mut generated = Vec::with_capacity(count);
        for attempt in 0..count {
            match self.generate(habits, time_of_day, None).await {
                Ok(suggestion) => generated.push(suggestion),
                Err(e) => tracing::warn!(attempt, error = %e, "suggestion generation failed"),
            }
        }
        generated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays canned replies and records every prompt it was sent.
    struct ScriptedClient {
        replies: Mutex<Vec<Result<String, GenerationError>>>,
        prompts: Mutex<Vec<(String, u32, f32)>>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<Result<String, GenerationError>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(
            &self,
            _system: &str,
            user: &str,
            max_tokens: u32,
            temperature: f32,
        ) -> Result<String, GenerationError> {
            self.prompts
                .lock()
                .unwrap()
                .push((user.to_string(), max_tokens, temperature));
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                return Err(GenerationError::EmptyResponse);
            }
            replies.remove(0)
        }
    }

    const REPLY: &str = r#"{"title":"夜のストレッチ","description":"寝る前に10分間ゆっくり体を伸ばしましょう","category":"健康","priority":6,"tags":["睡眠","ストレッチ"]}"#;

    #[tokio::test]
    async fn generate_parses_reply_and_stamps_time_of_day() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(REPLY.to_string())]));
        let generator = SuggestionGenerator::new(client.clone());

        let s = generator
            .generate(&["読書".to_string()], TimeOfDay::Evening, None)
            .await
            .unwrap();
        assert_eq!(s.title, "夜のストレッチ");
        assert_eq!(s.time_of_day, TimeOfDay::Evening);

        let prompts = client.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].0.contains("読書"));
        assert_eq!(prompts[0].1, 500);
        assert!((prompts[0].2 - 0.7).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn garbage_reply_yields_fallback() {
        let client = Arc::new(ScriptedClient::new(vec![Ok("I cannot help".to_string())]));
        let generator = SuggestionGenerator::new(client);
        let s = generator.generate(&[], TimeOfDay::Morning, None).await.unwrap();
        assert_eq!(s, fallback_suggestion(TimeOfDay::Morning));
    }

    #[tokio::test]
    async fn transport_failure_is_returned() {
        let client = Arc::new(ScriptedClient::new(vec![Err(GenerationError::Http {
            status: 500,
            body: "boom".into(),
        })]));
        let generator = SuggestionGenerator::new(client);
        let err = generator
            .generate(&[], TimeOfDay::Morning, None)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Http { status: 500, .. }));
    }

    #[tokio::test]
    async fn personalized_generation_sends_preferences() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(REPLY.to_string())]));
        let generator = SuggestionGenerator::new(client.clone());
        generator
            .generate_personalized(&[], TimeOfDay::Evening, &["瞑想".to_string()])
            .await
            .unwrap();
        let prompts = client.prompts.lock().unwrap();
        assert!(prompts[0].0.contains("現在の状況: ユーザーの好み: 瞑想"));
    }

    #[tokio::test]
    async fn generate_multiple_keeps_only_successes() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(REPLY.to_string()),
            Err(GenerationError::EmptyResponse),
            Ok(REPLY.to_string()),
        ]));
        let generator = SuggestionGenerator::new(client);
        let batch = generator
            .generate_multiple(&[], TimeOfDay::Evening, SuggestionGenerator::DEFAULT_BATCH)
            .await;
        assert_eq!(batch.len(), 2);
    }

    #[tokio::test]
    async fn config_overrides_sampling() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(REPLY.to_string())]));
        let config = GeneratorConfig {
            max_tokens: 256,
            temperature: 0.1,
            ..GeneratorConfig::default()
        };
        let generator = SuggestionGenerator::from_config(client.clone(), &config);
        generator.generate(&[], TimeOfDay::Morning, None).await.unwrap();
        let prompts = client.prompts.lock().unwrap();
        assert_eq!(prompts[0].1, 256);
        assert!((prompts[0].2 - 0.1).abs() < 1e-6);
    }
}
