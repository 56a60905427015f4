//! OpenAI-compatible chat completions backend.
//!
//! Any server exposing `POST {base_url}/chat/completions` with the OpenAI
//! request shape works, so `base_url` can point at a local proxy.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::CompletionClient;
use crate::credentials;
use crate::error::GenerationError;
use crate::storage::GeneratorConfig;

pub struct OpenAiClient {
    http_client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    /// # Errors
    /// Returns `InvalidEndpoint` if `base_url` does not form a valid URL.
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, GenerationError> {
        let endpoint = Url::parse(&format!(
            "{}/chat/completions",
            base_url.trim_end_matches('/')
        ))?;
        Ok(Self {
            http_client: Client::new(),
            endpoint,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Client for the configured endpoint and model, with the key taken
    /// from `OPENAI_API_KEY` or the keyring.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, GenerationError> {
        let api_key = credentials::openai_api_key()?;
        Self::new(&config.base_url, config.model.clone(), api_key)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageResponse,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Option<String>,
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens,
            temperature,
        };

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "completion request rejected");
            return Err(GenerationError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let client = OpenAiClient::new("https://api.example.com/v1/", "m", "k").unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            OpenAiClient::new("not a url", "m", "k"),
            Err(GenerationError::InvalidEndpoint(_))
        ));
    }

    #[tokio::test]
    async fn sends_chat_request_and_returns_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 500,
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "hello" }
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [
                        { "message": { "role": "assistant", "content": "{\"title\":\"x\"}" } }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client =
            OpenAiClient::new(&format!("{}/v1", server.url()), "gpt-3.5-turbo", "sk-test")
                .unwrap();
        let content = client.complete("sys", "hello", 500, 0.7).await.unwrap();
        assert_eq!(content, "{\"title\":\"x\"}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn http_error_carries_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;

        let client = OpenAiClient::new(&server.url(), "m", "k").unwrap();
        let err = client.complete("s", "u", 10, 0.0).await.unwrap_err();
        match err {
            GenerationError::Http { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "slow down");
            }
            other => panic!("expected HTTP error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_content_is_empty_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let client = OpenAiClient::new(&server.url(), "m", "k").unwrap();
        assert!(matches!(
            client.complete("s", "u", 10, 0.0).await,
            Err(GenerationError::EmptyResponse)
        ));
    }
}
