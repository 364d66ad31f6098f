use crate::prompt::ChatMessage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Model used for every completion call, including credential validation.
pub const COMPLETION_MODEL: &str = "gpt-3.5-turbo-0125";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Failures of a single completion round trip.
///
/// `Provider` covers the network and the API itself; `MalformedResponse`
/// covers replies that arrived but cannot be used. Neither is retried.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Completion request failed: {0}")]
    Provider(String),

    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),
}

/// The `{command, explanation}` pair parsed from the model's JSON reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSuggestion {
    pub command: String,
    pub explanation: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Thin client over the chat-completions endpoint.
pub struct CompletionClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl CompletionClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }

    /// Sends one request for the given message sequence and parses the reply
    /// into a [`CommandSuggestion`].
    ///
    /// The reply body is constrained to a JSON object via `response_format`;
    /// a reply that still fails to parse, or that lacks a non-empty `command`
    /// or `explanation`, is a [`CompletionError::MalformedResponse`].
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
    ) -> Result<CommandSuggestion, CompletionError> {
        let request = ChatRequest {
            model: COMPLETION_MODEL,
            messages,
            response_format: Some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let content = self.send(&request).await?;
        let content = content.ok_or_else(|| {
            CompletionError::MalformedResponse("Missing content on response".to_string())
        })?;

        let suggestion: CommandSuggestion = serde_json::from_str(&content).map_err(|e| {
            CompletionError::MalformedResponse(format!("Reply was not a valid JSON object: {e}"))
        })?;

        if suggestion.command.trim().is_empty() || suggestion.explanation.trim().is_empty() {
            return Err(CompletionError::MalformedResponse(
                "Reply is missing a command or explanation".to_string(),
            ));
        }

        Ok(suggestion)
    }

    /// Minimal round trip used to validate a candidate API key.
    pub async fn ping(&self) -> Result<(), CompletionError> {
        let messages = [ChatMessage::user("Respond with pong. Ping")];
        let request = ChatRequest {
            model: COMPLETION_MODEL,
            messages: &messages,
            response_format: None,
        };

        self.send(&request).await.map(|_| ())
    }

    async fn send(&self, request: &ChatRequest<'_>) -> Result<Option<String>, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| CompletionError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CompletionError::Provider(format!(
                "Completion request failed with status: {} - {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            CompletionError::MalformedResponse(format!("Failed to parse completion response: {e}"))
        })?;

        Ok(body.choices.into_iter().next().and_then(|c| c.message.content))
    }
}
