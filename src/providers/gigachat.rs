//! GigaChat completion provider
//!
//! Posts OpenAI-compatible chat-completion requests to the configured endpoint.
//! The endpoint URL is used verbatim (it already includes `/chat/completions`).
//! There is no retry loop: one request per call, failures are mapped to
//! `CompletionRequestError` and returned to the relay.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::providers::{CompletionRequestError, LlmMessage, LlmProvider, LlmResponse};

/// Completion request body
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    /// Model to use for completion
    model: &'a str,
    /// System prompt and conversation turns
    messages: Vec<LlmMessage>,
}

/// Completion response body
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    /// Response choices, only the first one is used
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    /// Token usage information
    usage: Option<CompletionUsage>,
    /// Error information if the request failed at API level
    error: Option<CompletionApiError>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionApiError {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<serde_json::Value>,
}

/// Chat-completion provider for GigaChat and other OpenAI-compatible endpoints
#[derive(Debug, Clone)]
pub struct GigaChatProvider {
    /// Full URL of the completions endpoint
    completion_url: String,
    /// Model name sent with every request
    model: String,
    /// Configured timeout, reported in timeout errors
    timeout_seconds: Option<u64>,
    /// HTTP client for making requests
    client: Client,
}

impl GigaChatProvider {
    /// Creates a new provider
    ///
    /// # Arguments
    ///
    /// * `completion_url` - Full completions URL
    /// * `model` - Model name, e.g. "GigaChat"
    /// * `timeout_seconds` - Optional per-request timeout; `None` waits indefinitely
    pub fn new(
        completion_url: impl Into<String>,
        model: impl Into<String>,
        timeout_seconds: Option<u64>,
    ) -> Result<Self, CompletionRequestError> {
        let mut builder = Client::builder();
        if let Some(secs) = timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| {
            CompletionRequestError::config(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            completion_url: completion_url.into(),
            model: model.into(),
            timeout_seconds,
            client,
        })
    }

    /// Returns the completions URL
    pub fn completion_url(&self) -> &str {
        &self.completion_url
    }

    fn build_request(&self, messages: Vec<LlmMessage>) -> CompletionRequest<'_> {
        CompletionRequest {
            model: &self.model,
            messages,
        }
    }

    /// Extracts `choices[0].message.content` from a successful response
    fn parse_response(
        &self,
        response: CompletionResponse,
    ) -> Result<LlmResponse, CompletionRequestError> {
        if let Some(error) = response.error {
            let code = error
                .code
                .map(|c| match c {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
                .or(error.error_type);
            return Err(CompletionRequestError::provider(error.message, code));
        }

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            CompletionRequestError::provider("No response choices returned", None::<&str>)
        })?;

        let content = choice.message.content.ok_or_else(|| {
            CompletionRequestError::serialization("First choice has no message content")
        })?;

        let mut llm_response = LlmResponse::new(content);
        if let Some(usage) = response.usage {
            llm_response = llm_response.with_tokens(usage.prompt_tokens, usage.completion_tokens);
        }

        Ok(llm_response)
    }

    async fn send(
        &self,
        request: &CompletionRequest<'_>,
        bearer_token: &str,
    ) -> Result<CompletionResponse, CompletionRequestError> {
        debug!(url = %self.completion_url, "Making completion request");

        let resp = self
            .client
            .post(&self.completion_url)
            .bearer_auth(bearer_token)
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Completion request failed");
                if e.is_timeout() {
                    CompletionRequestError::timeout(self.timeout_seconds.unwrap_or_default())
                } else if e.is_connect() {
                    CompletionRequestError::network(format!("Connection failed: {}", e))
                } else {
                    CompletionRequestError::network(format!("Request failed: {}", e))
                }
            })?;

        let status = resp.status();
        debug!(status = %status, "Received completion response");

        if status.is_success() {
            return resp.json::<CompletionResponse>().await.map_err(|e| {
                CompletionRequestError::serialization(format!("Failed to parse response: {}", e))
            });
        }

        let error_text = resp.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CompletionRequestError::auth(
                format!("Authentication failed ({}): {}", status, error_text),
            ),
            status if status.is_client_error() => CompletionRequestError::invalid_request(
                format!("Client error ({}): {}", status, error_text),
            ),
            status if status.is_server_error() => CompletionRequestError::provider(
                format!("Server error ({}): {}", status, error_text),
                Some(status.as_u16().to_string()),
            ),
            _ => CompletionRequestError::provider(
                format!("Unexpected status ({}): {}", status, error_text),
                Some(status.as_u16().to_string()),
            ),
        })
    }
}

#[async_trait::async_trait]
impl LlmProvider for GigaChatProvider {
    async fn chat(
        &self,
        messages: Vec<LlmMessage>,
        bearer_token: &str,
    ) -> Result<LlmResponse, CompletionRequestError> {
        info!(
            model = %self.model,
            message_count = messages.len(),
            "Sending chat request to {}",
            self.provider_name()
        );

        let request = self.build_request(messages);
        let response = self.send(&request, bearer_token).await?;
        let llm_response = self.parse_response(response)?;

        info!(
            content_length = llm_response.content.len(),
            prompt_tokens = ?llm_response.prompt_tokens,
            completion_tokens = ?llm_response.completion_tokens,
            "Received response from {}",
            self.provider_name()
        );

        Ok(llm_response)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &'static str {
        "gigachat"
    }
}
