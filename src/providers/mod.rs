//! Completion provider module for chatrelay
//!
//! Defines the message types sent to the chat-completion endpoint and the
//! `LlmProvider` trait the relay talks to.
//!
//! # Architecture
//!
//! - `LlmProvider` is the seam between the relay and the remote API
//! - `GigaChatProvider` implements it over HTTP with `reqwest`
//! - The bearer token is not owned by the provider: the caller obtains it from
//!   the `CredentialCache` and passes it with every request
//!
//! # Example
//!
//! ```rust
//! use chatrelay::providers::{LlmMessage, LlmProvider, LlmRole};
//!
//! async fn example(provider: &dyn LlmProvider, token: &str) {
//!     let messages = vec![
//!         LlmMessage::new(LlmRole::System, "You are a gestalt therapist"),
//!         LlmMessage::new(LlmRole::User, "Hello!"),
//!     ];
//!
//!     let response = provider.chat(messages, token).await.unwrap();
//!     println!("Response: {}", response.content);
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod error;
pub mod gigachat;
#[cfg(test)]
pub mod mock;

pub use error::CompletionRequestError;
pub use gigachat::GigaChatProvider;

/// Represents a message in the request sent to the completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmMessage {
    /// Role of the message sender
    pub role: LlmRole,
    /// Content of the message
    pub content: String,
}

impl LlmMessage {
    /// Creates a new message with the specified role and content
    pub fn new(role: LlmRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Returns true if this message carries the system prompt
    pub fn is_system(&self) -> bool {
        matches!(self.role, LlmRole::System)
    }

    /// Returns true if this message is from the user
    pub fn is_user(&self) -> bool {
        matches!(self.role, LlmRole::User)
    }

    /// Returns true if this message is from the assistant
    pub fn is_assistant(&self) -> bool {
        matches!(self.role, LlmRole::Assistant)
    }
}

/// Role of a message sender in the completion request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    /// System prompt/instructions
    System,
    /// User input
    User,
    /// Assistant response
    Assistant,
}

impl LlmRole {
    /// Returns the string representation of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmRole::System => "system",
            LlmRole::User => "user",
            LlmRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for LlmRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Response from the completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmResponse {
    /// Content of the assistant's response
    pub content: String,
    /// Number of tokens in the prompt (if provided by provider)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    /// Number of tokens in the completion (if provided by provider)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,
}

impl LlmResponse {
    /// Creates a new response with just content
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            prompt_tokens: None,
            completion_tokens: None,
        }
    }

    /// Adds token usage information
    pub fn with_tokens(mut self, prompt: u32, completion: u32) -> Self {
        self.prompt_tokens = Some(prompt);
        self.completion_tokens = Some(completion);
        self
    }

    /// Returns the total token count if available
    pub fn total_tokens(&self) -> Option<u32> {
        match (self.prompt_tokens, self.completion_tokens) {
            (Some(p), Some(c)) => Some(p + c),
            _ => None,
        }
    }
}

/// Trait for chat-completion providers
///
/// All implementations must be Send + Sync to allow concurrent usage across handlers.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send one completion request
    ///
    /// # Arguments
    ///
    /// * `messages` - System prompt followed by the stored conversation, oldest first
    /// * `bearer_token` - A currently valid access token
    async fn chat(
        &self,
        messages: Vec<LlmMessage>,
        bearer_token: &str,
    ) -> Result<LlmResponse, CompletionRequestError>;

    /// Returns the model name sent with every request
    fn model(&self) -> &str;

    /// Returns the provider name, used for logging
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_role_as_str() {
        assert_eq!(LlmRole::System.as_str(), "system");
        assert_eq!(LlmRole::User.as_str(), "user");
        assert_eq!(LlmRole::Assistant.as_str(), "assistant");
    }

    #[test]
    fn test_llm_role_display() {
        assert_eq!(format!("{}", LlmRole::System), "system");
        assert_eq!(format!("{}", LlmRole::Assistant), "assistant");
    }

    #[test]
    fn test_llm_message_creation() {
        let msg = LlmMessage::new(LlmRole::User, "Hello");
        assert_eq!(msg.role, LlmRole::User);
        assert_eq!(msg.content, "Hello");
        assert!(msg.is_user());
        assert!(!msg.is_system());
        assert!(!msg.is_assistant());
    }

    #[test]
    fn test_llm_response_with_tokens() {
        let response = LlmResponse::new("Hello").with_tokens(10, 5);

        assert_eq!(response.prompt_tokens, Some(10));
        assert_eq!(response.completion_tokens, Some(5));
        assert_eq!(response.total_tokens(), Some(15));
        assert!(LlmResponse::new("x").total_tokens().is_none());
    }

    #[test]
    fn test_message_wire_format() {
        let msg = LlmMessage::new(LlmRole::System, "persona");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({"role": "system", "content": "persona"}));
    }
}
