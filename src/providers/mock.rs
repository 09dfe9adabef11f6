//! Mock completion provider for testing
//!
//! Returns a configurable response or error without making network calls and
//! records what it was asked.

use std::sync::{Arc, Mutex};

use crate::providers::{CompletionRequestError, LlmMessage, LlmProvider, LlmResponse};

/// Mock provider for testing
pub struct MockLlmProvider {
    /// The response to return from chat()
    response: Arc<Mutex<LlmResponse>>,
    /// Optional error to return instead of the response
    error: Arc<Mutex<Option<CompletionRequestError>>>,
    /// Call counter for tracking
    call_count: Arc<Mutex<usize>>,
    /// Last messages received (for verification)
    last_messages: Arc<Mutex<Option<Vec<LlmMessage>>>>,
    /// Last bearer token received
    last_token: Arc<Mutex<Option<String>>>,
}

impl MockLlmProvider {
    /// Creates a new mock provider with default settings
    pub fn new() -> Self {
        Self {
            response: Arc::new(Mutex::new(LlmResponse::new("Mock response"))),
            error: Arc::new(Mutex::new(None)),
            call_count: Arc::new(Mutex::new(0)),
            last_messages: Arc::new(Mutex::new(None)),
            last_token: Arc::new(Mutex::new(None)),
        }
    }

    /// Sets the response content to return
    pub fn set_response(&self, content: impl Into<String>) {
        *self.response.lock().unwrap() = LlmResponse::new(content);
    }

    /// Sets the error to return (instead of the response)
    pub fn set_error(&self, error: CompletionRequestError) {
        *self.error.lock().unwrap() = Some(error);
    }

    /// Clears any set error
    pub fn clear_error(&self) {
        *self.error.lock().unwrap() = None;
    }

    /// Returns the number of times chat() was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Returns the last messages passed to chat()
    pub fn last_messages(&self) -> Option<Vec<LlmMessage>> {
        self.last_messages.lock().unwrap().clone()
    }

    /// Returns the last bearer token passed to chat()
    pub fn last_token(&self) -> Option<String> {
        self.last_token.lock().unwrap().clone()
    }
}

impl Default for MockLlmProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockLlmProvider {
    async fn chat(
        &self,
        messages: Vec<LlmMessage>,
        bearer_token: &str,
    ) -> Result<LlmResponse, CompletionRequestError> {
        *self.call_count.lock().unwrap() += 1;
        *self.last_messages.lock().unwrap() = Some(messages);
        *self.last_token.lock().unwrap() = Some(bearer_token.to_string());

        let error = self.error.lock().unwrap().clone();
        if let Some(err) = error {
            return Err(err);
        }

        Ok(self.response.lock().unwrap().clone())
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    fn provider_name(&self) -> &'static str {
        "MockProvider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::LlmRole;

    #[tokio::test]
    async fn test_mock_records_calls() {
        let mock = MockLlmProvider::new();
        mock.set_response("Hi there");

        let messages = vec![LlmMessage::new(LlmRole::User, "Hello")];
        let response = mock.chat(messages, "token-1").await.unwrap();

        assert_eq!(response.content, "Hi there");
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.last_token().as_deref(), Some("token-1"));
        assert_eq!(mock.last_messages().unwrap()[0].content, "Hello");
    }

    #[tokio::test]
    async fn test_mock_error_then_clear() {
        let mock = MockLlmProvider::new();
        mock.set_error(CompletionRequestError::network("down"));
        assert!(mock.chat(vec![], "t").await.is_err());

        mock.clear_error();
        assert!(mock.chat(vec![], "t").await.is_ok());
        assert_eq!(mock.call_count(), 2);
    }
}
