//! Message relay between chat users and the completion API
//!
//! For every inbound text message the relay:
//! 1. stores the user turn (truncating the history if needed)
//! 2. composes the request from the system prompt and the stored turns
//! 3. obtains a valid bearer token from the `CredentialCache`
//! 4. issues one completion request
//! 5. stores the assistant turn and returns the reply
//!
//! Any failure in steps 3-4 is logged and answered with a generic failure text.
//! The user turn stays stored and no assistant turn is added, so the next request
//! resends the unanswered turn as the latest context.

use std::sync::Arc;

use crate::chat::{InboundMessage, OutboundMessage};
use crate::commands::BotCommand;
use crate::conversation::{ConversationStore, Role, UserId};
use crate::credentials::{CredentialCache, CredentialFetchError};
use crate::providers::{CompletionRequestError, LlmProvider};

/// Reply sent to the user when any step of an exchange fails.
pub const FAILURE_TEXT: &str = "Oops... something went wrong!";

/// Errors that can end a single exchange
#[derive(thiserror::Error, Debug)]
pub enum RelayError {
    #[error("Could not obtain access token: {0}")]
    Credential(#[from] CredentialFetchError),

    #[error("Completion request failed: {0}")]
    Completion(#[from] CompletionRequestError),
}

/// Result type for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

/// Composes the conversation store, the credential cache and the completion
/// provider. Cheap to share behind an `Arc`; holds no per-message state.
pub struct Relay {
    store: Arc<ConversationStore>,
    credentials: Arc<CredentialCache>,
    provider: Arc<dyn LlmProvider>,
    system_prompt: Arc<str>,
}

impl Relay {
    pub fn new(
        store: Arc<ConversationStore>,
        credentials: Arc<CredentialCache>,
        provider: Arc<dyn LlmProvider>,
        system_prompt: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            store,
            credentials,
            provider,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Runs one exchange for `user_id` and returns the model's reply.
    pub async fn process_message(&self, user_id: UserId, text: &str) -> Result<String> {
        self.store.append_turn(user_id, Role::User, text).await;

        let messages = self.store.compose_request(user_id, &self.system_prompt).await;
        tracing::debug!(
            user_id = %user_id,
            message_count = messages.len(),
            "Composed completion request"
        );

        let token = self.credentials.get_valid_token().await?;

        let response = match self.provider.chat(messages, &token).await {
            Ok(response) => response,
            Err(e) => {
                if e.is_auth_error() {
                    // Rejected before its declared expiry; fetch a fresh one next time.
                    self.credentials.invalidate().await;
                }
                return Err(e.into());
            }
        };

        let answer = response.content.trim().to_string();
        self.store
            .append_turn(user_id, Role::Assistant, answer.clone())
            .await;

        Ok(answer)
    }

    /// Handles an inbound text message from a channel.
    ///
    /// Returns `None` for empty text and for command-like text (commands have
    /// their own entry point). Errors never escape: they become `FAILURE_TEXT`.
    pub async fn handle_message(&self, mut message: InboundMessage) -> Option<OutboundMessage> {
        if !message.sanitize() {
            tracing::debug!(
                channel = %message.channel,
                chat_id = %message.chat_id,
                "Ignoring empty or whitespace-only message"
            );
            return None;
        }

        if message.is_command() {
            tracing::debug!(chat_id = %message.chat_id, "Ignoring unrecognized command");
            return None;
        }

        let started = std::time::Instant::now();
        match self.process_message(message.user_id, &message.content).await {
            Ok(answer) => {
                tracing::info!(
                    user_id = %message.user_id,
                    chat_id = %message.chat_id,
                    reply_length = answer.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Exchange completed"
                );
                Some(message.reply(answer))
            }
            Err(e) => {
                tracing::error!(
                    user_id = %message.user_id,
                    chat_id = %message.chat_id,
                    error = %e,
                    "Exchange failed"
                );
                Some(message.reply(FAILURE_TEXT))
            }
        }
    }

    /// Handles a bot command and returns the reply text.
    pub async fn handle_command(&self, user_id: UserId, command: BotCommand) -> String {
        tracing::info!(user_id = %user_id, command = ?command, "Handling command");
        if command.clears_history() {
            self.store.reset(user_id).await;
        }
        command.reply_text()
    }
}
