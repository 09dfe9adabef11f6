//! Failures of a single chat-completion call
//!
//! Every failure of the completion endpoint surfaces as a `CompletionRequestError`.
//! None of them are retried: the relay logs the error and answers with a generic
//! failure text.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompletionRequestError {
    /// The completion endpoint could not be reached or the connection broke.
    #[error("Completion endpoint unreachable: {message}")]
    Network { message: String },

    /// HTTP 401 or 403: the bearer token was rejected.
    #[error("Bearer token rejected: {message}")]
    Auth { message: String },

    /// Any other 4xx.
    #[error("Completion request rejected: {message}")]
    InvalidRequest { message: String },

    /// Only produced when `request_timeout_secs` is set.
    #[error("Completion timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// 5xx from the completion service. `code` carries the HTTP status.
    #[error("Completion service error: {message}")]
    Provider {
        message: String,
        code: Option<String>,
    },

    /// The body had no `choices[0].message.content`, or was not JSON.
    #[error("Malformed completion response: {message}")]
    Serialization { message: String },

    /// The HTTP client could not be built.
    #[error("Completion client misconfigured: {message}")]
    Config { message: String },
}

impl CompletionRequestError {
    /// A rejected bearer token usually means the cached credential was revoked
    /// upstream before its declared expiry.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, CompletionRequestError::Auth { .. })
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn timeout(seconds: u64) -> Self {
        Self::Timeout { seconds }
    }

    /// Server-side failure; pass the HTTP status as `code`.
    pub fn provider(message: impl Into<String>, code: Option<impl Into<String>>) -> Self {
        Self::Provider {
            message: message.into(),
            code: code.map(|c| c.into()),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CompletionRequestError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
