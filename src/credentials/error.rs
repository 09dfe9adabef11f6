use thiserror::Error;

/// Failure to obtain an access token from the authorization endpoint.
///
/// The cached credential is never modified when this error is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CredentialFetchError {
    #[error("Authorization endpoint unreachable: {0}")]
    Network(String),

    #[error("Authorization endpoint rejected the request ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Invalid authorization response: {0}")]
    InvalidResponse(String),

    #[error("Authorization client misconfigured: {0}")]
    Config(String),
}

impl CredentialFetchError {
    /// HTTP status returned by the authorization endpoint, if it answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            CredentialFetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
