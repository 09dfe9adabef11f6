//! Access-token fetcher for the OAuth-style authorization endpoint
//!
//! Each request carries a fresh `RqUID`, the pre-shared `Authorization` value
//! exactly as configured (for GigaChat a `Basic ...` string), and a urlencoded
//! `scope` body.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

use crate::credentials::CredentialFetchError;

/// Parsed authorization response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Declared lifetime in seconds
    pub expires_in: i64,
}

/// Performs one remote token fetch.
#[async_trait]
pub trait TokenFetcher: Send + Sync {
    async fn fetch_token(&self) -> Result<TokenGrant, CredentialFetchError>;
}

/// `TokenFetcher` talking to the authorization endpoint over HTTP.
#[derive(Clone)]
pub struct OAuthTokenFetcher {
    client: Client,
    auth_url: String,
    auth_key: String,
    scope: String,
}

impl std::fmt::Debug for OAuthTokenFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthTokenFetcher")
            .field("auth_url", &self.auth_url)
            .field("auth_key", &"<redacted>")
            .field("scope", &self.scope)
            .finish()
    }
}

impl OAuthTokenFetcher {
    pub fn new(
        auth_url: impl Into<String>,
        auth_key: impl Into<String>,
        scope: impl Into<String>,
        timeout_seconds: Option<u64>,
    ) -> Result<Self, CredentialFetchError> {
        let mut builder = Client::builder();
        if let Some(secs) = timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| CredentialFetchError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            auth_url: auth_url.into(),
            auth_key: auth_key.into(),
            scope: scope.into(),
        })
    }

    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }
}

#[async_trait]
impl TokenFetcher for OAuthTokenFetcher {
    async fn fetch_token(&self) -> Result<TokenGrant, CredentialFetchError> {
        let request_id = Uuid::new_v4();
        tracing::debug!(url = %self.auth_url, rq_uid = %request_id, "Requesting access token");

        let response = self
            .client
            .post(&self.auth_url)
            .header("Accept", "application/json")
            .header("RqUID", request_id.to_string())
            .header("Authorization", &self.auth_key)
            .form(&[("scope", self.scope.as_str())])
            .send()
            .await
            .map_err(|e| CredentialFetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialFetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let grant = response
            .json::<TokenGrant>()
            .await
            .map_err(|e| CredentialFetchError::InvalidResponse(e.to_string()))?;

        if grant.access_token.is_empty() {
            return Err(CredentialFetchError::InvalidResponse(
                "access_token is empty".to_string(),
            ));
        }
        if grant.expires_in < 0 {
            return Err(CredentialFetchError::InvalidResponse(format!(
                "expires_in is negative: {}",
                grant.expires_in
            )));
        }

        tracing::info!(expires_in = grant.expires_in, "Access token received");
        Ok(grant)
    }
}
