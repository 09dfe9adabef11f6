//! Test doubles for the credential subsystem

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::credentials::{CredentialFetchError, TokenFetcher, TokenGrant};

/// Hands out queued results in order and counts calls.
pub struct ScriptedFetcher {
    results: Mutex<VecDeque<Result<TokenGrant, CredentialFetchError>>>,
    calls: Mutex<usize>,
}

impl ScriptedFetcher {
    pub fn new(results: Vec<Result<TokenGrant, CredentialFetchError>>) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(results.into()),
            calls: Mutex::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl TokenFetcher for ScriptedFetcher {
    async fn fetch_token(&self) -> Result<TokenGrant, CredentialFetchError> {
        *self.calls.lock().unwrap() += 1;
        // Give concurrent callers a chance to run while the fetch is "in flight".
        tokio::task::yield_now().await;
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CredentialFetchError::Network("script exhausted".into())))
    }
}

pub fn grant(token: &str, expires_in: i64) -> Result<TokenGrant, CredentialFetchError> {
    Ok(TokenGrant {
        access_token: token.to_string(),
        expires_in,
    })
}
