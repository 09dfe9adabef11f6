use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::credentials::{Clock, CredentialFetchError, SystemClock, TokenFetcher, TokenGrant};

/// Subtracted from the declared token lifetime so a token is never used right
/// at its expiry boundary.
pub const TOKEN_SAFETY_MARGIN_SECS: i64 = 60;

/// A held access token and the instant after which it must not be handed out.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Builds a credential from a grant received at `received_at`.
    ///
    /// A lifetime that does not fit the calendar range is an invalid response.
    pub fn from_grant(
        grant: TokenGrant,
        received_at: DateTime<Utc>,
        margin: Duration,
    ) -> Result<Self, CredentialFetchError> {
        let expires_at = Duration::try_seconds(grant.expires_in)
            .and_then(|lifetime| received_at.checked_add_signed(lifetime))
            .and_then(|instant| instant.checked_sub_signed(margin))
            .ok_or_else(|| {
                CredentialFetchError::InvalidResponse(format!(
                    "expires_in out of range: {}",
                    grant.expires_in
                ))
            })?;

        Ok(Self {
            token: grant.access_token,
            expires_at,
        })
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Process-wide holder of the completion API bearer token.
///
/// States: Empty (`None`), Valid, Expired. Expired is never stored explicitly;
/// it is detected by comparing the clock against `expires_at` on each call.
///
/// The slot is guarded by an async mutex that stays locked while a fetch is in
/// flight, so concurrent callers arriving in an Empty or Expired window wait for
/// that one fetch instead of each issuing their own.
pub struct CredentialCache {
    fetcher: Arc<dyn TokenFetcher>,
    clock: Arc<dyn Clock>,
    margin: Duration,
    slot: Mutex<Option<Credential>>,
}

impl CredentialCache {
    pub fn new(fetcher: Arc<dyn TokenFetcher>) -> Self {
        Self::with_clock(fetcher, Arc::new(SystemClock))
    }

    pub fn with_clock(fetcher: Arc<dyn TokenFetcher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            fetcher,
            clock,
            margin: Duration::seconds(TOKEN_SAFETY_MARGIN_SECS),
            slot: Mutex::new(None),
        }
    }

    /// Returns a token valid at the moment of the call.
    ///
    /// Performs no I/O while the held token is unexpired. Otherwise fetches a
    /// new one, stores it and returns it. A failed fetch leaves the slot as it
    /// was and is returned to the caller without retry.
    pub async fn get_valid_token(&self) -> Result<String, CredentialFetchError> {
        let mut slot = self.slot.lock().await;

        if let Some(credential) = slot.as_ref() {
            if credential.is_valid_at(self.clock.now()) {
                return Ok(credential.token.clone());
            }
            tracing::debug!(expires_at = %credential.expires_at, "Access token expired, refreshing");
        } else {
            tracing::debug!("No access token held, fetching");
        }

        let grant = match self.fetcher.fetch_token().await {
            Ok(grant) => grant,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch access token");
                return Err(e);
            }
        };

        if grant.expires_in <= TOKEN_SAFETY_MARGIN_SECS {
            tracing::warn!(
                expires_in = grant.expires_in,
                margin_secs = TOKEN_SAFETY_MARGIN_SECS,
                "Token lifetime is shorter than the safety margin; it will be refetched on next use"
            );
        }

        let credential = match Credential::from_grant(grant, self.clock.now(), self.margin) {
            Ok(credential) => credential,
            Err(e) => {
                tracing::error!(error = %e, "Rejected access token grant");
                return Err(e);
            }
        };
        let token = credential.token.clone();
        tracing::info!(expires_at = %credential.expires_at, "Access token refreshed");
        *slot = Some(credential);

        Ok(token)
    }

    /// Drops the held token; the next call fetches a new one.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }

    /// Expiry of the held token, if any.
    pub async fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.slot.lock().await.as_ref().map(|c| c.expires_at)
    }
}
