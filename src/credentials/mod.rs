//! Bearer credential management for the completion API
//!
//! The `CredentialCache` holds one access token and its expiry instant and hands
//! out a token that is valid at the moment of the call, fetching a new one from
//! the authorization endpoint when the slot is empty or expired. Expiry is
//! checked lazily on each call; no background timer runs.

pub mod cache;
pub mod clock;
pub mod error;
pub mod oauth;
#[cfg(test)]
pub mod testing;

pub use cache::{Credential, CredentialCache, TOKEN_SAFETY_MARGIN_SECS};
pub use clock::{Clock, SystemClock};
#[cfg(test)]
pub use clock::ManualClock;
pub use error::CredentialFetchError;
pub use oauth::{OAuthTokenFetcher, TokenFetcher, TokenGrant};
