//! Long-running relay process
//!
//! Builds the relay from the configuration, starts the Telegram channel and
//! waits for SIGTERM/SIGINT.

use crate::channels::{Channel, TelegramChannel};
use crate::config::Config;
use crate::conversation::ConversationStore;
use crate::credentials::{CredentialCache, OAuthTokenFetcher};
use crate::persona::SystemPrompt;
use crate::providers::{GigaChatProvider, LlmProvider};
use crate::relay::Relay;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Builds the relay and its components from a validated configuration.
pub fn build_relay(config: &Config) -> Result<Relay> {
    config.validate().context("Invalid configuration")?;

    let auth_key = config
        .auth_key
        .clone()
        .context("Authorization key is not configured")?;

    let fetcher = OAuthTokenFetcher::new(
        config.auth_url.clone(),
        auth_key,
        config.scope.clone(),
        config.request_timeout_secs,
    )
    .context("Failed to create authorization client")?;
    let credentials = Arc::new(CredentialCache::new(Arc::new(fetcher)));
    info!(auth_url = %config.auth_url, scope = %config.scope, "Credential cache initialized");

    let provider = GigaChatProvider::new(
        config.completion_url.clone(),
        config.model.clone(),
        config.request_timeout_secs,
    )
    .context("Failed to create completion client")?;
    info!(
        provider = provider.provider_name(),
        model = provider.model(),
        completion_url = %provider.completion_url(),
        "Completion provider initialized"
    );

    let store = Arc::new(ConversationStore::new(config.max_history_pairs));
    info!(max_pairs = config.max_history_pairs, "Conversation store initialized");

    let system_prompt = SystemPrompt::load(&config.knowledge_dir).with_context(|| {
        format!(
            "Failed to load knowledge files from {}",
            config.knowledge_dir.display()
        )
    })?;

    Ok(Relay::new(
        store,
        credentials,
        Arc::new(provider),
        system_prompt.into_string(),
    ))
}

/// Runs the relay until a shutdown signal arrives.
pub async fn run_gateway(config: &Config) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting chatrelay gateway"
    );

    let relay = Arc::new(build_relay(config)?);

    let token = config
        .telegram_token
        .clone()
        .context("Telegram token is not configured")?;
    let telegram = TelegramChannel::new(token).context("Invalid Telegram token")?;
    telegram
        .start(Arc::clone(&relay))
        .await
        .context("Failed to start Telegram channel")?;
    info!("Telegram channel initialized successfully");

    wait_for_shutdown_signal().await?;

    info!("Shutting down gateway...");
    if let Err(e) = telegram.shutdown().await {
        warn!("Telegram channel did not shut down cleanly: {}", e);
    }
    info!(
        users = relay.store().user_count().await,
        "Gateway stopped"
    );

    Ok(())
}

async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, initiating graceful shutdown...");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, initiating graceful shutdown...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for shutdown signal")?;
        info!("Received Ctrl+C, initiating graceful shutdown...");
    }
    Ok(())
}
