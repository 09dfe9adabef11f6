use crate::config::schema::Config;
use anyhow::{Context, Result};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[cfg(test)]
use std::sync::Mutex;

#[cfg(test)]
static CONFIG_TEST_ENV_LOCK: Mutex<()> = Mutex::new(());

/// Environment variables read by `load_config`.
pub const ENV_VARS: [&str; 8] = [
    "TELEGRAM_BOT_TOKEN",
    "GIGACHAT_AUTH_KEY",
    "GIGACHAT_URL",
    "GIGACHAT_AUTH_URL",
    "GIGACHAT_SCOPE",
    "GIGACHAT_MODEL",
    "CHATRELAY_MAX_HISTORY",
    "CHATRELAY_KNOWLEDGE_DIR",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file contains invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TELEGRAM_BOT_TOKEN is not set")]
    MissingTelegramToken,

    #[error("GIGACHAT_AUTH_KEY is not set")]
    MissingAuthKey,

    #[error("max_history_pairs must be at least 1")]
    InvalidHistoryBound,
}

/// Values given on the command line; they take precedence over everything else.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub model: Option<String>,
    pub knowledge_dir: Option<PathBuf>,
}

pub fn load_config(cli: CliOverrides, cli_config_path: Option<PathBuf>) -> Result<Config> {
    tracing::debug!("Loading configuration");

    let mut config = Config::default();

    // Layer 1: config file (~/.chatrelay/config.json)
    let config_file = cli_config_path.clone().or_else(get_default_config_path);

    if let Some(ref path) = config_file {
        if path.exists() {
            tracing::debug!(config_path = %path.display(), "Loading configuration from file");
            config = merge_config_from_file(config, path)?;

            let safe_summary = config.get_safe_summary();
            tracing::debug!(
                telegram_configured = safe_summary.telegram_configured,
                auth_key_configured = safe_summary.auth_key_configured,
                model = %safe_summary.model,
                "Configuration loaded from file"
            );
        } else {
            tracing::debug!(config_path = %path.display(), "Config file not found, using defaults");
        }
    }

    // Layer 2: environment variables
    tracing::debug!("Applying environment variable overrides");
    config = merge_env_variables(config);

    // Layer 3: CLI flags
    if let Some(model) = cli.model {
        tracing::debug!(model = %model, "Applying CLI model override");
        config.model = model;
    }
    if let Some(dir) = cli.knowledge_dir {
        tracing::debug!(knowledge_dir = %dir.display(), "Applying CLI knowledge dir override");
        config.knowledge_dir = dir;
    }

    let final_summary = config.get_safe_summary();
    tracing::debug!(
        telegram_configured = final_summary.telegram_configured,
        auth_key_configured = final_summary.auth_key_configured,
        model = %final_summary.model,
        max_history_pairs = final_summary.max_history_pairs,
        knowledge_dir = %final_summary.knowledge_dir.display(),
        "Configuration loaded successfully"
    );

    Ok(config)
}

/// Loads a `.env` file from the working directory into the process
/// environment, if one exists. Variables already set are not overwritten.
pub fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => tracing::debug!("No .env file found"),
        Err(e) => tracing::warn!(error = %e, "Failed to load .env file"),
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".chatrelay").join("config.json"))
}

fn merge_config_from_file(config: Config, path: &Path) -> Result<Config> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(config),
        Err(e) => return Err(e).context("Failed to read metadata for config file"),
    };

    let mode = metadata.permissions().mode() & 0o777;

    if mode != 0o600 {
        tracing::error!(
            "Config file {:?} has permissions {:o}, expected 0600 - skipping for security",
            path,
            mode
        );
        return Ok(config);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    // Missing fields fall back to defaults through `#[serde(default)]`.
    let file_config: Config = serde_json::from_str(&content).map_err(ConfigError::InvalidJson)?;

    Ok(file_config)
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn merge_env_variables(config: Config) -> Config {
    let max_history_pairs = match env_non_empty("CHATRELAY_MAX_HISTORY") {
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(value = %raw, "Ignoring invalid CHATRELAY_MAX_HISTORY");
                config.max_history_pairs
            }
        },
        None => config.max_history_pairs,
    };

    Config {
        telegram_token: env_non_empty("TELEGRAM_BOT_TOKEN").or(config.telegram_token),
        auth_key: env_non_empty("GIGACHAT_AUTH_KEY").or(config.auth_key),
        auth_url: env_non_empty("GIGACHAT_AUTH_URL").unwrap_or(config.auth_url),
        completion_url: env_non_empty("GIGACHAT_URL").unwrap_or(config.completion_url),
        scope: env_non_empty("GIGACHAT_SCOPE").unwrap_or(config.scope),
        model: env_non_empty("GIGACHAT_MODEL").unwrap_or(config.model),
        max_history_pairs,
        knowledge_dir: env_non_empty("CHATRELAY_KNOWLEDGE_DIR")
            .map(PathBuf::from)
            .unwrap_or(config.knowledge_dir),
        request_timeout_secs: config.request_timeout_secs,
    }
}
