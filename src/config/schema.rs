use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::loader::ConfigError;
use crate::conversation::DEFAULT_MAX_PAIRS;

pub const DEFAULT_AUTH_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";
pub const DEFAULT_COMPLETION_URL: &str =
    "https://gigachat.devices.sberbank.ru/api/v1/chat/completions";
pub const DEFAULT_SCOPE: &str = "GIGACHAT_API_PERS";
pub const DEFAULT_MODEL: &str = "GigaChat";
pub const DEFAULT_KNOWLEDGE_DIR: &str = "knowledge";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram_token: Option<String>,

    /// Pre-shared authorization string sent verbatim, e.g. `Basic <base64>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_key: Option<String>,

    pub auth_url: String,
    pub completion_url: String,
    pub scope: String,
    pub model: String,
    pub max_history_pairs: usize,
    pub knowledge_dir: PathBuf,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram_token: None,
            auth_key: None,
            auth_url: DEFAULT_AUTH_URL.to_string(),
            completion_url: DEFAULT_COMPLETION_URL.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_history_pairs: DEFAULT_MAX_PAIRS,
            knowledge_dir: PathBuf::from(DEFAULT_KNOWLEDGE_DIR),
            request_timeout_secs: None,
        }
    }
}

/// Loggable view of the configuration with secrets reduced to flags.
#[derive(Debug, Clone, PartialEq)]
pub struct SafeSummary {
    pub telegram_configured: bool,
    pub auth_key_configured: bool,
    pub model: String,
    pub max_history_pairs: usize,
    pub knowledge_dir: PathBuf,
}

impl Config {
    /// Checks that everything needed to start the relay is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram_token.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::MissingTelegramToken);
        }
        if self.auth_key.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::MissingAuthKey);
        }
        if self.max_history_pairs == 0 {
            return Err(ConfigError::InvalidHistoryBound);
        }
        Ok(())
    }

    pub fn get_safe_summary(&self) -> SafeSummary {
        SafeSummary {
            telegram_configured: self.telegram_token.as_deref().is_some_and(|t| !t.is_empty()),
            auth_key_configured: self.auth_key.as_deref().is_some_and(|k| !k.is_empty()),
            model: self.model.clone(),
            max_history_pairs: self.max_history_pairs,
            knowledge_dir: self.knowledge_dir.clone(),
        }
    }
}
