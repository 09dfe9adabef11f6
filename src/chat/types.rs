use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::UserId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub channel: String,
    pub chat_id: String,
    pub user_id: UserId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl InboundMessage {
    pub fn new(
        channel: impl Into<String>,
        chat_id: impl Into<String>,
        user_id: UserId,
        content: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            chat_id: chat_id.into(),
            user_id,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Returns true for text that looks like a bot command ("/start", "/foo").
    pub fn is_command(&self) -> bool {
        self.content.starts_with('/')
    }

    /// Trims the message content.
    /// Returns true if the message is valid (not empty/whitespace), false otherwise.
    /// Length is left alone; the text is relayed in full.
    pub fn sanitize(&mut self) -> bool {
        let trimmed = self.content.trim();
        if trimmed.is_empty() {
            return false;
        }

        if trimmed.len() != self.content.len() {
            self.content = trimmed.to_string();
        }

        true
    }

    /// Builds a reply addressed to the same chat.
    pub fn reply(&self, content: impl Into<String>) -> OutboundMessage {
        OutboundMessage::new(self.channel.clone(), self.chat_id.clone(), content)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub channel: String,
    pub chat_id: String,
    pub content: String,
}

impl OutboundMessage {
    pub fn new(
        channel: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            chat_id: chat_id.into(),
            content: content.into(),
        }
    }
}
