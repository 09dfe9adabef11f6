use crate::channels::Channel;
use crate::chat::{InboundMessage, OutboundMessage};
use crate::commands::BotCommand;
use crate::conversation::UserId;
use crate::relay::Relay;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ChatId, Update};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::sync::mpsc;

pub const TELEGRAM_CHANNEL_NAME: &str = "telegram";
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Invalid token format: {0}. Check @BotFather (https://t.me/BotFather) for a valid token.")]
    InvalidTokenFormat(String),

    #[error("Telegram API error: {0}")]
    ApiError(String),
}

/// Telegram front-end backed by teloxide long polling.
///
/// Commands go to `Relay::handle_command`, other text to `Relay::handle_message`.
/// Non-text updates are ignored.
pub struct TelegramChannel {
    bot: Bot,
    shutdown_tx: Arc<RwLock<Option<mpsc::Sender<()>>>>,
}

impl TelegramChannel {
    /// Creates the channel after checking the token format.
    ///
    /// Token format: "123456789:ABCdefGHIjklMNOpqrsTUVwxyz"
    pub fn new(token: String) -> Result<Self> {
        if !is_valid_token_format(&token) {
            return Err(TelegramError::InvalidTokenFormat(
                "Token must be in format: digits:alphanumeric (e.g., 123456789:ABC...)".to_string(),
            )
            .into());
        }

        Ok(Self {
            bot: Bot::new(token),
            shutdown_tx: Arc::new(RwLock::new(None)),
        })
    }

    /// Stops the dispatcher.
    pub async fn shutdown(&self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.write().await.take() {
            let _ = tx.send(()).await;
            tracing::info!("Telegram channel shutdown signal sent");
        }
        Ok(())
    }

    fn user_id_of(msg: &Message) -> Option<UserId> {
        msg.from.as_ref().map(|user| UserId(user.id.0))
    }

    async fn on_command(
        bot: Bot,
        msg: Message,
        command: BotCommand,
        relay: Arc<Relay>,
    ) -> Result<(), TelegramError> {
        let Some(user_id) = Self::user_id_of(&msg) else {
            tracing::debug!(chat_id = %msg.chat.id.0, "Command without sender, dropping");
            return Ok(());
        };

        let text = relay.handle_command(user_id, command).await;
        let reply = OutboundMessage::new(TELEGRAM_CHANNEL_NAME, msg.chat.id.0.to_string(), text);
        Self::send_message(&bot, reply).await
    }

    async fn on_text(bot: Bot, msg: Message, relay: Arc<Relay>) -> Result<(), TelegramError> {
        let Some(text) = msg.text() else {
            tracing::debug!(chat_id = %msg.chat.id.0, "Ignoring non-text message");
            return Ok(());
        };
        let Some(user_id) = Self::user_id_of(&msg) else {
            tracing::debug!(chat_id = %msg.chat.id.0, "Message without sender, dropping");
            return Ok(());
        };

        tracing::info!(
            chat_id = %msg.chat.id.0,
            user_id = %user_id,
            content_length = text.chars().count(),
            "Received Telegram message"
        );

        let inbound = InboundMessage::new(
            TELEGRAM_CHANNEL_NAME,
            msg.chat.id.0.to_string(),
            user_id,
            text,
        );

        match relay.handle_message(inbound).await {
            Some(reply) => Self::send_message(&bot, reply).await,
            None => Ok(()),
        }
    }

    /// Sends a message through the Bot API, truncating it to the Telegram limit.
    async fn send_message(bot: &Bot, message: OutboundMessage) -> Result<(), TelegramError> {
        let content = truncate_for_telegram(&message.content);
        if content.len() != message.content.len() {
            tracing::warn!(
                chat_id = %message.chat_id,
                original_length = message.content.chars().count(),
                "Outbound message too long, truncating to {} characters",
                TELEGRAM_MAX_MESSAGE_LENGTH
            );
        }

        let chat_id: i64 = message.chat_id.parse().map_err(|_| {
            TelegramError::ApiError(format!("Invalid chat_id format: {}", message.chat_id))
        })?;

        match bot.send_message(ChatId(chat_id), content).await {
            Ok(sent) => {
                tracing::debug!(
                    chat_id = %chat_id,
                    message_id = sent.id.0,
                    "Sent message to Telegram"
                );
                Ok(())
            }
            Err(e) => {
                let error_msg = format!("Failed to send Telegram message to chat {}: {}", chat_id, e);
                tracing::error!("{}", error_msg);
                Err(TelegramError::ApiError(error_msg))
            }
        }
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    async fn start(&self, relay: Arc<Relay>) -> Result<()> {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        {
            let mut tx = self.shutdown_tx.write().await;
            *tx = Some(shutdown_tx);
        }

        let bot = self.bot.clone();

        tokio::spawn(async move {
            let handler = Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<BotCommand>()
                        .endpoint(Self::on_command),
                )
                .branch(dptree::endpoint(Self::on_text));

            // Updates from one chat are handled in order, different chats concurrently.
            let mut dispatcher = Dispatcher::builder(bot, handler)
                .dependencies(dptree::deps![relay])
                .default_handler(|_upd| async move {
                    tracing::debug!("Ignoring non-message update");
                })
                .build();

            tokio::select! {
                _ = dispatcher.dispatch() => {
                    tracing::info!("Telegram dispatcher stopped");
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Telegram dispatcher received shutdown signal");
                }
            }
        });

        tracing::info!("Telegram channel connected and listening for messages");
        Ok(())
    }
}

/// Cuts `content` to at most 4096 characters on a character boundary.
pub fn truncate_for_telegram(content: &str) -> &str {
    match content.char_indices().nth(TELEGRAM_MAX_MESSAGE_LENGTH) {
        Some((byte_index, _)) => &content[..byte_index],
        None => content,
    }
}

/// Validates Telegram bot token format.
///
/// - Bot ID must be all digits
/// - Must contain exactly one colon separator
/// - Secret part must be non-empty
pub fn is_valid_token_format(token: &str) -> bool {
    let Some((bot_id, secret)) = token.split_once(':') else {
        return false;
    };

    !bot_id.is_empty()
        && bot_id.chars().all(|c| c.is_ascii_digit())
        && !secret.is_empty()
        && !secret.contains(':')
}
