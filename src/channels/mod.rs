use crate::relay::Relay;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub mod telegram;

pub use telegram::{TelegramChannel, TelegramError};

/// Trait that all messaging front-ends implement.
///
/// A channel receives messages from an external service, hands them to the
/// `Relay` and delivers each reply itself.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Start listening for inbound messages.
    ///
    /// Spawns the background tasks and returns immediately after setup.
    async fn start(&self, relay: Arc<Relay>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{InboundMessage, OutboundMessage};
    use crate::conversation::{ConversationStore, UserId};
    use crate::credentials::CredentialCache;
    use crate::credentials::testing::{ScriptedFetcher, grant};
    use crate::providers::mock::MockLlmProvider;
    use tokio::sync::{Mutex, mpsc};

    // Feeds queued inbound messages to the relay and collects replies.
    struct MockChannel {
        inbound: Mutex<Vec<InboundMessage>>,
        sender: mpsc::Sender<OutboundMessage>,
    }

    #[async_trait]
    impl Channel for MockChannel {
        async fn start(&self, relay: Arc<Relay>) -> Result<()> {
            let pending: Vec<InboundMessage> = self.inbound.lock().await.drain(..).collect();
            for message in pending {
                if let Some(reply) = relay.handle_message(message).await {
                    self.sender.send(reply).await?;
                }
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_channel_trait_routes_through_relay() {
        let provider = Arc::new(MockLlmProvider::new());
        provider.set_response("Hello back");
        let relay = Arc::new(Relay::new(
            Arc::new(ConversationStore::default()),
            Arc::new(CredentialCache::new(ScriptedFetcher::new(vec![grant("T1", 1800)]))),
            provider,
            "persona",
        ));

        let (tx, mut rx) = mpsc::channel(10);
        let channel = MockChannel {
            inbound: Mutex::new(vec![
                InboundMessage::new("test", "123", UserId(1), "Hello"),
                InboundMessage::new("test", "123", UserId(1), "/ignored"),
            ]),
            sender: tx,
        };

        channel.start(relay).await.unwrap();
        drop(channel);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.chat_id, "123");
        assert_eq!(received.content, "Hello back");
        assert!(rx.recv().await.is_none());
    }
}
