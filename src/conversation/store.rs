use crate::conversation::types::{Role, Turn, UserId};
use crate::providers::{LlmMessage, LlmRole};
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;
use tracing::debug;

/// Default number of user/assistant pairs kept per user.
pub const DEFAULT_MAX_PAIRS: usize = 10;

/// In-memory, per-user conversation history bounded to `2 * max_pairs` turns.
///
/// **Lock Scope Pattern**: every operation takes the map lock for the duration
/// of a single in-memory mutation or clone and releases it before returning.
/// No lock is held while a caller awaits remote I/O, so two messages from the
/// same user handled concurrently may interleave their turns.
pub struct ConversationStore {
    max_pairs: usize,
    conversations: RwLock<HashMap<UserId, VecDeque<Turn>>>,
}

impl ConversationStore {
    pub fn new(max_pairs: usize) -> Self {
        Self {
            max_pairs,
            conversations: RwLock::new(HashMap::new()),
        }
    }

    pub fn max_pairs(&self) -> usize {
        self.max_pairs
    }

    /// Maximum number of stored turns per user.
    pub fn max_turns(&self) -> usize {
        self.max_pairs * 2
    }

    /// Appends a turn and drops the oldest turns beyond the bound.
    pub async fn append_turn(&self, user_id: UserId, role: Role, content: impl Into<String>) {
        let max_turns = self.max_turns();
        let mut guard = self.conversations.write().await;
        let turns = guard.entry(user_id).or_default();

        turns.push_back(Turn::new(role, content));
        let mut dropped = 0usize;
        while turns.len() > max_turns {
            turns.pop_front();
            dropped += 1;
        }

        if dropped > 0 {
            debug!(user_id = %user_id, dropped, retained = turns.len(), "Truncated conversation");
        }
    }

    /// Replaces the user's history with an empty one.
    pub async fn reset(&self, user_id: UserId) {
        let mut guard = self.conversations.write().await;
        guard.insert(user_id, VecDeque::new());
        debug!(user_id = %user_id, "Conversation reset");
    }

    /// Builds the message sequence for a completion request: the system prompt
    /// followed by the user's stored turns, oldest first.
    pub async fn compose_request(&self, user_id: UserId, system_prompt: &str) -> Vec<LlmMessage> {
        let guard = self.conversations.read().await;
        let turns = guard.get(&user_id);

        let mut messages = Vec::with_capacity(1 + turns.map_or(0, VecDeque::len));
        messages.push(LlmMessage::new(LlmRole::System, system_prompt));
        if let Some(turns) = turns {
            messages.extend(turns.iter().cloned().map(LlmMessage::from));
        }
        messages
    }

    /// Snapshot of the user's stored turns.
    pub async fn history(&self, user_id: UserId) -> Vec<Turn> {
        let guard = self.conversations.read().await;
        guard
            .get(&user_id)
            .map(|turns| turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of users with a (possibly empty) conversation.
    pub async fn user_count(&self) -> usize {
        self.conversations.read().await.len()
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAIRS)
    }
}
