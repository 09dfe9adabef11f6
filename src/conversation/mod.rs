pub mod store;
pub mod types;

pub use store::{ConversationStore, DEFAULT_MAX_PAIRS};
pub use types::{Role, Turn, UserId};
