//! Conversation flow: the relay pipeline, its detached persistence queue and
//! the history service.

pub mod history;
pub mod persist;
pub mod relay;

#[cfg(test)]
pub(crate) mod testing;

pub use history::{ConversationService, history_filters};
pub use persist::{PersistenceQueue, TurnBatch};
pub use relay::{ChatRelayPipeline, RELAY_SCOPE};
