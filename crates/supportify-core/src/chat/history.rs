//! Conversation history reads, deletes and single-message writes.

use std::sync::Arc;

use serde_json::Value;
use supportify_observe::{ScopedLogger, meta};
use supportify_types::chat::{
    CHAT_MESSAGES_COLLECTION, ChatMessage, HistoryFilter, StoredChatMessage,
};
use supportify_types::error::RepositoryError;

use crate::chat::persist::to_record;
use crate::store::{Filter, Order, Record, RecordStore};

/// Turns a [`HistoryFilter`] into store filters. Blank optional ids are
/// treated as absent.
pub fn history_filters(filter: &HistoryFilter) -> Vec<Filter> {
    let mut filters = vec![Filter::equals("user_id", filter.user_id.as_str())];
    for (field, value) in [("agent_id", &filter.agent_id), ("org_id", &filter.org_id)] {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            filters.push(Filter::equals(field, value));
        }
    }
    filters
}

/// Direct access to the `chat_messages` collection.
///
/// Unlike the relay pipeline, every failure here is returned to the caller
/// after being logged.
pub struct ConversationService<S> {
    store: Arc<S>,
    log: ScopedLogger,
}

impl<S: RecordStore> ConversationService<S> {
    /// `log` is the `conversations` logger; each operation adds its own scope.
    pub fn new(store: Arc<S>, log: ScopedLogger) -> Self {
        Self { store, log }
    }

    /// Messages for the filter, oldest first.
    pub async fn history(
        &self,
        filter: &HistoryFilter,
    ) -> Result<Vec<StoredChatMessage>, RepositoryError> {
        let log = self.log.scoped("getConversationHistory");
        let order = Order::asc("created_at");

        let records: Result<Vec<StoredChatMessage>, RepositoryError> = self
            .store
            .select(CHAT_MESSAGES_COLLECTION, &history_filters(filter), Some(&order))
            .await
            .and_then(|records| records.into_iter().map(from_record).collect());

        records.inspect_err(|e| {
            log.error_with(
                "query-failed",
                meta!({
                    "user_id": filter.user_id,
                    "agent_id": filter.agent_id,
                    "org_id": filter.org_id,
                    "error": e.to_string(),
                }),
            );
        })
    }

    /// Delete every message matching the filter. Returns how many were removed.
    pub async fn delete_history(&self, filter: &HistoryFilter) -> Result<u64, RepositoryError> {
        let log = self.log.scoped("deleteConversationHistory");
        let ids = meta!({
            "user_id": filter.user_id,
            "agent_id": filter.agent_id,
            "org_id": filter.org_id,
        });

        match self
            .store
            .delete(CHAT_MESSAGES_COLLECTION, &history_filters(filter))
            .await
        {
            Ok(deleted) => {
                let mut meta = ids;
                meta.insert("deleted".to_string(), Value::from(deleted));
                log.info_with("conversation-history-deleted", meta);
                Ok(deleted)
            }
            Err(e) => {
                let mut meta = ids;
                meta.insert("error".to_string(), Value::String(e.to_string()));
                log.error_with("delete-failed", meta);
                Err(e)
            }
        }
    }

    /// Store one message outside the relay flow.
    pub async fn create_message(
        &self,
        message: &ChatMessage,
    ) -> Result<StoredChatMessage, RepositoryError> {
        let log = self.log.scoped("createChatMessage");

        match self.insert_one(message).await {
            Ok(stored) => {
                log.info_with(
                    "chat-message-created",
                    meta!({
                        "chat_message_id": stored.id,
                        "role": stored.message.role,
                        "user_id": stored.message.user_id,
                    }),
                );
                Ok(stored)
            }
            Err(e) => {
                log.error_with(
                    "create-failed",
                    meta!({ "data": message, "error": e.to_string() }),
                );
                Err(e)
            }
        }
    }

    async fn insert_one(&self, message: &ChatMessage) -> Result<StoredChatMessage, RepositoryError> {
        let record = to_record(message)?;
        let mut stored = self
            .store
            .insert_many(CHAT_MESSAGES_COLLECTION, vec![record])
            .await?;
        let record = stored
            .pop()
            .ok_or_else(|| RepositoryError::Query("insert returned no record".to_string()))?;
        from_record(record)
    }
}

fn from_record(record: Record) -> Result<StoredChatMessage, RepositoryError> {
    serde_json::from_value(Value::Object(record)).map_err(|e| RepositoryError::Query(e.to_string()))
}
