//! Detached, best-effort persistence of completed turns.
//!
//! The relay pipeline hands each successful turn to a [`PersistenceQueue`]
//! and returns to its caller without waiting. Every submission becomes one
//! tracked task that issues exactly one batched insert of
//! `[user, assistant]`, bounded by the write timeout. Failures stop at the
//! task boundary: they are logged with the turn's identifiers and dropped,
//! never retried.

use std::sync::Arc;
use std::time::Duration;

use supportify_observe::{ScopedLogger, meta};
use supportify_types::chat::{CHAT_MESSAGES_COLLECTION, ChatMessage};
use supportify_types::error::{PersistenceError, RepositoryError};
use tokio_util::task::TaskTracker;

use crate::store::{Record, RecordStore};

/// The two messages of one turn, always written together.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnBatch {
    pub user: ChatMessage,
    pub assistant: ChatMessage,
}

impl TurnBatch {
    pub fn new(user: ChatMessage, assistant: ChatMessage) -> Self {
        Self { user, assistant }
    }

    /// Records in insertion order: user first, then assistant.
    pub fn records(&self) -> Result<Vec<Record>, RepositoryError> {
        [&self.user, &self.assistant]
            .into_iter()
            .map(to_record)
            .collect()
    }

    fn failure(&self, source: RepositoryError) -> PersistenceError {
        PersistenceError {
            user_id: self.user.user_id.clone(),
            agent_id: self.user.agent_id.clone(),
            org_id: self.user.org_id.clone(),
            source,
        }
    }
}

pub(crate) fn to_record(message: &ChatMessage) -> Result<Record, RepositoryError> {
    match serde_json::to_value(message) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(RepositoryError::Query(format!(
            "chat message serialized to non-object: {other}"
        ))),
        Err(e) => Err(RepositoryError::Query(e.to_string())),
    }
}

/// Owner of every detached turn write.
///
/// Cloning shares the same store, tracker and logger.
pub struct PersistenceQueue<S> {
    store: Arc<S>,
    log: ScopedLogger,
    tracker: TaskTracker,
    write_timeout: Duration,
}

impl<S> Clone for PersistenceQueue<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            log: self.log.clone(),
            tracker: self.tracker.clone(),
            write_timeout: self.write_timeout,
        }
    }
}

impl<S: RecordStore + 'static> PersistenceQueue<S> {
    pub fn new(store: Arc<S>, log: ScopedLogger, write_timeout: Duration) -> Self {
        Self {
            store,
            log,
            tracker: TaskTracker::new(),
            write_timeout,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Spawn the batched write for `batch` and return immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, batch: TurnBatch) {
        let store = Arc::clone(&self.store);
        let log = self.log.clone();
        let write_timeout = self.write_timeout;

        self.tracker.spawn(async move {
            match persist_turn(store.as_ref(), &batch, write_timeout).await {
                Ok(count) => log.info_with(
                    "messages-stored",
                    meta!({
                        "user_id": batch.user.user_id,
                        "agent_id": batch.user.agent_id,
                        "count": count,
                    }),
                ),
                Err(err) => log.error_with(
                    "bulk-insert-failed",
                    meta!({
                        "user_id": err.user_id,
                        "agent_id": err.agent_id,
                        "org_id": err.org_id,
                        "error": err.source.to_string(),
                    }),
                ),
            }
        });
    }

    /// Number of writes still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every write submitted so far; the queue stays usable.
    pub async fn flush(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Close the queue and wait for in-flight writes.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

async fn persist_turn<S: RecordStore>(
    store: &S,
    batch: &TurnBatch,
    write_timeout: Duration,
) -> Result<usize, PersistenceError> {
    let records = batch.records().map_err(|e| batch.failure(e))?;
    let count = records.len();

    match tokio::time::timeout(
        write_timeout,
        store.insert_many(CHAT_MESSAGES_COLLECTION, records),
    )
    .await
    {
        Ok(Ok(_stored)) => Ok(count),
        Ok(Err(e)) => Err(batch.failure(e)),
        Err(_) => Err(batch.failure(RepositoryError::Timeout(write_timeout))),
    }
}
