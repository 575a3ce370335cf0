//! Test doubles for the completion and storage ports.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde_json::Value;
use supportify_observe::{LogSettings, MemorySink, ScopedLogger};
use supportify_types::chat::{ChatMessage, ChatTurnRequest, CompletionResult};
use supportify_types::error::RepositoryError;
use supportify_types::llm::{CompletionReply, RelayError};

use crate::chat::persist::TurnBatch;
use crate::completion::{CompletionProvider, validate_completion};
use crate::store::{Direction, Filter, Order, RECORD_ID_FIELD, Record, RecordStore};

pub(crate) fn logger() -> (ScopedLogger, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let log = ScopedLogger::root(Arc::new(LogSettings::default()), sink.clone())
        .scoped("conversations")
        .scoped("processChatCompletion");
    (log, sink)
}

pub(crate) fn turn(content: &str) -> ChatTurnRequest {
    ChatTurnRequest::new(content, "u1", "a1", "o1").unwrap()
}

pub(crate) fn turn_batch(user: &str, assistant: &str) -> TurnBatch {
    let request = turn(user);
    let at = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
    TurnBatch::new(
        ChatMessage::user(&request, at),
        ChatMessage::assistant(&CompletionResult::from_turn(&request, assistant.to_string()), at),
    )
}

type Outcome = Box<dyn Fn(&str) -> Result<CompletionReply, RelayError> + Send + Sync>;

/// Provider whose reply is fixed up front; records every call.
pub(crate) struct FakeProvider {
    outcome: Outcome,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeProvider {
    fn with(outcome: Outcome) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn replying(content: &str) -> Self {
        let content = content.to_string();
        Self::with(Box::new(move |_| {
            Ok(CompletionReply {
                assistant_content: content.clone(),
            })
        }))
    }

    /// Runs the real reply validation against a canned upstream body.
    pub(crate) fn responding(body: Value, log: ScopedLogger) -> Self {
        Self::with(Box::new(move |agent_id| validate_completion(&log, &body, agent_id)))
    }

    pub(crate) fn failing(status: u16, details: &str) -> Self {
        let details = details.to_string();
        Self::with(Box::new(move |_| {
            Err(RelayError::Upstream {
                status: Some(status),
                status_text: "Internal Server Error".to_string(),
                details: details.clone(),
            })
        }))
    }

    pub(crate) fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl CompletionProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, agent_id: &str, content: &str) -> Result<CompletionReply, RelayError> {
        self.calls
            .lock()
            .unwrap()
            .push((agent_id.to_string(), content.to_string()));
        (self.outcome)(agent_id)
    }
}

/// In-memory store that records every insert batch and can be told to fail
/// or stall.
#[derive(Default)]
pub(crate) struct RecordingStore {
    rows: Mutex<Vec<Record>>,
    inserts: Mutex<Vec<(String, Vec<Record>)>>,
    failure: Option<String>,
    delay: Option<Duration>,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn insert_calls(&self) -> Vec<(String, Vec<Record>)> {
        self.inserts.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), RepositoryError> {
        match &self.failure {
            Some(message) => Err(RepositoryError::Query(message.clone())),
            None => Ok(()),
        }
    }
}

impl RecordStore for RecordingStore {
    async fn insert_many(
        &self,
        collection: &str,
        records: Vec<Record>,
    ) -> Result<Vec<Record>, RepositoryError> {
        self.inserts
            .lock()
            .unwrap()
            .push((collection.to_string(), records.clone()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.check()?;

        let mut rows = self.rows.lock().unwrap();
        let stored: Vec<Record> = records
            .into_iter()
            .map(|mut record| {
                let id = format!("rec-{}", rows.len() + 1);
                record.insert(RECORD_ID_FIELD.to_string(), Value::String(id));
                rows.push(record.clone());
                record
            })
            .collect();
        Ok(stored)
    }

    async fn select(
        &self,
        _collection: &str,
        filters: &[Filter],
        order: Option<&Order>,
    ) -> Result<Vec<Record>, RepositoryError> {
        self.check()?;
        let mut matched: Vec<Record> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| filters.iter().all(|f| f.matches(row)))
            .cloned()
            .collect();
        if let Some(order) = order {
            matched.sort_by(|a, b| {
                let a = a.get(&order.field).and_then(Value::as_str).unwrap_or_default();
                let b = b.get(&order.field).and_then(Value::as_str).unwrap_or_default();
                match order.direction {
                    Direction::Ascending => a.cmp(b),
                    Direction::Descending => b.cmp(a),
                }
            });
        }
        Ok(matched)
    }

    async fn update(
        &self,
        _collection: &str,
        _filters: &[Filter],
        _patch: Record,
    ) -> Result<u64, RepositoryError> {
        self.check()?;
        Ok(0)
    }

    async fn delete(&self, _collection: &str, filters: &[Filter]) -> Result<u64, RepositoryError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|row| !filters.iter().all(|f| f.matches(row)));
        Ok((before - rows.len()) as u64)
    }
}
