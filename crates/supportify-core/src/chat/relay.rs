//! ChatRelayPipeline: one user turn from validated input to caller-visible
//! result, with storage isolated behind the [`PersistenceQueue`].
//!
//! Per turn the states run strictly in order:
//! received, upstream called, upstream failed (returned to the caller) or
//! upstream succeeded, response returned, and only then the detached
//! persistence attempt. Nothing is retried and a failed turn writes nothing.

use chrono::Utc;
use supportify_observe::{ScopedLogger, meta};
use supportify_types::chat::{ChatMessage, ChatTurnRequest, CompletionResult};
use supportify_types::llm::RelayError;

use crate::chat::persist::{PersistenceQueue, TurnBatch};
use crate::completion::CompletionProvider;
use crate::store::RecordStore;

/// Scope of every event emitted for a turn.
pub const RELAY_SCOPE: &str = "conversations::processChatCompletion";

/// Orchestrates chat turns.
///
/// Generic over the completion and storage ports so supportify-core never
/// depends on supportify-infra.
pub struct ChatRelayPipeline<P, S> {
    provider: P,
    persistence: PersistenceQueue<S>,
    log: ScopedLogger,
}

impl<P: CompletionProvider, S: RecordStore + 'static> ChatRelayPipeline<P, S> {
    /// `log` should already be scoped to [`RELAY_SCOPE`].
    pub fn new(provider: P, persistence: PersistenceQueue<S>, log: ScopedLogger) -> Self {
        Self {
            provider,
            persistence,
            log,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn persistence(&self) -> &PersistenceQueue<S> {
        &self.persistence
    }

    /// Relay one turn upstream and return the assistant reply.
    ///
    /// Only upstream-facing failures are returned. The message pair is handed
    /// to the persistence queue after the reply is built and is never awaited
    /// here; storage problems show up in the log only.
    pub async fn handle_turn(
        &self,
        request: ChatTurnRequest,
    ) -> Result<CompletionResult, RelayError> {
        let received_at = Utc::now();

        let upstream = self
            .log
            .time_with(
                "third-party-chat-completion",
                meta!({ "agent_id": request.agent_id(), "provider": self.provider.name() }),
                self.provider.complete(request.agent_id(), request.content()),
            )
            .await;

        let reply = match upstream {
            Ok(reply) => reply,
            Err(err) => {
                self.log.error_with(
                    "chat-completion-failed",
                    meta!({
                        "user_id": request.user_id(),
                        "agent_id": request.agent_id(),
                        "org_id": request.org_id(),
                        "code": err.code(),
                        "error": err.to_string(),
                    }),
                );
                return Err(err);
            }
        };

        let result = CompletionResult::from_turn(&request, reply.assistant_content);

        // Wall clock can step backwards; the pair must still read in order.
        let replied_at = Utc::now().max(received_at);
        let batch = TurnBatch::new(
            ChatMessage::user(&request, received_at),
            ChatMessage::assistant(&result, replied_at),
        );
        self.persistence.submit(batch);

        Ok(result)
    }
}
