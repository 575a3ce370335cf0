//! CompletionProvider trait definition.

use supportify_types::llm::{CompletionReply, RelayError};

/// One opaque upstream chat-completion endpoint.
///
/// Implementations live in supportify-infra (e.g., `HttpCompletionClient`).
/// A call issues exactly one upstream request; implementations never retry.
pub trait CompletionProvider: Send + Sync {
    /// Human-readable provider name, used in log metadata.
    fn name(&self) -> &str;

    /// Send `content` as a single user message on behalf of `agent_id` and
    /// return the validated assistant reply.
    fn complete(
        &self,
        agent_id: &str,
        content: &str,
    ) -> impl std::future::Future<Output = Result<CompletionReply, RelayError>> + Send;
}
