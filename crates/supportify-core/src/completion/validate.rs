//! Validation of a successful upstream chat-completion body.
//!
//! The upstream is only trusted to answer with *some* JSON. A usable reply
//! needs a non-empty `choices` array whose first element carries a
//! `message.content` string that is not blank once trimmed.

use serde_json::Value;
use supportify_observe::{ScopedLogger, meta};
use supportify_types::llm::{CompletionReply, RelayError};

/// Extract the assistant content from a parsed upstream response.
///
/// Missing, null or empty `choices` is an [`RelayError::EmptyCompletion`];
/// everything else that does not yield non-blank content is a
/// [`RelayError::MalformedResponse`]. Both outcomes are logged at error
/// level with the full response. The returned content is not trimmed.
pub fn validate_completion(
    log: &ScopedLogger,
    response: &Value,
    agent_id: &str,
) -> Result<CompletionReply, RelayError> {
    let choices = match response.get("choices") {
        None | Some(Value::Null) => &[][..],
        Some(Value::Array(choices)) => choices.as_slice(),
        Some(other) => {
            log.error_with(
                "invalid-assistant-response",
                meta!({ "response": response, "agent_id": agent_id }),
            );
            return Err(RelayError::MalformedResponse(format!(
                "choices is not an array: {other}"
            )));
        }
    };

    let Some(choice) = choices.first() else {
        log.error_with(
            "no-choices-in-response",
            meta!({ "response": response, "agent_id": agent_id }),
        );
        return Err(RelayError::EmptyCompletion);
    };

    let content = choice.pointer("/message/content");
    match content.and_then(Value::as_str) {
        Some(text) if !text.trim().is_empty() => Ok(CompletionReply {
            assistant_content: text.to_string(),
        }),
        _ => {
            log.error_with(
                "invalid-assistant-response",
                meta!({
                    "response": response,
                    "choice": choice,
                    "agent_id": agent_id,
                    "assistant_content": content,
                }),
            );
            Err(RelayError::MalformedResponse(
                "empty or missing assistant content".to_string(),
            ))
        }
    }
}
