//! Upstream chat-completion request/reply types for Supportify.
//!
//! These types model the wire body sent to the external completion endpoint
//! and the typed failures a completion call can produce.

use serde::{Deserialize, Serialize};

use crate::chat::MessageRole;

/// Diagnostic text used when an upstream error body cannot be read.
pub const UNREADABLE_BODY: &str = "Could not read error response body";

/// A single message in an upstream completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

/// Body of `POST {base}/chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    #[serde(default)]
    pub stream: bool,
}

impl CompletionRequest {
    /// A non-streaming request carrying exactly one user message.
    pub fn single_user(content: &str, model: &str, temperature: f64, max_tokens: u32) -> Self {
        Self {
            messages: vec![Message {
                role: MessageRole::User,
                content: content.to_string(),
            }],
            model: model.to_string(),
            temperature,
            max_tokens,
            stream: false,
        }
    }
}

/// Validated assistant reply extracted from an upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReply {
    pub assistant_content: String,
}

/// Failures of one upstream completion call.
///
/// These are the only failures a turn surfaces to its caller.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Non-success status, or no response at all when `status` is `None`.
    #[error("upstream request failed: {} {status_text}. Details: {details}", status_label(.status))]
    Upstream {
        status: Option<u16>,
        status_text: String,
        details: String,
    },

    #[error("no choices in chat response")]
    EmptyCompletion,

    #[error("invalid assistant response: {0}")]
    MalformedResponse(String),
}

fn status_label(status: &Option<u16>) -> String {
    status.map_or_else(|| "-".to_string(), |s| s.to_string())
}

impl RelayError {
    /// Stable machine-readable code for transport layers.
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::Upstream { .. } => "UPSTREAM_ERROR",
            RelayError::EmptyCompletion => "EMPTY_COMPLETION",
            RelayError::MalformedResponse(_) => "MALFORMED_RESPONSE",
        }
    }
}
