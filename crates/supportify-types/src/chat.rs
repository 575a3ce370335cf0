//! Chat turn, message, and history filter types for Supportify.
//!
//! A turn is one user message plus the one assistant reply it elicits.
//! Both sides are persisted as [`ChatMessage`] records in the
//! [`CHAT_MESSAGES_COLLECTION`] collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Record-store collection holding persisted chat messages.
pub const CHAT_MESSAGES_COLLECTION: &str = "chat_messages";

/// Author of a persisted chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// One validated user turn, immutable once constructed.
///
/// `content` is stored trimmed and is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTurnRequest {
    content: String,
    user_id: String,
    agent_id: String,
    org_id: String,
}

impl ChatTurnRequest {
    /// Validate and build a turn request.
    ///
    /// Trims `content`; rejects blank content and blank identifiers.
    pub fn new(
        content: impl Into<String>,
        user_id: impl Into<String>,
        agent_id: impl Into<String>,
        org_id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let content = content.into().trim().to_string();
        if content.is_empty() {
            return Err(ValidationError::EmptyField("content"));
        }

        let user_id = required(user_id.into(), "user_id")?;
        let agent_id = required(agent_id.into(), "agent_id")?;
        let org_id = required(org_id.into(), "org_id")?;

        Ok(Self {
            content,
            user_id,
            agent_id,
            org_id,
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn org_id(&self) -> &str {
        &self.org_id
    }
}

fn required(value: String, field: &'static str) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(value)
    }
}

/// A persisted chat message; two are produced per successful turn.
///
/// `created_at` serializes as fixed-width RFC 3339 with microseconds so that
/// stores ordering by the raw string order chronologically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub content: String,
    pub role: MessageRole,
    pub user_id: String,
    pub agent_id: String,
    pub org_id: String,
    #[serde(with = "sortable_timestamp")]
    pub created_at: DateTime<Utc>,
}

mod sortable_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

impl ChatMessage {
    /// Build the user side of a turn, stamped with `created_at`.
    pub fn user(request: &ChatTurnRequest, created_at: DateTime<Utc>) -> Self {
        Self {
            content: request.content.clone(),
            role: MessageRole::User,
            user_id: request.user_id.clone(),
            agent_id: request.agent_id.clone(),
            org_id: request.org_id.clone(),
            created_at,
        }
    }

    /// Build the assistant side of a turn from the caller-facing result.
    pub fn assistant(result: &CompletionResult, created_at: DateTime<Utc>) -> Self {
        Self {
            content: result.content.clone(),
            role: MessageRole::Assistant,
            user_id: result.user_id.clone(),
            agent_id: result.agent_id.clone(),
            org_id: result.org_id.clone(),
            created_at,
        }
    }
}

/// Assistant reply handed back to the caller. Not persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResult {
    pub content: String,
    pub role: MessageRole,
    pub user_id: String,
    pub agent_id: String,
    pub org_id: String,
}

impl CompletionResult {
    pub fn from_turn(request: &ChatTurnRequest, content: String) -> Self {
        Self {
            content,
            role: MessageRole::Assistant,
            user_id: request.user_id.clone(),
            agent_id: request.agent_id.clone(),
            org_id: request.org_id.clone(),
        }
    }
}

/// A [`ChatMessage`] as read back from the record store, with the
/// store-assigned identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChatMessage {
    pub id: String,
    #[serde(flatten)]
    pub message: ChatMessage,
}

/// Selection of persisted messages for history reads and deletes.
///
/// `user_id` is always required; `agent_id` and `org_id` narrow the selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryFilter {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
}

impl HistoryFilter {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            agent_id: None,
            org_id: None,
        }
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_org(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }
}
