//! Conversation handlers: relay a turn, read and clear history, store a
//! single message.
//!
//! Each handler times its whole operation on a route-scoped logger and logs
//! `request-failed` before mapping the error to a response.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde::Deserialize;

use supportify_observe::{ScopedLogger, meta};
use supportify_types::chat::{
    ChatMessage, ChatTurnRequest, CompletionResult, HistoryFilter, MessageRole,
    StoredChatMessage,
};
use supportify_types::error::ValidationError;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Body of `POST /api/v1/conversations`.
#[derive(Debug, Deserialize)]
pub struct ChatTurnBody {
    pub content: String,
    pub user_id: String,
    pub agent_id: String,
    pub org_id: String,
}

/// Body of `POST /api/v1/conversations/messages`.
#[derive(Debug, Deserialize)]
pub struct CreateMessageBody {
    pub content: String,
    pub role: MessageRole,
    pub user_id: String,
    pub agent_id: String,
    pub org_id: String,
}

fn route_log(state: &AppState, handler: &str) -> ScopedLogger {
    state.log.scoped("http::conversations").scoped(handler)
}

fn request_failed(log: &ScopedLogger, err: AppError) -> AppError {
    log.error_with("request-failed", meta!({ "error": err.message() }));
    err
}

/// POST /api/v1/conversations - Relay one chat turn upstream.
pub async fn chat_completion(
    State(state): State<AppState>,
    body: Result<Json<ChatTurnBody>, JsonRejection>,
) -> Result<Json<ApiResponse<CompletionResult>>, AppError> {
    let log = route_log(&state, "chatCompletion");
    let Json(body) = body.map_err(|e| request_failed(&log, e.into()))?;

    let request = ChatTurnRequest::new(body.content, body.user_id, body.agent_id, body.org_id)
        .map_err(|e| request_failed(&log, e.into()))?;

    let result = log
        .time("process-chat-completion", state.relay.handle_turn(request))
        .await
        .map_err(|e| request_failed(&log, e.into()))?;

    Ok(Json(ApiResponse::ok(result)))
}

/// GET /api/v1/conversations/history - Messages for a user, oldest first.
pub async fn get_history(
    State(state): State<AppState>,
    query: Result<Query<HistoryFilter>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<StoredChatMessage>>>, AppError> {
    let log = route_log(&state, "getConversationHistory");
    let Query(filter) = query.map_err(|e| request_failed(&log, e.into()))?;
    require_user(&filter).map_err(|e| request_failed(&log, e))?;

    let messages = log
        .time(
            "fetch-conversation-history",
            state.conversations.history(&filter),
        )
        .await
        .map_err(|e| request_failed(&log, e.into()))?;

    Ok(Json(ApiResponse::ok(messages)))
}

/// DELETE /api/v1/conversations/history - Remove a user's messages.
pub async fn delete_history(
    State(state): State<AppState>,
    query: Result<Query<HistoryFilter>, QueryRejection>,
) -> Result<StatusCode, AppError> {
    let log = route_log(&state, "deleteConversationHistory");
    let Query(filter) = query.map_err(|e| request_failed(&log, e.into()))?;
    require_user(&filter).map_err(|e| request_failed(&log, e))?;

    log.time(
        "delete-conversation-history",
        state.conversations.delete_history(&filter),
    )
    .await
    .map_err(|e| request_failed(&log, e.into()))?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/conversations/messages - Store one message directly.
pub async fn create_message(
    State(state): State<AppState>,
    body: Result<Json<CreateMessageBody>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<StoredChatMessage>>), AppError> {
    let log = route_log(&state, "createChatMessage");
    let Json(body) = body.map_err(|e| request_failed(&log, e.into()))?;

    if body.content.trim().is_empty() {
        return Err(request_failed(&log, ValidationError::EmptyField("content").into()));
    }
    if body.user_id.trim().is_empty() {
        return Err(request_failed(&log, ValidationError::EmptyField("user_id").into()));
    }

    let message = ChatMessage {
        content: body.content,
        role: body.role,
        user_id: body.user_id,
        agent_id: body.agent_id,
        org_id: body.org_id,
        created_at: Utc::now(),
    };

    let stored = log
        .time("create-chat-message", state.conversations.create_message(&message))
        .await
        .map_err(|e| request_failed(&log, e.into()))?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(stored))))
}

fn require_user(filter: &HistoryFilter) -> Result<(), AppError> {
    if filter.user_id.trim().is_empty() {
        return Err(ValidationError::EmptyField("user_id").into());
    }
    Ok(())
}
