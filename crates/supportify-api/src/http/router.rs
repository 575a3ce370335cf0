//! Axum router configuration for the REST API.
//!
//! Conversation routes are nested under `/api/v1`; `/healthcheck` sits at the
//! root. Unknown paths fall through to a JSON 404.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::error::AppError;
use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route(
            "/conversations",
            post(handlers::conversations::chat_completion),
        )
        .route(
            "/conversations/history",
            get(handlers::conversations::get_history)
                .delete(handlers::conversations::delete_history),
        )
        .route(
            "/conversations/messages",
            post(handlers::conversations::create_message),
        );

    Router::new()
        .route("/healthcheck", get(handlers::health::healthcheck))
        .nest("/api/v1", api_routes)
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use std::path::PathBuf;
    use std::sync::Arc;
    use supportify_core::store::RecordStore;
    use supportify_infra::backend::StoreBackend;
    use supportify_observe::{LogSettings, MemorySink, ScopedLogger};
    use supportify_types::chat::CHAT_MESSAGES_COLLECTION;
    use supportify_types::config::AppConfig;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BODY_LIMIT: usize = 1024 * 1024;

    fn test_state(upstream: &str) -> (AppState, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let log = ScopedLogger::root(Arc::new(LogSettings::default()), sink.clone());
        let mut config = AppConfig::default();
        config.upstream.base_url = upstream.to_string();
        config.upstream.timeout_secs = 5;

        let state = AppState::from_parts(
            config,
            StoreBackend::memory(),
            log,
            PathBuf::from(".supportify-test"),
        )
        .unwrap();
        (state, sink)
    }

    async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), BODY_LIMIT)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn turn_body(content: &str) -> Value {
        json!({"content": content, "user_id": "u1", "agent_id": "a1", "org_id": "o1"})
    }

    async fn upstream_replying(content: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": content}}]
            })))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_healthcheck() {
        let (state, _) = test_state("http://127.0.0.1:9");
        let (status, body) = send(&state, empty("GET", "/healthcheck")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(body["timestamp"].is_string());
        assert!(body["uptime"].as_f64().unwrap() >= 0.0);
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let (state, _) = test_state("http://127.0.0.1:9");
        let (status, body) = send(&state, empty("GET", "/api/v1/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"success": false, "message": "Not Found"}));
    }

    #[tokio::test]
    async fn test_chat_turn_returns_reply_and_persists_pair() {
        let server = upstream_replying("Hello!").await;
        let (state, sink) = test_state(&server.uri());

        let (status, body) = send(&state, post_json("/api/v1/conversations", turn_body("Hi"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(
            body["data"],
            json!({
                "content": "Hello!",
                "role": "assistant",
                "user_id": "u1",
                "agent_id": "a1",
                "org_id": "o1"
            })
        );

        state.relay.persistence().flush().await;

        let (status, body) = send(
            &state,
            empty("GET", "/api/v1/conversations/history?user_id=u1&agent_id=a1"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let messages = body["data"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "Hi");
        assert_eq!(messages[1]["role"], "assistant");
        assert!(messages[0]["id"].is_string());

        assert!(sink.messages().iter().any(|m| m == "end:process-chat-completion"));
    }

    #[tokio::test]
    async fn test_upstream_failure_maps_to_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;
        let (state, sink) = test_state(&server.uri());

        let (status, body) = send(&state, post_json("/api/v1/conversations", turn_body("Hi"))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("internal error"));
        assert_eq!(sink.find("request-failed").len(), 1);

        state.relay.persistence().flush().await;
        let stored = state
            .store
            .select(CHAT_MESSAGES_COLLECTION, &[], None)
            .await
            .unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn test_blank_content_is_rejected_without_upstream_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let (state, _) = test_state(&server.uri());

        let (status, body) =
            send(&state, post_json("/api/v1/conversations", turn_body("   "))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "field 'content' must not be empty");
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let (state, _) = test_state("http://127.0.0.1:9");
        let (status, body) = send(
            &state,
            post_json("/api/v1/conversations", json!({"content": "Hi"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_history_requires_user_id() {
        let (state, _) = test_state("http://127.0.0.1:9");
        let (status, _) = send(&state, empty("GET", "/api/v1/conversations/history")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            send(&state, empty("GET", "/api/v1/conversations/history?user_id=")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_message_then_delete_history() {
        let (state, _) = test_state("http://127.0.0.1:9");

        let (status, body) = send(
            &state,
            post_json(
                "/api/v1/conversations/messages",
                json!({
                    "content": "note",
                    "role": "user",
                    "user_id": "u1",
                    "agent_id": "a1",
                    "org_id": "o1"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["data"]["id"].is_string());
        assert_eq!(body["data"]["content"], "note");

        let (status, body) = send(
            &state,
            empty("DELETE", "/api/v1/conversations/history?user_id=u1"),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (_, body) =
            send(&state, empty("GET", "/api/v1/conversations/history?user_id=u1")).await;
        assert_eq!(body["data"], json!([]));
    }
}
