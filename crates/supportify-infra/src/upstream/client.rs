//! HTTP client for the third-party chat-completion service.
//!
//! Sends `POST {base_url}/chat/completions?agent_id=<id>` with a single user
//! message and validates the reply. One request per call, no retries. The
//! error body of a failed call is captured as text whatever its shape.

use std::time::Duration;

use serde_json::Value;
use supportify_core::completion::{CompletionProvider, validate_completion};
use supportify_observe::{ScopedLogger, meta};
use supportify_types::config::UpstreamConfig;
use supportify_types::llm::{CompletionReply, CompletionRequest, RelayError, UNREADABLE_BODY};

/// reqwest-backed [`CompletionProvider`].
pub struct HttpCompletionClient {
    client: reqwest::Client,
    config: UpstreamConfig,
    log: ScopedLogger,
}

impl HttpCompletionClient {
    /// Build a client whose every call is bounded by `config.timeout_secs`.
    ///
    /// `log` receives the upstream events (`third-party-api-failed`,
    /// `received-chat-response`, validation failures).
    pub fn new(config: UpstreamConfig, log: ScopedLogger) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            log,
        })
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

/// Diagnostic text of a failed response, or the sentinel when the body
/// could not be read.
fn error_details<E>(body: Result<String, E>) -> String {
    body.unwrap_or_else(|_| UNREADABLE_BODY.to_string())
}

fn transport_failure(err: &reqwest::Error) -> &'static str {
    if err.is_timeout() {
        "request timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request failed"
    }
}

impl CompletionProvider for HttpCompletionClient {
    fn name(&self) -> &str {
        "third-party"
    }

    async fn complete(&self, agent_id: &str, content: &str) -> Result<CompletionReply, RelayError> {
        let url = self.url();
        let body = CompletionRequest::single_user(
            content,
            &self.config.model,
            self.config.temperature,
            self.config.max_tokens,
        );

        let response = match self
            .client
            .post(&url)
            .query(&[("agent_id", agent_id)])
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                let status_text = transport_failure(&err);
                self.log.error_with(
                    "third-party-api-failed",
                    meta!({
                        "status_text": status_text,
                        "agent_id": agent_id,
                        "error_details": err.to_string(),
                        "request_url": url,
                    }),
                );
                return Err(RelayError::Upstream {
                    status: None,
                    status_text: status_text.to_string(),
                    details: err.to_string(),
                });
            }
        };

        let status = response.status();
        if !status.is_success() {
            let details = error_details(response.text().await);
            let status_text = status.canonical_reason().unwrap_or_default().to_string();

            self.log.error_with(
                "third-party-api-failed",
                meta!({
                    "status": status.as_u16(),
                    "status_text": status_text,
                    "agent_id": agent_id,
                    "error_details": details,
                    "request_url": url,
                    "request_body": body,
                }),
            );
            return Err(RelayError::Upstream {
                status: Some(status.as_u16()),
                status_text,
                details,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| RelayError::MalformedResponse(format!("unreadable response body: {e}")))?;
        let parsed: Value = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.log.error_with(
                    "invalid-assistant-response",
                    meta!({ "agent_id": agent_id, "body": text, "error": e.to_string() }),
                );
                return Err(RelayError::MalformedResponse(format!(
                    "response is not JSON: {e}"
                )));
            }
        };

        self.log.debug_with(
            "received-chat-response",
            meta!({ "response": parsed, "agent_id": agent_id }),
        );

        validate_completion(&self.log, &parsed, agent_id)
    }
}
