//! `supportify chat`: one turn from the command line.

use std::io::Write;

use anyhow::Result;
use console::style;

use supportify_types::chat::{ChatTurnRequest, CompletionResult};

use crate::state::AppState;

/// Relay `content` upstream and write the reply to `out`.
///
/// The reply is written as soon as it arrives; only then does this wait for
/// the turn's detached write, so the process does not exit mid-write.
pub async fn send_turn(
    state: &AppState,
    user: String,
    agent: String,
    org: String,
    content: String,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let request = ChatTurnRequest::new(content, user, agent, org)?;
    let result = state.relay.handle_turn(request).await?;

    print_reply(&result, json, out)?;
    out.flush()?;

    state.relay.persistence().flush().await;
    Ok(())
}

fn print_reply(result: &CompletionResult, json: bool, out: &mut impl Write) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(result)?)?;
    } else {
        writeln!(out)?;
        writeln!(
            out,
            "  {} {}",
            style(format!("{}:", result.agent_id)).cyan().bold(),
            result.content
        )?;
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlx::Connection;
    use sqlx::sqlite::SqliteConnection;
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use supportify_infra::backend::StoreBackend;
    use supportify_observe::{LogSettings, MemorySink, ScopedLogger};
    use supportify_types::config::AppConfig;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Records when the first byte was written.
    #[derive(Default)]
    struct StampedWriter {
        buf: Vec<u8>,
        first_write: Option<Instant>,
    }

    impl Write for StampedWriter {
        fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
            self.first_write.get_or_insert_with(Instant::now);
            self.buf.extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_reply_is_printed_before_stalled_write_resolves() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Hello!"}}]
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("chat.db").display());
        let store = StoreBackend::sqlite(&url).await.unwrap();

        // Another connection holds the write lock for the whole turn.
        let mut blocker = SqliteConnection::connect(&url).await.unwrap();
        sqlx::query("BEGIN EXCLUSIVE")
            .execute(&mut blocker)
            .await
            .unwrap();

        let sink = Arc::new(MemorySink::new());
        let log = ScopedLogger::root(Arc::new(LogSettings::default()), sink.clone());
        let mut config = AppConfig::default();
        config.upstream.base_url = server.uri();
        config.persistence.write_timeout_secs = 1;
        let state = AppState::from_parts(config, store, log, dir.path().to_path_buf()).unwrap();

        let mut out = StampedWriter::default();
        let started = Instant::now();
        send_turn(
            &state,
            "u1".to_string(),
            "a1".to_string(),
            "o1".to_string(),
            "Hi".to_string(),
            true,
            &mut out,
        )
        .await
        .unwrap();
        let finished = started.elapsed();

        let printed = out.first_write.unwrap().duration_since(started);
        assert!(printed < Duration::from_millis(500), "reply printed after {printed:?}");
        assert!(finished >= Duration::from_secs(1), "write was not awaited before exit");

        let output: serde_json::Value = serde_json::from_slice(&out.buf).unwrap();
        assert_eq!(output["content"], "Hello!");
        assert_eq!(sink.find("bulk-insert-failed").len(), 1);

        sqlx::query("ROLLBACK").execute(&mut blocker).await.unwrap();
    }

    #[tokio::test]
    async fn test_upstream_failure_prints_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let log = ScopedLogger::root(Arc::new(LogSettings::default()), Arc::new(MemorySink::new()));
        let mut config = AppConfig::default();
        config.upstream.base_url = server.uri();
        let state = AppState::from_parts(
            config,
            StoreBackend::memory(),
            log,
            std::path::PathBuf::from(".supportify-test"),
        )
        .unwrap();

        let mut out = StampedWriter::default();
        let err = send_turn(
            &state,
            "u1".to_string(),
            "a1".to_string(),
            "o1".to_string(),
            "Hi".to_string(),
            false,
            &mut out,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("internal error"));
        assert!(out.buf.is_empty());
    }
}
