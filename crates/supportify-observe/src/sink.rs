//! Destinations for [`LogEvent`]s.
//!
//! A sink may fail; [`ScopedLogger`](crate::scoped::ScopedLogger) discards
//! those failures so logging never aborts business logic.

use std::io::Write;
use std::sync::Mutex;

use thiserror::Error;

use crate::event::{LogEvent, LogLevel};

/// Errors a sink may report. Callers of the logger never see these.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink lock poisoned")]
    Poisoned,
}

/// Receives every event that passes the level filter.
pub trait LogSink: Send + Sync {
    fn emit(&self, event: &LogEvent) -> Result<(), SinkError>;
}

/// Render one event as a single line:
/// `{color}LEVEL [timestamp] (scope) -> message{reset} {meta}`.
///
/// The scope part is omitted for the root logger and the metadata part when empty.
pub fn format_line(event: &LogEvent, color: bool) -> String {
    let scope = if event.scope.is_empty() {
        String::new()
    } else {
        format!(" ({})", event.scope)
    };

    let head = format!(
        "{} [{}]{scope} -> {}",
        event.level.label(),
        event.timestamp_iso(),
        event.message,
    );
    let mut line = if color {
        event.level.style().apply_to(head).to_string()
    } else {
        head
    };

    if !event.meta.is_empty() {
        line.push(' ');
        line.push_str(&serde_json::Value::Object(event.meta.clone()).to_string());
    }

    line
}

/// Writes one rendered line per event.
pub struct LineSink<W: Write + Send> {
    writer: Mutex<W>,
    color: bool,
}

impl<W: Write + Send> LineSink<W> {
    pub fn new(writer: W, color: bool) -> Self {
        Self {
            writer: Mutex::new(writer),
            color,
        }
    }

    /// Consume the sink and return the underlying writer.
    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer.into_inner().map_err(|_| SinkError::Poisoned)
    }
}

impl LineSink<std::io::Stdout> {
    pub fn stdout(color: bool) -> Self {
        Self::new(std::io::stdout(), color)
    }
}

impl<W: Write + Send> LogSink for LineSink<W> {
    fn emit(&self, event: &LogEvent) -> Result<(), SinkError> {
        let line = format_line(event, self.color);
        let mut writer = self.writer.lock().map_err(|_| SinkError::Poisoned)?;
        writeln!(writer, "{line}")?;
        Ok(())
    }
}

/// Forwards events into `tracing`, so the installed subscriber formats them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, event: &LogEvent) -> Result<(), SinkError> {
        let scope = event.scope.as_str();
        let meta = serde_json::Value::Object(event.meta.clone());
        let message = event.message.as_str();

        match event.level {
            LogLevel::Debug => tracing::debug!(scope, %meta, "{message}"),
            LogLevel::Info => tracing::info!(scope, %meta, "{message}"),
            LogLevel::Warn => tracing::warn!(scope, %meta, "{message}"),
            LogLevel::Error => tracing::error!(scope, %meta, "{message}"),
        }

        Ok(())
    }
}

/// Keeps every event in memory. Used by tests to assert on emitted events.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LogEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events so far, in emission order.
    pub fn events(&self) -> Vec<LogEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Events whose message equals `message`.
    pub fn find(&self, message: &str) -> Vec<LogEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.message == message)
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.message).collect()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, event: &LogEvent) -> Result<(), SinkError> {
        self.events
            .lock()
            .map_err(|_| SinkError::Poisoned)?
            .push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Meta;
    use chrono::{DateTime, Utc};

    fn event(level: LogLevel, scope: &str, meta: Meta) -> LogEvent {
        LogEvent {
            level,
            scope: scope.to_string(),
            message: "chat-message-created".to_string(),
            meta,
            timestamp: DateTime::parse_from_rfc3339("2025-01-02T03:04:05.006Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn test_format_line_plain() {
        let line = format_line(
            &event(LogLevel::Info, "conversations", crate::meta!({"role": "user"})),
            false,
        );
        assert_eq!(
            line,
            r#"INFO [2025-01-02T03:04:05.006Z] (conversations) -> chat-message-created {"role":"user"}"#
        );
    }

    #[test]
    fn test_format_line_root_without_meta() {
        let line = format_line(&event(LogLevel::Warn, "", Meta::new()), false);
        assert_eq!(line, "WARN [2025-01-02T03:04:05.006Z] -> chat-message-created");
    }

    #[test]
    fn test_format_line_colored() {
        let colored = format_line(
            &event(LogLevel::Error, "x", crate::meta!({"k": 1})),
            true,
        );
        let plain = format_line(
            &event(LogLevel::Error, "x", crate::meta!({"k": 1})),
            false,
        );
        assert_ne!(colored, plain);
        assert_eq!(console::strip_ansi_codes(&colored), plain);
        assert!(colored.ends_with(r#" {"k":1}"#), "metadata stays unstyled");
    }

    #[test]
    fn test_line_sink_writes_one_line_per_event() {
        let sink = LineSink::new(Vec::new(), false);
        sink.emit(&event(LogLevel::Debug, "a", Meta::new())).unwrap();
        sink.emit(&event(LogLevel::Info, "a::b", Meta::new())).unwrap();

        let written = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("(a::b)"));
    }

    #[test]
    fn test_memory_sink_find() {
        let sink = MemorySink::new();
        sink.emit(&event(LogLevel::Info, "a", Meta::new())).unwrap();
        assert_eq!(sink.find("chat-message-created").len(), 1);
        assert!(sink.find("other").is_empty());
    }
}
