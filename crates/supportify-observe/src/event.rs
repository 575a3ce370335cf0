//! Log event and level types.

use chrono::{DateTime, SecondsFormat, Utc};
use console::Style;
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Open key-value metadata attached to an event.
pub type Meta = serde_json::Map<String, serde_json::Value>;

/// Severity of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const ALL: [LogLevel; 4] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    /// Upper-case label used in rendered lines.
    pub fn label(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Terminal style for this level. Forced on: callers decide whether to
    /// color at all from [`LogSettings`](crate::settings::LogSettings).
    pub fn style(self) -> Style {
        let style = Style::new().force_styling(true);
        match self {
            LogLevel::Debug => style.cyan(),
            LogLevel::Info => style.green(),
            LogLevel::Warn => style.yellow(),
            LogLevel::Error => style.red(),
        }
    }

    pub(crate) fn bit(self) -> u8 {
        match self {
            LogLevel::Debug => 1,
            LogLevel::Info => 1 << 1,
            LogLevel::Warn => 1 << 2,
            LogLevel::Error => 1 << 3,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("invalid log level: '{other}'")),
        }
    }
}

/// One structured event. Write-only: never read back by the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEvent {
    pub level: LogLevel,
    /// `::`-separated scope path; empty for the root logger.
    pub scope: String,
    pub message: String,
    pub meta: Meta,
    pub timestamp: DateTime<Utc>,
}

impl LogEvent {
    /// ISO-8601 timestamp with millisecond precision, e.g. `2025-01-01T00:00:00.000Z`.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parse_is_lenient() {
        assert_eq!(" INFO ".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("Warn".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_log_level_bits_are_distinct() {
        let mask = LogLevel::ALL.iter().fold(0u8, |acc, l| acc | l.bit());
        assert_eq!(mask, 0b1111);
    }

    #[test]
    fn test_timestamp_iso_format() {
        let event = LogEvent {
            level: LogLevel::Info,
            scope: String::new(),
            message: "x".to_string(),
            meta: Meta::new(),
            timestamp: DateTime::parse_from_rfc3339("2025-03-04T05:06:07.089Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        assert_eq!(event.timestamp_iso(), "2025-03-04T05:06:07.089Z");
    }
}
