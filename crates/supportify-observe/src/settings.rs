//! Process-wide logger settings.
//!
//! Built once at startup and shared by `Arc` with every [`ScopedLogger`],
//! never mutated afterwards.
//!
//! [`ScopedLogger`]: crate::scoped::ScopedLogger

use crate::event::LogLevel;

/// Env var holding a comma-separated allow-list of levels, e.g. `info,warn,error`.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Env var naming the deployment environment; `production` disables colors.
pub const APP_ENV_ENV: &str = "APP_ENV";

/// Consulted when [`APP_ENV_ENV`] is unset or blank.
pub const NODE_ENV_ENV: &str = "NODE_ENV";

const ALL_LEVELS: u8 = 0b1111;

/// Level allow-list and color switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings {
    enabled: u8,
    color: bool,
}

impl Default for LogSettings {
    /// All levels enabled, colors off.
    fn default() -> Self {
        Self {
            enabled: ALL_LEVELS,
            color: false,
        }
    }
}

impl LogSettings {
    /// Settings with an explicit allow-list. `None` enables every level.
    pub fn new(levels: Option<&[LogLevel]>, color: bool) -> Self {
        let enabled = match levels {
            Some(levels) => levels.iter().fold(0, |acc, l| acc | l.bit()),
            None => ALL_LEVELS,
        };
        Self { enabled, color }
    }

    /// Read [`LOG_LEVEL_ENV`], [`APP_ENV_ENV`] and [`NODE_ENV_ENV`] from the
    /// process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    ///
    /// - An unset or blank `LOG_LEVEL` enables every level.
    /// - Otherwise only the listed levels are enabled; unknown names are ignored.
    /// - Colors are on unless the environment is `production`, taken from
    ///   `APP_ENV`, or from `NODE_ENV` when `APP_ENV` is unset or blank.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let enabled = match lookup(LOG_LEVEL_ENV) {
            Some(raw) if !raw.trim().is_empty() => parse_levels(&raw),
            _ => ALL_LEVELS,
        };

        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let color = non_blank(APP_ENV_ENV)
            .or_else(|| non_blank(NODE_ENV_ENV))
            .map(|env| env.trim().to_lowercase() != "production")
            .unwrap_or(true);

        Self { enabled, color }
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.enabled & level.bit() != 0
    }

    pub fn color(&self) -> bool {
        self.color
    }

    /// Enabled levels in ascending severity.
    pub fn enabled_levels(&self) -> Vec<LogLevel> {
        LogLevel::ALL
            .into_iter()
            .filter(|l| self.is_enabled(*l))
            .collect()
    }
}

fn parse_levels(raw: &str) -> u8 {
    raw.split(',')
        .filter_map(|part| part.parse::<LogLevel>().ok())
        .fold(0, |acc, l| acc | l.bit())
}
