//! Hierarchical, leveled, structured logger with timing spans.
//!
//! A [`ScopedLogger`] carries a `::`-separated scope path and default
//! metadata. Child loggers are built with [`ScopedLogger::scoped`]; building
//! one has no side effects. Every emission goes through the shared
//! [`LogSettings`] level filter and then to the shared [`LogSink`]. Sink
//! failures are discarded: a logging call never fails.
//!
//! Timing goes through [`ScopedLogger::start`] / [`Timer::end`], or better
//! through [`ScopedLogger::time`], which guarantees exactly one `end:` event
//! per `start:` event whatever the outcome.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::Value;

use crate::event::{LogEvent, LogLevel, Meta};
use crate::settings::LogSettings;
use crate::sink::LogSink;

/// Separator between scope segments.
pub const SCOPE_SEPARATOR: &str = "::";

/// Shallow merge; keys from `overlay` win.
fn merge(base: &Meta, overlay: Meta) -> Meta {
    let mut merged = base.clone();
    merged.extend(overlay);
    merged
}

/// Structured logger bound to a scope and default metadata.
///
/// Cheap to clone: all state is reference counted.
#[derive(Clone)]
pub struct ScopedLogger {
    scope: Arc<str>,
    defaults: Arc<Meta>,
    settings: Arc<LogSettings>,
    sink: Arc<dyn LogSink>,
}

impl fmt::Debug for ScopedLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedLogger")
            .field("scope", &self.scope)
            .field("defaults", &self.defaults)
            .field("settings", &self.settings)
            .finish()
    }
}

impl ScopedLogger {
    /// Unscoped logger with no default metadata.
    pub fn root(settings: Arc<LogSettings>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            scope: Arc::from(""),
            defaults: Arc::new(Meta::new()),
            settings,
            sink,
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn defaults(&self) -> &Meta {
        &self.defaults
    }

    pub fn settings(&self) -> &LogSettings {
        &self.settings
    }

    /// Child logger whose scope is `{self.scope}::{child}`.
    pub fn scoped(&self, child: &str) -> Self {
        self.child(child, None)
    }

    /// Child logger with extra default metadata (child keys win on conflict).
    pub fn scoped_with(&self, child: &str, meta: Meta) -> Self {
        self.child(child, Some(meta))
    }

    fn child(&self, child: &str, meta: Option<Meta>) -> Self {
        let scope: Arc<str> = if self.scope.is_empty() {
            Arc::from(child)
        } else if child.is_empty() {
            Arc::clone(&self.scope)
        } else {
            Arc::from(format!("{}{SCOPE_SEPARATOR}{child}", self.scope))
        };

        let defaults = match meta {
            Some(extra) => Arc::new(merge(&self.defaults, extra)),
            None => Arc::clone(&self.defaults),
        };

        Self {
            scope,
            defaults,
            settings: Arc::clone(&self.settings),
            sink: Arc::clone(&self.sink),
        }
    }

    /// Emit one event. Disabled levels return before any merging happens.
    pub fn log(&self, level: LogLevel, message: &str, meta: Option<Meta>) {
        if !self.settings.is_enabled(level) {
            return;
        }

        let meta = match meta {
            Some(meta) => merge(&self.defaults, meta),
            None => (*self.defaults).clone(),
        };

        let event = LogEvent {
            level,
            scope: self.scope.to_string(),
            message: message.to_string(),
            meta,
            timestamp: Utc::now(),
        };

        let _ = self.sink.emit(&event);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, None);
    }

    pub fn debug_with(&self, message: &str, meta: Meta) {
        self.log(LogLevel::Debug, message, Some(meta));
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, None);
    }

    pub fn info_with(&self, message: &str, meta: Meta) {
        self.log(LogLevel::Info, message, Some(meta));
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message, None);
    }

    pub fn warn_with(&self, message: &str, meta: Meta) {
        self.log(LogLevel::Warn, message, Some(meta));
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, None);
    }

    pub fn error_with(&self, message: &str, meta: Meta) {
        self.log(LogLevel::Error, message, Some(meta));
    }

    /// Emit `start:<action>` at debug level and return a running [`Timer`].
    pub fn start(&self, action: &str) -> Timer {
        self.start_inner(action, None)
    }

    pub fn start_with(&self, action: &str, meta: Meta) -> Timer {
        self.start_inner(action, Some(meta))
    }

    fn start_inner(&self, action: &str, meta: Option<Meta>) -> Timer {
        let started = Instant::now();
        self.log(LogLevel::Debug, &format!("start:{action}"), meta.clone());
        Timer {
            logger: self.clone(),
            action: action.to_string(),
            meta: meta.unwrap_or_default(),
            started,
            ended: false,
        }
    }

    /// Time one fallible operation.
    ///
    /// On `Ok` the `end:` event carries no extra metadata; on `Err(e)` it
    /// carries `{"error": e.to_string()}` and `e` is returned unchanged.
    pub async fn time<T, E, Fut>(&self, action: &str, fut: Fut) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.time_inner(action, None, fut).await
    }

    pub async fn time_with<T, E, Fut>(&self, action: &str, meta: Meta, fut: Fut) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.time_inner(action, Some(meta), fut).await
    }

    async fn time_inner<T, E, Fut>(
        &self,
        action: &str,
        meta: Option<Meta>,
        fut: Fut,
    ) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let timer = self.start_inner(action, meta);
        let outcome = fut.await;
        finish_timer(timer, &outcome);
        outcome
    }

    /// Synchronous counterpart of [`ScopedLogger::time`].
    pub fn time_sync<T, E, F>(&self, action: &str, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: fmt::Display,
    {
        let timer = self.start_inner(action, None);
        let outcome = f();
        finish_timer(timer, &outcome);
        outcome
    }
}

fn finish_timer<T, E: fmt::Display>(timer: Timer, outcome: &Result<T, E>) {
    match outcome {
        Ok(_) => timer.end(),
        Err(err) => {
            let mut extra = Meta::new();
            extra.insert("error".to_string(), Value::String(err.to_string()));
            timer.end_with(extra);
        }
    }
}

/// A running timing span created by [`ScopedLogger::start`].
///
/// `end` consumes the timer. A timer dropped without `end` (cancelled
/// future, early return, unwinding) emits its `end:` event from `Drop`
/// with `{"abandoned": true}`, so each `start:` has exactly one `end:`.
#[must_use = "a timer emits its end event when ended or dropped"]
pub struct Timer {
    logger: ScopedLogger,
    action: String,
    meta: Meta,
    started: Instant,
    ended: bool,
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("scope", &self.logger.scope())
            .field("action", &self.action)
            .field("elapsed_ms", &self.elapsed_ms())
            .finish()
    }
}

impl Timer {
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Fractional milliseconds since `start`.
    pub fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    /// Emit `end:<action>` at info level with `{duration_ms, ...meta}`.
    pub fn end(mut self) {
        self.finish(None);
    }

    /// Emit `end:<action>` with `{duration_ms, ...meta, ...extra}`.
    pub fn end_with(mut self, extra: Meta) {
        self.finish(Some(extra));
    }

    fn finish(&mut self, extra: Option<Meta>) {
        if self.ended {
            return;
        }
        self.ended = true;

        let mut meta = Meta::new();
        meta.insert("duration_ms".to_string(), Value::from(self.elapsed_ms()));
        meta.extend(std::mem::take(&mut self.meta));
        if let Some(extra) = extra {
            meta.extend(extra);
        }

        self.logger
            .log(LogLevel::Info, &format!("end:{}", self.action), Some(meta));
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if !self.ended {
            let mut extra = Meta::new();
            extra.insert("abandoned".to_string(), Value::Bool(true));
            self.finish(Some(extra));
        }
    }
}
