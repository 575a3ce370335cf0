//! Observability for Supportify.
//!
//! - [`scoped::ScopedLogger`]: hierarchical, leveled, structured event emitter
//!   with start/end timing spans.
//! - [`settings::LogSettings`]: process-wide level allow-list and color switch,
//!   built once at startup and shared by every logger.
//! - [`sink`]: destinations for [`event::LogEvent`]s (tracing, line writer, memory).
//! - [`tracing_setup`]: global `tracing` subscriber with optional OTel export.

pub mod event;
pub mod scoped;
pub mod settings;
pub mod sink;
pub mod tracing_setup;

pub use event::{LogEvent, LogLevel, Meta};
pub use scoped::{ScopedLogger, Timer};
pub use settings::LogSettings;
pub use sink::{LineSink, LogSink, MemorySink, SinkError, TracingSink};

#[doc(hidden)]
pub use serde_json as __serde_json;

/// Build a [`Meta`] map from a JSON object literal.
///
/// ```
/// let user_id = "u1";
/// let meta = supportify_observe::meta!({ "user_id": user_id, "count": 2 });
/// assert_eq!(meta["count"], 2);
/// ```
///
/// Anything other than an object literal yields an empty map.
#[macro_export]
macro_rules! meta {
    () => {
        $crate::__serde_json::Map::new()
    };
    ($($json:tt)+) => {
        match $crate::__serde_json::json!($($json)+) {
            $crate::__serde_json::Value::Object(map) => map,
            _ => $crate::__serde_json::Map::new(),
        }
    };
}
