//! Structured run-event logging port.
//!
//! Every engine component reports through a [`Logger`]: an event name plus a
//! JSON object of fields. Loggers can be bound to extra context (the run id,
//! for example) so that downstream code never has to thread it manually.
//! Implementations live in `webpost-infra` (tracing console output, per-run
//! log store, fan-out composite).

use std::sync::Arc;

use serde_json::{Map, Value};
use webpost_types::step::LogLevel;

/// Sink for structured run events.
///
/// Dyn-compatible so it can be shared as `Arc<dyn Logger>` across handlers,
/// enrichers and background tasks.
pub trait Logger: Send + Sync {
    /// Record one event.
    fn emit(&self, level: LogLevel, event: &str, fields: Map<String, Value>);

    /// Return a logger whose events always carry `fields`.
    ///
    /// Bound fields are merged underneath the per-event fields, so an event
    /// can still override a bound key.
    fn bind(&self, fields: Map<String, Value>) -> Arc<dyn Logger>;

    fn debug(&self, event: &str, fields: Value) {
        self.emit(LogLevel::Debug, event, into_fields(fields));
    }

    fn info(&self, event: &str, fields: Value) {
        self.emit(LogLevel::Info, event, into_fields(fields));
    }

    fn error(&self, event: &str, fields: Value) {
        self.emit(LogLevel::Error, event, into_fields(fields));
    }
}

/// Coerce an arbitrary JSON value into an event field map.
///
/// Objects pass through, `null` becomes empty, anything else is wrapped as
/// `{"value": ...}`.
pub fn into_fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

/// Merge `overlay` on top of `base` (overlay wins on key collisions).
pub fn merge_fields(base: &Map<String, Value>, overlay: Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();
    merged.extend(overlay);
    merged
}

/// Logger that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn emit(&self, _level: LogLevel, _event: &str, _fields: Map<String, Value>) {}

    fn bind(&self, _fields: Map<String, Value>) -> Arc<dyn Logger> {
        Arc::new(NullLogger)
    }
}
