//! Console logger: run events as `tracing` records.

use std::sync::Arc;

use serde_json::{Map, Value};
use webpost_core::logging::{Logger, merge_fields};
use webpost_types::step::LogLevel;

use super::event_payload;

/// Emits each run event under the `webpost::run` target.
///
/// The event name becomes the `event` field and the JSON payload the
/// `fields` field, so the JSON subscriber output stays machine-readable.
#[derive(Debug, Clone, Default)]
pub struct ConsoleLogger {
    bound: Map<String, Value>,
}

impl ConsoleLogger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Logger for ConsoleLogger {
    fn emit(&self, level: LogLevel, event: &str, fields: Map<String, Value>) {
        let payload = Value::Object(event_payload(&self.bound, event, fields));
        match level {
            LogLevel::Debug => tracing::debug!(target: "webpost::run", event, fields = %payload),
            LogLevel::Info => tracing::info!(target: "webpost::run", event, fields = %payload),
            LogLevel::Error => tracing::error!(target: "webpost::run", event, fields = %payload),
        }
    }

    fn bind(&self, fields: Map<String, Value>) -> Arc<dyn Logger> {
        Arc::new(Self {
            bound: merge_fields(&self.bound, fields),
        })
    }
}
