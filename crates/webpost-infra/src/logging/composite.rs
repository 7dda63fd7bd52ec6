//! Fan-out logger.

use std::sync::Arc;

use serde_json::{Map, Value};
use webpost_core::logging::Logger;
use webpost_types::step::LogLevel;

/// Forwards each event to every inner logger, in order.
#[derive(Clone, Default)]
pub struct CompositeLogger {
    loggers: Vec<Arc<dyn Logger>>,
}

impl CompositeLogger {
    pub fn new(loggers: Vec<Arc<dyn Logger>>) -> Self {
        Self { loggers }
    }
}

impl Logger for CompositeLogger {
    fn emit(&self, level: LogLevel, event: &str, fields: Map<String, Value>) {
        for logger in &self.loggers {
            logger.emit(level, event, fields.clone());
        }
    }

    fn bind(&self, fields: Map<String, Value>) -> Arc<dyn Logger> {
        Arc::new(Self {
            loggers: self
                .loggers
                .iter()
                .map(|logger| logger.bind(fields.clone()))
                .collect(),
        })
    }
}
