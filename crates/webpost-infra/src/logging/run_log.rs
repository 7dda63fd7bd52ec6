//! Logger appending run events to a [`RunLogStore`].

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use webpost_core::logging::{Logger, merge_fields};
use webpost_core::repository::run::RunLogStore;
use webpost_types::run::RunLogEntry;
use webpost_types::step::LogLevel;

use super::event_payload;

/// Writes every event for `run_id` to the store, regardless of level.
pub struct RunLogLogger {
    run_id: String,
    store: Arc<dyn RunLogStore>,
    bound: Map<String, Value>,
}

impl RunLogLogger {
    pub fn new(run_id: impl Into<String>, store: Arc<dyn RunLogStore>) -> Self {
        Self {
            run_id: run_id.into(),
            store,
            bound: Map::new(),
        }
    }
}

impl Logger for RunLogLogger {
    fn emit(&self, _level: LogLevel, event: &str, fields: Map<String, Value>) {
        self.store.append(
            &self.run_id,
            RunLogEntry {
                timestamp: Utc::now(),
                event: event.to_string(),
                fields: event_payload(&self.bound, event, fields),
            },
        );
    }

    fn bind(&self, fields: Map<String, Value>) -> Arc<dyn Logger> {
        Arc::new(Self {
            run_id: self.run_id.clone(),
            store: Arc::clone(&self.store),
            bound: merge_fields(&self.bound, fields),
        })
    }
}
