//! Run-event logger implementations.
//!
//! - `console`: forwards events to `tracing`
//! - `run_log`: appends events to a per-run log store
//! - `composite`: fans one event out to several loggers

pub mod composite;
pub mod console;
pub mod run_log;

use serde_json::{Map, Value};
use webpost_core::logging::merge_fields;

/// Bound fields overlaid with the event's fields, plus `type` set to the
/// event name unless a field already claims it.
pub(crate) fn event_payload(
    bound: &Map<String, Value>,
    event: &str,
    fields: Map<String, Value>,
) -> Map<String, Value> {
    let mut payload = merge_fields(bound, fields);
    payload
        .entry("type")
        .or_insert_with(|| Value::String(event.to_string()));
    payload
}
