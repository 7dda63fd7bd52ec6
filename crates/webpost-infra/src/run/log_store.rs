//! In-memory [`RunLogStore`].

use dashmap::DashMap;
use webpost_core::repository::run::RunLogStore;
use webpost_types::run::RunLogEntry;

/// Append-only event lists keyed by run id. Kept for the process lifetime.
#[derive(Debug, Default)]
pub struct InMemoryRunLogStore {
    entries: DashMap<String, Vec<RunLogEntry>>,
}

impl InMemoryRunLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RunLogStore for InMemoryRunLogStore {
    fn append(&self, run_id: &str, entry: RunLogEntry) {
        self.entries
            .entry(run_id.to_string())
            .or_default()
            .push(entry);
    }

    fn list(&self, run_id: &str) -> Vec<RunLogEntry> {
        self.entries
            .get(run_id)
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}
