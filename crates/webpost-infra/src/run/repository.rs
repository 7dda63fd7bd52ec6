//! In-memory [`RunRepository`].

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use webpost_core::repository::run::RunRepository;
use webpost_types::error::RunStateError;
use webpost_types::run::{RunPayload, RunRecord, RunStatus};

/// Run records keyed by run id. Records live for the process lifetime:
/// nothing evicts them, so memory grows with the number of tracked runs.
#[derive(Debug, Default)]
pub struct InMemoryRunRepository {
    runs: DashMap<String, RunRecord>,
}

impl InMemoryRunRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RunRepository for InMemoryRunRepository {
    fn create(&self, record: RunRecord) -> Result<RunRecord, RunStateError> {
        match self.runs.entry(record.run_id.clone()) {
            Entry::Occupied(_) => Err(RunStateError::AlreadyExists(record.run_id)),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    fn get(&self, run_id: &str) -> Option<RunRecord> {
        self.runs.get(run_id).map(|record| record.clone())
    }

    fn transition_status(
        &self,
        run_id: &str,
        expected: RunStatus,
        next: RunStatus,
        payload: RunPayload,
    ) -> Result<RunRecord, RunStateError> {
        // The shard write lock is held from the check through the write.
        let mut record = self
            .runs
            .get_mut(run_id)
            .ok_or_else(|| RunStateError::NotFound(run_id.to_string()))?;
        if record.status != expected || !expected.can_transition_to(next) {
            return Err(RunStateError::InvalidTransition {
                run_id: run_id.to_string(),
                from: record.status,
                to: next,
            });
        }
        let updated = record.with_status(next, payload);
        *record = updated.clone();
        Ok(updated)
    }
}
