//! Run status and run log storage traits.
//!
//! Both stores are written from background run tasks and read from API
//! handlers concurrently, so implementations must be internally
//! synchronized. Operations are synchronous: the in-process stores never
//! block on IO.

use webpost_types::error::RunStateError;
use webpost_types::run::{RunLogEntry, RunPayload, RunRecord, RunStatus};

/// Status projection store for asynchronous runs.
pub trait RunRepository: Send + Sync {
    /// Insert a new record. Fails with `AlreadyExists` on a duplicate id.
    fn create(&self, record: RunRecord) -> Result<RunRecord, RunStateError>;

    /// Fetch a record by run id.
    fn get(&self, run_id: &str) -> Option<RunRecord>;

    /// Atomically move a run from `expected` to `next`.
    ///
    /// Fails with `NotFound` for unknown runs and `InvalidTransition` when
    /// the current status is not `expected`. The read-check-write must not
    /// interleave with another transition of the same run.
    fn transition_status(
        &self,
        run_id: &str,
        expected: RunStatus,
        next: RunStatus,
        payload: RunPayload,
    ) -> Result<RunRecord, RunStateError>;
}

/// Append-only per-run event list.
pub trait RunLogStore: Send + Sync {
    fn append(&self, run_id: &str, entry: RunLogEntry);

    /// Entries in append order. Unknown runs yield an empty list.
    fn list(&self, run_id: &str) -> Vec<RunLogEntry>;
}
