//! Scenario run service: the entry points behind the REST API and CLI.
//!
//! # Submit flow
//!
//! 1. Reject an over-cap `wait_sec`.
//! 2. Load the scenario and validate required inputs.
//! 3. Resolve the secret provider from `secret_ref`.
//! 4. Register the idempotency key, if any. Earlier failures leave the key
//!    unused.
//! 5. Without `wait_sec`, execute inline and return the outcome.
//! 6. With `wait_sec`, create a queued record, schedule the run in the
//!    background and wait up to `wait_sec` seconds for it to finish.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use webpost_types::config::DEFAULT_MAX_WAIT_SEC;
use webpost_types::error::{
    IdempotencyError, InputValidationError, RunStateError, ScenarioError, SecretError,
};
use webpost_types::run::{RunLogEntry, RunRecord, RunRequest, RunResponse, RunStatus};
use webpost_types::scenario::Scenario;

use crate::repository::idempotency::IdempotencyStore;
use crate::repository::run::{RunLogStore, RunRepository};
use crate::repository::scenario::ScenarioSource;

use super::idempotency::IdempotencyService;
use super::input::ScenarioInputValidator;
use super::run::{
    PreparedRun, RunExecutionContext, execute_scenario, execute_tracked, new_run_id,
};
use super::scheduler::RunScheduler;

// ---------------------------------------------------------------------------
// Errors / results
// ---------------------------------------------------------------------------

/// Request-level failures. Step failures are not errors here; they come
/// back as an unsuccessful [`RunResponse`].
#[derive(Debug, Error)]
pub enum RunServiceError {
    #[error("wait_sec must be <= {0}")]
    WaitTooLong(u64),

    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error(transparent)]
    Input(#[from] InputValidationError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Idempotency(#[from] IdempotencyError),

    #[error(transparent)]
    RunState(#[from] RunStateError),
}

/// What `submit` produced.
#[derive(Debug, Clone)]
pub enum RunSubmission {
    /// The run finished: executed inline, or completed within `wait_sec`.
    Completed { run_id: String, response: RunResponse },
    /// The run is tracked in the background.
    Accepted { run_id: String, status: RunStatus },
}

/// Stores shared by every run.
#[derive(Clone)]
pub struct RunStores {
    pub runs: Arc<dyn RunRepository>,
    pub logs: Arc<dyn RunLogStore>,
    pub idempotency: Arc<dyn IdempotencyStore>,
}

// ---------------------------------------------------------------------------
// ScenarioRunService
// ---------------------------------------------------------------------------

/// Validates requests and runs scenarios inline or in the background.
///
/// Generic over the scenario source; everything per-run comes from the
/// injected [`RunExecutionContext`].
pub struct ScenarioRunService<S: ScenarioSource> {
    scenarios: S,
    env: Arc<dyn RunExecutionContext>,
    runs: Arc<dyn RunRepository>,
    logs: Arc<dyn RunLogStore>,
    idempotency: IdempotencyService,
    scheduler: RunScheduler,
    max_wait_sec: u64,
}

impl<S: ScenarioSource> ScenarioRunService<S> {
    pub fn new(
        scenarios: S,
        env: Arc<dyn RunExecutionContext>,
        stores: RunStores,
        scheduler: RunScheduler,
    ) -> Self {
        Self {
            scenarios,
            env,
            runs: stores.runs,
            logs: stores.logs,
            idempotency: IdempotencyService::new(stores.idempotency),
            scheduler,
            max_wait_sec: DEFAULT_MAX_WAIT_SEC,
        }
    }

    pub fn with_max_wait_sec(mut self, max_wait_sec: u64) -> Self {
        self.max_wait_sec = max_wait_sec;
        self
    }

    pub fn max_wait_sec(&self) -> u64 {
        self.max_wait_sec
    }

    /// Load a scenario without running it.
    pub async fn load_scenario(&self, scenario_id: &str) -> Result<Scenario, RunServiceError> {
        Ok(self.scenarios.load(scenario_id).await?)
    }

    /// Validate and start a run. See the module docs for the flow.
    pub async fn submit(
        &self,
        scenario_id: &str,
        request: RunRequest,
        wait_sec: Option<u64>,
    ) -> Result<RunSubmission, RunServiceError> {
        if let Some(wait) = wait_sec.filter(|wait| *wait > self.max_wait_sec) {
            tracing::debug!(wait, max = self.max_wait_sec, "wait_sec over cap");
            return Err(RunServiceError::WaitTooLong(self.max_wait_sec));
        }

        let scenario = self.scenarios.load(scenario_id).await?;
        ScenarioInputValidator::validate(&scenario, &request.vars)?;
        let secrets = self.env.secret_provider(&request)?;
        if let Some(key) = request.idempotency_key.as_deref() {
            self.idempotency.register_or_raise(key)?;
        }

        let run = PreparedRun {
            run_id: new_run_id(),
            scenario: Arc::new(scenario),
            vars: request.vars,
            secrets,
        };

        let Some(wait) = wait_sec else {
            let run_id = run.run_id.clone();
            let logger = self.env.run_logger(&run_id);
            let outcome = execute_scenario(self.env.as_ref(), &run, logger).await;
            return Ok(RunSubmission::Completed {
                run_id,
                response: outcome.into_response(),
            });
        };

        let record = self.runs.create(RunRecord::queued(&run.run_id, scenario_id))?;
        let run_id = record.run_id.clone();
        self.scheduler.submit(
            &run_id,
            execute_tracked(Arc::clone(&self.env), Arc::clone(&self.runs), run),
        );
        tracing::info!(run_id = %run_id, scenario_id, wait, "run scheduled");

        if wait > 0 && self.scheduler.wait(&run_id, Duration::from_secs(wait)).await {
            let completed = self.get_run(&run_id)?;
            return Ok(RunSubmission::Completed {
                run_id,
                response: RunResponse::from_record(&completed),
            });
        }
        Ok(RunSubmission::Accepted {
            run_id,
            status: record.status,
        })
    }

    /// Wait for a background run. See [`RunScheduler::wait`].
    pub async fn wait(&self, run_id: &str, timeout: Duration) -> bool {
        self.scheduler.wait(run_id, timeout).await
    }

    pub fn get_run(&self, run_id: &str) -> Result<RunRecord, RunServiceError> {
        self.runs
            .get(run_id)
            .ok_or_else(|| RunStateError::NotFound(run_id.to_string()).into())
    }

    /// Log entries of a tracked run, in emission order.
    pub fn run_logs(&self, run_id: &str) -> Result<Vec<RunLogEntry>, RunServiceError> {
        self.get_run(run_id)?;
        Ok(self.logs.list(run_id))
    }
}
