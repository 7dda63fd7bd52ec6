//! One scenario execution, with or without run tracking.
//!
//! Untracked (synchronous) runs return their [`RunOutcome`] directly.
//! Tracked runs move their [`RunRecord`](webpost_types::run::RunRecord)
//! through `queued -> running -> succeeded|failed` around the same
//! execution.

use std::sync::Arc;

use serde_json::{Map, Value, json};
use uuid::Uuid;
use webpost_types::error::SecretError;
use webpost_types::run::{ErrorDetail, RunPayload, RunRequest, RunResponse, RunStatus};
use webpost_types::scenario::Scenario;

use crate::engine::context::RunContext;
use crate::engine::deps::{ExecutionDeps, UrlResolver};
use crate::engine::executor::StepExecutor;
use crate::http::transport::TransportError;
use crate::logging::Logger;
use crate::repository::run::RunRepository;
use crate::repository::secret::SecretProvider;

use super::error_detail::ExecutionErrorBuilder;

// ---------------------------------------------------------------------------
// RunExecutionContext
// ---------------------------------------------------------------------------

/// Per-run wiring supplied by the infrastructure layer.
pub trait RunExecutionContext: Send + Sync {
    /// Logger for one run. Events should also reach the run log store.
    fn run_logger(&self, run_id: &str) -> Arc<dyn Logger>;

    /// Provider selected by the request's `secret_ref`.
    fn secret_provider(&self, request: &RunRequest) -> Result<Arc<dyn SecretProvider>, SecretError>;

    /// Resolver for the scenario's relative step URLs.
    fn url_resolver(&self, scenario: &Scenario) -> Arc<dyn UrlResolver>;

    /// A step executor with a fresh HTTP session.
    fn executor(&self, scenario: &Scenario) -> Result<StepExecutor, TransportError>;
}

/// New run id: UUID v7 in simple (hex) form.
pub fn new_run_id() -> String {
    Uuid::now_v7().simple().to_string()
}

// ---------------------------------------------------------------------------
// PreparedRun / RunOutcome
// ---------------------------------------------------------------------------

/// Everything a validated request needs to execute.
#[derive(Clone)]
pub struct PreparedRun {
    pub run_id: String,
    pub scenario: Arc<Scenario>,
    pub vars: Map<String, Value>,
    pub secrets: Arc<dyn SecretProvider>,
}

impl PreparedRun {
    pub fn scenario_id(&self) -> &str {
        &self.scenario.meta.id
    }
}

/// Terminal state of one execution.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub ok: bool,
    pub result: Option<Map<String, Value>>,
    pub error: Option<String>,
    pub error_detail: Option<ErrorDetail>,
}

impl RunOutcome {
    pub fn succeeded(result: Map<String, Value>) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
            error_detail: None,
        }
    }

    pub fn failed(result: Option<Map<String, Value>>, detail: ErrorDetail) -> Self {
        Self {
            ok: false,
            result,
            error: Some(detail.message.clone()),
            error_detail: Some(detail),
        }
    }

    pub fn status(&self) -> RunStatus {
        if self.ok {
            RunStatus::Succeeded
        } else {
            RunStatus::Failed
        }
    }

    pub fn into_response(self) -> RunResponse {
        RunResponse {
            success: self.ok,
            result: self.result,
            error: self.error,
            error_detail: self.error_detail,
        }
    }

    pub fn into_payload(self) -> RunPayload {
        RunPayload {
            result: self.result,
            error: self.error,
            error_detail: self.error_detail,
        }
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Run the scenario's steps once and fold the result into a [`RunOutcome`].
///
/// Interpreter errors and executor construction failures become
/// `exception` outcomes and are logged as `scenario_execution_failed`.
pub async fn execute_scenario(
    env: &dyn RunExecutionContext,
    run: &PreparedRun,
    logger: Arc<dyn Logger>,
) -> RunOutcome {
    let exception = |message: String, ctx: Option<&RunContext>| {
        logger.error(
            "scenario_execution_failed",
            json!({"error": message, "scenario_id": run.scenario_id()}),
        );
        RunOutcome::failed(
            ctx.map(|ctx| ctx.result.clone()),
            ExecutionErrorBuilder::build_from_exception(message, ctx),
        )
    };

    let executor = match env.executor(&run.scenario) {
        Ok(executor) => executor,
        Err(e) => return exception(e.to_string(), None),
    };
    let deps = ExecutionDeps::new(
        Arc::clone(&run.secrets),
        env.url_resolver(&run.scenario),
        Arc::clone(&logger),
    );
    let mut ctx = RunContext::new(run.vars.clone()).with_run_id(run.run_id.as_str());

    match executor.execute(&run.scenario.steps, &mut ctx, &deps).await {
        Ok(result) if result.ok => RunOutcome::succeeded(ctx.result),
        Ok(result) => {
            let detail = ExecutionErrorBuilder::build_from_result(&result, Some(&ctx));
            RunOutcome::failed(Some(ctx.result), detail)
        }
        Err(e) => exception(e.to_string(), Some(&ctx)),
    }
}

/// Background body of a tracked run.
///
/// The record must already exist in `queued`. A failed `running`
/// transition (e.g. the record changed underneath) stops the run before any
/// step executes.
pub async fn execute_tracked(
    env: Arc<dyn RunExecutionContext>,
    runs: Arc<dyn RunRepository>,
    run: PreparedRun,
) {
    let mut bound = Map::new();
    bound.insert("run_id".to_string(), Value::String(run.run_id.clone()));
    let logger = env.run_logger(&run.run_id).bind(bound);
    logger.info("run.start", json!({"scenario_id": run.scenario_id()}));

    if let Err(e) = runs.transition_status(
        &run.run_id,
        RunStatus::Queued,
        RunStatus::Running,
        RunPayload::default(),
    ) {
        logger.error(
            "run.transition_failed",
            json!({"error": e.to_string(), "run_id": run.run_id}),
        );
        return;
    }

    let outcome = execute_scenario(env.as_ref(), &run, Arc::clone(&logger)).await;
    let status = outcome.status();
    if let Err(e) = runs.transition_status(
        &run.run_id,
        RunStatus::Running,
        status,
        outcome.into_payload(),
    ) {
        logger.error(
            "run.transition_failed",
            json!({"error": e.to_string(), "run_id": run.run_id}),
        );
        return;
    }
    logger.info("run.end", json!({"status": status}));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryLogs, MemoryRuns, TestEnv, html_response, scenario_from_json};
    use webpost_types::run::{ErrorCode, RunRecord};

    fn prepared(env: &TestEnv, scenario: Scenario) -> PreparedRun {
        PreparedRun {
            run_id: new_run_id(),
            scenario: Arc::new(scenario),
            vars: Map::new(),
            secrets: env.secret_provider(&RunRequest::default()).unwrap(),
        }
    }

    #[test]
    fn test_new_run_id_is_simple_hex() {
        let id = new_run_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, new_run_id());
    }

    #[tokio::test]
    async fn test_execute_scenario_success_and_failure() {
        let env = TestEnv::new(Arc::new(MemoryLogs::default()));
        let ok = scenario_from_json(
            r#"{"meta":{"id":"s"},"steps":[{"id":"r","type":"result","fields":{"a":1}}]}"#,
        );
        let run = prepared(&env, ok);
        let outcome = execute_scenario(&env, &run, env.run_logger(&run.run_id)).await;
        assert!(outcome.ok);
        assert_eq!(outcome.result.unwrap()["a"], 1);

        env.transport.push(html_response(503, "https://example.test/x", "down"));
        let failing = scenario_from_json(
            r#"{"meta":{"id":"s"},"steps":[
                {"id":"get","type":"http","request":{"url":"/x"}},
                {"id":"check","type":"assert","conditions":[{"expr":"${last.status}==200"}]}
            ]}"#,
        );
        let run = prepared(&env, failing);
        let outcome = execute_scenario(&env, &run, env.run_logger(&run.run_id)).await;
        assert!(!outcome.ok);
        let detail = outcome.error_detail.unwrap();
        assert_eq!(detail.code, ErrorCode::StepFailed);
        assert_eq!(detail.step_id.as_deref(), Some("check"));
        assert_eq!(detail.last_status, Some(503));
        assert_eq!(outcome.error.as_deref(), Some("assertion failed: ${last.status}==200"));
    }

    #[tokio::test]
    async fn test_interpreter_error_is_exception() {
        let logs = Arc::new(MemoryLogs::default());
        let env = TestEnv::new(Arc::clone(&logs));
        let scenario = scenario_from_json(
            r#"{"meta":{"id":"s"},"steps":[{"id":"a","type":"assert","conditions":[{"expr":"0"}],
                "on_error":[{"action":"goto","goto_step_id":"missing"}]}]}"#,
        );
        let run = prepared(&env, scenario);
        let outcome = execute_scenario(&env, &run, env.run_logger(&run.run_id)).await;
        let detail = outcome.error_detail.unwrap();
        assert_eq!(detail.code, ErrorCode::Exception);
        assert_eq!(detail.message, "goto target not found: missing");
        assert!(logs.events(&run.run_id).contains(&"scenario_execution_failed".to_string()));
    }

    #[tokio::test]
    async fn test_tracked_run_moves_to_terminal_state() {
        let logs = Arc::new(MemoryLogs::default());
        let env = Arc::new(TestEnv::new(Arc::clone(&logs)));
        let runs = Arc::new(MemoryRuns::default());
        let scenario = scenario_from_json(
            r#"{"meta":{"id":"s"},"steps":[{"id":"r","type":"result","fields":{"done":true}}]}"#,
        );
        let run = prepared(&env, scenario);
        let run_id = run.run_id.clone();
        runs.create(RunRecord::queued(&run_id, "s")).unwrap();

        execute_tracked(env, runs.clone(), run).await;

        let record = runs.get(&run_id).unwrap();
        assert_eq!(record.status, RunStatus::Succeeded);
        assert_eq!(record.result.unwrap()["done"], true);
        let events = logs.events(&run_id);
        assert_eq!(events.first().map(String::as_str), Some("run.start"));
        assert_eq!(events.last().map(String::as_str), Some("run.end"));
    }

    #[tokio::test]
    async fn test_tracked_run_stops_when_not_queued() {
        let logs = Arc::new(MemoryLogs::default());
        let env = Arc::new(TestEnv::new(Arc::clone(&logs)));
        let runs = Arc::new(MemoryRuns::default());
        let scenario = scenario_from_json(
            r#"{"meta":{"id":"s"},"steps":[{"id":"r","type":"result","fields":{"done":true}}]}"#,
        );
        let run = prepared(&env, scenario);
        let run_id = run.run_id.clone();

        execute_tracked(env, runs.clone(), run).await;

        assert!(runs.get(&run_id).is_none());
        assert_eq!(logs.events(&run_id), vec!["run.start", "run.transition_failed"]);
    }
}
