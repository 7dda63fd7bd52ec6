//! Scenario run handlers for the REST API.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};

use webpost_core::service::error_detail::ExecutionErrorBuilder;
use webpost_core::service::run::RunOutcome;
use webpost_core::service::scenario_run::{RunServiceError, RunSubmission};
use webpost_types::error::ScenarioError;
use webpost_types::run::{RunLogEntry, RunRecord, RunRequest};

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// Query parameters for run submission.
#[derive(Debug, Deserialize, Default)]
pub struct RunQuery {
    /// Track the run in the background and wait up to this many seconds.
    pub wait_sec: Option<u64>,
}

fn run_links(resp: ApiResponse<Value>, run_id: &str) -> ApiResponse<Value> {
    resp.with_link("self", &format!("/runs/{run_id}"))
        .with_link("logs", &format!("/runs/{run_id}/logs"))
}

/// POST /scenarios/{id}/runs - Run a scenario.
///
/// Without `wait_sec` the scenario runs inline and the outcome is returned.
/// With `wait_sec` the run is tracked: a finished run returns its outcome,
/// otherwise `202 Accepted` with the run id.
pub async fn create_run(
    State(state): State<AppState>,
    Path(scenario_id): Path<String>,
    Query(query): Query<RunQuery>,
    Json(body): Json<RunRequest>,
) -> Result<ApiResponse<Value>, AppError> {
    let timer = RequestTimer::start();

    let submission = match state
        .run_service
        .submit(&scenario_id, body, query.wait_sec)
        .await
    {
        Ok(submission) => submission,
        // A scenario that exists but cannot be read or parsed is reported
        // the same way as a run that crashed.
        Err(RunServiceError::Scenario(
            e @ (ScenarioError::Malformed { .. } | ScenarioError::Io { .. }),
        )) => {
            tracing::warn!(scenario_id = %scenario_id, error = %e, "scenario could not be loaded");
            let detail = ExecutionErrorBuilder::build_from_exception(e.to_string(), None);
            let response = RunOutcome::failed(None, detail).into_response();
            return Ok(timer.success(to_value(&response)?));
        }
        Err(e) => return Err(e.into()),
    };

    match submission {
        RunSubmission::Completed { run_id, response } => {
            let data = to_value(&response)?;
            let resp = timer.success(data);
            Ok(if query.wait_sec.is_some() {
                run_links(resp, &run_id)
            } else {
                resp
            })
        }
        RunSubmission::Accepted { run_id, status } => {
            let resp = timer
                .success(json!({ "run_id": run_id, "status": status }))
                .with_status(StatusCode::ACCEPTED);
            Ok(run_links(resp, &run_id))
        }
    }
}

/// GET /runs/{id} - Status and outcome of a tracked run.
pub async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<ApiResponse<RunRecord>, AppError> {
    let timer = RequestTimer::start();
    let record = state.run_service.get_run(&run_id)?;
    Ok(timer
        .success(record)
        .with_link("self", &format!("/runs/{run_id}"))
        .with_link("logs", &format!("/runs/{run_id}/logs")))
}

/// GET /runs/{id}/logs - Events of a tracked run in emission order.
pub async fn get_run_logs(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<ApiResponse<Vec<RunLogEntry>>, AppError> {
    let timer = RequestTimer::start();
    let entries = state.run_service.run_logs(&run_id)?;
    Ok(timer
        .success(entries)
        .with_link("run", &format!("/runs/{run_id}")))
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::state::tests::state_for;
    use tempfile::TempDir;
    use webpost_types::error::RunStateError;

    const HELLO: &str = r#"
meta:
  id: hello
inputs:
  required: [name]
steps:
  - id: greet
    type: log
    message: "hello ${vars.name}"
  - id: out
    type: result
    fields:
      greeting: "hello ${vars.name}"
"#;

    const FAILING: &str = r#"
meta:
  id: failing
steps:
  - id: check
    type: assert
    conditions:
      - expr: "${vars.flag} == yes"
        message: flag must be yes
"#;

    fn scenarios() -> TempDir {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("hello.yaml"), HELLO).unwrap();
        std::fs::write(tmp.path().join("failing.yaml"), FAILING).unwrap();
        std::fs::write(tmp.path().join("broken.yaml"), "steps: [ {").unwrap();
        tmp
    }

    fn request(vars: Value) -> Json<RunRequest> {
        Json(RunRequest {
            vars: vars.as_object().cloned().unwrap_or_default(),
            ..Default::default()
        })
    }

    async fn submit(
        state: &AppState,
        id: &str,
        wait_sec: Option<u64>,
        body: Json<RunRequest>,
    ) -> Result<ApiResponse<Value>, AppError> {
        create_run(
            State(state.clone()),
            Path(id.to_string()),
            Query(RunQuery { wait_sec }),
            body,
        )
        .await
    }

    #[tokio::test]
    async fn test_sync_run_returns_result() {
        let dir = scenarios();
        let state = state_for(dir.path());

        let resp = submit(&state, "hello", None, request(json!({"name": "Sato"})))
            .await
            .unwrap();

        assert_eq!(resp.status, StatusCode::OK);
        let data = resp.data.unwrap();
        assert_eq!(data["success"], true);
        assert_eq!(data["result"]["greeting"], "hello Sato");
        assert!(resp.links.is_empty());
    }

    #[tokio::test]
    async fn test_sync_step_failure_is_200_with_detail() {
        let dir = scenarios();
        let state = state_for(dir.path());

        let resp = submit(&state, "failing", None, request(json!({"flag": "no"})))
            .await
            .unwrap();

        assert_eq!(resp.status, StatusCode::OK);
        let data = resp.data.unwrap();
        assert_eq!(data["success"], false);
        assert_eq!(data["error_detail"]["code"], "step_failed");
        assert_eq!(data["error_detail"]["step_id"], "check");
        assert_eq!(data["error"], "flag must be yes");
    }

    #[tokio::test]
    async fn test_malformed_scenario_reports_exception() {
        let dir = scenarios();
        let state = state_for(dir.path());

        let resp = submit(&state, "broken", None, request(json!({}))).await.unwrap();

        let data = resp.data.unwrap();
        assert_eq!(data["success"], false);
        assert_eq!(data["error_detail"]["code"], "exception");
    }

    #[tokio::test]
    async fn test_request_errors_map_to_status() {
        let dir = scenarios();
        let state = state_for(dir.path());

        let missing = submit(&state, "nope", None, request(json!({}))).await.unwrap_err();
        assert_eq!(missing.parts().0, StatusCode::NOT_FOUND);

        let invalid = submit(&state, "hello", None, request(json!({}))).await.unwrap_err();
        assert_eq!(invalid.parts().0, StatusCode::BAD_REQUEST);
        assert_eq!(invalid.parts().2, "Missing required inputs: name");

        let too_long = submit(&state, "hello", Some(31), request(json!({"name": "a"})))
            .await
            .unwrap_err();
        assert_eq!(too_long.parts().2, "wait_sec must be <= 30");

        let unknown_ref = submit(
            &state,
            "hello",
            None,
            Json(RunRequest {
                vars: json!({"name": "a"}).as_object().cloned().unwrap(),
                secret_ref: Some("vault".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(unknown_ref.parts().1, "UNKNOWN_SECRET_REF");
    }

    #[tokio::test]
    async fn test_duplicate_idempotency_key_conflicts() {
        let dir = scenarios();
        let state = state_for(dir.path());
        let keyed = || {
            Json(RunRequest {
                vars: json!({"name": "a"}).as_object().cloned().unwrap(),
                idempotency_key: Some("k1".to_string()),
                ..Default::default()
            })
        };

        // A 404 does not consume the key.
        assert!(submit(&state, "nope", None, keyed()).await.is_err());
        assert!(submit(&state, "hello", None, keyed()).await.is_ok());

        let dup = submit(&state, "hello", None, keyed()).await.unwrap_err();
        assert_eq!(dup.parts().0, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_accepted_run_can_be_polled() {
        let dir = scenarios();
        let state = state_for(dir.path());

        let resp = submit(&state, "hello", Some(0), request(json!({"name": "Kim"})))
            .await
            .unwrap();
        assert_eq!(resp.status, StatusCode::ACCEPTED);
        let data = resp.data.unwrap();
        assert_eq!(data["status"], "queued");
        let run_id = data["run_id"].as_str().unwrap().to_string();
        assert_eq!(resp.links["self"], format!("/runs/{run_id}"));
        assert_eq!(resp.links["logs"], format!("/runs/{run_id}/logs"));

        assert!(state.run_service.wait(&run_id, Duration::from_secs(5)).await);

        let record = get_run(State(state.clone()), Path(run_id.clone()))
            .await
            .unwrap()
            .data
            .unwrap();
        assert_eq!(record.status.to_string(), "succeeded");
        assert_eq!(record.result.unwrap()["greeting"], "hello Kim");

        let logs = get_run_logs(State(state.clone()), Path(run_id))
            .await
            .unwrap()
            .data
            .unwrap();
        assert!(logs.iter().any(|entry| entry.event == "result.saved"));
    }

    #[tokio::test]
    async fn test_waited_run_returns_outcome_with_links() {
        let dir = scenarios();
        let state = state_for(dir.path());

        let resp = submit(&state, "hello", Some(5), request(json!({"name": "Lee"})))
            .await
            .unwrap();

        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.data.unwrap()["result"]["greeting"], "hello Lee");
        assert!(resp.links.contains_key("self"));
    }

    #[tokio::test]
    async fn test_unknown_run_is_404() {
        let dir = scenarios();
        let state = state_for(dir.path());

        let err = get_run(State(state.clone()), Path("missing".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Run(RunServiceError::RunState(RunStateError::NotFound(_)))
        ));

        let err = get_run_logs(State(state), Path("missing".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.parts().0, StatusCode::NOT_FOUND);
    }
}
