//! `webpost run`: execute a scenario synchronously from the terminal.

use std::collections::HashMap;

use serde_json::{Map, Value, json};
use webpost_core::service::scenario_run::RunSubmission;
use webpost_types::run::{RunRequest, RunResponse};

use crate::state::AppState;

/// Build the run request from repeated `--var` / `--secret` flags.
///
/// Values are passed as strings. A repeated key keeps the last value.
pub fn build_request(
    vars: Vec<(String, String)>,
    secrets: Vec<(String, String)>,
    secret_ref: Option<String>,
) -> RunRequest {
    RunRequest {
        vars: vars
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect::<Map<String, Value>>(),
        secrets: secrets.into_iter().collect::<HashMap<String, String>>(),
        secret_ref,
        idempotency_key: None,
    }
}

/// Run the scenario inline and print the outcome.
///
/// Returns whether the run succeeded. Request errors (unknown scenario,
/// missing inputs, unknown `secret_ref`) are returned as errors.
pub async fn run_scenario(
    state: &AppState,
    scenario_id: &str,
    request: RunRequest,
    json: bool,
) -> anyhow::Result<bool> {
    let submission = state.run_service.submit(scenario_id, request, None).await?;
    let (run_id, response) = match submission {
        RunSubmission::Completed { run_id, response } => (run_id, response),
        // Only tracked runs are accepted, and this one runs inline.
        RunSubmission::Accepted { run_id, status } => {
            anyhow::bail!("run {run_id} was not executed inline (status: {status})")
        }
    };

    if json {
        let out = json!({
            "run_id": run_id,
            "success": response.success,
            "result": response.result,
            "error": response.error,
            "error_detail": response.error_detail,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_styled(scenario_id, &run_id, &response)?;
    }
    Ok(response.success)
}

fn print_styled(scenario_id: &str, run_id: &str, response: &RunResponse) -> anyhow::Result<()> {
    println!();
    if response.success {
        println!(
            "  {} Scenario '{}' succeeded",
            console::style("✓").green().bold(),
            console::style(scenario_id).cyan()
        );
    } else {
        println!(
            "  {} Scenario '{}' failed",
            console::style("✗").red().bold(),
            console::style(scenario_id).cyan()
        );
    }
    println!("  {}", console::style(format!("run {run_id}")).dim());

    if let Some(detail) = &response.error_detail {
        println!();
        println!("  {:<12} {}", console::style("Error").bold(), detail.message);
        println!(
            "  {:<12} {}",
            console::style("Code").bold(),
            serde_json::to_value(detail.code)?.as_str().unwrap_or_default()
        );
        if let Some(step_id) = &detail.step_id {
            println!("  {:<12} {step_id}", console::style("Step").bold());
        }
        if let Some(status) = detail.last_status {
            println!("  {:<12} {status}", console::style("HTTP status").bold());
        }
    }

    if let Some(result) = response.result.as_ref().filter(|r| !r.is_empty()) {
        println!();
        println!("  {}", console::style("Result").bold());
        for (key, value) in result {
            let shown = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            println!("    {key}: {shown}");
        }
    }
    println!();
    Ok(())
}
