//! Step executor: the instruction-pointer loop over a scenario's steps.
//!
//! # Execution flow
//!
//! 1. Assign a run id when the context has none and bind it into the logger.
//! 2. Walk the steps by index, skipping disabled ones.
//! 3. Resolve the handler, log `step.start`, run it, log `step.end`.
//! 4. On success clear the step's retry counter and advance (or follow a
//!    handler-initiated jump).
//! 5. On failure route through `on_error`: retry the same index after the
//!    backoff, jump to another step, or abort the run.

use std::collections::HashMap;
use std::time::Instant;

use serde_json::{Map, Value, json};
use thiserror::Error;
use uuid::Uuid;
use webpost_types::step::{OnErrorAction, Step};

use super::context::RunContext;
use super::deps::ExecutionDeps;
use super::registry::HandlerRegistry;
use super::retry::{ErrorRouter, RetryHandler};
use crate::logging::Logger;

// ---------------------------------------------------------------------------
// Errors / results
// ---------------------------------------------------------------------------

/// Interpreter errors. These end the run immediately and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    #[error("No handler for step '{step_id}' of type {step_type}")]
    NoHandler { step_id: String, step_type: String },

    #[error("on_error goto requires goto_step_id (step '{0}')")]
    GotoTargetMissing(String),

    #[error("goto target not found: {0}")]
    GotoTargetNotFound(String),
}

/// Outcome of a complete run through the step list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub ok: bool,
    pub failed_step_id: Option<String>,
    pub error_message: Option<String>,
}

impl ExecutionResult {
    pub fn succeeded() -> Self {
        Self {
            ok: true,
            ..Default::default()
        }
    }

    pub fn failed(step_id: &str, error_message: Option<String>) -> Self {
        Self {
            ok: false,
            failed_step_id: Some(step_id.to_string()),
            error_message,
        }
    }
}

// ---------------------------------------------------------------------------
// StepExecutor
// ---------------------------------------------------------------------------

/// Runs a step list against one [`RunContext`].
#[derive(Debug, Default)]
pub struct StepExecutor {
    registry: HandlerRegistry,
}

impl StepExecutor {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    /// Execute `steps` in order.
    ///
    /// Step failures are reported through [`ExecutionResult`]; only
    /// interpreter errors (missing handler, bad goto) return `Err`.
    pub async fn execute(
        &self,
        steps: &[Step],
        ctx: &mut RunContext,
        deps: &ExecutionDeps,
    ) -> Result<ExecutionResult, ExecutorError> {
        if ctx.run_id.is_empty() {
            ctx.run_id = Uuid::now_v7().simple().to_string();
        }
        let mut bound = Map::new();
        bound.insert("run_id".to_string(), Value::String(ctx.run_id.clone()));
        let deps = deps.with_logger(deps.logger.bind(bound));
        let logger = deps.logger.as_ref();

        let mut index_of: HashMap<&str, usize> = HashMap::new();
        for (idx, step) in steps.iter().enumerate() {
            index_of.entry(step.id.as_str()).or_insert(idx);
        }
        let mut retries: HashMap<&str, u32> = HashMap::new();

        let mut i = 0;
        while i < steps.len() {
            let step = &steps[i];
            if !step.enabled {
                i += 1;
                continue;
            }

            let handler = self.registry.resolve(step)?;
            logger.info(
                "step.start",
                json!({"step_id": step.id, "step_type": step.type_name()}),
            );
            let started = Instant::now();
            let outcome = handler.handle(step, ctx, &deps).await;
            logger.info(
                "step.end",
                json!({
                    "step_id": step.id,
                    "ok": outcome.ok,
                    "elapsed_ms": started.elapsed().as_millis() as u64,
                }),
            );

            if outcome.ok {
                retries.remove(step.id.as_str());
                i = match outcome.goto_step_id.as_deref() {
                    Some(target) => jump(step, target, &index_of, &mut retries, logger)?,
                    None => i + 1,
                };
                continue;
            }

            let decision = {
                let secrets = deps.secret_map().unwrap_or_default();
                ErrorRouter::resolve(step, &ctx.render_sources(&secrets), logger)
            };

            match decision.action {
                OnErrorAction::Retry => {
                    let count = retries.get(step.id.as_str()).copied().unwrap_or(0);
                    if !RetryHandler::should_retry(&step.retry, count) {
                        return Ok(ExecutionResult::failed(&step.id, outcome.error_message));
                    }
                    let backoff = RetryHandler::backoff(&step.retry, count);
                    if !backoff.is_zero() {
                        tokio::time::sleep(backoff).await;
                    }
                    let attempt = count + 1;
                    logger.info(
                        "step.retry.backoff",
                        json!({
                            "step_id": step.id,
                            "attempt": attempt,
                            "backoff_sec": backoff.as_secs_f64(),
                        }),
                    );
                    logger.info(
                        "step.retry",
                        json!({"step_id": step.id, "attempt": attempt, "max": step.retry.max}),
                    );
                    retries.insert(step.id.as_str(), attempt);
                }
                OnErrorAction::Goto => {
                    let target = decision
                        .goto_step_id
                        .as_deref()
                        .filter(|target| !target.is_empty())
                        .ok_or_else(|| ExecutorError::GotoTargetMissing(step.id.clone()))?;
                    i = jump(step, target, &index_of, &mut retries, logger)?;
                }
                OnErrorAction::Abort => {
                    return Ok(ExecutionResult::failed(&step.id, outcome.error_message));
                }
            }
        }

        Ok(ExecutionResult::succeeded())
    }
}

/// Resolve a goto target, log the jump and give the target a fresh retry
/// budget.
fn jump<'s>(
    from: &Step,
    target: &str,
    index_of: &HashMap<&'s str, usize>,
    retries: &mut HashMap<&'s str, u32>,
    logger: &dyn Logger,
) -> Result<usize, ExecutorError> {
    let (&key, &idx) = index_of
        .get_key_value(target)
        .ok_or_else(|| ExecutorError::GotoTargetNotFound(target.to_string()))?;
    logger.info("step.goto", json!({"from": from.id, "to": target}));
    retries.remove(key);
    Ok(idx)
}
