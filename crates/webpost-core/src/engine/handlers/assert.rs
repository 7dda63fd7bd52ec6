//! Assert step: evaluate conditions in `all` or `any` mode.

use serde_json::json;
use webpost_types::step::{AssertMode, AssertStep, ConditionSpec, Step, StepKind};

use crate::engine::condition::ConditionEvaluator;
use crate::engine::context::RunContext;
use crate::engine::deps::ExecutionDeps;
use crate::engine::template::RenderSources;
use crate::logging::Logger;

use super::{StepHandler, StepOutcome, wrong_kind};

const GENERIC_FAILURE: &str = "assertion failed";

#[derive(Debug, Clone, Copy, Default)]
pub struct AssertStepHandler;

impl AssertStepHandler {
    fn evaluate(
        step_id: &str,
        spec: &AssertStep,
        src: &RenderSources<'_>,
        logger: &dyn Logger,
    ) -> StepOutcome {
        let check = |cond: &ConditionSpec| match ConditionEvaluator::evaluate(&cond.expr, src) {
            Ok(passed) => passed,
            Err(e) => {
                logger.error(
                    "assert.eval_failed",
                    json!({"step_id": step_id, "expr": cond.expr, "error": e.to_string()}),
                );
                false
            }
        };
        let failure_message = |cond: &ConditionSpec| {
            cond.message
                .clone()
                .unwrap_or_else(|| format!("assertion failed: {}", cond.expr))
        };

        let mut failures = Vec::new();
        let passed = match spec.mode {
            AssertMode::All => {
                for cond in &spec.conditions {
                    if !check(cond) {
                        failures.push(failure_message(cond));
                        if spec.fail_fast {
                            break;
                        }
                    }
                }
                failures.is_empty()
            }
            AssertMode::Any => {
                let mut any = false;
                for cond in &spec.conditions {
                    if check(cond) {
                        any = true;
                        break;
                    }
                    failures.push(failure_message(cond));
                }
                any
            }
        };

        logger.debug(
            "assert.evaluated",
            json!({
                "step_id": step_id,
                "mode": spec.mode,
                "conditions": spec.conditions.len(),
                "failed": failures.len(),
                "ok": passed,
            }),
        );

        if passed {
            return StepOutcome::success();
        }
        let message = spec.message.clone().unwrap_or_else(|| {
            if failures.is_empty() {
                GENERIC_FAILURE.to_string()
            } else {
                failures.join("; ")
            }
        });
        StepOutcome::failure(message)
    }
}

impl StepHandler for AssertStepHandler {
    fn name(&self) -> &'static str {
        "assert"
    }

    fn supports(&self, step: &Step) -> bool {
        matches!(step.kind, StepKind::Assert(_))
    }

    async fn handle(&self, step: &Step, ctx: &mut RunContext, deps: &ExecutionDeps) -> StepOutcome {
        let StepKind::Assert(spec) = &step.kind else {
            return wrong_kind(self.name(), step);
        };
        let secrets = match deps.secret_map() {
            Ok(secrets) => secrets,
            Err(e) => return StepOutcome::failure(e.to_string()),
        };
        let src = ctx.render_sources(&secrets);
        Self::evaluate(&step.id, spec, &src, deps.logger.as_ref())
    }
}
