//! Log step: emit a rendered message at the configured level.

use serde_json::{Map, Value};
use webpost_types::step::{LogStep, Step, StepKind};

use crate::engine::context::RunContext;
use crate::engine::deps::ExecutionDeps;
use crate::engine::secret_policy::SecretTemplatePolicy;
use crate::engine::template::TemplateRenderer;

use super::{StepHandler, StepOutcome, wrong_kind};

/// Event name for user log steps.
pub const LOG_EVENT: &str = "log";

#[derive(Debug, Clone, Copy, Default)]
pub struct LogStepHandler;

impl LogStepHandler {
    /// Rendered event fields: user fields plus `step_id` and `message`.
    fn render(step_id: &str, spec: &LogStep, ctx: &RunContext, deps: &ExecutionDeps) -> Result<Map<String, Value>, String> {
        SecretTemplatePolicy::assert_safe_str(&spec.message).map_err(|e| e.to_string())?;
        SecretTemplatePolicy::assert_safe(&Value::Object(spec.fields.clone())).map_err(|e| e.to_string())?;

        let secrets = deps.secret_map().map_err(|e| e.to_string())?;
        let src = ctx.render_sources(&secrets);
        let message = TemplateRenderer::render_value(&spec.message, &src).map_err(|e| e.to_string())?;

        let mut fields = Map::new();
        for (key, template) in &spec.fields {
            let value = TemplateRenderer::render_json(template, &src).map_err(|e| e.to_string())?;
            fields.insert(key.clone(), value);
        }
        fields.insert("step_id".to_string(), Value::String(step_id.to_string()));
        fields.insert("message".to_string(), message);
        Ok(fields)
    }
}

impl StepHandler for LogStepHandler {
    fn name(&self) -> &'static str {
        "log"
    }

    fn supports(&self, step: &Step) -> bool {
        matches!(step.kind, StepKind::Log(_))
    }

    async fn handle(&self, step: &Step, ctx: &mut RunContext, deps: &ExecutionDeps) -> StepOutcome {
        let StepKind::Log(spec) = &step.kind else {
            return wrong_kind(self.name(), step);
        };
        match Self::render(&step.id, spec, ctx, deps) {
            Ok(fields) => {
                deps.logger.emit(spec.level, LOG_EVENT, fields);
                StepOutcome::success()
            }
            Err(message) => {
                deps.logger.error(
                    "log.step_failed",
                    serde_json::json!({"step_id": step.id, "error": message}),
                );
                StepOutcome::failure(message)
            }
        }
    }
}
