//! Result step: render fields and upsert them into the run result.

use serde_json::{Map, Value, json};
use webpost_types::error::TemplateError;
use webpost_types::step::{Step, StepKind};

use crate::engine::context::RunContext;
use crate::engine::deps::ExecutionDeps;
use crate::engine::template::TemplateRenderer;

use super::{StepHandler, StepOutcome, wrong_kind};

#[derive(Debug, Clone, Copy, Default)]
pub struct ResultStepHandler;

impl StepHandler for ResultStepHandler {
    fn name(&self) -> &'static str {
        "result"
    }

    fn supports(&self, step: &Step) -> bool {
        matches!(step.kind, StepKind::Result(_))
    }

    async fn handle(&self, step: &Step, ctx: &mut RunContext, deps: &ExecutionDeps) -> StepOutcome {
        let StepKind::Result(spec) = &step.kind else {
            return wrong_kind(self.name(), step);
        };

        let rendered = deps.secret_map().map_err(|e| e.to_string()).and_then(|secrets| {
            let src = ctx.render_sources(&secrets);
            spec.fields
                .iter()
                .map(|(key, template)| Ok((key.clone(), TemplateRenderer::render_json(template, &src)?)))
                .collect::<Result<Map<String, Value>, TemplateError>>()
                .map_err(|e| e.to_string())
        });

        match rendered {
            Ok(fields) => {
                deps.logger.info("result.saved", json!({"step_id": step.id, "result": fields}));
                ctx.result.extend(fields);
                StepOutcome::success()
            }
            Err(message) => {
                deps.logger.error(
                    "result.step_failed",
                    json!({"step_id": step.id, "error": message}),
                );
                StepOutcome::failure(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingLogger, make_deps};

    #[tokio::test]
    async fn test_fields_are_rendered_and_upserted() {
        let step: Step = serde_json::from_str(
            r#"{"id":"done","type":"result","fields":{"reservation":"${vars.no}","count":"${vars.n}","fixed":true}}"#,
        )
        .unwrap();
        let vars = json!({"no": "R-1", "n": 3}).as_object().cloned().unwrap_or_default();
        let mut ctx = RunContext::new(vars);
        ctx.result.insert("reservation".to_string(), json!("old"));
        ctx.result.insert("kept".to_string(), json!("yes"));
        let logger = RecordingLogger::new();

        let outcome = ResultStepHandler.handle(&step, &mut ctx, &make_deps(&logger)).await;

        assert!(outcome.ok);
        assert_eq!(
            Value::Object(ctx.result.clone()),
            json!({"reservation": "R-1", "count": 3, "fixed": true, "kept": "yes"})
        );
        assert_eq!(logger.events_named("result.saved")[0].fields["result"]["reservation"], "R-1");
    }

    #[tokio::test]
    async fn test_render_error_fails_without_partial_update() {
        let step: Step = serde_json::from_str(
            r#"{"id":"done","type":"result","fields":{"a":"x","b":"${bad.root}"}}"#,
        )
        .unwrap();
        let mut ctx = RunContext::default();
        let logger = RecordingLogger::new();

        let outcome = ResultStepHandler.handle(&step, &mut ctx, &make_deps(&logger)).await;

        assert!(!outcome.ok);
        assert_eq!(outcome.error_message.as_deref(), Some("unknown root: bad"));
        assert!(ctx.result.is_empty());
        assert_eq!(logger.events_named("result.step_failed").len(), 1);
    }
}
