//! Structured error details for failed runs.

use webpost_types::run::{ErrorCode, ErrorDetail};

use crate::engine::context::RunContext;
use crate::engine::executor::ExecutionResult;

/// Default message when a failed step reported none.
pub const DEFAULT_STEP_FAILURE: &str = "Step execution failed";

pub struct ExecutionErrorBuilder;

impl ExecutionErrorBuilder {
    /// Detail for a run that ended with a failed step.
    pub fn build_from_result(result: &ExecutionResult, ctx: Option<&RunContext>) -> ErrorDetail {
        ErrorDetail {
            code: ErrorCode::StepFailed,
            message: result
                .error_message
                .clone()
                .unwrap_or_else(|| DEFAULT_STEP_FAILURE.to_string()),
            step_id: result.failed_step_id.clone(),
            last_status: ctx.and_then(RunContext::last_status),
        }
    }

    /// Detail for an error raised outside step handling.
    pub fn build_from_exception(message: impl Into<String>, ctx: Option<&RunContext>) -> ErrorDetail {
        ErrorDetail {
            code: ErrorCode::Exception,
            message: message.into(),
            step_id: None,
            last_status: ctx.and_then(RunContext::last_status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::LastResponse;

    fn ctx_with_status(status: u16) -> RunContext {
        let mut ctx = RunContext::default();
        ctx.last = Some(LastResponse {
            status,
            url: "https://example.test/".to_string(),
            text: String::new(),
            headers: Default::default(),
        });
        ctx
    }

    #[test]
    fn test_from_result_uses_step_and_last_status() {
        let result = ExecutionResult::failed("submit", Some("bad".to_string()));
        let detail = ExecutionErrorBuilder::build_from_result(&result, Some(&ctx_with_status(500)));
        assert_eq!(detail.code, ErrorCode::StepFailed);
        assert_eq!(detail.message, "bad");
        assert_eq!(detail.step_id.as_deref(), Some("submit"));
        assert_eq!(detail.last_status, Some(500));
    }

    #[test]
    fn test_from_result_default_message() {
        let result = ExecutionResult::failed("submit", None);
        let detail = ExecutionErrorBuilder::build_from_result(&result, None);
        assert_eq!(detail.message, DEFAULT_STEP_FAILURE);
        assert_eq!(detail.last_status, None);
    }

    #[test]
    fn test_from_exception() {
        let detail = ExecutionErrorBuilder::build_from_exception("boom", Some(&RunContext::default()));
        assert_eq!(detail.code, ErrorCode::Exception);
        assert_eq!(detail.step_id, None);
        assert_eq!(detail.last_status, None);
    }
}
