//! Step handlers, one per step kind.
//!
//! Handlers never return errors: every handler-local failure (transport,
//! template, scrape, assertion) is logged and reported as a failed
//! [`StepOutcome`], leaving routing to the executor.

pub mod assert;
pub mod http;
pub mod log;
pub mod result;
pub mod scrape;

use webpost_types::step::Step;

use super::context::RunContext;
use super::deps::ExecutionDeps;

/// Result of running one step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub ok: bool,
    pub error_message: Option<String>,
    /// Handler-initiated jump taken after a successful step. Reserved: the
    /// built-in handlers always leave it unset.
    pub goto_step_id: Option<String>,
}

impl StepOutcome {
    pub fn success() -> Self {
        Self {
            ok: true,
            ..Default::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_message: Some(message.into()),
            goto_step_id: None,
        }
    }
}

/// Executes steps of one kind.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait StepHandler: Send + Sync {
    /// Handler name used in logs.
    fn name(&self) -> &'static str;

    fn supports(&self, step: &Step) -> bool;

    /// Run `step`, mutating `ctx`. Steps of an unsupported kind fail.
    fn handle(
        &self,
        step: &Step,
        ctx: &mut RunContext,
        deps: &ExecutionDeps,
    ) -> impl std::future::Future<Output = StepOutcome> + Send;
}

pub(crate) fn wrong_kind(handler: &str, step: &Step) -> StepOutcome {
    StepOutcome::failure(format!(
        "{handler} handler cannot run step '{}' of type {}",
        step.id,
        step.type_name()
    ))
}
