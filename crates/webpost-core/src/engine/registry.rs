//! Closed dispatch from step kind to handler.
//!
//! The HTTP handler needs a transport, so it is optional: a registry built
//! without one (e.g. for dry checks) reports `NoHandler` for HTTP steps.

use std::sync::Arc;

use webpost_types::step::{Step, StepKind};

use super::context::RunContext;
use super::deps::ExecutionDeps;
use super::executor::ExecutorError;
use super::handlers::assert::AssertStepHandler;
use super::handlers::http::HttpStepHandler;
use super::handlers::log::LogStepHandler;
use super::handlers::result::ResultStepHandler;
use super::handlers::scrape::ScrapeStepHandler;
use super::handlers::{StepHandler, StepOutcome};
use super::trace::{TraceEmitter, TraceEnricher};
use crate::http::box_transport::BoxHttpTransport;

/// Handler resolved for one step.
#[derive(Debug, Clone, Copy)]
pub enum HandlerRef<'a> {
    Http(&'a HttpStepHandler),
    Scrape(&'a ScrapeStepHandler),
    Assert(&'a AssertStepHandler),
    Result(&'a ResultStepHandler),
    Log(&'a LogStepHandler),
}

impl HandlerRef<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            HandlerRef::Http(h) => h.name(),
            HandlerRef::Scrape(h) => h.name(),
            HandlerRef::Assert(h) => h.name(),
            HandlerRef::Result(h) => h.name(),
            HandlerRef::Log(h) => h.name(),
        }
    }

    pub async fn handle(&self, step: &Step, ctx: &mut RunContext, deps: &ExecutionDeps) -> StepOutcome {
        match self {
            HandlerRef::Http(h) => h.handle(step, ctx, deps).await,
            HandlerRef::Scrape(h) => h.handle(step, ctx, deps).await,
            HandlerRef::Assert(h) => h.handle(step, ctx, deps).await,
            HandlerRef::Result(h) => h.handle(step, ctx, deps).await,
            HandlerRef::Log(h) => h.handle(step, ctx, deps).await,
        }
    }
}

/// The built-in handlers, one per step kind.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    http: Option<HttpStepHandler>,
    scrape: ScrapeStepHandler,
    assert: AssertStepHandler,
    result: ResultStepHandler,
    log: LogStepHandler,
}

impl HandlerRegistry {
    /// Registry without an HTTP handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// All handlers, with the standard trace enrichers plus `extra`.
    pub fn standard(transport: BoxHttpTransport, extra: Vec<Arc<dyn TraceEnricher>>) -> Self {
        Self::new().with_http(HttpStepHandler::new(transport, TraceEmitter::standard(extra)))
    }

    pub fn with_http(mut self, handler: HttpStepHandler) -> Self {
        self.http = Some(handler);
        self
    }

    pub fn resolve(&self, step: &Step) -> Result<HandlerRef<'_>, ExecutorError> {
        let handler = match &step.kind {
            StepKind::Http(_) => self.http.as_ref().map(HandlerRef::Http),
            StepKind::Scrape(_) => Some(HandlerRef::Scrape(&self.scrape)),
            StepKind::Assert(_) => Some(HandlerRef::Assert(&self.assert)),
            StepKind::Result(_) => Some(HandlerRef::Result(&self.result)),
            StepKind::Log(_) => Some(HandlerRef::Log(&self.log)),
        };
        handler.ok_or_else(|| ExecutorError::NoHandler {
            step_id: step.id.clone(),
            step_type: step.type_name().to_string(),
        })
    }
}
