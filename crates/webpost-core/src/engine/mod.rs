//! Scenario interpreter.
//!
//! - `RunContext`: mutable per-run state visible to templates
//! - `TemplateRenderer` / `ConditionEvaluator`: `${root.path}` expansion and
//!   the tiny comparison language used by assert and on_error
//! - `StepExecutor`: walks the step list with retry/goto/abort routing
//! - `HandlerRegistry`: closed dispatch from step kind to handler
//! - `trace`: pluggable enrichers that log HTTP exchanges

pub mod condition;
pub mod context;
pub mod deps;
pub mod executor;
pub mod form;
pub mod handlers;
pub mod html;
pub mod redact;
pub mod registry;
pub mod retry;
pub mod secret_policy;
pub mod template;
pub mod trace;
