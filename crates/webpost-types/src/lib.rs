//! Shared domain types for the WebPost scenario runner.
//!
//! This crate contains the declarative scenario model (steps, retry and
//! on_error policy), the run status projection, configuration, and the
//! domain error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod error;
pub mod run;
pub mod scenario;
pub mod step;

mod de;
