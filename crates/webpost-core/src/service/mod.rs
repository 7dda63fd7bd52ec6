//! Run services built on the engine and the repository ports.
//!
//! - `input` / `idempotency`: request checks before anything runs
//! - `error_detail`: structured failure payloads
//! - `scheduler`: bounded background execution with completion waits
//! - `run`: one scenario execution, tracked or not
//! - `scenario_run`: the submit/get/logs entry points used by the API and CLI

pub mod error_detail;
pub mod idempotency;
pub mod input;
pub mod run;
pub mod scenario_run;
pub mod scheduler;
