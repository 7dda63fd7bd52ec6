//! Infrastructure layer for webpost.
//!
//! Contains implementations of the ports defined in `webpost-core`: scenario
//! files on disk, the reqwest-backed session transport, secret providers,
//! in-memory run stores, run-event loggers and HTTP artifact capture.
//! [`context::LiveRunContext`] wires them together for the API and CLI.

pub mod artifacts;
pub mod config;
pub mod context;
pub mod http;
pub mod idempotency;
pub mod logging;
pub mod run;
pub mod scenario;
pub mod secret;
pub mod url;
