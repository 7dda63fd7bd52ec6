//! Process-level observability for webpost.
//!
//! Run events have their own pipeline (the `Logger` port in webpost-core);
//! this crate only installs the global `tracing` subscriber those events and
//! the server's own diagnostics end up in.

pub mod tracing_setup;
