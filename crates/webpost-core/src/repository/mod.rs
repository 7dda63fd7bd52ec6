//! Repository trait definitions (ports).
//!
//! These traits define the storage and lookup interfaces that the
//! infrastructure layer (webpost-infra) implements. The core crate never
//! depends on a specific storage technology.

pub mod idempotency;
pub mod run;
pub mod scenario;
pub mod secret;
