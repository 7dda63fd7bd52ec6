//! Secret provider implementations.
//!
//! - `inline`: secrets carried in the run request body
//! - `env`: named environment variables, all required
//! - `resolver`: maps a request's `secret_ref` to one of the above

pub mod env;
pub mod inline;
pub mod resolver;
