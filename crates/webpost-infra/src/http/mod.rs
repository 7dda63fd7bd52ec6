//! Target-site HTTP session.
//!
//! - `client`: `ReqwestTransport`, the `HttpTransport` implementation
//! - `cookie_jar`: enumerable per-run cookie store

pub mod client;
pub mod cookie_jar;
