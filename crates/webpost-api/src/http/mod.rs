//! HTTP/REST API layer for webpost.
//!
//! Axum-based REST API for submitting scenario runs and polling tracked
//! runs, with an envelope response format and CORS support.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
