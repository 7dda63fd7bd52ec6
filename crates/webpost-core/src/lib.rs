//! Step execution engine and port traits for webpost.
//!
//! This crate defines the "ports" (logger, transport, repositories, secret
//! providers) that the infrastructure layer implements, together with the
//! scenario interpreter and the run services built on top of them. It
//! depends only on `webpost-types` -- never on `webpost-infra`.

pub mod engine;
pub mod http;
pub mod logging;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;
