//! In-process run stores.
//!
//! Both are backed by `DashMap`. Values are cloned on read so that no
//! shard guard outlives a call.

pub mod log_store;
pub mod repository;
