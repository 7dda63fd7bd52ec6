//! Idempotency key store trait.

/// Set of keys already used to submit a run.
pub trait IdempotencyStore: Send + Sync {
    /// Atomically insert `key`. Returns `true` if it was not present.
    fn register(&self, key: &str) -> bool;
}
