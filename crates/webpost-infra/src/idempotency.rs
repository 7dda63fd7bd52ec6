//! In-memory [`IdempotencyStore`].

use dashmap::DashSet;
use webpost_core::repository::idempotency::IdempotencyStore;

/// Keys used so far in this process. Never expires, so the set grows for
/// the process lifetime.
#[derive(Debug, Default)]
pub struct InMemoryIdempotencyStore {
    keys: DashSet<String>,
}

impl InMemoryIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdempotencyStore for InMemoryIdempotencyStore {
    fn register(&self, key: &str) -> bool {
        self.keys.insert(key.to_string())
    }
}
