//! Duplicate submission guard.

use std::sync::Arc;

use webpost_types::error::IdempotencyError;

use crate::repository::idempotency::IdempotencyStore;

#[derive(Clone)]
pub struct IdempotencyService {
    store: Arc<dyn IdempotencyStore>,
}

impl IdempotencyService {
    pub fn new(store: Arc<dyn IdempotencyStore>) -> Self {
        Self { store }
    }

    /// Register `key`, failing if it was used before.
    pub fn register_or_raise(&self, key: &str) -> Result<(), IdempotencyError> {
        if self.store.register(key) {
            Ok(())
        } else {
            Err(IdempotencyError::KeyAlreadyUsed(key.to_string()))
        }
    }
}
