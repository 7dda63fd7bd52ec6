//! Environment variable secret provider.
//!
//! Reads a fixed list of variable names (`[secrets] env_required` in
//! `webpost.toml`). Every name must be set and non-empty; each becomes a
//! secret of the same name.

use std::collections::HashMap;

use webpost_core::repository::secret::SecretProvider;
use webpost_types::error::SecretError;

#[derive(Debug, Clone, Default)]
pub struct EnvSecretProvider {
    required: Vec<String>,
}

impl EnvSecretProvider {
    pub fn new(required: Vec<String>) -> Self {
        Self { required }
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }
}

impl SecretProvider for EnvSecretProvider {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self) -> Result<HashMap<String, String>, SecretError> {
        let mut found = HashMap::with_capacity(self.required.len());
        let mut missing = Vec::new();
        for name in &self.required {
            // Non-UTF-8 values count as unset.
            match std::env::var(name) {
                Ok(value) if !value.is_empty() => {
                    found.insert(name.clone(), value);
                }
                _ => missing.push(name.clone()),
            }
        }
        if missing.is_empty() {
            Ok(found)
        } else {
            Err(SecretError::Missing(missing))
        }
    }
}
