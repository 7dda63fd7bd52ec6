//! Request-scoped secret provider.

use std::collections::HashMap;

use secrecy::{ExposeSecret, SecretString};
use webpost_core::repository::secret::SecretProvider;
use webpost_types::error::SecretError;

/// Holds the `secrets` map submitted with a run request.
///
/// Values stay wrapped in [`SecretString`] until a step renders them, so
/// they never show up in `Debug` output.
pub struct InlineSecretProvider {
    secrets: HashMap<String, SecretString>,
}

impl InlineSecretProvider {
    pub fn new(secrets: &HashMap<String, String>) -> Self {
        Self {
            secrets: secrets
                .iter()
                .map(|(k, v)| (k.clone(), SecretString::from(v.clone())))
                .collect(),
        }
    }
}

impl SecretProvider for InlineSecretProvider {
    fn name(&self) -> &str {
        "inline"
    }

    fn get(&self) -> Result<HashMap<String, String>, SecretError> {
        Ok(self
            .secrets
            .iter()
            .map(|(k, v)| (k.clone(), v.expose_secret().to_string()))
            .collect())
    }
}

impl std::fmt::Debug for InlineSecretProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&String> = self.secrets.keys().collect();
        keys.sort();
        f.debug_struct("InlineSecretProvider")
            .field("keys", &keys)
            .finish()
    }
}
