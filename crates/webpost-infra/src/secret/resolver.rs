//! `secret_ref` to provider mapping.

use std::collections::HashMap;
use std::sync::Arc;

use webpost_core::repository::secret::SecretProvider;
use webpost_types::error::SecretError;
use webpost_types::run::RunRequest;

use super::env::EnvSecretProvider;
use super::inline::InlineSecretProvider;

/// Builds a provider for one run request.
pub type SecretFactory = Box<dyn Fn(&RunRequest) -> Arc<dyn SecretProvider> + Send + Sync>;

/// Key used when a request has no `secret_ref`.
pub const DEFAULT_SECRET_REF: &str = "inline";

/// Registry of named secret provider factories.
pub struct SecretProviderResolver {
    factories: HashMap<String, SecretFactory>,
    default_ref: String,
}

impl SecretProviderResolver {
    pub fn new(default_ref: impl Into<String>) -> Self {
        Self {
            factories: HashMap::new(),
            default_ref: default_ref.into(),
        }
    }

    /// `inline` (default) and `env` with the given required variable names.
    pub fn standard(env_required: Vec<String>) -> Self {
        Self::new(DEFAULT_SECRET_REF)
            .register("inline", |request: &RunRequest| {
                Arc::new(InlineSecretProvider::new(&request.secrets)) as Arc<dyn SecretProvider>
            })
            .register("env", move |_request: &RunRequest| {
                Arc::new(EnvSecretProvider::new(env_required.clone())) as Arc<dyn SecretProvider>
            })
    }

    pub fn register<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&RunRequest) -> Arc<dyn SecretProvider> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    /// Provider for `request.secret_ref`, or the default when it is unset.
    pub fn resolve(&self, request: &RunRequest) -> Result<Arc<dyn SecretProvider>, SecretError> {
        let key = request.secret_ref.as_deref().unwrap_or(&self.default_ref);
        self.factories
            .get(key)
            .map(|factory| factory(request))
            .ok_or_else(|| SecretError::UnknownRef(key.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for SecretProviderResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretProviderResolver")
            .field("factories", &self.names())
            .field("default_ref", &self.default_ref)
            .finish()
    }
}
