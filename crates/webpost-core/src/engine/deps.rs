//! Per-run collaborators handed to every step handler.

use std::sync::Arc;

use serde_json::{Map, Value};
use webpost_types::error::SecretError;

use crate::logging::Logger;
use crate::repository::secret::SecretProvider;

use super::template::secrets_to_map;

/// Resolves relative step URLs into absolute ones.
pub trait UrlResolver: Send + Sync {
    fn resolve(&self, url: &str) -> String;
}

/// Immutable bundle of the secret provider, URL resolver and logger.
///
/// Cloning is cheap (three `Arc`s). The executor rebinds the logger with
/// the run id via [`ExecutionDeps::with_logger`].
#[derive(Clone)]
pub struct ExecutionDeps {
    pub secrets: Arc<dyn SecretProvider>,
    pub urls: Arc<dyn UrlResolver>,
    pub logger: Arc<dyn Logger>,
}

impl ExecutionDeps {
    pub fn new(
        secrets: Arc<dyn SecretProvider>,
        urls: Arc<dyn UrlResolver>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            secrets,
            urls,
            logger,
        }
    }

    /// Same collaborators with a different logger.
    pub fn with_logger(&self, logger: Arc<dyn Logger>) -> Self {
        Self {
            secrets: Arc::clone(&self.secrets),
            urls: Arc::clone(&self.urls),
            logger,
        }
    }

    pub fn resolve_url(&self, url: &str) -> String {
        self.urls.resolve(url)
    }

    /// Secrets as the JSON map templates read under `secrets.*`.
    pub fn secret_map(&self) -> Result<Map<String, Value>, SecretError> {
        self.secrets.get().map(|secrets| secrets_to_map(&secrets))
    }
}

impl std::fmt::Debug for ExecutionDeps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionDeps")
            .field("secrets", &self.secrets.name())
            .finish_non_exhaustive()
    }
}
