//! Live run wiring.
//!
//! [`LiveRunContext`] implements the [`RunExecutionContext`] trait from
//! webpost-core with the concrete pieces in this crate:
//! - console + run-log logging via `CompositeLogger`
//! - `inline`/`env` secret selection via `SecretProviderResolver`
//! - a fresh `ReqwestTransport` (and cookie jar) per run
//! - optional raw artifact capture on every HTTP exchange

use std::sync::Arc;

use webpost_core::engine::deps::UrlResolver;
use webpost_core::engine::executor::StepExecutor;
use webpost_core::engine::registry::HandlerRegistry;
use webpost_core::engine::trace::TraceEnricher;
use webpost_core::http::box_transport::BoxHttpTransport;
use webpost_core::http::transport::TransportError;
use webpost_core::logging::Logger;
use webpost_core::repository::run::RunLogStore;
use webpost_core::repository::secret::SecretProvider;
use webpost_core::service::run::RunExecutionContext;
use webpost_types::config::{AppConfig, HttpConfig};
use webpost_types::error::SecretError;
use webpost_types::run::RunRequest;
use webpost_types::scenario::Scenario;

use crate::artifacts::ArtifactSaver;
use crate::http::client::ReqwestTransport;
use crate::logging::composite::CompositeLogger;
use crate::logging::console::ConsoleLogger;
use crate::logging::run_log::RunLogLogger;
use crate::secret::resolver::SecretProviderResolver;
use crate::url::BaseUrlResolver;

pub struct LiveRunContext {
    http: HttpConfig,
    logs: Arc<dyn RunLogStore>,
    secrets: SecretProviderResolver,
    artifacts: Option<Arc<ArtifactSaver>>,
}

impl LiveRunContext {
    pub fn new(
        http: HttpConfig,
        logs: Arc<dyn RunLogStore>,
        secrets: SecretProviderResolver,
        artifacts: Option<Arc<ArtifactSaver>>,
    ) -> Self {
        Self {
            http,
            logs,
            secrets,
            artifacts,
        }
    }

    /// Wiring described by `webpost.toml`.
    pub fn from_config(config: &AppConfig, logs: Arc<dyn RunLogStore>) -> Self {
        let artifacts = config
            .artifacts
            .enabled
            .then(|| Arc::new(ArtifactSaver::new(config.artifacts.dir.clone())));
        if let Some(saver) = &artifacts {
            tracing::info!(dir = %saver.root().display(), "HTTP artifact capture enabled");
        }
        Self::new(
            config.http.clone(),
            logs,
            SecretProviderResolver::standard(config.secrets.env_required.clone()),
            artifacts,
        )
    }

    pub fn logs(&self) -> &Arc<dyn RunLogStore> {
        &self.logs
    }
}

impl RunExecutionContext for LiveRunContext {
    fn run_logger(&self, run_id: &str) -> Arc<dyn Logger> {
        Arc::new(CompositeLogger::new(vec![
            Arc::new(ConsoleLogger::new()),
            Arc::new(RunLogLogger::new(run_id, Arc::clone(&self.logs))),
        ]))
    }

    fn secret_provider(&self, request: &RunRequest) -> Result<Arc<dyn SecretProvider>, SecretError> {
        self.secrets.resolve(request)
    }

    fn url_resolver(&self, scenario: &Scenario) -> Arc<dyn UrlResolver> {
        Arc::new(BaseUrlResolver::new(scenario.base_url()))
    }

    fn executor(&self, scenario: &Scenario) -> Result<StepExecutor, TransportError> {
        let transport = ReqwestTransport::for_scenario(scenario, &self.http)?;
        let extra: Vec<Arc<dyn TraceEnricher>> = self
            .artifacts
            .iter()
            .map(|saver| Arc::clone(saver) as Arc<dyn TraceEnricher>)
            .collect();
        Ok(StepExecutor::new(HandlerRegistry::standard(
            BoxHttpTransport::new(transport),
            extra,
        )))
    }
}

impl std::fmt::Debug for LiveRunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveRunContext")
            .field("http", &self.http)
            .field("secrets", &self.secrets)
            .field("artifacts", &self.artifacts.is_some())
            .finish_non_exhaustive()
    }
}
