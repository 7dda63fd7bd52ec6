//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! `ScenarioRunService` is generic over its scenario source and takes its
//! stores as trait objects; AppState pins them to the infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use webpost_core::repository::run::RunLogStore;
use webpost_core::service::run::RunExecutionContext;
use webpost_core::service::scenario_run::{RunStores, ScenarioRunService};
use webpost_core::service::scheduler::RunScheduler;
use webpost_infra::config::{load_app_config, resolve_data_dir};
use webpost_infra::context::LiveRunContext;
use webpost_infra::idempotency::InMemoryIdempotencyStore;
use webpost_infra::run::log_store::InMemoryRunLogStore;
use webpost_infra::run::repository::InMemoryRunRepository;
use webpost_infra::scenario::FileScenarioSource;
use webpost_types::config::AppConfig;

pub type ConcreteRunService = ScenarioRunService<FileScenarioSource>;

/// Shared application state.
///
/// Used by both CLI commands and REST API handlers. Cloning shares the
/// stores and the scheduler.
#[derive(Clone)]
pub struct AppState {
    pub run_service: Arc<ConcreteRunService>,
    pub config: Arc<AppConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load `webpost.toml` from the data directory and wire services.
    ///
    /// `scenarios_dir` overrides the configured scenario directory.
    pub async fn init(scenarios_dir: Option<PathBuf>) -> Self {
        let data_dir = resolve_data_dir();
        let mut config = load_app_config(&data_dir).await;
        if let Some(dir) = scenarios_dir {
            config.scenarios_dir = dir;
        }
        if !config.scenarios_dir.is_dir() {
            tracing::warn!(
                dir = %config.scenarios_dir.display(),
                "scenarios directory does not exist"
            );
        }
        Self::from_config(config, data_dir)
    }

    pub fn from_config(config: AppConfig, data_dir: PathBuf) -> Self {
        let logs: Arc<dyn RunLogStore> = Arc::new(InMemoryRunLogStore::new());
        let env: Arc<dyn RunExecutionContext> =
            Arc::new(LiveRunContext::from_config(&config, Arc::clone(&logs)));
        let stores = RunStores {
            runs: Arc::new(InMemoryRunRepository::new()),
            logs,
            idempotency: Arc::new(InMemoryIdempotencyStore::new()),
        };

        let run_service = ScenarioRunService::new(
            FileScenarioSource::new(config.scenarios_dir.clone()),
            env,
            stores,
            RunScheduler::new(config.runner.max_workers),
        )
        .with_max_wait_sec(config.runner.max_wait_sec);

        tracing::debug!(
            scenarios_dir = %config.scenarios_dir.display(),
            max_workers = config.runner.max_workers,
            max_wait_sec = config.runner.max_wait_sec,
            "application state initialized"
        );

        Self {
            run_service: Arc::new(run_service),
            config: Arc::new(config),
            data_dir,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::Path;

    use super::*;

    /// State over a scenarios directory, with default settings otherwise.
    pub(crate) fn state_for(scenarios_dir: &Path) -> AppState {
        let config = AppConfig {
            scenarios_dir: scenarios_dir.to_path_buf(),
            ..AppConfig::default()
        };
        AppState::from_config(config, scenarios_dir.to_path_buf())
    }

    #[test]
    fn test_from_config_applies_runner_settings() {
        let mut config = AppConfig::default();
        config.runner.max_wait_sec = 5;
        let state = AppState::from_config(config, PathBuf::from("/tmp/webpost"));
        assert_eq!(state.run_service.max_wait_sec(), 5);
        assert_eq!(state.data_dir, PathBuf::from("/tmp/webpost"));
    }
}
