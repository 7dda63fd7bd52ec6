//! Scenario files on disk.
//!
//! - `finder`: recursive `{id}.yaml|.yml|.json` lookup
//! - `loader`: YAML/JSON parsing into `Scenario`
//! - `FileScenarioSource`: the `ScenarioSource` implementation combining both

pub mod finder;
pub mod loader;

use std::path::PathBuf;

use webpost_core::repository::scenario::ScenarioSource;
use webpost_types::error::ScenarioError;
use webpost_types::scenario::Scenario;

use self::finder::ScenarioFileFinder;
use self::loader::ScenarioLoader;

/// Loads scenarios from a directory tree.
///
/// Files are re-read on every call, so edits take effect on the next run.
#[derive(Debug, Clone)]
pub struct FileScenarioSource {
    finder: ScenarioFileFinder,
}

impl FileScenarioSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            finder: ScenarioFileFinder::new(base_dir),
        }
    }
}

impl ScenarioSource for FileScenarioSource {
    async fn load(&self, scenario_id: &str) -> Result<Scenario, ScenarioError> {
        let finder = self.finder.clone();
        let id = scenario_id.to_string();
        let path = tokio::task::spawn_blocking(move || finder.find_by_id(&id))
            .await
            .map_err(|e| ScenarioError::Io {
                path: self.finder.base_dir().display().to_string(),
                reason: e.to_string(),
            })?
            .ok_or_else(|| ScenarioError::NotFound(scenario_id.to_string()))?;

        tracing::debug!(scenario_id, path = %path.display(), "loading scenario");
        let mut scenario = ScenarioLoader::load(&path).await?;
        if scenario.meta.id.is_empty() {
            scenario.meta.id = scenario_id.to_string();
        }
        Ok(scenario)
    }
}
