//! Parse scenario files (YAML or JSON) into [`Scenario`] values.

use std::path::Path;

use webpost_types::error::ScenarioError;
use webpost_types::scenario::Scenario;

/// Stateless scenario file parser.
pub struct ScenarioLoader;

impl ScenarioLoader {
    /// Parse `content` read from `path`, choosing the format by extension.
    ///
    /// `.json` uses serde_json; every other extension is treated as YAML.
    /// The result is normalized (step names default to ids).
    pub fn parse(path: &Path, content: &str) -> Result<Scenario, ScenarioError> {
        let malformed = |reason: String| ScenarioError::Malformed {
            path: path.display().to_string(),
            reason,
        };

        if content.trim().is_empty() {
            return Err(malformed("file is empty".to_string()));
        }

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let scenario = if is_json {
            serde_json::from_str::<Scenario>(content).map_err(|e| malformed(e.to_string()))?
        } else {
            serde_yaml_ng::from_str::<Scenario>(content).map_err(|e| malformed(e.to_string()))?
        };
        Ok(scenario.normalized())
    }

    /// Read and parse the file at `path`.
    pub async fn load(path: &Path) -> Result<Scenario, ScenarioError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ScenarioError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Self::parse(path, &content)
    }
}
