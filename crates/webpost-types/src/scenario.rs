//! Scenario aggregate: metadata, declared inputs, HTTP defaults, and steps.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::step::Step;

/// Default user agent when a scenario does not declare one.
pub const DEFAULT_USER_AGENT: &str = "ScenarioRunner/1.0";

/// Default per-request timeout for scenario HTTP steps.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;

/// A named, versioned, ordered list of steps plus input/default configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub meta: ScenarioMeta,
    #[serde(default)]
    pub inputs: ScenarioInputs,
    #[serde(default)]
    pub defaults: ScenarioDefaults,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Fill derived fields after parsing (step names default to their id).
    pub fn normalized(mut self) -> Self {
        for step in &mut self.steps {
            if step.name.is_empty() {
                step.name = step.id.clone();
            }
        }
        self
    }

    /// Base URL for relative step URLs (empty when no HTTP defaults exist).
    pub fn base_url(&self) -> &str {
        self.defaults
            .http
            .as_ref()
            .map(|h| h.base_url.as_str())
            .unwrap_or("")
    }

    /// Names of required inputs that are absent or null in `vars`.
    pub fn missing_inputs(&self, vars: &Map<String, Value>) -> Vec<String> {
        self.inputs
            .required
            .iter()
            .filter(|key| matches!(vars.get(key.as_str()), None | Some(Value::Null)))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioMeta {
    #[serde(default, deserialize_with = "crate::de::string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_version", deserialize_with = "crate::de::string_or_number")]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ScenarioMeta {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            version: default_version(),
            description: String::new(),
            enabled: true,
            user_agent: default_user_agent(),
        }
    }
}

/// Input variable names the caller is expected to provide.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioInputs {
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub optional: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpDefaults>,
}

/// Transport defaults applied to every HTTP step of the scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpDefaults {
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_timeout_sec")]
    pub timeout_sec: u64,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for HttpDefaults {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_sec: DEFAULT_HTTP_TIMEOUT_SECS,
            headers: BTreeMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_version() -> String {
    "1".to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_sec() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}
