//! Global configuration types for the scenario runner.
//!
//! `AppConfig` represents `webpost.toml`, which controls where scenarios are
//! found, how many runs execute concurrently, HTTP transport defaults, trace
//! artifact persistence, and which environment secrets are required.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Upper bound for the `wait_sec` query parameter.
pub const DEFAULT_MAX_WAIT_SEC: u64 = 30;

/// Top-level configuration.
///
/// Loaded from `{data_dir}/webpost.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Root directory searched (recursively) for `{id}.yaml|.yml|.json`.
    #[serde(default = "default_scenarios_dir")]
    pub scenarios_dir: PathBuf,

    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub artifacts: ArtifactConfig,

    #[serde(default)]
    pub secrets: SecretsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            scenarios_dir: default_scenarios_dir(),
            runner: RunnerConfig::default(),
            http: HttpConfig::default(),
            artifacts: ArtifactConfig::default(),
            secrets: SecretsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Worker pool and wait settings for asynchronous runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Maximum number of runs executing at once.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Ceiling for the caller-supplied `wait_sec`.
    #[serde(default = "default_max_wait_sec")]
    pub max_wait_sec: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            max_wait_sec: default_max_wait_sec(),
        }
    }
}

/// Fallbacks for scenarios without `defaults.http`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Overrides the scenario timeout when set.
    #[serde(default)]
    pub timeout_sec: Option<u64>,
    /// Overrides `meta.user_agent` when set.
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Raw request/response capture for debugging target sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_artifact_dir")]
    pub dir: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_artifact_dir(),
        }
    }
}

/// Environment secret provider settings (`secret_ref = env`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// Variables that must all be set; each becomes a secret of the same name.
    #[serde(default)]
    pub env_required: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_scenarios_dir() -> PathBuf {
    PathBuf::from("scenarios")
}

fn default_max_workers() -> usize {
    4
}

fn default_max_wait_sec() -> u64 {
    DEFAULT_MAX_WAIT_SEC
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("tmp/http")
}
