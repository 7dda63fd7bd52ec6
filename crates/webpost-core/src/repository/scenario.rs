//! Scenario source trait definition.

use webpost_types::error::ScenarioError;
use webpost_types::scenario::Scenario;

/// Resolves a scenario id to a parsed, normalized [`Scenario`].
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
/// Implementations live in webpost-infra (e.g., `FileScenarioSource`).
pub trait ScenarioSource: Send + Sync {
    /// Load a scenario by id.
    ///
    /// Returns `ScenarioError::NotFound` when no file matches and
    /// `ScenarioError::Malformed` when one matches but fails to parse.
    fn load(
        &self,
        scenario_id: &str,
    ) -> impl std::future::Future<Output = Result<Scenario, ScenarioError>> + Send;
}
