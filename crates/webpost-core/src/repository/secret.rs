//! Secret provider trait definition.

use std::collections::HashMap;

use webpost_types::error::SecretError;

/// Source of the secret values visible to templates under `secrets.*`.
///
/// One provider is resolved per run from the request's `secret_ref`.
/// Implementations live in webpost-infra (inline request secrets,
/// environment variables).
pub trait SecretProvider: Send + Sync {
    /// Human-readable provider name (e.g., "inline", "env").
    fn name(&self) -> &str;

    /// Return every secret this provider exposes.
    fn get(&self) -> Result<HashMap<String, String>, SecretError>;
}
