use thiserror::Error;

use crate::run::RunStatus;

/// Errors from locating or parsing a scenario file.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Scenario file not found: {0}")]
    NotFound(String),

    #[error("malformed scenario file '{path}': {reason}")]
    Malformed { path: String, reason: String },

    #[error("failed to read scenario file '{path}': {reason}")]
    Io { path: String, reason: String },
}

/// Errors from the run status store.
#[derive(Debug, Error)]
pub enum RunStateError {
    #[error("Run not found: {0}")]
    NotFound(String),

    #[error("Run already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid run transition: {run_id} {from} -> {to}")]
    InvalidTransition {
        run_id: String,
        from: RunStatus,
        to: RunStatus,
    },
}

/// Errors related to secret resolution.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Missing secrets. Set {}", .0.join(" and "))]
    Missing(Vec<String>),

    #[error("Unknown secret_ref: {0}")]
    UnknownRef(String),
}

/// Caller input rejected before any step runs.
#[derive(Debug, Error)]
pub enum InputValidationError {
    #[error("Missing required inputs: {}", .0.join(", "))]
    MissingInputs(Vec<String>),
}

/// Duplicate submission guard errors.
#[derive(Debug, Error)]
pub enum IdempotencyError {
    #[error("Idempotency key already used")]
    KeyAlreadyUsed(String),
}

/// Template expansion errors. Fatal for the step that triggered them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unknown root: {0}")]
    UnknownRoot(String),

    #[error("unclosed template: {0}")]
    Unclosed(String),

    #[error("{0} is not list for [*] expansion")]
    NotAList(String),

    #[error("invalid [*] usage: {0}")]
    InvalidWildcard(String),

    #[error("index access on non-list: {0}")]
    IndexOnNonList(String),
}
