//! Run tracking types: status projection, log entries, request/response shapes.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// RunStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of an asynchronous run.
///
/// Strictly forward-moving: `queued -> running -> {succeeded, failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Succeeded | RunStatus::Failed)
    }

    /// Whether `self -> next` is a legal edge. Terminal states have no
    /// outgoing edges and `running` cannot be skipped.
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        match self {
            RunStatus::Queued => next == RunStatus::Running,
            RunStatus::Running => next.is_terminal(),
            RunStatus::Succeeded | RunStatus::Failed => false,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Queued => write!(f, "queued"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Succeeded => write!(f, "succeeded"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// ErrorDetail
// ---------------------------------------------------------------------------

/// Machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// A step failed and routing resolved to abort (or retries ran out).
    StepFailed,
    /// Anything raised outside step handling: fatal interpreter errors,
    /// secret resolution, scenario problems.
    Exception,
}

/// Structured failure surfaced to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub message: String,
    /// Failed step, when known.
    pub step_id: Option<String>,
    /// Status of the last HTTP response observed, if any HTTP step ran.
    pub last_status: Option<u16>,
}

// ---------------------------------------------------------------------------
// RunRecord
// ---------------------------------------------------------------------------

/// Status projection of one asynchronous run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub scenario_id: String,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub result: Option<Map<String, Value>>,
    pub error: Option<String>,
    pub error_detail: Option<ErrorDetail>,
}

impl RunRecord {
    /// New record in `queued`.
    pub fn queued(run_id: impl Into<String>, scenario_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            run_id: run_id.into(),
            scenario_id: scenario_id.into(),
            status: RunStatus::Queued,
            created_at: now,
            updated_at: now,
            result: None,
            error: None,
            error_detail: None,
        }
    }

    /// Copy with a new status. Payload fields passed as `None` keep their
    /// previous value.
    pub fn with_status(&self, status: RunStatus, payload: RunPayload) -> Self {
        Self {
            run_id: self.run_id.clone(),
            scenario_id: self.scenario_id.clone(),
            status,
            created_at: self.created_at,
            updated_at: Utc::now(),
            result: payload.result.or_else(|| self.result.clone()),
            error: payload.error.or_else(|| self.error.clone()),
            error_detail: payload.error_detail.or_else(|| self.error_detail.clone()),
        }
    }
}

/// Optional payload attached to a status transition.
#[derive(Debug, Clone, Default)]
pub struct RunPayload {
    pub result: Option<Map<String, Value>>,
    pub error: Option<String>,
    pub error_detail: Option<ErrorDetail>,
}

// ---------------------------------------------------------------------------
// RunLogEntry
// ---------------------------------------------------------------------------

/// One event captured for a run, in emission order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub timestamp: DateTime<Utc>,
    pub event: String,
    pub fields: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// Caller input for starting a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunRequest {
    /// Input variables.
    #[serde(default)]
    pub vars: Map<String, Value>,
    /// Inline secrets (used with `secret_ref = inline`).
    #[serde(default)]
    pub secrets: HashMap<String, String>,
    /// Secret provider selection: `inline` (default) or `env`.
    #[serde(default)]
    pub secret_ref: Option<String>,
    /// Prevents duplicate execution when provided.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Terminal outcome of a run as reported to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
    pub success: bool,
    pub result: Option<Map<String, Value>>,
    pub error: Option<String>,
    pub error_detail: Option<ErrorDetail>,
}

impl RunResponse {
    /// Project a terminal record into the synchronous response shape.
    pub fn from_record(record: &RunRecord) -> Self {
        Self {
            success: record.status == RunStatus::Succeeded,
            result: record.result.clone(),
            error: record.error.clone(),
            error_detail: record.error_detail.clone(),
        }
    }
}
