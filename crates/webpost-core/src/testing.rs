//! Test doubles shared by the engine and service tests.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::{Map, Value};
use webpost_types::error::{RunStateError, ScenarioError, SecretError};
use webpost_types::run::{RunLogEntry, RunPayload, RunRecord, RunRequest, RunStatus};
use webpost_types::scenario::Scenario;
use webpost_types::step::LogLevel;

use crate::engine::deps::{ExecutionDeps, UrlResolver};
use crate::engine::executor::StepExecutor;
use crate::engine::registry::HandlerRegistry;
use crate::http::box_transport::BoxHttpTransport;
use crate::http::transport::{
    CookieRecord, HttpRequest, HttpResponse, HttpTransport, TransportError,
};
use crate::logging::{Logger, merge_fields};
use crate::repository::idempotency::IdempotencyStore;
use crate::repository::run::{RunLogStore, RunRepository};
use crate::repository::scenario::ScenarioSource;
use crate::repository::secret::SecretProvider;
use crate::service::run::RunExecutionContext;

// ---------------------------------------------------------------------------
// RecordingLogger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RecordedEvent {
    pub level: LogLevel,
    pub event: String,
    pub fields: Map<String, Value>,
}

/// Logger that keeps every event in memory. Bound children share the sink.
#[derive(Clone, Default)]
pub struct RecordingLogger {
    sink: Arc<Mutex<Vec<RecordedEvent>>>,
    bound: Map<String, Value>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.sink.lock().unwrap().clone()
    }

    pub fn events_named(&self, name: &str) -> Vec<RecordedEvent> {
        self.events().into_iter().filter(|e| e.event == name).collect()
    }

    pub fn event_names(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.event).collect()
    }
}

impl Logger for RecordingLogger {
    fn emit(&self, level: LogLevel, event: &str, fields: Map<String, Value>) {
        self.sink.lock().unwrap().push(RecordedEvent {
            level,
            event: event.to_string(),
            fields: merge_fields(&self.bound, fields),
        });
    }

    fn bind(&self, fields: Map<String, Value>) -> Arc<dyn Logger> {
        Arc::new(Self {
            sink: Arc::clone(&self.sink),
            bound: merge_fields(&self.bound, fields),
        })
    }
}

// ---------------------------------------------------------------------------
// Secrets / URLs
// ---------------------------------------------------------------------------

pub struct StaticSecrets(pub HashMap<String, String>);

impl SecretProvider for StaticSecrets {
    fn name(&self) -> &str {
        "static"
    }

    fn get(&self) -> Result<HashMap<String, String>, SecretError> {
        Ok(self.0.clone())
    }
}

pub struct MissingSecrets;

impl SecretProvider for MissingSecrets {
    fn name(&self) -> &str {
        "missing"
    }

    fn get(&self) -> Result<HashMap<String, String>, SecretError> {
        Err(SecretError::Missing(vec!["SITE_PASSWORD".to_string()]))
    }
}

/// Prefixes relative URLs with `https://example.test`.
pub struct TestUrls;

impl UrlResolver for TestUrls {
    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("https://example.test/{}", url.trim_start_matches('/'))
        }
    }
}

pub fn make_deps(logger: &RecordingLogger) -> ExecutionDeps {
    make_deps_with_secrets(logger, HashMap::new())
}

pub fn make_deps_with_secrets(
    logger: &RecordingLogger,
    secrets: HashMap<String, String>,
) -> ExecutionDeps {
    ExecutionDeps::new(
        Arc::new(StaticSecrets(secrets)),
        Arc::new(TestUrls),
        Arc::new(logger.clone()),
    )
}

// ---------------------------------------------------------------------------
// ScriptedTransport
// ---------------------------------------------------------------------------

/// Transport that replays queued responses and records every request.
///
/// When the queue runs dry the last response is repeated.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    responses: Arc<Mutex<VecDeque<Result<HttpResponse, String>>>>,
    last: Arc<Mutex<Option<HttpResponse>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    cookies: Arc<Mutex<Vec<CookieRecord>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: HttpResponse) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn push_error(&self, reason: &str) -> &Self {
        self.responses.lock().unwrap().push_back(Err(reason.to_string()));
        self
    }

    pub fn set_cookies(&self, cookies: Vec<CookieRecord>) {
        *self.cookies.lock().unwrap() = cookies;
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn request(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(response)) => {
                *self.last.lock().unwrap() = Some(response.clone());
                Ok(response)
            }
            Some(Err(reason)) => Err(TransportError::Request {
                url: request.url.clone(),
                reason,
            }),
            None => self.last.lock().unwrap().clone().ok_or_else(|| {
                TransportError::Request {
                    url: request.url.clone(),
                    reason: "no scripted response".to_string(),
                }
            }),
        }
    }

    fn snapshot_cookies(&self) -> Vec<CookieRecord> {
        self.cookies.lock().unwrap().clone()
    }
}

/// HTML response with the given status and body.
pub fn html_response(status: u16, url: &str, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        url: url.to_string(),
        headers: BTreeMap::from([(
            "content-type".to_string(),
            "text/html; charset=utf-8".to_string(),
        )]),
        body: body.as_bytes().to_vec(),
        history: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// In-memory stores
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryKeys(Mutex<HashSet<String>>);

impl IdempotencyStore for MemoryKeys {
    fn register(&self, key: &str) -> bool {
        self.0.lock().unwrap().insert(key.to_string())
    }
}

#[derive(Default)]
pub struct MemoryRuns(Mutex<HashMap<String, RunRecord>>);

impl RunRepository for MemoryRuns {
    fn create(&self, record: RunRecord) -> Result<RunRecord, RunStateError> {
        let mut runs = self.0.lock().unwrap();
        if runs.contains_key(&record.run_id) {
            return Err(RunStateError::AlreadyExists(record.run_id));
        }
        runs.insert(record.run_id.clone(), record.clone());
        Ok(record)
    }

    fn get(&self, run_id: &str) -> Option<RunRecord> {
        self.0.lock().unwrap().get(run_id).cloned()
    }

    fn transition_status(
        &self,
        run_id: &str,
        expected: RunStatus,
        next: RunStatus,
        payload: RunPayload,
    ) -> Result<RunRecord, RunStateError> {
        let mut runs = self.0.lock().unwrap();
        let current = runs
            .get(run_id)
            .ok_or_else(|| RunStateError::NotFound(run_id.to_string()))?;
        if current.status != expected || !expected.can_transition_to(next) {
            return Err(RunStateError::InvalidTransition {
                run_id: run_id.to_string(),
                from: current.status,
                to: next,
            });
        }
        let updated = current.with_status(next, payload);
        runs.insert(run_id.to_string(), updated.clone());
        Ok(updated)
    }
}

#[derive(Default)]
pub struct MemoryLogs(Mutex<HashMap<String, Vec<RunLogEntry>>>);

impl MemoryLogs {
    /// Event names recorded for `run_id`.
    pub fn events(&self, run_id: &str) -> Vec<String> {
        self.list(run_id).into_iter().map(|entry| entry.event).collect()
    }
}

impl RunLogStore for MemoryLogs {
    fn append(&self, run_id: &str, entry: RunLogEntry) {
        self.0
            .lock()
            .unwrap()
            .entry(run_id.to_string())
            .or_default()
            .push(entry);
    }

    fn list(&self, run_id: &str) -> Vec<RunLogEntry> {
        self.0.lock().unwrap().get(run_id).cloned().unwrap_or_default()
    }
}

/// Logger appending to a run log store.
struct StoreLogger {
    run_id: String,
    store: Arc<MemoryLogs>,
    bound: Map<String, Value>,
}

impl Logger for StoreLogger {
    fn emit(&self, _level: LogLevel, event: &str, fields: Map<String, Value>) {
        self.store.append(
            &self.run_id,
            RunLogEntry {
                timestamp: Utc::now(),
                event: event.to_string(),
                fields: merge_fields(&self.bound, fields),
            },
        );
    }

    fn bind(&self, fields: Map<String, Value>) -> Arc<dyn Logger> {
        Arc::new(Self {
            run_id: self.run_id.clone(),
            store: Arc::clone(&self.store),
            bound: merge_fields(&self.bound, fields),
        })
    }
}

// ---------------------------------------------------------------------------
// Scenarios / run wiring
// ---------------------------------------------------------------------------

pub fn scenario_from_json(json: &str) -> Scenario {
    serde_json::from_str::<Scenario>(json).unwrap().normalized()
}

pub struct StaticScenarios(HashMap<String, Scenario>);

impl StaticScenarios {
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        Self(
            scenarios
                .into_iter()
                .map(|s| (s.meta.id.clone(), s))
                .collect(),
        )
    }
}

impl ScenarioSource for StaticScenarios {
    async fn load(&self, scenario_id: &str) -> Result<Scenario, ScenarioError> {
        self.0
            .get(scenario_id)
            .cloned()
            .ok_or_else(|| ScenarioError::NotFound(scenario_id.to_string()))
    }
}

/// Run wiring over a shared [`ScriptedTransport`] and a [`MemoryLogs`]
/// store. `secret_ref` accepts `inline` (the default) only.
pub struct TestEnv {
    pub transport: ScriptedTransport,
    pub logs: Arc<MemoryLogs>,
}

impl TestEnv {
    pub fn new(logs: Arc<MemoryLogs>) -> Self {
        Self {
            transport: ScriptedTransport::new(),
            logs,
        }
    }
}

impl RunExecutionContext for TestEnv {
    fn run_logger(&self, run_id: &str) -> Arc<dyn Logger> {
        Arc::new(StoreLogger {
            run_id: run_id.to_string(),
            store: Arc::clone(&self.logs),
            bound: Map::new(),
        })
    }

    fn secret_provider(&self, request: &RunRequest) -> Result<Arc<dyn SecretProvider>, SecretError> {
        match request.secret_ref.as_deref().unwrap_or("inline") {
            "inline" => Ok(Arc::new(StaticSecrets(request.secrets.clone()))),
            other => Err(SecretError::UnknownRef(other.to_string())),
        }
    }

    fn url_resolver(&self, _scenario: &Scenario) -> Arc<dyn UrlResolver> {
        Arc::new(TestUrls)
    }

    fn executor(&self, _scenario: &Scenario) -> Result<StepExecutor, TransportError> {
        Ok(StepExecutor::new(HandlerRegistry::standard(
            BoxHttpTransport::new(self.transport.clone()),
            Vec::new(),
        )))
    }
}
