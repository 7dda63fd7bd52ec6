//! Raw HTTP exchange capture for debugging target sites.
//!
//! Each exchange produces three files under `{root}/{ts}_{run_id}/`:
//!
//! ```text
//! {ts}_{idx:03}_{step}.req   METHOD url, headers, blank line, k=v form lines
//! {ts}_{idx:03}_{step}.resp  HTTP status, headers
//! {ts}_{idx:03}_{step}.html  raw body bytes
//! ```
//!
//! `ts` is fixed per run on first use and `idx` counts files within the run,
//! so files sort in exchange order. Credentials are masked in `.req`/`.resp`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::Local;
use dashmap::DashMap;
use serde_json::json;
use webpost_core::engine::redact::mask_value;
use webpost_core::engine::trace::{HttpTrace, TraceEnricher};
use webpost_core::logging::Logger;

#[derive(Debug)]
struct RunDir {
    ts: String,
    next_index: usize,
}

/// Writes `.req`/`.resp`/`.html` files for every HTTP exchange.
#[derive(Debug)]
pub struct ArtifactSaver {
    root: PathBuf,
    runs: DashMap<String, RunDir>,
}

impl ArtifactSaver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            runs: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reserve three consecutive file indices for one exchange.
    fn reserve(&self, run_id: &str) -> (String, usize) {
        let mut run = self.runs.entry(run_id.to_string()).or_insert_with(|| RunDir {
            ts: Local::now().format("%Y%m%d_%H%M%S%3f").to_string(),
            next_index: 0,
        });
        let first = run.next_index;
        run.next_index += 3;
        (run.ts.clone(), first)
    }

    fn save(&self, trace: &HttpTrace<'_>) -> std::io::Result<PathBuf> {
        let (ts, first) = self.reserve(trace.run_id);
        let dir = self.root.join(format!("{ts}_{}", trace.run_id));
        std::fs::create_dir_all(&dir)?;

        let file = |idx: usize, ext: &str| dir.join(format!("{ts}_{idx:03}_{}.{ext}", trace.step_id));

        let mut req = format!("{} {}\n", trace.method, trace.url);
        for (k, v) in trace.request_headers {
            let _ = writeln!(req, "{k}: {}", mask_value(k, v));
        }
        req.push('\n');
        for (k, v) in trace.request_form {
            let _ = writeln!(req, "{k}={}", mask_value(k, v));
        }
        std::fs::write(file(first, "req"), req)?;

        let mut resp = format!("HTTP {}\n", trace.response.status);
        for (k, v) in &trace.response.headers {
            let _ = writeln!(resp, "{k}: {}", mask_value(k, v));
        }
        std::fs::write(file(first + 1, "resp"), resp)?;

        std::fs::write(file(first + 2, "html"), trace.raw)?;
        Ok(dir)
    }
}

impl TraceEnricher for ArtifactSaver {
    fn name(&self) -> &'static str {
        "artifacts"
    }

    fn enrich(&self, trace: &HttpTrace<'_>, logger: &dyn Logger) {
        match self.save(trace) {
            Ok(dir) => logger.info(
                "http.artifacts.saved",
                json!({
                    "step_id": trace.step_id,
                    "dir": dir.display().to_string(),
                    "sha256": trace.response.body_sha256,
                }),
            ),
            Err(e) => logger.error(
                "http.artifacts.failed",
                json!({"step_id": trace.step_id, "error": e.to_string()}),
            ),
        }
    }
}
