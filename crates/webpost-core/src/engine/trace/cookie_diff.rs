//! Cookie jar changes across one HTTP exchange (names only, never values).

use std::collections::{BTreeMap, BTreeSet};

use serde_json::json;

use crate::http::transport::CookieRecord;
use crate::logging::Logger;

use super::{HttpTrace, TraceEnricher};

/// Cookie names added, removed or changed, keyed by (name, domain, path).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieDiff {
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
    pub changed: BTreeSet<String>,
}

impl CookieDiff {
    pub fn between(before: &[CookieRecord], after: &[CookieRecord]) -> Self {
        let before = index(before);
        let after = index(after);

        let mut diff = CookieDiff::default();
        for (key, value) in &after {
            match before.get(key) {
                None => {
                    diff.added.insert(key.0.to_string());
                }
                Some(old) if old != value => {
                    diff.changed.insert(key.0.to_string());
                }
                Some(_) => {}
            }
        }
        for key in before.keys() {
            if !after.contains_key(key) {
                diff.removed.insert(key.0.to_string());
            }
        }
        diff
    }
}

fn index(cookies: &[CookieRecord]) -> BTreeMap<(&str, &str, &str), &str> {
    cookies
        .iter()
        .map(|c| ((c.name.as_str(), c.domain.as_str(), c.path.as_str()), c.value.as_str()))
        .collect()
}

/// Logs `http.cookie_diff`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieDiffLogger;

impl TraceEnricher for CookieDiffLogger {
    fn name(&self) -> &'static str {
        "cookie_diff"
    }

    fn enrich(&self, trace: &HttpTrace<'_>, logger: &dyn Logger) {
        let diff = CookieDiff::between(&trace.cookies_before, &trace.cookies_after);
        logger.info(
            "http.cookie_diff",
            json!({
                "step_id": trace.step_id,
                "added": diff.added,
                "removed": diff.removed,
                "changed": diff.changed,
            }),
        );
    }
}
