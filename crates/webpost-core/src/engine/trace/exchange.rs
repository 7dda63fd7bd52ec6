//! Request/response summary events for every HTTP exchange.

use serde_json::json;

use crate::engine::redact::{mask_map, mask_pairs};
use crate::logging::Logger;

use super::{HttpTrace, TraceEnricher};

/// Characters of decoded body included in `http.response`.
const TEXT_HEAD_CHARS: usize = 200;

/// Logs `http.request`, `http.response`, `http.trace` and the debug-level
/// `http.request_detail` / `http.cookies` events. Credentials are masked.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreTraceLogger;

impl TraceEnricher for CoreTraceLogger {
    fn name(&self) -> &'static str {
        "core"
    }

    fn enrich(&self, trace: &HttpTrace<'_>, logger: &dyn Logger) {
        let response = &trace.response;
        let set_cookie = response.header("set-cookie").is_some_and(|v| !v.is_empty());
        let location = response.header("location");

        logger.info(
            "http.request",
            json!({
                "step_id": trace.step_id,
                "method": trace.method,
                "url": trace.url,
                "allow_redirects": trace.allow_redirects,
                "headers": mask_map(trace.request_headers),
                "form": mask_pairs(trace.request_form),
                "merged_from": trace.merged_from,
                "merged_count": trace.merged_count,
                "collision_keys": trace.collision_keys,
            }),
        );

        logger.info(
            "http.response",
            json!({
                "step_id": trace.step_id,
                "status": response.status,
                "final_url": response.url,
                "headers": mask_map(&response.headers),
                "content_type": response.content_type,
                "encoding": response.encoding,
                "body_len": response.body_len,
                "body_sha256": response.body_sha256,
                "history": response.history,
                "set_cookie": set_cookie,
                "location": location,
                "text_head": trace.text_head(TEXT_HEAD_CHARS),
            }),
        );

        logger.info(
            "http.trace",
            json!({
                "step_id": trace.step_id,
                "method": trace.method,
                "url": trace.url,
                "status": response.status,
                "final_url": response.url,
                "content_type": response.content_type,
                "encoding": response.encoding,
                "body_len": response.body_len,
                "body_sha256": response.body_sha256,
                "history": response.history,
                "set_cookie": set_cookie,
                "location": location,
                "collision_keys": trace.collision_keys,
            }),
        );

        logger.debug(
            "http.request_detail",
            json!({
                "step_id": trace.step_id,
                "headers": mask_map(trace.request_headers),
                "form": mask_pairs(trace.request_form),
            }),
        );

        logger.debug(
            "http.cookies",
            json!({
                "step_id": trace.step_id,
                "cookies_before_count": trace.cookies_before.len(),
                "cookies_after_count": trace.cookies_after.len(),
            }),
        );
    }
}
