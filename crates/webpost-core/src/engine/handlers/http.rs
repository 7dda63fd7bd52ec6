//! HTTP step: render, send, decode, trace, and store the response as `last`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use encoding_rs::Encoding;
use regex::Regex;
use serde_json::json;
use sha2::{Digest, Sha256};
use thiserror::Error;
use webpost_types::error::{SecretError, TemplateError};
use webpost_types::step::{HttpRequestSpec, Step, StepKind};

use crate::engine::context::{LastResponse, RunContext};
use crate::engine::deps::ExecutionDeps;
use crate::engine::form::{FormComposer, FormError};
use crate::engine::html;
use crate::engine::redact::{mask_map, mask_pairs};
use crate::engine::template::TemplateRenderer;
use crate::engine::trace::{HttpTrace, ResponseMeta, TraceEmitter};
use crate::http::box_transport::BoxHttpTransport;
use crate::http::transport::{HttpRequest, TransportError};

use super::{StepHandler, StepOutcome, wrong_kind};

/// Tried in order when the declared charset is missing or unknown.
const FALLBACK_ENCODINGS: [&str; 4] = ["cp932", "shift_jis", "windows-31j", "utf-8"];

static CHARSET: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)charset\s*=\s*([^\s;]+)").ok());

#[derive(Debug, Error)]
enum HttpStepError {
    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Runs `type: http` steps over one session transport.
#[derive(Debug)]
pub struct HttpStepHandler {
    transport: BoxHttpTransport,
    emitter: TraceEmitter,
}

impl HttpStepHandler {
    pub fn new(transport: BoxHttpTransport, emitter: TraceEmitter) -> Self {
        Self { transport, emitter }
    }

    async fn execute(
        &self,
        step: &Step,
        spec: &HttpRequestSpec,
        ctx: &mut RunContext,
        deps: &ExecutionDeps,
    ) -> Result<(), HttpStepError> {
        let url = deps.resolve_url(&spec.url);
        let method = spec.method.to_uppercase();
        let secrets = deps.secret_map()?;

        let (headers, composed) = {
            let src = ctx.render_sources(&secrets);
            let headers = spec
                .headers
                .iter()
                .map(|(k, v)| Ok((k.clone(), TemplateRenderer::render_str(v, &src)?)))
                .collect::<Result<BTreeMap<_, _>, TemplateError>>()?;
            let composed = FormComposer::compose(
                &spec.form_list,
                &src,
                &ctx.vars,
                spec.merge_from_vars.as_deref(),
            )?;
            (headers, composed)
        };
        let form = FormComposer::dedupe_last_wins(&composed.pairs);
        let collision_keys =
            FormComposer::collision_keys(&spec.form_list, &ctx.vars, spec.merge_from_vars.as_deref());

        deps.logger.debug(
            "http.form_composed",
            json!({
                "step_id": step.id,
                "method": method,
                "url": url,
                "merged_from": composed.merged_from,
                "merged_count": composed.merged_count,
                "duplicate_keys": FormComposer::duplicate_keys(&composed.pairs),
                "collision_keys": collision_keys,
                "form": mask_pairs(&composed.pairs),
                "headers": mask_map(&headers),
            }),
        );
        deps.logger.debug(
            "http.client",
            json!({"step_id": step.id, "transport": self.transport.name()}),
        );

        // Login-style POSTs are inspected hop by hop.
        let allow_redirects = (method == "POST").then_some(false);

        let request = HttpRequest {
            method,
            url,
            headers,
            form,
            allow_redirects,
        };

        let cookies_before = self.transport.snapshot_cookies();
        let response = self.transport.request(&request).await?;
        let cookies_after = self.transport.snapshot_cookies();

        let content_type = response.header("content-type").map(str::to_string);
        let (text, encoding) = decode_body(&response.body, content_type.as_deref());
        let body_sha256 = format!("{:x}", Sha256::digest(&response.body));
        let html_title = html::title(&html::parse(&text));

        let trace = HttpTrace {
            run_id: &ctx.run_id,
            step_id: &step.id,
            method: &request.method,
            url: &request.url,
            allow_redirects: request.allow_redirects,
            request_headers: &request.headers,
            request_form: &request.form,
            merged_from: composed.merged_from.as_deref(),
            merged_count: composed.merged_count,
            collision_keys,
            cookies_before,
            cookies_after,
            response: ResponseMeta {
                status: response.status,
                url: response.url.clone(),
                headers: response.headers.clone(),
                encoding,
                content_type,
                history: response.history.clone(),
                body_len: text.chars().count(),
                body_sha256,
            },
            text: &text,
            raw: &response.body,
            html_title,
        };
        self.emitter.emit(&trace, deps.logger.as_ref());

        ctx.last = Some(LastResponse {
            status: response.status,
            url: response.url,
            text,
            headers: response.headers,
        });
        Ok(())
    }
}

impl StepHandler for HttpStepHandler {
    fn name(&self) -> &'static str {
        "http"
    }

    fn supports(&self, step: &Step) -> bool {
        matches!(step.kind, StepKind::Http(_))
    }

    async fn handle(&self, step: &Step, ctx: &mut RunContext, deps: &ExecutionDeps) -> StepOutcome {
        let StepKind::Http(http) = &step.kind else {
            return wrong_kind(self.name(), step);
        };
        match self.execute(step, &http.request, ctx, deps).await {
            Ok(()) => StepOutcome::success(),
            Err(e) => {
                deps.logger.error(
                    "http.step_failed",
                    json!({"step_id": step.id, "error": e.to_string()}),
                );
                StepOutcome::failure(e.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Body decoding
// ---------------------------------------------------------------------------

/// Decode a response body.
///
/// 1. The `Content-Type` charset, with replacement characters for bad bytes.
/// 2. Each fallback encoding that decodes the bytes without errors.
/// 3. UTF-8 with replacement.
///
/// Returns the text and the name of the encoding used (`None` for an empty
/// body).
pub fn decode_body(raw: &[u8], content_type: Option<&str>) -> (String, Option<String>) {
    if raw.is_empty() {
        return (String::new(), None);
    }

    if let Some(encoding) = content_type.and_then(declared_charset) {
        let (text, _) = encoding.decode_without_bom_handling(raw);
        return (text.into_owned(), Some(encoding.name().to_string()));
    }

    for label in FALLBACK_ENCODINGS {
        let Some(encoding) = Encoding::for_label(label.as_bytes()) else {
            continue;
        };
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(raw) {
            return (text.into_owned(), Some(encoding.name().to_string()));
        }
    }

    (
        String::from_utf8_lossy(raw).into_owned(),
        Some(encoding_rs::UTF_8.name().to_string()),
    )
}

fn declared_charset(content_type: &str) -> Option<&'static Encoding> {
    let re = CHARSET.as_ref()?;
    let label = re.captures(content_type)?.get(1)?.as_str();
    let label = label.trim().trim_matches(|c| c == '"' || c == '\'');
    Encoding::for_label(label.as_bytes())
}
