//! Scrape step: extract values from `last.text` into `vars` or `state`.
//!
//! Commands:
//! - `hidden_inputs`: every `<input type=hidden name=...>` as an object
//! - `css`: first match (or all with `multiple`), element text or `attr`
//! - `label`: text of the cell next to a visible `th`/`td`/`dt` label
//!
//! No match is not an error: `css` stores `""` (or `[]`), `label` stores `""`.

use serde_json::{Value, json};
use thiserror::Error;
use webpost_types::step::{ScrapeStep, Step, StepKind};

use crate::engine::context::RunContext;
use crate::engine::deps::ExecutionDeps;
use crate::engine::html;
use crate::logging::Logger;

use super::{StepHandler, StepOutcome, wrong_kind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScrapeError {
    #[error("scrape requires ctx.last.text (no previous response)")]
    NoResponse,

    #[error("unsupported scrape command: {0}")]
    UnsupportedCommand(String),

    #[error("unsupported scrape save_to: {0}")]
    UnsupportedTarget(String),

    #[error("scrape.{command} requires {field}")]
    MissingField {
        command: &'static str,
        field: &'static str,
    },

    #[error("{0}")]
    Selector(String),
}

/// Where scraped values are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTarget {
    Vars,
    State,
}

impl SaveTarget {
    pub fn parse(name: &str) -> Result<Self, ScrapeError> {
        match name {
            "vars" => Ok(SaveTarget::Vars),
            "state" => Ok(SaveTarget::State),
            other => Err(ScrapeError::UnsupportedTarget(other.to_string())),
        }
    }

    pub fn save(self, ctx: &mut RunContext, key: &str, value: Value) {
        let map = match self {
            SaveTarget::Vars => &mut ctx.vars,
            SaveTarget::State => &mut ctx.state,
        };
        map.insert(key.to_string(), value);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScrapeStepHandler;

impl ScrapeStepHandler {
    fn run(
        &self,
        step_id: &str,
        spec: &ScrapeStep,
        ctx: &mut RunContext,
        logger: &dyn Logger,
    ) -> Result<(), ScrapeError> {
        let target = SaveTarget::parse(&spec.save_to)?;
        let command = spec.command.trim().to_lowercase();

        let (save_as, value) = {
            let text = ctx
                .last
                .as_ref()
                .map(|last| last.text.as_str())
                .filter(|text| !text.is_empty())
                .ok_or(ScrapeError::NoResponse)?;

            match command.as_str() {
                "hidden_inputs" => {
                    let save_as = require(spec.save_as.as_deref(), "hidden_inputs", "save_as")?;
                    let hidden = html::hidden_inputs(&html::parse(text));
                    let keys_preview: Vec<&String> = hidden.keys().take(10).collect();
                    logger.debug(
                        "scrape.hidden_inputs",
                        json!({
                            "step_id": step_id,
                            "save_as": save_as,
                            "count": hidden.len(),
                            "keys_preview": keys_preview,
                        }),
                    );
                    (save_as, Value::Object(hidden))
                }
                "css" => {
                    let css = require(spec.selector.as_deref(), "css", "selector")?;
                    let save_as = require(spec.save_as.as_deref(), "css", "save_as")?;
                    (save_as, scrape_css(step_id, css, save_as, spec, text, logger)?)
                }
                "label" => {
                    let label = require(spec.label.as_deref(), "label", "label")?;
                    let save_as = require(spec.save_as.as_deref(), "label", "save_as")?;
                    let found = html::label_value(&html::parse(text), label);
                    logger.debug(
                        "scrape.label",
                        json!({
                            "step_id": step_id,
                            "label": label,
                            "save_as": save_as,
                            "found": found.is_some(),
                        }),
                    );
                    (save_as, Value::String(found.unwrap_or_default()))
                }
                _ => return Err(ScrapeError::UnsupportedCommand(spec.command.clone())),
            }
        };

        target.save(ctx, save_as, value);
        Ok(())
    }
}

fn require<'a>(
    value: Option<&'a str>,
    command: &'static str,
    field: &'static str,
) -> Result<&'a str, ScrapeError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ScrapeError::MissingField { command, field })
}

fn scrape_css(
    step_id: &str,
    css: &str,
    save_as: &str,
    spec: &ScrapeStep,
    text: &str,
    logger: &dyn Logger,
) -> Result<Value, ScrapeError> {
    let selector = html::selector(css).map_err(ScrapeError::Selector)?;
    let doc = html::parse(text);
    let extract = |node: scraper::ElementRef<'_>| match spec.attr.as_deref() {
        Some(attr) => node.value().attr(attr).unwrap_or_default().to_string(),
        None => html::element_text(node),
    };

    let mut nodes = doc.select(&selector).peekable();
    if nodes.peek().is_none() {
        logger.info(
            "scrape.css.not_found",
            json!({"step_id": step_id, "selector": css, "save_as": save_as}),
        );
        return Ok(if spec.multiple { json!([]) } else { json!("") });
    }

    if spec.multiple {
        let values: Vec<String> = nodes.map(extract).collect();
        logger.debug(
            "scrape.css",
            json!({
                "step_id": step_id,
                "selector": css,
                "save_as": save_as,
                "multiple": true,
                "count": values.len(),
                "values_preview": values.iter().take(5).collect::<Vec<_>>(),
            }),
        );
        Ok(json!(values))
    } else {
        let value = nodes.next().map(extract).unwrap_or_default();
        logger.debug(
            "scrape.css",
            json!({
                "step_id": step_id,
                "selector": css,
                "save_as": save_as,
                "multiple": false,
                "value": value.chars().take(200).collect::<String>(),
            }),
        );
        Ok(Value::String(value))
    }
}

impl StepHandler for ScrapeStepHandler {
    fn name(&self) -> &'static str {
        "scrape"
    }

    fn supports(&self, step: &Step) -> bool {
        matches!(step.kind, StepKind::Scrape(_))
    }

    async fn handle(&self, step: &Step, ctx: &mut RunContext, deps: &ExecutionDeps) -> StepOutcome {
        let StepKind::Scrape(spec) = &step.kind else {
            return wrong_kind(self.name(), step);
        };
        match self.run(&step.id, spec, ctx, deps.logger.as_ref()) {
            Ok(()) => StepOutcome::success(),
            Err(e) => {
                deps.logger.error(
                    "scrape.step_failed",
                    json!({"step_id": step.id, "command": spec.command, "error": e.to_string()}),
                );
                StepOutcome::failure(e.to_string())
            }
        }
    }
}
