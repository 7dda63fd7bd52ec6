//! Final form payload composition for HTTP steps.
//!
//! Two sources are concatenated: the pairs of an optional `vars` object
//! (`merge_from_vars`) first, then the rendered `form_list`. List values
//! expand into repeated pairs. Callers dedupe the result with
//! [`FormComposer::dedupe_last_wins`] so explicit entries override merged
//! ones.

use std::collections::{BTreeSet, HashMap};

use serde_json::{Map, Value};
use thiserror::Error;
use webpost_types::error::TemplateError;

use super::template::{RenderSources, TemplateRenderer, stringify};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("vars['{name}'] must be object, got: {kind}")]
    MergeTargetNotObject { name: String, kind: &'static str },
}

/// Concatenated form pairs plus merge bookkeeping for the trace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposedForm {
    pub pairs: Vec<(String, String)>,
    pub merged_from: Option<String>,
    pub merged_count: usize,
}

pub struct FormComposer;

impl FormComposer {
    /// Render and concatenate the form sources.
    ///
    /// A missing merge target is not an error (nothing is merged); a merge
    /// target that is not an object is.
    pub fn compose(
        form_list: &[(String, String)],
        src: &RenderSources<'_>,
        vars: &Map<String, Value>,
        merge_from_vars: Option<&str>,
    ) -> Result<ComposedForm, FormError> {
        let rendered = TemplateRenderer::render_form_list(form_list, src)?;
        let expanded = expand_list_values(rendered);

        let Some(name) = merge_from_vars.filter(|name| !name.is_empty()) else {
            return Ok(ComposedForm {
                pairs: expanded,
                ..Default::default()
            });
        };

        let merged: Vec<(String, String)> = match vars.get(name) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Object(obj)) => obj
                .iter()
                .map(|(k, v)| (k.clone(), stringify(v)))
                .collect(),
            Some(other) => {
                return Err(FormError::MergeTargetNotObject {
                    name: name.to_string(),
                    kind: json_kind(other),
                });
            }
        };

        let merged_count = merged.len();
        let mut pairs = merged;
        pairs.extend(expanded);
        Ok(ComposedForm {
            pairs,
            merged_from: Some(name.to_string()),
            merged_count,
        })
    }

    /// Keep one pair per key: the value of its last occurrence, at the
    /// position of that last occurrence.
    pub fn dedupe_last_wins(pairs: &[(String, String)]) -> Vec<(String, String)> {
        let last_index: HashMap<&str, usize> = pairs
            .iter()
            .enumerate()
            .map(|(idx, (key, _))| (key.as_str(), idx))
            .collect();
        pairs
            .iter()
            .enumerate()
            .filter(|(idx, (key, _))| last_index.get(key.as_str()) == Some(idx))
            .map(|(_, pair)| pair.clone())
            .collect()
    }

    /// Keys appearing more than once, sorted.
    pub fn duplicate_keys(pairs: &[(String, String)]) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut dups = BTreeSet::new();
        for (key, _) in pairs {
            if !seen.insert(key.as_str()) {
                dups.insert(key.clone());
            }
        }
        dups.into_iter().collect()
    }

    /// Keys present in both the merged vars object and the explicit form
    /// list, sorted. Explicit keys are compared unrendered.
    pub fn collision_keys(
        form_list: &[(String, String)],
        vars: &Map<String, Value>,
        merge_from_vars: Option<&str>,
    ) -> Vec<String> {
        let Some(Value::Object(merged)) = merge_from_vars.and_then(|name| vars.get(name)) else {
            return Vec::new();
        };
        let explicit: BTreeSet<&str> = form_list.iter().map(|(k, _)| k.as_str()).collect();
        merged
            .keys()
            .filter(|k| explicit.contains(k.as_str()))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn expand_list_values(pairs: Vec<(String, Value)>) -> Vec<(String, String)> {
    let mut out = Vec::with_capacity(pairs.len());
    for (key, value) in pairs {
        match value {
            Value::Array(items) => {
                out.extend(items.iter().map(|item| (key.clone(), stringify(item))));
            }
            other => out.push((key, stringify(&other))),
        }
    }
    out
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
