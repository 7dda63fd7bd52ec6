//! `${root.path}` template expansion.
//!
//! Roots are `vars`, `state`, `secrets` and `last`. Paths walk dotted
//! segments:
//!
//! - `a.b.c` looks up object keys; a missing key yields `""`
//! - `items.0` indexes a list; out of range yields `""`
//! - `items[*]` returns the list itself (for form field expansion)
//!
//! Unknown roots, unclosed expressions and misuse of `[*]` or numeric
//! segments are errors.

use std::collections::HashMap;

use serde_json::{Map, Value};
use webpost_types::error::TemplateError;

use super::context::LastResponse;

/// Borrowed view of the four template roots.
#[derive(Debug, Clone, Copy)]
pub struct RenderSources<'a> {
    pub vars: &'a Map<String, Value>,
    pub state: &'a Map<String, Value>,
    pub secrets: &'a Map<String, Value>,
    pub last: Option<&'a LastResponse>,
}

/// Convert provider secrets into the JSON map templates read from.
pub fn secrets_to_map(secrets: &HashMap<String, String>) -> Map<String, Value> {
    secrets
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect()
}

/// Stringify a rendered value the way string contexts see it.
///
/// Lists join their items with `,`, objects become compact JSON and `null`
/// becomes empty.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) | Value::Bool(_) | Value::Number(_) => value.to_string(),
    }
}

// ---------------------------------------------------------------------------
// TemplateRenderer
// ---------------------------------------------------------------------------

/// Stateless template renderer. All logic lives in associated functions.
pub struct TemplateRenderer;

impl TemplateRenderer {
    /// Render a template, keeping the value type when the whole string is a
    /// single expression (`"${vars.dates[*]}"` stays a list). Any other
    /// template renders to a string.
    pub fn render_value(template: &str, src: &RenderSources<'_>) -> Result<Value, TemplateError> {
        if !template.contains("${") {
            return Ok(Value::String(template.to_string()));
        }
        if let Some(expr) = whole_expression(template) {
            return Ok(match Self::eval(expr, src)? {
                Value::Null => Value::String(String::new()),
                other => other,
            });
        }
        Self::render_str(template, src).map(Value::String)
    }

    /// Render a template into a string, expanding every `${...}` in place.
    pub fn render_str(template: &str, src: &RenderSources<'_>) -> Result<String, TemplateError> {
        if !template.contains("${") {
            return Ok(template.to_string());
        }

        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find('}')
                .ok_or_else(|| TemplateError::Unclosed(template.to_string()))?;
            let value = Self::eval(after[..end].trim(), src)?;
            out.push_str(&stringify(&value));
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }

    /// Render every string inside a JSON value, recursing into lists and
    /// objects. Non-string scalars pass through unchanged.
    pub fn render_json(value: &Value, src: &RenderSources<'_>) -> Result<Value, TemplateError> {
        match value {
            Value::String(s) => Self::render_value(s, src),
            Value::Array(items) => items
                .iter()
                .map(|item| Self::render_json(item, src))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) => map
                .iter()
                .map(|(key, item)| Ok((key.clone(), Self::render_json(item, src)?)))
                .collect::<Result<Map<_, _>, TemplateError>>()
                .map(Value::Object),
            other => Ok(other.clone()),
        }
    }

    /// Render form pairs. Keys render as strings; values keep lists intact so
    /// the form composer can expand them into repeated pairs.
    pub fn render_form_list(
        form_list: &[(String, String)],
        src: &RenderSources<'_>,
    ) -> Result<Vec<(String, Value)>, TemplateError> {
        form_list
            .iter()
            .map(|(key, value)| Ok((Self::render_str(key, src)?, Self::render_value(value, src)?)))
            .collect()
    }

    fn eval(expr: &str, src: &RenderSources<'_>) -> Result<Value, TemplateError> {
        let (root, path) = expr.split_once('.').unwrap_or((expr, ""));
        let scope = Scope::resolve(root, src)?;
        if path.is_empty() {
            return Ok(scope.to_value());
        }

        let mut parts = path.split('.');
        let head = parts.next().unwrap_or_default();
        let mut current = resolve_head(&scope, head)?;
        for part in parts {
            current = resolve_part(&current, part)?;
        }
        Ok(current)
    }
}

/// Root of every `${...}` expression in `template`, found and trimmed the
/// same way [`TemplateRenderer::render_str`] evaluates them. Scanning stops
/// at an unclosed expression, which fails rendering anyway.
pub fn expression_roots(template: &str) -> Vec<&str> {
    let mut roots = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        let expr = after[..end].trim();
        roots.push(expr.split_once('.').map_or(expr, |(root, _)| root));
        rest = &after[end + 1..];
    }
    roots
}

/// Inner expression when `template` is exactly one `${...}`.
fn whole_expression(template: &str) -> Option<&str> {
    let inner = template.strip_prefix("${")?.strip_suffix('}')?;
    if inner.contains("${") || inner.contains('}') {
        return None;
    }
    Some(inner.trim())
}

// ---------------------------------------------------------------------------
// Path resolution
// ---------------------------------------------------------------------------

enum Scope<'a> {
    Map(&'a Map<String, Value>),
    Last(Option<&'a LastResponse>),
}

impl<'a> Scope<'a> {
    fn resolve(root: &str, src: &RenderSources<'a>) -> Result<Self, TemplateError> {
        match root {
            "vars" => Ok(Scope::Map(src.vars)),
            "state" => Ok(Scope::Map(src.state)),
            "secrets" => Ok(Scope::Map(src.secrets)),
            "last" => Ok(Scope::Last(src.last)),
            other => Err(TemplateError::UnknownRoot(other.to_string())),
        }
    }

    fn get(&self, key: &str) -> Value {
        match self {
            Scope::Map(map) => map.get(key).cloned().unwrap_or_else(empty),
            Scope::Last(Some(last)) => last.field(key),
            Scope::Last(None) => empty(),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Scope::Map(map) => Value::Object((*map).clone()),
            Scope::Last(Some(last)) => last.to_value(),
            Scope::Last(None) => Value::Object(Map::new()),
        }
    }
}

fn empty() -> Value {
    Value::String(String::new())
}

fn is_index(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
}

fn resolve_head(scope: &Scope<'_>, part: &str) -> Result<Value, TemplateError> {
    if let Some(key) = part.strip_suffix("[*]") {
        return expect_list(scope.get(key), key);
    }
    if part.contains("[*]") {
        return Err(TemplateError::InvalidWildcard(part.to_string()));
    }
    if is_index(part) {
        // Roots are always objects.
        return Err(TemplateError::IndexOnNonList(part.to_string()));
    }
    Ok(scope.get(part))
}

fn resolve_part(current: &Value, part: &str) -> Result<Value, TemplateError> {
    if let Some(key) = part.strip_suffix("[*]") {
        return expect_list(get_key(current, key), key);
    }
    if part.contains("[*]") {
        return Err(TemplateError::InvalidWildcard(part.to_string()));
    }
    if is_index(part) {
        let Value::Array(items) = current else {
            return Err(TemplateError::IndexOnNonList(part.to_string()));
        };
        let value = part
            .parse::<usize>()
            .ok()
            .and_then(|idx| items.get(idx))
            .cloned()
            .unwrap_or_else(empty);
        return Ok(value);
    }
    Ok(get_key(current, part))
}

fn get_key(current: &Value, key: &str) -> Value {
    match current {
        Value::Object(map) => map.get(key).cloned().unwrap_or_else(empty),
        _ => empty(),
    }
}

fn expect_list(value: Value, key: &str) -> Result<Value, TemplateError> {
    if value.is_array() {
        Ok(value)
    } else {
        Err(TemplateError::NotAList(key.to_string()))
    }
}
