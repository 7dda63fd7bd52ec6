//! HTML lookup helpers built on `scraper`.
//!
//! `scraper::Html` is not `Send`; callers parse and query inside synchronous
//! code and only carry owned strings across `.await` points.

use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};

pub fn parse(text: &str) -> Html {
    Html::parse_document(text)
}

/// Compile a CSS selector, reporting parse failures as text.
pub fn selector(css: &str) -> Result<Selector, String> {
    Selector::parse(css).map_err(|e| format!("invalid selector '{css}': {e:?}"))
}

/// Text content with each text node trimmed and empty nodes dropped.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .concat()
}

pub fn title(doc: &Html) -> Option<String> {
    let sel = selector("title").ok()?;
    doc.select(&sel).next().map(element_text)
}

/// `action` attribute of the first `<form>`.
pub fn first_form_action(doc: &Html) -> Option<String> {
    let sel = selector("form").ok()?;
    doc.select(&sel)
        .next()
        .and_then(|form| form.value().attr("action"))
        .map(str::to_string)
}

fn hidden_elements(doc: &Html) -> Vec<ElementRef<'_>> {
    let Ok(sel) = selector("input") else {
        return Vec::new();
    };
    doc.select(&sel)
        .filter(|el| {
            el.value()
                .attr("type")
                .is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
        })
        .collect()
}

/// Value of the hidden input named `name`. A hidden input without a
/// `value` attribute yields `Some("")`.
pub fn hidden_value(doc: &Html, name: &str) -> Option<String> {
    hidden_elements(doc)
        .into_iter()
        .find(|el| el.value().attr("name") == Some(name))
        .map(|el| el.value().attr("value").unwrap_or_default().to_string())
}

/// Every named hidden input as `{name: value}`. Later duplicates win.
pub fn hidden_inputs(doc: &Html) -> Map<String, Value> {
    hidden_elements(doc)
        .into_iter()
        .filter_map(|el| {
            let name = el.value().attr("name")?;
            let value = el.value().attr("value").unwrap_or_default();
            Some((name.to_string(), Value::String(value.to_string())))
        })
        .collect()
}

fn normalize_label(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches([':', '：'])
        .trim()
        .to_string()
}

/// Find a `th`/`td`/`dt` whose text equals `label` and return the text of
/// the following `td` (for table cells) or `dd` (for definition terms).
///
/// Whitespace is collapsed and a trailing colon ignored on both sides.
pub fn label_value(doc: &Html, label: &str) -> Option<String> {
    let wanted = normalize_label(label);
    let sel = selector("th, td, dt").ok()?;
    for cell in doc.select(&sel) {
        if normalize_label(&cell.text().collect::<String>()) != wanted {
            continue;
        }
        let target = if cell.value().name() == "dt" { "dd" } else { "td" };
        let next = cell
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == target);
        if let Some(next) = next {
            return Some(element_text(next));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><head><title> Login </title></head>
<body>
  <form action="/auth/login" method="post">
    <input type="hidden" name="csrfToken" value="tok-1">
    <input type="HIDDEN" name="screenID" value="LOGIN01">
    <input type="hidden" name="empty">
    <input type="text" name="user" value="visible">
  </form>
  <table>
    <tr><th>Reservation No.</th><td> A-100 </td></tr>
    <tr><th>Status:</th><td><span>Confirmed</span></td></tr>
  </table>
  <dl><dt>Guest</dt><dd>Sato</dd></dl>
</body></html>"#;

    #[test]
    fn test_title_and_form_action() {
        let doc = parse(PAGE);
        assert_eq!(title(&doc).as_deref(), Some("Login"));
        assert_eq!(first_form_action(&doc).as_deref(), Some("/auth/login"));
    }

    #[test]
    fn test_hidden_inputs_and_values() {
        let doc = parse(PAGE);
        let hidden = hidden_inputs(&doc);
        assert_eq!(hidden.len(), 3);
        assert_eq!(hidden["csrfToken"], "tok-1");
        assert_eq!(hidden["empty"], "");
        assert!(!hidden.contains_key("user"));
        assert_eq!(hidden_value(&doc, "screenID").as_deref(), Some("LOGIN01"));
        assert_eq!(hidden_value(&doc, "missing"), None);
    }

    #[test]
    fn test_label_value_table_and_definition_list() {
        let doc = parse(PAGE);
        assert_eq!(label_value(&doc, "Reservation No.").as_deref(), Some("A-100"));
        assert_eq!(label_value(&doc, "Status").as_deref(), Some("Confirmed"));
        assert_eq!(label_value(&doc, "Guest").as_deref(), Some("Sato"));
        assert_eq!(label_value(&doc, "Unknown"), None);
    }

    #[test]
    fn test_invalid_selector_is_error() {
        assert!(selector("div[").is_err());
    }
}
