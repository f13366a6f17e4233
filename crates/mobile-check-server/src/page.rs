//! Checklist page rendering.
//!
//! Rows are rendered from the typed records with HTML escaping. The payload
//! is also embedded as a script variable for the submit logic; that JSON is
//! escaped for the script context so stored text cannot end the element.

use askama::Template;
use mobile_check_core::{ChecklistItem, ChecklistPayload, Error, Result};
use serde::Serialize;

/// Subject line of the drafted report email.
pub const REPORT_SUBJECT: &str = "Checklist Results";

/// Message shown when every row is complete.
pub const ALL_CLEAR_MESSAGE: &str = "All items checked off with no issues.";

/// Page title and heading.
pub const PAGE_TITLE: &str = "Mobile Check";

#[derive(Template)]
#[template(path = "mobile_check.html")]
struct ChecklistPage<'a> {
    title: &'a str,
    items: &'a [ChecklistItem],
    data_json: String,
    email_json: String,
    subject_json: String,
    all_clear_json: String,
}

/// Renders the checklist page for a payload.
///
/// # Errors
///
/// Returns an internal error if the template fails to render.
pub fn render_checklist(payload: &ChecklistPayload, report_email: &str) -> Result<String> {
    let page = ChecklistPage {
        title: PAGE_TITLE,
        items: payload.items(),
        data_json: script_json(&payload.to_value())?,
        email_json: script_json(report_email)?,
        subject_json: script_json(REPORT_SUBJECT)?,
        all_clear_json: script_json(ALL_CLEAR_MESSAGE)?,
    };

    page.render()
        .map_err(|e| Error::internal(format!("failed to render checklist page: {e}")))
}

/// Serializes a value as JSON that is safe inside an inline `<script>`.
///
/// The characters `<`, `>`, `&`, U+2028 and U+2029 only occur inside JSON
/// strings, where `\uXXXX` escapes decode to the same text.
///
/// # Errors
///
/// Returns a serialization error if the value cannot be encoded.
pub fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let raw = serde_json::to_string(value)?;
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    Ok(out)
}

/// Extracts the payload embedded in a rendered page.
#[cfg(test)]
pub(crate) fn embedded_data(html: &str) -> serde_json::Value {
    let start = html.find("const data = ").expect("data variable") + "const data = ".len();
    let end = start + html[start..].find(";\n").expect("statement end");
    serde_json::from_str(&html[start..end]).expect("embedded JSON")
}
