//! Turning free-form model replies into artifacts.
//!
//! [`extract_json_array`] is strict: it either recovers a JSON array of
//! objects or fails. [`split_report`] is best-effort: missing sections fall
//! back to placeholders.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value, json};

use crate::error::{Error, Result};

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";
pub const EXECUTIVE_MARKER: &str = "---EXECUTIVE---";
pub const DEFAULT_EXECUTIVE: &str = "Executive summary not generated.";

/// Parses a reply that should be a JSON array of objects.
///
/// The untouched reply is written to `raw_file` first so a parse failure never
/// loses the model output. Accepts the bare array, or the array wrapped in a
/// single code fence whose first line may be a `json`/`jsonc` tag.
pub fn extract_json_array(raw: &str, raw_file: &Path) -> Result<Vec<Map<String, Value>>> {
    write_raw(raw, raw_file)?;

    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw) {
        return into_objects(items);
    }

    let cleaned = strip_code_fence(raw);
    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Array(items)) => into_objects(items),
        Ok(_) => Err(Error::MalformedResponse {
            reason: "expected a JSON array but got something else".to_string(),
        }),
        Err(err) => Err(Error::MalformedResponse {
            reason: format!("no JSON array could be recovered: {err}"),
        }),
    }
}

fn write_raw(raw: &str, raw_file: &Path) -> Result<()> {
    if let Some(parent) = raw_file.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
    }
    fs::write(raw_file, raw).map_err(|err| Error::io(raw_file, err))
}

fn into_objects(items: Vec<Value>) -> Result<Vec<Map<String, Value>>> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(object) => Ok(object),
            other => Err(Error::MalformedResponse {
                reason: format!("array element {index} is not an object: {other}"),
            }),
        })
        .collect()
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with(FENCE) {
        return trimmed;
    }

    let inner = trimmed.trim_matches('`');
    match inner.split_once('\n') {
        Some((first, rest)) if is_language_tag(first) => rest,
        _ => inner,
    }
}

fn is_language_tag(line: &str) -> bool {
    let tag = line.trim();
    tag.is_empty() || tag.eq_ignore_ascii_case("json") || tag.eq_ignore_ascii_case("jsonc")
}

/// The three sections of a log analysis reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub technical: String,
    pub analysis: Value,
    pub executive: String,
}

pub fn default_analysis() -> Value {
    json!({"error": "No JSON generated"})
}

/// Splits a reply of the form `TEXT ```json {..} ``` ---EXECUTIVE--- SUMMARY`.
///
/// Markers are searched strictly left to right: the JSON fence, then its
/// closing fence, then the executive marker after it. Each section keeps its
/// default unless its marker is found. A fenced block that does not parse is
/// kept verbatim under an `error` object instead of failing the split.
pub fn split_report(raw: &str) -> Report {
    let mut report = Report {
        technical: raw.to_string(),
        analysis: default_analysis(),
        executive: DEFAULT_EXECUTIVE.to_string(),
    };

    let Some((before, remainder)) = raw.split_once(JSON_FENCE) else {
        return report;
    };
    report.technical = before.trim().to_string();

    let Some((block, after_json)) = remainder.split_once(FENCE) else {
        return report;
    };
    let block = block.trim();
    report.analysis = serde_json::from_str(block).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "analysis block is not valid JSON");
        json!({"error": "Invalid JSON generated", "raw": block})
    });

    if let Some(executive) = after_json.split(EXECUTIVE_MARKER).nth(1) {
        report.executive = executive.trim().to_string();
    }

    report
}
