use crate::error::{ReportError, Result};
use crate::model::{Bug, BugReport, Confidence, LineRange, ReportMetadata, ReportOrigin, Severity};
use crate::reader::ReportDecoder;
use serde::Deserialize;
use serde_json::Value;

/// Placeholder file name for records that do not say where the bug is
pub const UNKNOWN_FILE: &str = "<unknown>";

/// JSON findings from a whole-file scan: a list of records, or `{"bugs": [...]}`
#[derive(Debug, Clone, Copy, Default)]
pub struct WholeFileReport;

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default, alias = "file_path", alias = "file")]
    filename: Option<String>,
    #[serde(default)]
    start_line: Option<Value>,
    #[serde(default)]
    end_line: Option<Value>,
    #[serde(default)]
    line_number: Option<Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    severity: Option<Value>,
    #[serde(default)]
    confidence: Option<Value>,
    #[serde(default)]
    suggested_fix: Option<String>,
    #[serde(default)]
    code_snippet: Option<String>,
}

impl ReportDecoder for WholeFileReport {
    fn origin(&self) -> ReportOrigin {
        ReportOrigin::WholeFile
    }

    fn accepts(&self, content: &str) -> bool {
        matches!(content.trim_start().chars().next(), Some('[' | '{'))
    }

    fn parse(&self, content: &str) -> Result<BugReport> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| ReportError::format(format!("invalid JSON report: {e}")))?;

        let records = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("bugs") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(ReportError::format(
                        "JSON report object must contain a \"bugs\" array",
                    ))
                }
            },
            other => {
                return Err(ReportError::format(format!(
                    "JSON report must be a list of bug records, got {other}"
                )))
            }
        };

        let bugs = records
            .into_iter()
            .enumerate()
            .map(|(index, item)| to_bug(index, item))
            .collect::<Result<Vec<_>>>()?;

        log::debug!("Decoded {} whole-file bug records", bugs.len());
        Ok(BugReport::new(
            ReportOrigin::WholeFile,
            bugs,
            ReportMetadata::default(),
        ))
    }
}

fn to_bug(index: usize, item: Value) -> Result<Bug> {
    let raw: RawRecord = serde_json::from_value(item)
        .map_err(|e| ReportError::format(format!("bug record #{index}: {e}")))?;

    let description = required(raw.description, "description", index)?;
    let severity = required(raw.severity.as_ref().and_then(rating_text), "severity", index)?;

    let lines = match (&raw.start_line, &raw.end_line) {
        (None, None) => raw
            .line_number
            .as_ref()
            .map_or(LineRange::UNKNOWN, |v| LineRange::parse(&value_text(v))),
        (start, end) => LineRange::from_bounds(
            start.as_ref().and_then(line_value),
            end.as_ref().and_then(line_value),
        ),
    };

    let file = raw
        .filename
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| {
            log::warn!("Bug record #{index} has no file name");
            UNKNOWN_FILE.to_string()
        });

    Ok(Bug {
        description,
        file,
        lines,
        severity: Severity::parse_lenient(&severity),
        confidence: raw
            .confidence
            .as_ref()
            .and_then(rating_text)
            .map_or(Confidence::Medium, |c| Confidence::parse_lenient(&c)),
        suggested_fix: raw.suggested_fix.unwrap_or_default().trim().to_string(),
        code_snippet: raw.code_snippet.filter(|s| !s.trim().is_empty()),
    })
}

fn required(value: Option<String>, field: &'static str, index: usize) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ReportError::missing_field(field, index))
}

/// Line numbers arrive as integers or as text like "42"
fn line_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => Some(LineRange::parse(s).start),
        _ => None,
    }
    .filter(|line| *line > 0)
}

/// Ratings are expected as text; numbers and other scalars fall through to
/// lenient parsing
fn rating_text(value: &Value) -> Option<String> {
    (!value.is_null()).then(|| value_text(value))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
