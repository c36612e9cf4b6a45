use crate::error::{ReportError, Result};
use crate::model::{Bug, BugReport, Confidence, LineRange, ReportMetadata, ReportOrigin, Severity};
use crate::reader::ReportDecoder;
use crate::whole_file::UNKNOWN_FILE;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

/// Commit id written when the source report does not carry one
pub const DEFAULT_COMMIT_ID: &str = "HEAD";

const ROOT_ELEMENT: &str = "bug_analysis_report";
const BUG_ELEMENT: &str = "bug";

/// XML findings from a diff-based analysis (`<bug_analysis_report>`)
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffReport;

impl ReportDecoder for DiffReport {
    fn origin(&self) -> ReportOrigin {
        ReportOrigin::Diff
    }

    fn accepts(&self, content: &str) -> bool {
        content.trim_start().starts_with('<')
    }

    fn parse(&self, content: &str) -> Result<BugReport> {
        let document = DiffReportDocument::from_xml(content)?;
        document.into_report()
    }
}

/// On-disk shape of a diff-based report; readable and writable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "bug_analysis_report")]
pub struct DiffReportDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    commit_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,

    #[serde(default)]
    affected_files: FileList,

    #[serde(default)]
    bugs: BugList,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct FileList {
    #[serde(rename = "file", default)]
    files: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct BugList {
    #[serde(rename = "bug", default)]
    bugs: Vec<BugElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct BugElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    line_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    suggested_fix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    code_snippet: Option<String>,
}

impl From<&Bug> for BugElement {
    fn from(bug: &Bug) -> Self {
        Self {
            file_path: Some(bug.file.clone()),
            line_number: Some(bug.lines.to_string()),
            description: Some(bug.description.clone()),
            severity: Some(bug.severity.as_str().to_string()),
            confidence: Some(bug.confidence.as_str().to_string()),
            suggested_fix: Some(bug.suggested_fix.clone()),
            code_snippet: bug.code_snippet.clone(),
        }
    }
}

impl DiffReportDocument {
    /// Parse a full report; any other root element is a format error
    pub fn from_xml(content: &str) -> Result<Self> {
        let root = root_element(content)?;
        if root != ROOT_ELEMENT {
            return Err(ReportError::format(format!(
                "expected <{ROOT_ELEMENT}> root element, found <{root}>"
            )));
        }

        quick_xml::de::from_str(content)
            .map_err(|e| ReportError::format(format!("invalid XML report: {e}")))
    }

    /// Wrap a bare `<bug>` element in a minimal report listing its file
    pub fn wrap_single_bug(content: &str) -> Result<Self> {
        let content = content.trim_start_matches('\u{feff}');
        let root = root_element(content)?;
        if root != BUG_ELEMENT {
            return Err(ReportError::format(format!(
                "expected a single <{BUG_ELEMENT}> element, found <{root}>"
            )));
        }

        let element: BugElement = quick_xml::de::from_str(content)
            .map_err(|e| ReportError::format(format!("invalid bug element: {e}")))?;

        Ok(Self {
            commit_id: None,
            timestamp: None,
            affected_files: FileList {
                files: non_blank(element.file_path.clone()).into_iter().collect(),
            },
            bugs: BugList {
                bugs: vec![element],
            },
            summary: None,
        })
    }

    /// Minimal document handing one bug to a coding assistant, keeping the
    /// report's commit id, timestamp, affected files and summary
    #[must_use]
    pub fn single_bug(report: &BugReport, bug: &Bug) -> Self {
        Self::with_bugs(report, std::iter::once(bug))
    }

    fn with_bugs<'a>(report: &BugReport, bugs: impl Iterator<Item = &'a Bug>) -> Self {
        let metadata = &report.metadata;
        Self {
            commit_id: Some(
                metadata
                    .commit_id
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COMMIT_ID.to_string()),
            ),
            timestamp: Some(metadata.timestamp.clone().unwrap_or_default()),
            affected_files: FileList {
                files: report
                    .affected_files()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            },
            bugs: BugList {
                bugs: bugs.map(BugElement::from).collect(),
            },
            summary: metadata.summary.clone(),
        }
    }

    #[must_use]
    pub fn bug_count(&self) -> usize {
        self.bugs.bugs.len()
    }

    /// Serialize with an XML declaration, two-space indented
    pub fn to_xml(&self) -> Result<String> {
        let mut body = String::new();
        let mut serializer = quick_xml::se::Serializer::new(&mut body);
        serializer.indent(' ', 2);
        self.serialize(serializer)
            .map_err(|e| ReportError::format(format!("failed to write XML report: {e}")))?;

        Ok(format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{body}\n"
        ))
    }

    /// Normalize into a canonical report
    pub fn into_report(self) -> Result<BugReport> {
        let bugs = self
            .bugs
            .bugs
            .into_iter()
            .enumerate()
            .map(|(index, element)| to_bug(index, element))
            .collect::<Result<Vec<_>>>()?;

        log::debug!("Decoded {} diff-based bug records", bugs.len());

        let metadata = ReportMetadata {
            commit_id: non_blank(self.commit_id),
            timestamp: non_blank(self.timestamp),
            affected_files: self
                .affected_files
                .files
                .into_iter()
                .filter_map(|f| non_blank(Some(f)))
                .collect(),
            summary: non_blank(self.summary),
        };

        Ok(BugReport::new(ReportOrigin::Diff, bugs, metadata))
    }
}

fn to_bug(index: usize, element: BugElement) -> Result<Bug> {
    let description =
        non_blank(element.description).ok_or(ReportError::missing_field("description", index))?;
    let severity =
        non_blank(element.severity).ok_or(ReportError::missing_field("severity", index))?;

    Ok(Bug {
        description,
        file: non_blank(element.file_path).unwrap_or_else(|| {
            log::warn!("Bug record #{index} has no file_path");
            UNKNOWN_FILE.to_string()
        }),
        lines: element
            .line_number
            .as_deref()
            .map_or(LineRange::UNKNOWN, LineRange::parse),
        severity: Severity::parse_lenient(&severity),
        confidence: element
            .confidence
            .as_deref()
            .map_or(Confidence::Medium, Confidence::parse_lenient),
        suggested_fix: non_blank(element.suggested_fix).unwrap_or_default(),
        code_snippet: element.code_snippet.filter(|s| !s.trim().is_empty()),
    })
}

/// Name of the first element, skipping the declaration, comments and whitespace
fn root_element(content: &str) -> Result<String> {
    let mut reader = Reader::from_str(content);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) => {
                return Ok(String::from_utf8_lossy(e.name().as_ref()).into_owned());
            }
            Ok(Event::Eof) => return Err(ReportError::format("XML report has no root element")),
            Ok(_) => {}
            Err(e) => return Err(ReportError::format(format!("invalid XML report: {e}"))),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
