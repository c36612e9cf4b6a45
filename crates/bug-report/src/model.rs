use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Declares a LOW < MEDIUM < HIGH rating with case-insensitive parsing
macro_rules! rating {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            Low,
            #[default]
            Medium,
            High,
        }

        impl $name {
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    Self::Low => "low",
                    Self::Medium => "medium",
                    Self::High => "high",
                }
            }

            /// Parse a producer value, coercing anything unrecognized to MEDIUM
            #[must_use]
            pub fn parse_lenient(raw: &str) -> Self {
                raw.parse().unwrap_or_else(|_| {
                    log::warn!(
                        "Unrecognized {} '{}', treating it as medium",
                        $what,
                        raw.trim()
                    );
                    Self::Medium
                })
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    "low" => Ok(Self::Low),
                    "medium" => Ok(Self::Medium),
                    "high" => Ok(Self::High),
                    other => Err(format!("unknown {}: {other}", $what)),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.as_str().to_ascii_uppercase())
            }
        }
    };
}

rating!(
    /// How harmful a bug is
    Severity,
    "severity"
);

rating!(
    /// How sure the producer is that the bug is real
    Confidence,
    "confidence"
);

/// Inclusive line range; `0-0` means the producer did not say
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl LineRange {
    pub const UNKNOWN: Self = Self { start: 0, end: 0 };

    #[must_use]
    pub fn new(start: u32, end: u32) -> Self {
        if end < start {
            Self { start, end: start }
        } else {
            Self { start, end }
        }
    }

    /// Build from optional bounds; a missing end collapses to the start line
    #[must_use]
    pub fn from_bounds(start: Option<u32>, end: Option<u32>) -> Self {
        match (start, end) {
            (Some(start), Some(end)) => Self::new(start, end),
            (Some(line), None) | (None, Some(line)) => Self::new(line, line),
            (None, None) => Self::UNKNOWN,
        }
    }

    /// Parse free text such as `42`, `42-45` or `12, 14`: first and last integers
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let numbers: Vec<u32> = text
            .split(|c: char| !c.is_ascii_digit())
            .filter(|part| !part.is_empty())
            .filter_map(|part| part.parse().ok())
            .collect();

        match (numbers.first(), numbers.last()) {
            (Some(&first), Some(&last)) => Self::new(first, last),
            _ => Self::UNKNOWN,
        }
    }

    #[must_use]
    pub const fn is_known(&self) -> bool {
        self.start > 0
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_known() {
            f.write_str("unknown")
        } else if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// A normalized finding, regardless of which producer emitted it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bug {
    pub description: String,
    pub file: String,
    pub lines: LineRange,
    pub severity: Severity,
    pub confidence: Confidence,
    pub suggested_fix: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
}

impl Bug {
    /// Identity used for de-duplication: (file, line range, description)
    #[must_use]
    pub fn identity(&self) -> (&str, LineRange, &str) {
        (self.file.as_str(), self.lines, self.description.as_str())
    }

    /// Both ratings are at or above the given thresholds
    #[must_use]
    pub fn meets(&self, severity: Severity, confidence: Confidence) -> bool {
        self.severity >= severity && self.confidence >= confidence
    }

    /// `file:lines`, or just the file when lines are unknown
    #[must_use]
    pub fn location(&self) -> String {
        if self.lines.is_known() {
            format!("{}:{}", self.file, self.lines)
        } else {
            self.file.clone()
        }
    }
}

/// Which producer format a report came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportOrigin {
    /// JSON findings from a whole-file scan
    WholeFile,
    /// XML findings from a diff-based analysis
    Diff,
}

impl fmt::Display for ReportOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WholeFile => f.write_str("whole-file"),
            Self::Diff => f.write_str("diff"),
        }
    }
}

/// Producer-supplied context; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub commit_id: Option<String>,
    pub timestamp: Option<String>,
    pub affected_files: Vec<String>,
    pub summary: Option<String>,
}

/// Ordered bugs from one analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugReport {
    pub origin: ReportOrigin,
    pub bugs: Vec<Bug>,
    pub metadata: ReportMetadata,
}

impl BugReport {
    /// Build a report, keeping producer order and dropping repeated identities
    pub fn new(origin: ReportOrigin, bugs: Vec<Bug>, metadata: ReportMetadata) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(bugs.len());
        for bug in bugs {
            let (file, lines, description) = bug.identity();
            let key = (file.to_string(), lines, description.to_string());
            if seen.insert(key) {
                unique.push(bug);
            } else {
                log::warn!(
                    "Dropping duplicate bug at {}: {}",
                    bug.location(),
                    bug.description
                );
            }
        }

        Self {
            origin,
            bugs: unique,
            metadata,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bugs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bugs.is_empty()
    }

    /// Listed affected files plus every bug's file, in first-seen order
    #[must_use]
    pub fn affected_files(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.metadata
            .affected_files
            .iter()
            .map(String::as_str)
            .chain(self.bugs.iter().map(|bug| bug.file.as_str()))
            .filter(|file| seen.insert(*file))
            .collect()
    }

    /// Bugs meeting both thresholds, in report order
    pub fn meeting(
        &self,
        severity: Severity,
        confidence: Confidence,
    ) -> impl Iterator<Item = &Bug> {
        self.bugs
            .iter()
            .filter(move |bug| bug.meets(severity, confidence))
    }
}
