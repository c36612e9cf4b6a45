use std::path::PathBuf;
use tfc_bug_report::ReportError;
use thiserror::Error;

/// Result type for session-level operations
pub type Result<T> = std::result::Result<T, FixError>;

/// Session-fatal errors; nothing has been presented when one is returned
#[derive(Error, Debug)]
pub enum FixError {
    /// Skip-analysis mode found no usable report
    #[error("Bug report not found at {path}: {reason}")]
    ReportNotFound { path: PathBuf, reason: String },

    /// The report produced by the analyzer could not be read
    #[error(transparent)]
    Report(#[from] ReportError),

    /// The wrapped single-bug report could not be written
    #[error("Failed to write report {path}: {source}")]
    WriteReport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Bug analyzer failed: {0}")]
    Analyzer(#[from] AnalyzerError),

    #[error("Version control error: {0}")]
    Vcs(#[from] VcsError),

    /// Interactive policy without a way to ask the operator
    #[error("Interactive session requires a decision prompt")]
    PromptUnavailable,
}

impl FixError {
    pub fn report_not_found(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ReportNotFound {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// The coding assistant could not apply a fix; bug-scoped
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct PatchApplicationError {
    pub message: String,
}

impl PatchApplicationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Committing an applied fix failed; bug-scoped, the patch stays applied
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CommitError {
    pub message: String,
}

impl CommitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A read-only version-control query failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct VcsError {
    pub message: String,
}

impl VcsError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The external report producer failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AnalyzerError {
    pub message: String,
}

impl AnalyzerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
