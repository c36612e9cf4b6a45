use crate::error::{AnalyzerError, CommitError, PatchApplicationError, VcsError};
use std::fmt;
use std::path::{Path, PathBuf};
use tfc_bug_report::{Bug, BugReport};

/// Coding assistant that turns one bug into a working-tree patch
pub trait PatchService {
    /// Called once per bug that reaches an apply transition
    fn apply(&self, bug: &Bug, report: &BugReport) -> Result<(), PatchApplicationError>;
}

/// Version-control operations the workflow relies on
pub trait VersionControl {
    /// Uncommitted changes relative to HEAD
    fn diff_since_head(&self) -> Result<String, VcsError>;

    /// Changes introduced by `commit_id`
    fn diff_for_commit(&self, commit_id: &str) -> Result<String, VcsError>;

    /// Record one commit holding only `paths`; other working-tree changes
    /// stay uncommitted
    fn commit(&self, message: &str, paths: &[&str]) -> Result<(), CommitError>;
}

/// What the analyzer should look at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisTarget {
    WorkingTree,
    Commit(String),
}

impl fmt::Display for AnalysisTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WorkingTree => f.write_str("working tree"),
            Self::Commit(id) => write!(f, "commit {id}"),
        }
    }
}

/// Parameters for one analyzer run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub directory: PathBuf,
    pub target: AnalysisTarget,
    pub debug: bool,
}

impl AnalysisRequest {
    pub fn new(directory: impl Into<PathBuf>, target: AnalysisTarget) -> Self {
        Self {
            directory: directory.into(),
            target,
            debug: false,
        }
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// External report producer; writes a report file at `output`
pub trait BugAnalyzer {
    fn analyze(&self, request: &AnalysisRequest, output: &Path) -> Result<(), AnalyzerError>;
}
