//! # TFC Bug Report
//!
//! Normalizes the two bug-report producer formats into one ordered
//! [`BugReport`]:
//!
//! ```text
//! report file
//!     │
//!     ├──> starts with '[' or '{'  → WholeFileReport (JSON records)
//!     │
//!     ├──> starts with '<'         → DiffReport (<bug_analysis_report> XML)
//!     │
//!     └──> anything else           → ReportError::Format
//! ```
//!
//! Unknown severity or confidence values become MEDIUM, duplicate bugs
//! (same file, line range and description) are dropped, and producer order
//! is preserved. [`DiffReportDocument`] writes the XML format back out, which
//! is how a single bug is handed to a coding assistant.

mod diff;
mod error;
mod model;
mod reader;
mod whole_file;

pub use diff::{DiffReport, DiffReportDocument, DEFAULT_COMMIT_ID};
pub use error::{ReportError, Result};
pub use model::{Bug, BugReport, Confidence, LineRange, ReportMetadata, ReportOrigin, Severity};
pub use reader::{BugReportReader, ReportDecoder};
pub use whole_file::{WholeFileReport, UNKNOWN_FILE};
