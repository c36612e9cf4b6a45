use crate::diff::DiffReport;
use crate::error::{ReportError, Result};
use crate::model::{BugReport, ReportOrigin};
use crate::whole_file::WholeFileReport;
use std::path::Path;

/// One producer format: recognizes its content shape and decodes it
pub trait ReportDecoder: Send + Sync {
    fn origin(&self) -> ReportOrigin;

    /// Cheap shape check on the raw content
    fn accepts(&self, content: &str) -> bool;

    fn parse(&self, content: &str) -> Result<BugReport>;
}

/// Reads a report file with whichever decoder accepts its content
pub struct BugReportReader {
    decoders: Vec<Box<dyn ReportDecoder>>,
}

impl Default for BugReportReader {
    fn default() -> Self {
        Self::with_decoders(vec![Box::new(WholeFileReport), Box::new(DiffReport)])
    }
}

impl BugReportReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoders are tried in order; the first that accepts the content wins
    #[must_use]
    pub fn with_decoders(decoders: Vec<Box<dyn ReportDecoder>>) -> Self {
        Self { decoders }
    }

    pub fn read(&self, path: impl AsRef<Path>) -> Result<BugReport> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let report = self.read_str(&content)?;
        log::info!(
            "Loaded {} bug(s) from {} report {}",
            report.len(),
            report.origin,
            path.display()
        );
        Ok(report)
    }

    pub fn read_str(&self, content: &str) -> Result<BugReport> {
        let content = content.trim_start_matches('\u{feff}');
        if content.trim().is_empty() {
            return Err(ReportError::format("report is empty"));
        }

        let decoder = self
            .decoders
            .iter()
            .find(|decoder| decoder.accepts(content))
            .ok_or_else(|| ReportError::format("unrecognized report format"))?;

        log::debug!("Decoding report as {}", decoder.origin());
        decoder.parse(content)
    }
}
