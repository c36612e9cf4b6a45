use crate::error::{FixError, Result};
use crate::services::{AnalysisRequest, AnalysisTarget, BugAnalyzer, VersionControl};
use std::fs;
use std::path::{Path, PathBuf};
use tfc_bug_report::{
    BugReport, BugReportReader, DiffReportDocument, ReportMetadata, ReportOrigin,
};

/// Where the session's single report comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportSource {
    /// Skip analysis and load a previously written report
    Existing(PathBuf),

    /// Run the analyzer, which writes the report to `output`
    Analyze {
        request: AnalysisRequest,
        output: PathBuf,
    },

    /// Wrap the lone `<bug>` element in `bug_xml` into a report at `output`
    SingleBug { bug_xml: PathBuf, output: PathBuf },
}

impl ReportSource {
    #[must_use]
    pub fn report_path(&self) -> &Path {
        match self {
            Self::Existing(path) => path,
            Self::Analyze { output, .. } | Self::SingleBug { output, .. } => output,
        }
    }
}

/// Obtain the report for one session. Any failure here is session-fatal.
///
/// In analysis mode an empty diff short-circuits to an empty report without
/// running the analyzer.
pub fn acquire_report(
    source: &ReportSource,
    reader: &BugReportReader,
    analyzer: &dyn BugAnalyzer,
    vcs: &dyn VersionControl,
) -> Result<BugReport> {
    match source {
        ReportSource::Existing(path) => load_existing(reader, path),
        ReportSource::SingleBug { bug_xml, output } => {
            wrap_single_bug(bug_xml, output)?;
            Ok(reader.read(output)?)
        }
        ReportSource::Analyze { request, output } => {
            let diff = match &request.target {
                AnalysisTarget::WorkingTree => vcs.diff_since_head()?,
                AnalysisTarget::Commit(id) => vcs.diff_for_commit(id)?,
            };

            if diff.trim().is_empty() {
                log::info!("No changes in {}, nothing to analyze", request.target);
                let commit_id = match &request.target {
                    AnalysisTarget::Commit(id) => Some(id.clone()),
                    AnalysisTarget::WorkingTree => None,
                };
                return Ok(BugReport::new(
                    ReportOrigin::Diff,
                    Vec::new(),
                    ReportMetadata {
                        commit_id,
                        ..ReportMetadata::default()
                    },
                ));
            }

            log::info!(
                "Analyzing {} ({} bytes of diff) into {}",
                request.target,
                diff.len(),
                output.display()
            );
            analyzer.analyze(request, output)?;
            Ok(reader.read(output)?)
        }
    }
}

fn wrap_single_bug(bug_xml: &Path, output: &Path) -> Result<()> {
    let content = fs::read_to_string(bug_xml)
        .map_err(|e| FixError::report_not_found(bug_xml, e.to_string()))?;

    let xml = DiffReportDocument::wrap_single_bug(&content)?.to_xml()?;
    fs::write(output, xml).map_err(|source| FixError::WriteReport {
        path: output.to_path_buf(),
        source,
    })?;

    log::info!(
        "Wrapped single bug from {} into {}",
        bug_xml.display(),
        output.display()
    );
    Ok(())
}

fn load_existing(reader: &BugReportReader, path: &Path) -> Result<BugReport> {
    if !path.is_file() {
        return Err(FixError::report_not_found(path, "file does not exist"));
    }

    reader
        .read(path)
        .map_err(|e| FixError::report_not_found(path, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AnalyzerError, CommitError, VcsError};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use tempfile::tempdir;

    const XML: &str = "<bug_analysis_report><commit_id>c1</commit_id><bugs>\
        <bug><file_path>a.py</file_path><line_number>3</line_number>\
        <description>d</description><severity>high</severity></bug>\
        </bugs></bug_analysis_report>";

    struct StaticVcs(&'static str);

    impl VersionControl for StaticVcs {
        fn diff_since_head(&self) -> std::result::Result<String, VcsError> {
            Ok(self.0.to_string())
        }

        fn diff_for_commit(&self, commit_id: &str) -> std::result::Result<String, VcsError> {
            if commit_id == "missing" {
                Err(VcsError::new("unknown revision"))
            } else {
                Ok(self.0.to_string())
            }
        }

        fn commit(
            &self,
            _message: &str,
            _paths: &[&str],
        ) -> std::result::Result<(), CommitError> {
            Ok(())
        }
    }

    /// Writes `content` to the output path, or fails when `None`
    struct WritingAnalyzer {
        content: Option<&'static str>,
        runs: Cell<usize>,
    }

    impl WritingAnalyzer {
        fn new(content: Option<&'static str>) -> Self {
            Self {
                content,
                runs: Cell::new(0),
            }
        }
    }

    impl BugAnalyzer for WritingAnalyzer {
        fn analyze(
            &self,
            _request: &AnalysisRequest,
            output: &Path,
        ) -> std::result::Result<(), AnalyzerError> {
            self.runs.set(self.runs.get() + 1);
            match self.content {
                Some(content) => fs::write(output, content)
                    .map_err(|e| AnalyzerError::new(e.to_string())),
                None => Err(AnalyzerError::new("bug-analyzer exited with status 2")),
            }
        }
    }

    fn analyze_source(dir: &Path, target: AnalysisTarget) -> ReportSource {
        ReportSource::Analyze {
            request: AnalysisRequest::new(dir, target),
            output: dir.join("bug_analysis_report.xml"),
        }
    }

    #[test]
    fn missing_existing_report_is_not_found() {
        let temp = tempdir().unwrap();
        let analyzer = WritingAnalyzer::new(None);
        let source = ReportSource::Existing(temp.path().join("absent.xml"));

        let err = acquire_report(
            &source,
            &BugReportReader::new(),
            &analyzer,
            &StaticVcs(""),
        )
        .unwrap_err();

        assert!(matches!(err, FixError::ReportNotFound { .. }));
        assert_eq!(analyzer.runs.get(), 0);
    }

    #[test]
    fn unparsable_existing_report_is_not_found() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("report.xml");
        fs::write(&path, "not a report").unwrap();

        let err = acquire_report(
            &ReportSource::Existing(path),
            &BugReportReader::new(),
            &WritingAnalyzer::new(None),
            &StaticVcs(""),
        )
        .unwrap_err();

        assert!(err.to_string().contains("unrecognized report format"));
    }

    #[test]
    fn existing_report_is_loaded() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("report.xml");
        fs::write(&path, XML).unwrap();

        let report = acquire_report(
            &ReportSource::Existing(path),
            &BugReportReader::new(),
            &WritingAnalyzer::new(None),
            &StaticVcs(""),
        )
        .unwrap();

        assert_eq!(report.len(), 1);
    }

    #[test]
    fn analyzer_output_is_read_back() {
        let temp = tempdir().unwrap();
        let analyzer = WritingAnalyzer::new(Some(XML));

        let report = acquire_report(
            &analyze_source(temp.path(), AnalysisTarget::WorkingTree),
            &BugReportReader::new(),
            &analyzer,
            &StaticVcs("diff --git a/a.py b/a.py"),
        )
        .unwrap();

        assert_eq!(analyzer.runs.get(), 1);
        assert_eq!(report.metadata.commit_id.as_deref(), Some("c1"));
    }

    #[test]
    fn empty_diff_skips_analyzer() {
        let temp = tempdir().unwrap();
        let analyzer = WritingAnalyzer::new(Some(XML));

        let report = acquire_report(
            &analyze_source(temp.path(), AnalysisTarget::Commit("abc".into())),
            &BugReportReader::new(),
            &analyzer,
            &StaticVcs("  \n"),
        )
        .unwrap();

        assert!(report.is_empty());
        assert_eq!(report.metadata.commit_id.as_deref(), Some("abc"));
        assert_eq!(analyzer.runs.get(), 0);
    }

    #[test]
    fn analyzer_failure_is_fatal() {
        let temp = tempdir().unwrap();

        let err = acquire_report(
            &analyze_source(temp.path(), AnalysisTarget::WorkingTree),
            &BugReportReader::new(),
            &WritingAnalyzer::new(None),
            &StaticVcs("diff"),
        )
        .unwrap_err();

        assert!(matches!(err, FixError::Analyzer(_)));
    }

    #[test]
    fn unknown_commit_is_fatal() {
        let temp = tempdir().unwrap();

        let err = acquire_report(
            &analyze_source(temp.path(), AnalysisTarget::Commit("missing".into())),
            &BugReportReader::new(),
            &WritingAnalyzer::new(Some(XML)),
            &StaticVcs("diff"),
        )
        .unwrap_err();

        assert!(matches!(err, FixError::Vcs(_)));
    }

    #[test]
    fn single_bug_is_wrapped_and_read_back() {
        let temp = tempdir().unwrap();
        let bug_xml = temp.path().join("bug.xml");
        fs::write(
            &bug_xml,
            "<bug><file_path>a.py</file_path><line_number>3</line_number>\
             <description>d</description><severity>high</severity></bug>",
        )
        .unwrap();
        let output = temp.path().join("bug_analysis_report.xml");
        let analyzer = WritingAnalyzer::new(None);

        let report = acquire_report(
            &ReportSource::SingleBug {
                bug_xml,
                output: output.clone(),
            },
            &BugReportReader::new(),
            &analyzer,
            &StaticVcs(""),
        )
        .unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(report.metadata.affected_files, vec!["a.py".to_string()]);
        assert!(output.is_file());
        assert_eq!(analyzer.runs.get(), 0);
    }

    #[test]
    fn missing_single_bug_file_is_not_found() {
        let temp = tempdir().unwrap();

        let err = acquire_report(
            &ReportSource::SingleBug {
                bug_xml: temp.path().join("absent.xml"),
                output: temp.path().join("out.xml"),
            },
            &BugReportReader::new(),
            &WritingAnalyzer::new(None),
            &StaticVcs(""),
        )
        .unwrap_err();

        assert!(matches!(err, FixError::ReportNotFound { .. }));
    }

    #[test]
    fn garbage_from_analyzer_is_report_error() {
        let temp = tempdir().unwrap();

        let err = acquire_report(
            &analyze_source(temp.path(), AnalysisTarget::WorkingTree),
            &BugReportReader::new(),
            &WritingAnalyzer::new(Some("<bug_analysis_report><bugs><bug>")),
            &StaticVcs("diff"),
        )
        .unwrap_err();

        assert!(matches!(err, FixError::Report(_)));
    }
}
