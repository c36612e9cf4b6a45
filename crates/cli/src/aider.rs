use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tfc_bug_report::{Bug, BugReport, DiffReportDocument, UNKNOWN_FILE};
use tfc_fix_workflow::{PatchApplicationError, PatchService};

const FIX_MESSAGE: &str = "Here is a bug analysis report in XML format. \
For each bug, please fix the code in the specified file and line. \
Apply the suggested fix if possible, or otherwise address the described issue. \
Do not make unrelated changes.";

/// `PatchService` that hands one bug at a time to the `aider` coding assistant
pub(crate) struct AiderPatchService {
    program: OsString,
    root: PathBuf,
    debug: bool,
}

impl AiderPatchService {
    pub(crate) fn new(program: impl Into<OsString>, root: impl AsRef<Path>, debug: bool) -> Self {
        Self {
            program: program.into(),
            root: root.as_ref().to_path_buf(),
            debug,
        }
    }

    fn command(&self, report_path: &Path, bug: &Bug) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.current_dir(&self.root)
            .arg("--yes-always")
            .arg("--no-auto-commits");
        if self.debug {
            cmd.arg("--pretty").arg("--stream");
        } else {
            cmd.arg("--no-pretty").arg("--no-stream");
        }
        cmd.arg("--message").arg(FIX_MESSAGE).arg("--read").arg(report_path);
        if bug.file != UNKNOWN_FILE {
            cmd.arg("--file").arg(&bug.file);
        }
        cmd
    }
}

impl PatchService for AiderPatchService {
    fn apply(&self, bug: &Bug, report: &BugReport) -> Result<(), PatchApplicationError> {
        let xml = DiffReportDocument::single_bug(report, bug)
            .to_xml()
            .map_err(|e| PatchApplicationError::new(e.to_string()))?;

        // Removed when dropped, after the assistant has exited
        let mut report_file = tempfile::Builder::new()
            .prefix("tfc_")
            .suffix("_single_bug.xml")
            .tempfile()
            .map_err(|e| PatchApplicationError::new(format!("failed to create temp report: {e}")))?;
        report_file
            .write_all(xml.as_bytes())
            .and_then(|()| report_file.flush())
            .map_err(|e| PatchApplicationError::new(format!("failed to write temp report: {e}")))?;

        log::info!("Asking aider to fix {}", bug.location());
        let output = self
            .command(report_file.path(), bug)
            .output()
            .map_err(|e| {
                PatchApplicationError::new(format!(
                    "failed to run {}: {e}",
                    self.program.to_string_lossy()
                ))
            })?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            let line = line.trim();
            if !line.is_empty() {
                log::info!("[aider] {line}");
            }
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines().map(str::trim).filter(|l| !l.is_empty()) {
            log::debug!("[aider stderr] {line}");
        }

        if output.status.success() {
            return Ok(());
        }

        let reason = stderr
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .last()
            .unwrap_or("no error output");
        Err(PatchApplicationError::new(format!(
            "aider exited with {}: {reason}",
            output.status
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tfc_bug_report::{Confidence, LineRange, ReportMetadata, ReportOrigin, Severity};

    fn report() -> BugReport {
        BugReport::new(
            ReportOrigin::Diff,
            vec![Bug {
                description: "Off by one".into(),
                file: "src/a.py".into(),
                lines: LineRange::new(3, 4),
                severity: Severity::High,
                confidence: Confidence::High,
                suggested_fix: "Use <=".into(),
                code_snippet: None,
            }],
            ReportMetadata::default(),
        )
    }

    #[test]
    fn command_passes_bug_file_and_report() {
        let temp = tempdir().unwrap();
        let service = AiderPatchService::new("aider", temp.path(), false);
        let report = report();

        let cmd = service.command(Path::new("/tmp/r.xml"), &report.bugs[0]);
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert!(args.contains(&"--no-auto-commits".to_string()));
        assert!(args.windows(2).any(|w| w[0] == "--read" && w[1] == "/tmp/r.xml"));
        assert!(args.windows(2).any(|w| w[0] == "--file" && w[1] == "src/a.py"));
        assert!(args.contains(&"--no-stream".to_string()));
    }

    #[test]
    fn missing_program_fails_the_patch() {
        let temp = tempdir().unwrap();
        let service = AiderPatchService::new("tfc-no-such-aider", temp.path(), false);
        let report = report();

        let err = service.apply(&report.bugs[0], &report).unwrap_err();
        assert!(err.message.contains("failed to run tfc-no-such-aider"));
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_decides_success() {
        let temp = tempdir().unwrap();
        let report = report();

        let ok = AiderPatchService::new("true", temp.path(), false);
        assert!(ok.apply(&report.bugs[0], &report).is_ok());

        let failing = AiderPatchService::new("false", temp.path(), true);
        let err = failing.apply(&report.bugs[0], &report).unwrap_err();
        assert!(err.message.starts_with("aider exited with"));
    }
}
