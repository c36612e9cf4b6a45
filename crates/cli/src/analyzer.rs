use indicatif::{ProgressBar, ProgressStyle};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use std::time::Duration;
use tfc_fix_workflow::{AnalysisRequest, AnalysisTarget, AnalyzerError, BugAnalyzer};

/// `BugAnalyzer` that runs the external `bug-analyzer` program
pub(crate) struct ExternalBugAnalyzer {
    program: OsString,
    show_progress: bool,
}

impl ExternalBugAnalyzer {
    pub(crate) fn new(program: impl Into<OsString>, show_progress: bool) -> Self {
        Self {
            program: program.into(),
            show_progress,
        }
    }

    fn command(&self, request: &AnalysisRequest, output: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--directory")
            .arg(&request.directory)
            .arg("--output")
            .arg(output);
        match &request.target {
            AnalysisTarget::WorkingTree => {
                cmd.arg("--working-tree");
            }
            AnalysisTarget::Commit(id) => {
                cmd.arg("--commit").arg(id);
            }
        }
        if request.debug {
            cmd.arg("--debug");
        }
        cmd
    }

    fn spinner(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(style.tick_chars("|/-\\ "));
        }
        spinner.set_message("Running bug analyzer...");
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }
}

impl BugAnalyzer for ExternalBugAnalyzer {
    fn analyze(&self, request: &AnalysisRequest, output: &Path) -> Result<(), AnalyzerError> {
        let spinner = self.spinner();
        let result = self.command(request, output).output();
        spinner.finish_and_clear();

        let result = result.map_err(|e| {
            AnalyzerError::new(format!(
                "failed to run {}: {e}",
                self.program.to_string_lossy()
            ))
        })?;

        for line in String::from_utf8_lossy(&result.stdout).lines() {
            log_analyzer_line(line);
        }
        for line in String::from_utf8_lossy(&result.stderr).lines() {
            log_analyzer_line(line);
        }

        if !result.status.success() {
            return Err(AnalyzerError::new(format!(
                "{} exited with {}",
                self.program.to_string_lossy(),
                result.status
            )));
        }

        if !output.is_file() {
            return Err(AnalyzerError::new(format!(
                "analyzer finished but wrote no report at {}",
                output.display()
            )));
        }

        log::info!("Bug analysis complete: {}", output.display());
        Ok(())
    }
}

/// Re-log analyzer output at the level its own prefix announces
fn log_analyzer_line(line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    if line.contains("ERROR") || line.contains("CRITICAL") {
        log::error!("[bug-analyzer] {line}");
    } else if line.contains("WARNING") {
        log::warn!("[bug-analyzer] {line}");
    } else if line.contains("DEBUG") {
        log::debug!("[bug-analyzer] {line}");
    } else {
        log::info!("[bug-analyzer] {line}");
    }
}
