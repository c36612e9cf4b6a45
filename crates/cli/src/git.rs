use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tfc_fix_workflow::{CommitError, VcsError, VersionControl};

/// `VersionControl` backed by the `git` command line
pub(crate) struct GitCli {
    program: OsString,
    root: PathBuf,
}

impl GitCli {
    pub(crate) fn new(program: impl Into<OsString>, root: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            root: root.as_ref().to_path_buf(),
        }
    }

    fn run<I, S>(&self, args: I) -> Result<Output, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Command::new(&self.program)
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .output()
            .map_err(|e| format!("failed to run {}: {e}", self.program.to_string_lossy()))
    }

    /// Run and return stdout, turning a non-zero exit into its stderr text
    fn run_checked<I, S>(&self, args: I) -> Result<String, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = self.run(args)?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }
        Err(failure_text(&output))
    }
}

impl VersionControl for GitCli {
    fn diff_since_head(&self) -> Result<String, VcsError> {
        self.run_checked(["diff", "HEAD"]).map_err(VcsError::new)
    }

    fn diff_for_commit(&self, commit_id: &str) -> Result<String, VcsError> {
        self.run_checked(["show", "--format=", commit_id])
            .map_err(VcsError::new)
    }

    fn commit(&self, message: &str, paths: &[&str]) -> Result<(), CommitError> {
        if paths.is_empty() {
            return Err(CommitError::new("no paths to commit"));
        }

        // `commit -- <paths>` records only these paths even if other changes
        // are staged
        let mut add = vec!["add", "--"];
        add.extend_from_slice(paths);
        self.run_checked(add).map_err(CommitError::new)?;

        let mut commit = vec!["commit", "-m", message, "--"];
        commit.extend_from_slice(paths);
        self.run_checked(commit).map_err(CommitError::new)?;

        if let Ok(head) = self.run_checked(["rev-parse", "--short", "HEAD"]) {
            log::debug!("Created commit {}", head.trim());
        }
        Ok(())
    }
}

/// Best human-readable reason for a failed git call (git prints some, like
/// "nothing to commit", on stdout)
fn failure_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let text = if stderr.trim().is_empty() {
        stdout.trim()
    } else {
        stderr.trim()
    };

    if text.is_empty() {
        format!("git exited with {}", output.status)
    } else {
        text.to_string()
    }
}
