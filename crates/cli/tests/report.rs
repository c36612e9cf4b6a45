use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const DIFF_REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<bug_analysis_report>
  <commit_id>abc123</commit_id>
  <timestamp>2024-05-01T10:00:00</timestamp>
  <affected_files><file>app/db.py</file></affected_files>
  <bugs>
    <bug>
      <file_path>app/db.py</file_path>
      <line_number>42</line_number>
      <description>SQL built by string concatenation</description>
      <severity>high</severity>
      <confidence>medium</confidence>
      <suggested_fix>Use a parameterized query</suggested_fix>
    </bug>
  </bugs>
</bug_analysis_report>
"#;

#[allow(deprecated)]
fn tfc(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tfc").expect("binary");
    cmd.current_dir(dir)
        .env("TFC_GIT_BIN", "tfc-test-missing-git")
        .env("TFC_BUG_ANALYZER_BIN", "tfc-test-missing-analyzer");
    cmd
}

#[test]
fn bug_below_default_thresholds_passes() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("bug_analysis_report.xml"), DIFF_REPORT).unwrap();

    tfc(temp.path())
        .arg("find-bugs-and-report")
        .arg("--skip-bug-analyzer")
        .assert()
        .success()
        .stdout(contains("app/db.py:42"))
        .stdout(contains("0 of 1 bug(s)"));
}

#[test]
fn bug_meeting_thresholds_fails_the_run() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("bug_analysis_report.xml"), DIFF_REPORT).unwrap();

    let output = tfc(temp.path())
        .arg("find-bugs-and-report")
        .arg("--skip-bug-analyzer")
        .arg("--confidence-threshold")
        .arg("medium")
        .arg("--json")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["blocking"], 1);
    assert_eq!(body["bugs"][0]["file"], "app/db.py");
}

#[test]
fn malformed_report_is_fatal() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("bug_analysis_report.xml"), "garbage").unwrap();

    tfc(temp.path())
        .arg("find-bugs-and-report")
        .arg("--skip-bug-analyzer")
        .assert()
        .failure();
}

#[test]
fn foreign_xml_document_is_not_a_report() {
    let temp = tempdir().unwrap();
    fs::write(
        temp.path().join("bug_analysis_report.xml"),
        "<error>analyzer crashed</error>",
    )
    .unwrap();

    tfc(temp.path())
        .arg("find-bugs-and-report")
        .arg("--skip-bug-analyzer")
        .assert()
        .failure()
        .stderr(contains("root element"));
}
