use console::{measure_text_width, style, Style};
use std::fmt::Write as _;
use tfc_bug_report::{Bug, Confidence, Severity};
use tfc_code_chunker::{Chunk, ChunkPlanStats};
use tfc_fix_workflow::{BugOutcome, FixDecision, RunSummary, SessionObserver};

use crate::print_stdout;

const BOX_WIDTH: usize = 66;
const INNER_WIDTH: usize = BOX_WIDTH - 2;
const LABEL_WIDTH: usize = 15;

/// Prints each bug box and its outcome to stdout as the session advances
pub(crate) struct TerminalObserver;

impl SessionObserver for TerminalObserver {
    fn on_presented(&self, index: usize, total: usize, bug: &Bug) {
        let _ = print_stdout(&bug_box(index, total, bug));
    }

    fn on_resolved(&self, _index: usize, bug: &Bug, outcome: &BugOutcome) {
        let _ = print_stdout(&outcome_line(bug, outcome));
    }

    fn on_aborted(&self, index: usize, total: usize) {
        let _ = print_stdout(&format!(
            "{} {} bug(s) left unprocessed",
            style("Aborted.").yellow().bold(),
            total - index
        ));
    }
}

fn frame() -> Style {
    Style::new().magenta().bold()
}

fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::High => Style::new().red().bold(),
        Severity::Medium => Style::new().yellow().bold(),
        Severity::Low => Style::new().cyan().bold(),
    }
}

fn confidence_style(confidence: Confidence) -> Style {
    match confidence {
        Confidence::High => Style::new().green().bold(),
        Confidence::Medium => Style::new().yellow().bold(),
        Confidence::Low => Style::new().red().bold(),
    }
}

/// Greedy word wrap; words longer than `width` are split
pub(crate) fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let head: String = word.chars().take(width).collect();
            word = word.chars().skip(width).collect();
            lines.push(head);
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn box_line(out: &mut String, content: &str) {
    let pad = INNER_WIDTH.saturating_sub(measure_text_width(content));
    let _ = writeln!(
        out,
        "{}{content}{}{}",
        frame().apply_to("┃"),
        " ".repeat(pad),
        frame().apply_to("┃")
    );
}

fn labeled(out: &mut String, label: &str, value: &str, value_style: &Style) {
    let width = INNER_WIDTH - LABEL_WIDTH;
    let lines = wrap(value, width);
    let label_text = format!("{label:<LABEL_WIDTH$}");

    match lines.split_first() {
        None => box_line(out, &style(label_text).yellow().bold().to_string()),
        Some((first, rest)) => {
            box_line(
                out,
                &format!(
                    "{}{}",
                    style(&label_text).yellow().bold(),
                    value_style.apply_to(first)
                ),
            );
            for line in rest {
                box_line(
                    out,
                    &format!("{}{}", " ".repeat(LABEL_WIDTH), value_style.apply_to(line)),
                );
            }
        }
    }
}

/// Boxed rendering of one bug, numbered from one
pub(crate) fn bug_box(index: usize, total: usize, bug: &Bug) -> String {
    let mut out = String::new();
    let plain = Style::new();

    let _ = writeln!(out, "{}", frame().apply_to(format!("┏{}┓", "━".repeat(INNER_WIDTH))));
    box_line(
        &mut out,
        &style(format!("  Bug {}/{total}", index + 1)).cyan().bold().to_string(),
    );
    let _ = writeln!(out, "{}", frame().apply_to(format!("┣{}┫", "━".repeat(INNER_WIDTH))));

    labeled(&mut out, "File:", &bug.file, &plain);
    labeled(&mut out, "Line:", &bug.lines.to_string(), &plain);
    labeled(&mut out, "Severity:", &bug.severity.to_string(), &severity_style(bug.severity));
    labeled(
        &mut out,
        "Confidence:",
        &bug.confidence.to_string(),
        &confidence_style(bug.confidence),
    );
    labeled(&mut out, "Description:", &bug.description, &plain);
    let fix = if bug.suggested_fix.is_empty() {
        "<no suggestion>"
    } else {
        bug.suggested_fix.as_str()
    };
    labeled(&mut out, "Suggested fix:", fix, &plain);

    if let Some(snippet) = &bug.code_snippet {
        box_line(&mut out, &style("Code snippet:").yellow().bold().to_string());
        for line in snippet.lines() {
            let clipped: String = line.chars().take(INNER_WIDTH).collect();
            box_line(&mut out, &style(clipped).blue().to_string());
        }
    }

    let _ = write!(out, "{}", frame().apply_to(format!("┗{}┛", "━".repeat(INNER_WIDTH))));
    out
}

fn decision_style(decision: FixDecision) -> Style {
    match decision {
        FixDecision::Applied | FixDecision::AppliedAndCommitted => Style::new().green().bold(),
        FixDecision::Skipped => Style::new().dim(),
        FixDecision::Failed => Style::new().red().bold(),
        FixDecision::Pending => Style::new().yellow(),
    }
}

pub(crate) fn outcome_line(bug: &Bug, outcome: &BugOutcome) -> String {
    let mut line = format!(
        "{} {}",
        decision_style(outcome.decision).apply_to(outcome.decision),
        bug.location()
    );
    if let Some(err) = &outcome.patch_error {
        let _ = write!(line, " (patch failed: {err})");
    }
    if let Some(err) = &outcome.commit_error {
        let _ = write!(line, " (commit failed: {err})");
    }
    line
}

/// End-of-run summary
pub(crate) fn summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", style("Fix session summary").bold().underlined());
    let _ = writeln!(out, "  Total bugs:            {}", summary.total);
    let _ = writeln!(out, "  Applied:               {}", summary.applied);
    let _ = writeln!(
        out,
        "  Applied and committed: {}",
        summary.applied_and_committed
    );
    let _ = writeln!(out, "  Skipped:               {}", summary.skipped);
    let _ = writeln!(out, "  Failed:                {}", summary.failed);
    if summary.not_processed > 0 {
        let _ = writeln!(out, "  Not processed:         {}", summary.not_processed);
    }
    let _ = writeln!(out, "  Commits created:       {}", summary.commits_created);

    for note in &summary.patch_failures {
        let _ = writeln!(
            out,
            "  {} bug {} at {}: {}",
            style("patch failed").red(),
            note.bug,
            note.location,
            note.message
        );
    }
    for note in &summary.commit_failures {
        let _ = writeln!(
            out,
            "  {} bug {} at {}: {}",
            style("commit failed").yellow(),
            note.bug,
            note.location,
            note.message
        );
    }
    out.trim_end().to_string()
}

/// One line per bug, for report-only runs
pub(crate) fn bug_line(index: usize, bug: &Bug) -> String {
    format!(
        "{}. [{}/{}] {}: {}",
        index + 1,
        severity_style(bug.severity).apply_to(bug.severity),
        confidence_style(bug.confidence).apply_to(bug.confidence),
        bug.location(),
        bug.description
    )
}

/// Human-readable chunk plan
pub(crate) fn chunk_plan(chunks: &[Chunk], stats: &ChunkPlanStats) -> String {
    let mut out = String::new();
    for (idx, chunk) in chunks.iter().enumerate() {
        let _ = writeln!(
            out,
            "{} {} ({} files)",
            style(format!("Chunk {}/{}", idx + 1, chunks.len())).bold(),
            chunk.label(),
            chunk.len()
        );
        for path in chunk.paths() {
            let _ = writeln!(out, "  {}", path.display());
        }
    }

    let _ = writeln!(
        out,
        "{} files in {} chunks",
        stats.total_files, stats.total_chunks
    );
    if !stats.merged_directories.is_empty() {
        let dirs: Vec<String> = stats
            .merged_directories
            .iter()
            .map(|d| {
                if d.as_os_str().is_empty() {
                    ".".to_string()
                } else {
                    d.display().to_string()
                }
            })
            .collect();
        let _ = writeln!(out, "Merged directories: {}", dirs.join(", "));
    }
    out.trim_end().to_string()
}
