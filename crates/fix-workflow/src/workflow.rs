use crate::error::{CommitError, FixError, Result};
use crate::policy::{FixAction, FixDecision, FixPolicy, PromptOutcome};
use crate::prompt::DecisionPrompt;
use crate::services::{PatchService, VersionControl};
use crate::session::{BugOutcome, FixSession};
use tfc_bug_report::{Bug, BugReport, UNKNOWN_FILE};

const COMMIT_SUBJECT_MAX_CHARS: usize = 72;

/// Hooks for showing progress; all methods default to doing nothing
pub trait SessionObserver {
    /// A bug is about to be decided (`index` is zero-based)
    fn on_presented(&self, _index: usize, _total: usize, _bug: &Bug) {}

    /// A bug reached its terminal decision
    fn on_resolved(&self, _index: usize, _bug: &Bug, _outcome: &BugOutcome) {}

    /// The operator aborted before `index` was decided
    fn on_aborted(&self, _index: usize, _total: usize) {}
}

/// Observer that shows nothing
pub struct SilentObserver;

impl SessionObserver for SilentObserver {}

/// Drives each bug of a report to a terminal decision, strictly in order
pub struct FixWorkflow<'a> {
    patcher: &'a dyn PatchService,
    vcs: &'a dyn VersionControl,
    observer: &'a dyn SessionObserver,
}

impl<'a> FixWorkflow<'a> {
    pub fn new(patcher: &'a dyn PatchService, vcs: &'a dyn VersionControl) -> Self {
        Self {
            patcher,
            vcs,
            observer: &SilentObserver,
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: &'a dyn SessionObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Run one session. An interactive policy requires `prompt`.
    ///
    /// Per-bug patch and commit failures are recorded on the session and
    /// never stop the loop; only an aborted prompt ends it early.
    pub fn run(
        &self,
        report: BugReport,
        policy: FixPolicy,
        mut prompt: Option<&mut dyn DecisionPrompt>,
    ) -> Result<FixSession> {
        if policy.is_interactive() && prompt.is_none() {
            return Err(FixError::PromptUnavailable);
        }

        let mut session = FixSession::new(report, policy);
        let total = session.report().len();
        log::info!("Triaging {total} bug(s) with policy {policy}");

        for index in 0..total {
            let step = {
                let report = session.report();
                let bug = &report.bugs[index];
                self.observer.on_presented(index, total, bug);

                let action = match (policy.fixed_action(), prompt.as_deref_mut()) {
                    (Some(action), _) => Some(action),
                    (None, Some(prompt)) => match prompt.decide(index, total, bug) {
                        PromptOutcome::Decided(action) => Some(action),
                        PromptOutcome::Abort => None,
                    },
                    (None, None) => None,
                };

                action.map(|action| {
                    let outcome = self.execute(action, bug, report);
                    self.observer.on_resolved(index, bug, &outcome);
                    outcome
                })
            };

            match step {
                Some(outcome) => session.record(index, outcome),
                None => {
                    log::warn!(
                        "Session aborted at bug {}/{total}; {} bug(s) not processed",
                        index + 1,
                        total - index
                    );
                    self.observer.on_aborted(index, total);
                    session.abort();
                    break;
                }
            }
        }

        Ok(session)
    }

    fn execute(&self, action: FixAction, bug: &Bug, report: &BugReport) -> BugOutcome {
        if !action.needs_patch() {
            log::debug!("Skipping bug at {}", bug.location());
            return BugOutcome::new(FixDecision::resolve(action, false, false));
        }

        let patch = self.patcher.apply(bug, report);
        if let Err(e) = &patch {
            log::warn!("Failed to apply fix for {}: {e}", bug.location());
        }

        let commit = match (&patch, action) {
            (Ok(()), FixAction::ApplyAndCommit) => {
                let result = self.commit_fix(bug);
                match &result {
                    Ok(()) => log::info!("Committed fix for {}", bug.location()),
                    Err(e) => log::warn!(
                        "Fix for {} applied but commit failed: {e}",
                        bug.location()
                    ),
                }
                Some(result)
            }
            _ => None,
        };

        let committed = matches!(commit, Some(Ok(())));
        BugOutcome {
            decision: FixDecision::resolve(action, patch.is_ok(), committed),
            patch_attempted: true,
            patch_error: patch.err().map(|e| e.message),
            commit_error: commit.and_then(|result| result.err()).map(|e| e.message),
        }
    }
}

impl FixWorkflow<'_> {
    /// Commit only the bug's file, so unrelated edits and the report itself
    /// never ride along
    fn commit_fix(&self, bug: &Bug) -> std::result::Result<(), CommitError> {
        if bug.file == UNKNOWN_FILE {
            return Err(CommitError::new(
                "bug has no file location, nothing to stage",
            ));
        }
        self.vcs.commit(&commit_message(bug), &[bug.file.as_str()])
    }
}

/// `fix: <first line of description> (<file>:<lines>)`, subject kept short
#[must_use]
pub fn commit_message(bug: &Bug) -> String {
    let first_line = bug.description.lines().next().unwrap_or_default().trim();
    let mut subject: String = first_line.chars().take(COMMIT_SUBJECT_MAX_CHARS).collect();
    if first_line.chars().count() > COMMIT_SUBJECT_MAX_CHARS {
        subject.push_str("...");
    }

    let mut message = format!("fix: {subject} ({})", bug.location());
    if !bug.suggested_fix.is_empty() {
        message.push_str("\n\n");
        message.push_str(&bug.suggested_fix);
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CommitError, PatchApplicationError, VcsError};
    use crate::prompt::LinePrompt;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::io::Cursor;
    use tfc_bug_report::{Confidence, LineRange, ReportMetadata, ReportOrigin, Severity};

    fn report(count: u32) -> BugReport {
        let bugs = (1..=count)
            .map(|i| Bug {
                description: format!("bug {i}"),
                file: format!("src/m{i}.py"),
                lines: LineRange::new(i * 10, i * 10 + 2),
                severity: Severity::High,
                confidence: Confidence::Medium,
                suggested_fix: format!("fix {i}"),
                code_snippet: None,
            })
            .collect();
        BugReport::new(ReportOrigin::Diff, bugs, ReportMetadata::default())
    }

    /// Records every patch call; fails for descriptions in `failing`
    #[derive(Default)]
    struct FakePatcher {
        failing: HashSet<String>,
        calls: RefCell<Vec<String>>,
    }

    impl FakePatcher {
        fn failing_on(description: &str) -> Self {
            Self {
                failing: HashSet::from([description.to_string()]),
                ..Self::default()
            }
        }
    }

    impl PatchService for FakePatcher {
        fn apply(&self, bug: &Bug, _report: &BugReport) -> std::result::Result<(), PatchApplicationError> {
            self.calls.borrow_mut().push(bug.description.clone());
            if self.failing.contains(&bug.description) {
                Err(PatchApplicationError::new("assistant exited with status 1"))
            } else {
                Ok(())
            }
        }
    }

    /// Records commit messages and staged paths; fails every commit when
    /// `fail_commits`, or commits touching a file in `failing_files`
    #[derive(Default)]
    struct FakeVcs {
        fail_commits: bool,
        failing_files: HashSet<String>,
        commits: RefCell<Vec<String>>,
        staged: RefCell<Vec<Vec<String>>>,
    }

    impl VersionControl for FakeVcs {
        fn diff_since_head(&self) -> std::result::Result<String, VcsError> {
            Ok(String::new())
        }

        fn diff_for_commit(&self, _commit_id: &str) -> std::result::Result<String, VcsError> {
            Ok(String::new())
        }

        fn commit(&self, message: &str, paths: &[&str]) -> std::result::Result<(), CommitError> {
            if self.fail_commits || paths.iter().any(|p| self.failing_files.contains(*p)) {
                return Err(CommitError::new("nothing to commit"));
            }
            self.commits.borrow_mut().push(message.to_string());
            self.staged
                .borrow_mut()
                .push(paths.iter().map(|p| (*p).to_string()).collect());
            Ok(())
        }
    }

    fn decisions(session: &FixSession) -> Vec<FixDecision> {
        session.outcomes().iter().map(|o| o.decision).collect()
    }

    #[test]
    fn always_skip_makes_no_external_calls() {
        let patcher = FakePatcher::default();
        let vcs = FakeVcs::default();

        let session = FixWorkflow::new(&patcher, &vcs)
            .run(report(3), FixPolicy::AutoSkip, None)
            .unwrap();

        assert_eq!(decisions(&session), vec![FixDecision::Skipped; 3]);
        assert!(patcher.calls.borrow().is_empty());
        assert!(vcs.commits.borrow().is_empty());

        let summary = session.summary();
        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.patches_attempted, 0);
        assert_eq!(summary.commits_created, 0);
    }

    #[test]
    fn always_commit_creates_one_commit_per_bug() {
        let patcher = FakePatcher::default();
        let vcs = FakeVcs::default();

        let session = FixWorkflow::new(&patcher, &vcs)
            .run(report(3), FixPolicy::AutoCommit, None)
            .unwrap();

        let summary = session.summary();
        assert_eq!(summary.applied_and_committed, 3);
        assert_eq!(vcs.commits.borrow().len(), summary.applied_and_committed);
        assert_eq!(summary.commits_created, 3);
        assert!(vcs.commits.borrow()[0].starts_with("fix: bug 1 (src/m1.py:10-12)"));
        assert_eq!(
            *vcs.staged.borrow(),
            vec![
                vec!["src/m1.py".to_string()],
                vec!["src/m2.py".to_string()],
                vec!["src/m3.py".to_string()]
            ]
        );
    }

    #[test]
    fn unknown_file_is_applied_but_not_committed() {
        let patcher = FakePatcher::default();
        let vcs = FakeVcs::default();
        let mut report = report(1);
        report.bugs[0].file = UNKNOWN_FILE.to_string();

        let session = FixWorkflow::new(&patcher, &vcs)
            .run(report, FixPolicy::AutoCommit, None)
            .unwrap();

        assert_eq!(decisions(&session), vec![FixDecision::Applied]);
        assert!(vcs.commits.borrow().is_empty());
        assert!(session.outcomes()[0]
            .commit_error
            .as_deref()
            .unwrap()
            .contains("no file location"));
    }

    #[test]
    fn failed_patch_does_not_block_later_commits() {
        let patcher = FakePatcher::failing_on("bug 1");
        let vcs = FakeVcs::default();

        let session = FixWorkflow::new(&patcher, &vcs)
            .run(report(2), FixPolicy::AutoCommit, None)
            .unwrap();

        assert_eq!(
            decisions(&session),
            vec![FixDecision::Failed, FixDecision::AppliedAndCommitted]
        );
        assert_eq!(vcs.commits.borrow().len(), 1);
        assert_eq!(
            session.outcomes()[0].patch_error.as_deref(),
            Some("assistant exited with status 1")
        );
        assert_eq!(session.summary().patch_failures.len(), 1);
    }

    #[test]
    fn commit_failure_leaves_fix_applied() {
        let patcher = FakePatcher::default();
        let vcs = FakeVcs {
            fail_commits: true,
            ..FakeVcs::default()
        };

        let session = FixWorkflow::new(&patcher, &vcs)
            .run(report(1), FixPolicy::AutoCommit, None)
            .unwrap();

        assert_eq!(decisions(&session), vec![FixDecision::Applied]);
        assert_eq!(
            session.outcomes()[0].commit_error.as_deref(),
            Some("nothing to commit")
        );
        assert_eq!(session.summary().commits_created, 0);
    }

    #[test]
    fn auto_apply_never_commits() {
        let patcher = FakePatcher::default();
        let vcs = FakeVcs::default();

        let session = FixWorkflow::new(&patcher, &vcs)
            .run(report(2), FixPolicy::AutoApply, None)
            .unwrap();

        assert_eq!(decisions(&session), vec![FixDecision::Applied; 2]);
        assert_eq!(patcher.calls.borrow().len(), 2);
        assert!(vcs.commits.borrow().is_empty());
    }

    #[test]
    fn interactive_answers_drive_each_bug() {
        let patcher = FakePatcher::default();
        let vcs = FakeVcs::default();
        let mut prompt = LinePrompt::new(Cursor::new("y\nn\na\n"), Vec::new());

        let session = FixWorkflow::new(&patcher, &vcs)
            .run(report(3), FixPolicy::Interactive, Some(&mut prompt))
            .unwrap();

        assert_eq!(
            decisions(&session),
            vec![
                FixDecision::Applied,
                FixDecision::Skipped,
                FixDecision::AppliedAndCommitted
            ]
        );
        assert_eq!(*patcher.calls.borrow(), vec!["bug 1", "bug 3"]);
        assert_eq!(vcs.commits.borrow().len(), 1);
    }

    #[test]
    fn abort_leaves_remaining_bugs_pending() {
        let patcher = FakePatcher::default();
        let vcs = FakeVcs::default();
        let mut prompt = LinePrompt::new(Cursor::new("n\n"), Vec::new());

        let session = FixWorkflow::new(&patcher, &vcs)
            .run(report(3), FixPolicy::Interactive, Some(&mut prompt))
            .unwrap();

        assert!(session.is_aborted());
        assert_eq!(
            decisions(&session),
            vec![
                FixDecision::Skipped,
                FixDecision::Pending,
                FixDecision::Pending
            ]
        );

        let summary = session.summary();
        assert_eq!(summary.not_processed, 2);
        assert_eq!(summary.accounted(), summary.total);
    }

    #[test]
    fn interactive_without_prompt_is_rejected() {
        let patcher = FakePatcher::default();
        let vcs = FakeVcs::default();

        let err = FixWorkflow::new(&patcher, &vcs)
            .run(report(1), FixPolicy::Interactive, None)
            .unwrap_err();

        assert!(matches!(err, FixError::PromptUnavailable));
    }

    #[test]
    fn empty_report_is_immediately_done() {
        let patcher = FakePatcher::default();
        let vcs = FakeVcs::default();

        let session = FixWorkflow::new(&patcher, &vcs)
            .run(report(0), FixPolicy::AutoCommit, None)
            .unwrap();

        assert!(session.is_done());
        assert_eq!(session.summary().total, 0);
    }

    #[test]
    fn observer_sees_every_presented_bug() {
        struct Counting(RefCell<Vec<(usize, FixDecision)>>);
        impl SessionObserver for Counting {
            fn on_resolved(&self, index: usize, _bug: &Bug, outcome: &BugOutcome) {
                self.0.borrow_mut().push((index, outcome.decision));
            }
        }

        let patcher = FakePatcher::default();
        let vcs = FakeVcs::default();
        let observer = Counting(RefCell::new(Vec::new()));

        FixWorkflow::new(&patcher, &vcs)
            .with_observer(&observer)
            .run(report(2), FixPolicy::AutoSkip, None)
            .unwrap();

        assert_eq!(
            *observer.0.borrow(),
            vec![(0, FixDecision::Skipped), (1, FixDecision::Skipped)]
        );
    }

    #[test]
    fn commit_message_truncates_long_descriptions() {
        let mut bug = report(1).bugs.remove(0);
        bug.description = format!("{}\nsecond line", "x".repeat(100));
        bug.suggested_fix.clear();

        let message = commit_message(&bug);

        assert!(message.starts_with(&format!("fix: {}...", "x".repeat(72))));
        assert!(message.ends_with("(src/m1.py:10-12)"));
        assert!(!message.contains("second line"));
    }

    fn unattended_policy() -> impl Strategy<Value = FixPolicy> {
        prop_oneof![
            Just(FixPolicy::AutoApply),
            Just(FixPolicy::AutoSkip),
            Just(FixPolicy::AutoCommit),
        ]
    }

    proptest! {
        #[test]
        fn outcome_counts_match_external_calls(
            size in 0u32..12,
            failing_patches in prop::collection::hash_set(1u32..12, 0..6),
            failing_commits in prop::collection::hash_set(1u32..12, 0..6),
            policy in unattended_policy(),
        ) {
            let patcher = FakePatcher {
                failing: failing_patches.iter().map(|i| format!("bug {i}")).collect(),
                ..FakePatcher::default()
            };
            let vcs = FakeVcs {
                failing_files: failing_commits.iter().map(|i| format!("src/m{i}.py")).collect(),
                ..FakeVcs::default()
            };

            let session = FixWorkflow::new(&patcher, &vcs)
                .run(report(size), policy, None)
                .unwrap();
            let summary = session.summary();

            prop_assert_eq!(summary.total, size as usize);
            prop_assert_eq!(summary.accounted(), summary.total);
            prop_assert_eq!(vcs.commits.borrow().len(), summary.applied_and_committed);
            prop_assert_eq!(summary.commits_created, summary.applied_and_committed);

            if policy == FixPolicy::AutoSkip {
                prop_assert!(patcher.calls.borrow().is_empty());
                prop_assert_eq!(summary.skipped, summary.total);
            } else {
                prop_assert_eq!(patcher.calls.borrow().len(), summary.total);
            }

            if policy == FixPolicy::AutoCommit {
                let expected = (1..=size)
                    .filter(|i| !failing_patches.contains(i) && !failing_commits.contains(i))
                    .count();
                prop_assert_eq!(summary.applied_and_committed, expected);
            } else {
                prop_assert!(vcs.commits.borrow().is_empty());
            }
        }
    }
}
