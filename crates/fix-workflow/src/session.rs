use crate::policy::{FixDecision, FixPolicy};
use serde::Serialize;
use tfc_bug_report::{Bug, BugReport};

/// Ledger entry for one bug
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BugOutcome {
    pub decision: FixDecision,

    /// The patch service was invoked for this bug
    pub patch_attempted: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_error: Option<String>,
}

impl BugOutcome {
    #[must_use]
    pub fn new(decision: FixDecision) -> Self {
        Self {
            decision,
            ..Self::default()
        }
    }
}

/// One bounded pass of the triage workflow over a report
#[derive(Debug, Clone)]
pub struct FixSession {
    report: BugReport,
    policy: FixPolicy,
    outcomes: Vec<BugOutcome>,
    aborted: bool,
}

impl FixSession {
    /// Every bug starts PENDING
    #[must_use]
    pub fn new(report: BugReport, policy: FixPolicy) -> Self {
        let outcomes = vec![BugOutcome::default(); report.len()];
        Self {
            report,
            policy,
            outcomes,
            aborted: false,
        }
    }

    #[must_use]
    pub fn report(&self) -> &BugReport {
        &self.report
    }

    #[must_use]
    pub const fn policy(&self) -> FixPolicy {
        self.policy
    }

    #[must_use]
    pub fn outcomes(&self) -> &[BugOutcome] {
        &self.outcomes
    }

    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Every bug has left PENDING, or the operator aborted
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.aborted || self.outcomes.iter().all(|o| o.decision.is_terminal())
    }

    /// Record a terminal outcome; a decided bug is never revisited
    pub(crate) fn record(&mut self, index: usize, outcome: BugOutcome) {
        if let Some(slot) = self.outcomes.get_mut(index) {
            debug_assert!(!slot.decision.is_terminal(), "bug {index} decided twice");
            *slot = outcome;
        }
    }

    pub(crate) fn abort(&mut self) {
        self.aborted = true;
    }

    /// Bugs paired with their outcomes, in report order
    pub fn entries(&self) -> impl Iterator<Item = (&Bug, &BugOutcome)> {
        self.report.bugs.iter().zip(self.outcomes.iter())
    }

    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            total: self.outcomes.len(),
            aborted: self.aborted,
            ..RunSummary::default()
        };

        for (index, (bug, outcome)) in self.entries().enumerate() {
            match outcome.decision {
                FixDecision::Pending => summary.not_processed += 1,
                FixDecision::Applied => summary.applied += 1,
                FixDecision::Skipped => summary.skipped += 1,
                FixDecision::AppliedAndCommitted => summary.applied_and_committed += 1,
                FixDecision::Failed => summary.failed += 1,
            }

            if outcome.patch_attempted {
                summary.patches_attempted += 1;
            }

            if let Some(message) = &outcome.patch_error {
                summary.patch_failures.push(FailureNote::new(index, bug, message));
            }
            if let Some(message) = &outcome.commit_error {
                summary
                    .commit_failures
                    .push(FailureNote::new(index, bug, message));
            }
        }

        summary.commits_created = summary.applied_and_committed;
        summary
    }
}

/// A bug-scoped failure shown in the end-of-run summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureNote {
    /// One-based position in the report
    pub bug: usize,
    pub location: String,
    pub message: String,
}

impl FailureNote {
    fn new(index: usize, bug: &Bug, message: &str) -> Self {
        Self {
            bug: index + 1,
            location: bug.location(),
            message: message.to_string(),
        }
    }
}

/// Counts per outcome for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub applied: usize,
    pub skipped: usize,
    pub applied_and_committed: usize,
    pub failed: usize,

    /// Bugs left PENDING because the session was aborted
    pub not_processed: usize,

    pub patches_attempted: usize,
    pub commits_created: usize,
    pub aborted: bool,

    pub patch_failures: Vec<FailureNote>,
    pub commit_failures: Vec<FailureNote>,
}

impl RunSummary {
    /// Sum of every outcome bucket, PENDING included; always equals `total`
    #[must_use]
    pub const fn accounted(&self) -> usize {
        self.applied + self.skipped + self.applied_and_committed + self.failed + self.not_processed
    }

    /// Bugs that reached a terminal decision
    #[must_use]
    pub const fn processed(&self) -> usize {
        self.total - self.not_processed
    }
}
