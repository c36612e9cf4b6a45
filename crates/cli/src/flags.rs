use clap::ValueEnum;
use tfc_bug_report::{Confidence, Severity};
use tfc_fix_workflow::FixPolicy;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub(crate) enum ThresholdFlag {
    Low,
    Medium,
    High,
}

impl ThresholdFlag {
    pub(crate) const fn as_severity(self) -> Severity {
        match self {
            ThresholdFlag::Low => Severity::Low,
            ThresholdFlag::Medium => Severity::Medium,
            ThresholdFlag::High => Severity::High,
        }
    }

    pub(crate) const fn as_confidence(self) -> Confidence {
        match self {
            ThresholdFlag::Low => Confidence::Low,
            ThresholdFlag::Medium => Confidence::Medium,
            ThresholdFlag::High => Confidence::High,
        }
    }
}

/// `find-bugs-and-fix` policy: any `--auto-*` flag implies non-interactive,
/// and `--no-interactive` on its own means auto-apply
pub(crate) const fn triage_policy(
    no_interactive: bool,
    auto_apply: bool,
    auto_skip: bool,
    auto_commit: bool,
) -> FixPolicy {
    if auto_commit {
        FixPolicy::AutoCommit
    } else if auto_skip {
        FixPolicy::AutoSkip
    } else if auto_apply || no_interactive {
        FixPolicy::AutoApply
    } else {
        FixPolicy::Interactive
    }
}

/// `fix-bugs` is always non-interactive
pub(crate) const fn batch_policy(auto_commit: bool) -> FixPolicy {
    if auto_commit {
        FixPolicy::AutoCommit
    } else {
        FixPolicy::AutoApply
    }
}
