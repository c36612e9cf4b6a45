use serde::{Deserialize, Serialize};
use std::fmt;

/// How every bug in a session is decided; fixed for the whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixPolicy {
    /// Ask the operator per bug
    Interactive,
    AutoApply,
    AutoSkip,
    AutoCommit,
}

impl FixPolicy {
    /// The uniform action of a non-interactive policy
    #[must_use]
    pub const fn fixed_action(self) -> Option<FixAction> {
        match self {
            Self::Interactive => None,
            Self::AutoApply => Some(FixAction::Apply),
            Self::AutoSkip => Some(FixAction::Skip),
            Self::AutoCommit => Some(FixAction::ApplyAndCommit),
        }
    }

    #[must_use]
    pub const fn is_interactive(self) -> bool {
        matches!(self, Self::Interactive)
    }
}

impl fmt::Display for FixPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Interactive => "interactive",
            Self::AutoApply => "auto-apply",
            Self::AutoSkip => "auto-skip",
            Self::AutoCommit => "auto-commit",
        };
        f.write_str(name)
    }
}

/// What to do with one presented bug
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixAction {
    Apply,
    Skip,
    ApplyAndCommit,
}

impl FixAction {
    #[must_use]
    pub const fn needs_patch(self) -> bool {
        !matches!(self, Self::Skip)
    }
}

/// Answer from a decision prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    Decided(FixAction),
    /// Operator ended input; the session halts
    Abort,
}

/// Per-bug outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FixDecision {
    #[default]
    Pending,
    Applied,
    Skipped,
    AppliedAndCommitted,
    Failed,
}

impl FixDecision {
    /// Terminal decision for `action` given how the external calls went.
    ///
    /// `patched` is ignored for `Skip`; `committed` only matters for
    /// `ApplyAndCommit` after a successful patch.
    #[must_use]
    pub const fn resolve(action: FixAction, patched: bool, committed: bool) -> Self {
        match action {
            FixAction::Skip => Self::Skipped,
            FixAction::Apply if patched => Self::Applied,
            FixAction::ApplyAndCommit if patched && committed => Self::AppliedAndCommitted,
            FixAction::ApplyAndCommit if patched => Self::Applied,
            FixAction::Apply | FixAction::ApplyAndCommit => Self::Failed,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for FixDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "PENDING",
            Self::Applied => "APPLIED",
            Self::Skipped => "SKIPPED",
            Self::AppliedAndCommitted => "APPLIED_AND_COMMITTED",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}
