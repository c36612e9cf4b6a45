//! # TFC Fix Workflow
//!
//! Drives a bug report through the triage loop, one bug at a time:
//!
//! ```text
//! ReportSource ──> acquire_report ──> BugReport
//!                                        │
//!                 FixPolicy ────────────>│
//!                                        ▼
//!   for each bug: PENDING ──> presented ──> FixAction
//!                                        │
//!        Skip ───────────────────────────┼──> SKIPPED
//!        Apply ──> PatchService ─────────┼──> APPLIED | FAILED
//!        ApplyAndCommit ──> PatchService ──> VersionControl::commit
//!                                        └──> APPLIED_AND_COMMITTED | APPLIED | FAILED
//! ```
//!
//! Patch and commit failures are bug-scoped: they are recorded on the
//! [`FixSession`] ledger and the loop moves on. Only report acquisition
//! errors are fatal. An aborted interactive prompt stops the session and
//! leaves the remaining bugs PENDING.

mod error;
mod policy;
mod prompt;
mod services;
mod session;
mod source;
mod workflow;

pub use error::{
    AnalyzerError, CommitError, FixError, PatchApplicationError, Result, VcsError,
};
pub use policy::{FixAction, FixDecision, FixPolicy, PromptOutcome};
pub use prompt::{parse_answer, DecisionPrompt, LinePrompt, PROMPT_QUESTION, PROMPT_RETRY_HINT};
pub use services::{AnalysisRequest, AnalysisTarget, BugAnalyzer, PatchService, VersionControl};
pub use session::{BugOutcome, FailureNote, FixSession, RunSummary};
pub use source::{acquire_report, ReportSource};
pub use workflow::{commit_message, FixWorkflow, SessionObserver, SilentObserver};
