use std::env;
use std::ffi::OsString;

pub(crate) const GIT_BIN_ENV: &str = "TFC_GIT_BIN";
pub(crate) const AIDER_BIN_ENV: &str = "TFC_AIDER_BIN";
pub(crate) const BUG_ANALYZER_BIN_ENV: &str = "TFC_BUG_ANALYZER_BIN";

/// External programs the adapters run; each can be overridden from the environment
#[derive(Debug, Clone)]
pub(crate) struct ToolConfig {
    pub(crate) git: OsString,
    pub(crate) aider: OsString,
    pub(crate) bug_analyzer: OsString,
}

impl ToolConfig {
    pub(crate) fn from_env() -> Self {
        Self {
            git: program(GIT_BIN_ENV, "git"),
            aider: program(AIDER_BIN_ENV, "aider"),
            bug_analyzer: program(BUG_ANALYZER_BIN_ENV, "bug-analyzer"),
        }
    }
}

fn program(var: &str, default: &str) -> OsString {
    match env::var_os(var) {
        Some(value) if !value.is_empty() => {
            log::debug!("Using {var}={}", value.to_string_lossy());
            value
        }
        _ => OsString::from(default),
    }
}
