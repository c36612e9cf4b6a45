use std::path::PathBuf;
use thiserror::Error;

/// Result type for discovery operations
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Errors that can occur while discovering source files
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// Root does not exist or is not a directory
    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },
}

impl DiscoveryError {
    pub fn invalid_path(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
