use std::path::PathBuf;
use thiserror::Error;

/// Result type for report operations
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors that can occur while reading or writing bug reports
#[derive(Error, Debug)]
pub enum ReportError {
    /// No decoder accepted the content, or the accepting decoder could not parse it
    #[error("Report format error: {0}")]
    Format(String),

    /// A bug record lacks a required field
    #[error("Bug record #{index} is missing required field '{field}'")]
    MissingField { field: &'static str, index: usize },

    /// IO error while reading the report file
    #[error("Failed to read report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReportError {
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub const fn missing_field(field: &'static str, index: usize) -> Self {
        Self::MissingField { field, index }
    }
}
