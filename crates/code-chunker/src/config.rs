use serde::{Deserialize, Serialize};

use crate::error::{ChunkerError, Result};

/// Default lower bound of files per chunk
pub const DEFAULT_MIN_FILES: usize = 10;

/// Default upper bound of files per chunk
pub const DEFAULT_MAX_FILES: usize = 20;

/// Size bounds for file chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Minimum files per chunk (soft: a trailing chunk may fall below it)
    pub min_files: usize,

    /// Maximum files per chunk (hard limit)
    pub max_files: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            min_files: DEFAULT_MIN_FILES,
            max_files: DEFAULT_MAX_FILES,
        }
    }
}

impl ChunkerConfig {
    /// Create config with explicit bounds (validated on use)
    #[must_use]
    pub const fn new(min_files: usize, max_files: usize) -> Self {
        Self {
            min_files,
            max_files,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.min_files == 0 {
            return Err(ChunkerError::invalid_config("min_files must be > 0"));
        }

        if self.max_files == 0 {
            return Err(ChunkerError::invalid_config("max_files must be > 0"));
        }

        if self.min_files > self.max_files {
            return Err(ChunkerError::invalid_config(format!(
                "min_files ({}) cannot exceed max_files ({})",
                self.min_files, self.max_files
            )));
        }

        Ok(())
    }
}
