//! # TFC Code Chunker
//!
//! Directory-aware batching of source files for multi-file processors.
//!
//! ## Philosophy
//!
//! A chunk is the unit of work handed to a bug analyzer or patch tool, so
//! chunks should:
//! - Keep files from the same directory together
//! - Stay within a bounded size so a processor never sees too much at once
//! - Cover every input file exactly once
//! - Be reproducible for the same input
//!
//! ## Architecture
//!
//! ```text
//! Discovered files
//!     │
//!     ├──> Group by parent directory (sorted-path order)
//!     │
//!     ├──> Large directory (>= min_files)
//!     │    └─> Consecutive balanced slices of <= max_files
//!     │
//!     ├──> Small directory (< min_files)
//!     │    └─> Append to running buffer, flush once >= min_files
//!     │
//!     └──> Trailing buffer → final (possibly undersized) chunk
//! ```
//!
//! ## Example
//!
//! ```rust
//! use tfc_code_chunker::{Chunker, ChunkerConfig};
//!
//! let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
//!
//! let mut files: Vec<String> = (0..15).map(|i| format!("A/f{i}.py")).collect();
//! files.extend((0..8).map(|i| format!("B/f{i}.py")));
//!
//! let chunks = chunker.chunk(files);
//! assert_eq!(chunks.len(), 2);
//! assert_eq!(chunks[0].len(), 15);
//! assert_eq!(chunks[1].len(), 8);
//! ```

mod chunker;
mod config;
mod error;
mod types;

pub use chunker::{chunk, ChunkPlanStats, Chunker};
pub use config::{ChunkerConfig, DEFAULT_MAX_FILES, DEFAULT_MIN_FILES};
pub use error::{ChunkerError, Result};
pub use types::{Chunk, SourceFile};
