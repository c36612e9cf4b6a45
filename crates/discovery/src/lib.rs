//! # TFC Discovery
//!
//! Finds candidate source files under a directory, skipping dependency
//! trees, tests, documentation, build output and hidden files. The walk
//! honors `.gitignore` and the result is sorted so downstream chunking is
//! reproducible.
//!
//! ```no_run
//! use tfc_discovery::FileScanner;
//!
//! let files = FileScanner::new("./src").discover().unwrap();
//! println!("{} source files", files.len());
//! ```

mod error;
mod scanner;

pub use error::{DiscoveryError, Result};
pub use scanner::{discover, FileScanner};
