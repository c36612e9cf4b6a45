use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A discovered source file keyed by its immediate parent directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SourceFile {
    /// File path as produced by discovery
    path: PathBuf,

    /// Immediate parent directory (empty for bare file names)
    parent: PathBuf,
}

impl SourceFile {
    /// Create a source file, deriving the parent-directory key from the path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self { path, parent }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn parent(&self) -> &Path {
        &self.parent
    }
}

impl From<PathBuf> for SourceFile {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl From<String> for SourceFile {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl From<&str> for SourceFile {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// An ordered, non-empty batch of source files handed to a multi-file processor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    files: Vec<SourceFile>,

    /// Dominant directory, used for diagnostics and batch labels
    label: String,
}

impl Chunk {
    /// Build a chunk; returns `None` for an empty file list
    pub(crate) fn from_files(files: Vec<SourceFile>) -> Option<Self> {
        let label = dominant_directory(&files)?;
        Some(Self { files, label })
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Always false: chunks are never empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Distinct parent directories in this chunk, sorted
    #[must_use]
    pub fn directories(&self) -> Vec<&Path> {
        let mut dirs: Vec<&Path> = self.files.iter().map(SourceFile::parent).collect();
        dirs.sort();
        dirs.dedup();
        dirs
    }

    /// Whether files from more than one directory were merged into this chunk
    #[must_use]
    pub fn is_merged(&self) -> bool {
        self.directories().len() > 1
    }

    /// File paths, in chunk order
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(SourceFile::path)
    }
}

/// Directory contributing the most files; ties go to the first in sorted order
fn dominant_directory(files: &[SourceFile]) -> Option<String> {
    let mut counts: BTreeMap<&Path, usize> = BTreeMap::new();
    for file in files {
        *counts.entry(file.parent()).or_insert(0) += 1;
    }

    let mut best: Option<(&Path, usize)> = None;
    for (dir, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((dir, count));
        }
    }

    best.map(|(dir, _)| display_dir(dir))
}

fn display_dir(dir: &Path) -> String {
    if dir.as_os_str().is_empty() {
        ".".to_string()
    } else {
        dir.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_file_parent_key() {
        let file = SourceFile::new("src/app/main.rs");
        assert_eq!(file.parent(), Path::new("src/app"));

        let bare = SourceFile::new("main.rs");
        assert_eq!(bare.parent(), Path::new(""));
    }

    #[test]
    fn test_empty_chunk_is_rejected() {
        assert!(Chunk::from_files(Vec::new()).is_none());
    }

    #[test]
    fn test_label_is_dominant_directory() {
        let chunk = Chunk::from_files(vec![
            SourceFile::new("a/1.rs"),
            SourceFile::new("b/1.rs"),
            SourceFile::new("b/2.rs"),
        ])
        .unwrap();
        assert_eq!(chunk.label(), "b");
        assert!(chunk.is_merged());
        assert_eq!(chunk.directories(), vec![Path::new("a"), Path::new("b")]);
    }

    #[test]
    fn test_label_tie_prefers_sorted_first() {
        let chunk = Chunk::from_files(vec![SourceFile::new("z/1.rs"), SourceFile::new("m/1.rs")])
            .unwrap();
        assert_eq!(chunk.label(), "m");
    }

    #[test]
    fn test_root_level_label() {
        let chunk = Chunk::from_files(vec![SourceFile::new("main.rs")]).unwrap();
        assert_eq!(chunk.label(), ".");
        assert!(!chunk.is_merged());
    }
}
