use crate::config::ChunkerConfig;
use crate::error::Result;
use crate::types::{Chunk, SourceFile};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;

/// Main chunker interface for batching discovered files
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a new chunker, rejecting invalid bounds
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Partition files into ordered, directory-local chunks.
    ///
    /// Directories are visited in sorted-path order. A directory holding at
    /// least `min_files` files is split into consecutive slices of at most
    /// `max_files`; smaller directories are pooled into a running buffer that
    /// is flushed once it reaches `min_files`. Whatever remains in the buffer
    /// after the last directory becomes the final (possibly undersized) chunk.
    pub fn chunk<I, F>(&self, files: I) -> Vec<Chunk>
    where
        I: IntoIterator<Item = F>,
        F: Into<SourceFile>,
    {
        let min = self.config.min_files;
        let max = self.config.max_files;

        let mut chunks = Vec::new();
        let mut pending: Vec<SourceFile> = Vec::new();

        for (dir, dir_files) in group_by_parent(files) {
            if dir_files.len() >= min {
                log::debug!(
                    "Directory '{}' has {} files, slicing into chunks of <= {}",
                    dir.display(),
                    dir_files.len(),
                    max
                );
                push_slices(&mut chunks, dir_files, max);
                continue;
            }

            pending.extend(dir_files);
            if pending.len() >= min {
                push_slices(&mut chunks, std::mem::take(&mut pending), max);
            }
        }

        if !pending.is_empty() {
            log::debug!(
                "Flushing {} leftover files as trailing chunk",
                pending.len()
            );
            chunks.extend(Chunk::from_files(pending));
        }

        chunks
    }

    /// Summarize a chunk plan for diagnostics
    #[must_use]
    pub fn get_stats(chunks: &[Chunk]) -> ChunkPlanStats {
        let mut size_distribution = BTreeMap::new();
        let mut merged_directories = BTreeSet::new();

        for chunk in chunks {
            *size_distribution.entry(chunk.len()).or_insert(0) += 1;
            if chunk.is_merged() {
                merged_directories.extend(chunk.directories().into_iter().map(PathBuf::from));
            }
        }

        ChunkPlanStats {
            total_chunks: chunks.len(),
            total_files: chunks.iter().map(Chunk::len).sum(),
            min_chunk_files: chunks.iter().map(Chunk::len).min().unwrap_or(0),
            max_chunk_files: chunks.iter().map(Chunk::len).max().unwrap_or(0),
            size_distribution,
            merged_directories,
        }
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            config: ChunkerConfig::default(),
        }
    }
}

/// Chunk `files` with explicit bounds
pub fn chunk<I, F>(files: I, min_files: usize, max_files: usize) -> Result<Vec<Chunk>>
where
    I: IntoIterator<Item = F>,
    F: Into<SourceFile>,
{
    let chunker = Chunker::new(ChunkerConfig::new(min_files, max_files))?;
    Ok(chunker.chunk(files))
}

/// Statistics about a chunk plan
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ChunkPlanStats {
    pub total_chunks: usize,
    pub total_files: usize,
    pub min_chunk_files: usize,
    pub max_chunk_files: usize,

    /// chunk size -> number of chunks with that size
    pub size_distribution: BTreeMap<usize, usize>,

    /// Directories whose files share a chunk with another directory
    pub merged_directories: BTreeSet<PathBuf>,
}

/// Group by parent directory in sorted-path order, keeping first occurrences only
fn group_by_parent<I, F>(files: I) -> BTreeMap<PathBuf, Vec<SourceFile>>
where
    I: IntoIterator<Item = F>,
    F: Into<SourceFile>,
{
    let mut seen = HashSet::new();
    let mut groups: BTreeMap<PathBuf, Vec<SourceFile>> = BTreeMap::new();

    for file in files {
        let file = file.into();
        if !seen.insert(file.path().to_path_buf()) {
            log::debug!("Ignoring duplicate file {}", file.path().display());
            continue;
        }
        groups
            .entry(file.parent().to_path_buf())
            .or_default()
            .push(file);
    }

    groups
}

/// Split into ceil(n / max) consecutive slices whose sizes differ by at most one
fn push_slices(chunks: &mut Vec<Chunk>, files: Vec<SourceFile>, max: usize) {
    let total = files.len();
    if total == 0 {
        return;
    }

    let pieces = total.div_ceil(max);
    let base = total / pieces;
    let extra = total % pieces;

    let mut iter = files.into_iter();
    for i in 0..pieces {
        let size = base + usize::from(i < extra);
        let slice: Vec<SourceFile> = iter.by_ref().take(size).collect();
        chunks.extend(Chunk::from_files(slice));
    }
}
