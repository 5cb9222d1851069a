//! Caller-owned cache of prepared pipeline output
//!
//! Entries are keyed by directory and validated against a
//! [`DirectoryFingerprint`] of the files the loader would read. There is no
//! process-wide state: whoever owns the [`PreparedCache`] decides its lifetime
//! and when to invalidate.

use crate::error::Result;
use crate::loader::RecordLoader;
use crate::pipeline::{OwnershipPipeline, PreparedData};
use hashbrown::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Size and modification time of one input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStamp {
    pub name: String,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

/// Identity of a directory's input files
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectoryFingerprint {
    files: Vec<FileStamp>,
}

impl DirectoryFingerprint {
    /// Stamp every file `loader` would discover in `dir` (metadata only)
    pub fn compute(dir: &Path, loader: &RecordLoader) -> Result<Self> {
        let mut files = Vec::new();
        for path in loader.discover(dir)? {
            let meta = fs::metadata(&path)?;
            files.push(FileStamp {
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                len: meta.len(),
                modified: meta.modified().ok(),
            });
        }
        Ok(Self { files })
    }

    pub fn files(&self) -> &[FileStamp] {
        &self.files
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    fingerprint: DirectoryFingerprint,
    data: Arc<PreparedData>,
}

/// Memoizes [`OwnershipPipeline::run`] per directory
///
/// The cache owns the pipeline it memoizes, so every entry was produced by
/// the same loader, normalizer and labeler. Use one cache per configuration.
#[derive(Debug, Default)]
pub struct PreparedCache {
    pipeline: OwnershipPipeline,
    entries: HashMap<PathBuf, CacheEntry>,
}

impl PreparedCache {
    pub fn new(pipeline: OwnershipPipeline) -> Self {
        Self {
            pipeline,
            entries: HashMap::new(),
        }
    }

    pub fn pipeline(&self) -> &OwnershipPipeline {
        &self.pipeline
    }

    /// Cached output for `dir`, re-running the pipeline if its files changed
    pub fn get_or_prepare(&mut self, dir: &Path) -> Result<Arc<PreparedData>> {
        let fingerprint = DirectoryFingerprint::compute(dir, self.pipeline.loader())?;

        if let Some(entry) = self.entries.get(dir) {
            if entry.fingerprint == fingerprint {
                log::debug!("Cache hit for {}", dir.display());
                return Ok(Arc::clone(&entry.data));
            }
            log::debug!("Input files changed in {}, re-running pipeline", dir.display());
        }

        let data = Arc::new(self.pipeline.run(dir)?);
        self.entries.insert(
            dir.to_path_buf(),
            CacheEntry {
                fingerprint,
                data: Arc::clone(&data),
            },
        );
        Ok(data)
    }

    /// Drop the entry for `dir`; returns whether one existed
    pub fn invalidate(&mut self, dir: &Path) -> bool {
        self.entries.remove(dir).is_some()
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.entries.contains_key(dir)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
