//! Fingerprint engine and the finder that dispatches it.
//!
//! # Overview
//!
//! [`FingerprintEngine`] turns a file list into a [`ScanArtifact`]: content
//! fingerprints (or exact file names in name mode) mapped to paths in scan
//! order. [`DuplicateFinder`] runs the engine directly for `threads <= 1`
//! and through a [`WorkerPool`] otherwise. Both paths produce the same
//! artifact for the same input.
//!
//! # Example
//!
//! ```no_run
//! use dupesweep::duplicates::{DuplicateFinder, FinderConfig, ScanOptions};
//! use dupesweep::scanner::collect_files;
//! use std::path::PathBuf;
//!
//! let (files, _) = collect_files(&[PathBuf::from(".")]);
//! let finder = DuplicateFinder::new(
//!     FinderConfig::default()
//!         .with_threads(4)
//!         .with_options(ScanOptions::default().with_skip_empty(true)),
//! );
//!
//! let outcome = finder.find(&files);
//! for group in outcome.groups() {
//!     println!("{}: {} copies", group.key(), group.len());
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::groups::{duplicate_groups, name_groups, DuplicateGroup, FingerprintMap, NameMap};
use super::workers::{WorkerError, WorkerPool};
use crate::progress::{ProgressCallback, WorkerProgress};
use crate::scanner::{HashError, Hasher};

/// Phase name reported to progress callbacks while fingerprinting.
pub const HASH_PHASE: &str = "hashing";

/// What makes two files duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareBy {
    /// Identical content fingerprint
    #[default]
    Content,
    /// Identical file name; content is never read
    Name,
}

/// Options shared by every fingerprint engine in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Grouping criterion
    pub compare: CompareBy,
    /// Hash only the first `chunk` bytes (0 = whole file)
    pub chunk: u64,
    /// Leave zero-length files out of the map
    pub skip_empty: bool,
    /// Show the current path in progress messages
    pub show_path: bool,
}

impl ScanOptions {
    /// Set the grouping criterion.
    #[must_use]
    pub fn with_compare(mut self, compare: CompareBy) -> Self {
        self.compare = compare;
        self
    }

    /// Set the prefix length for partial hashing.
    #[must_use]
    pub fn with_chunk(mut self, chunk: u64) -> Self {
        self.chunk = chunk;
        self
    }

    /// Skip zero-length files.
    #[must_use]
    pub fn with_skip_empty(mut self, skip: bool) -> Self {
        self.skip_empty = skip;
        self
    }

    /// Show the current path in progress messages.
    #[must_use]
    pub fn with_show_path(mut self, show: bool) -> Self {
        self.show_path = show;
        self
    }
}

/// Partial or aggregate result of a scan.
///
/// This is also the JSON interchange shape written by `--dump-map`:
/// `{"hashes": {<hex>: [paths]}, "names": {<name>: [paths]}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanArtifact {
    /// Content fingerprint → paths
    #[serde(default)]
    pub hashes: FingerprintMap,
    /// File name → paths (name mode only)
    #[serde(default)]
    pub names: NameMap,
}

impl ScanArtifact {
    /// Append another artifact's entries after this one's.
    pub fn merge(&mut self, other: Self) {
        self.hashes.merge(other.hashes);
        self.names.merge(other.names);
    }

    /// Number of recorded paths across both maps.
    #[must_use]
    pub fn path_count(&self) -> usize {
        self.hashes.path_count() + self.names.path_count()
    }

    /// Duplicate groups for the given criterion.
    #[must_use]
    pub fn groups(&self, compare: CompareBy) -> Vec<DuplicateGroup> {
        match compare {
            CompareBy::Content => duplicate_groups(&self.hashes),
            CompareBy::Name => name_groups(&self.names),
        }
    }

    /// Render as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parse an artifact from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a valid artifact.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Everything a scan produced, including recovered failures.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Aggregate fingerprint and name maps
    pub artifact: ScanArtifact,
    /// Files that could not be read; excluded from the maps
    pub errors: Vec<HashError>,
    /// Partitions whose results are missing from the maps
    pub worker_errors: Vec<WorkerError>,
    /// Zero-length files left out by `skip_empty`
    pub skipped_empty: usize,
    /// Criterion the maps were built with
    pub compare: CompareBy,
}

impl ScanOutcome {
    /// Duplicate groups in first-scan order.
    #[must_use]
    pub fn groups(&self) -> Vec<DuplicateGroup> {
        self.artifact.groups(self.compare)
    }

    /// Whether any file or worker failure was recovered from.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || !self.worker_errors.is_empty()
    }
}

/// Single-threaded fingerprint engine.
///
/// Each worker of a [`WorkerPool`] owns a private instance.
#[derive(Debug, Clone)]
pub struct FingerprintEngine {
    hasher: Hasher,
    options: ScanOptions,
}

impl FingerprintEngine {
    /// Create an engine for the given options.
    #[must_use]
    pub fn new(options: ScanOptions) -> Self {
        Self {
            hasher: Hasher::new().with_chunk(options.chunk),
            options,
        }
    }

    /// Options this engine was built with.
    #[must_use]
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Record one file in `artifact`.
    ///
    /// Returns `Ok(false)` when the file was left out as empty.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be inspected or read. The
    /// artifact is unchanged in that case.
    pub fn scan_file(&self, path: &Path, artifact: &mut ScanArtifact) -> Result<bool, HashError> {
        if self.options.skip_empty {
            let size = fs::metadata(path)
                .map_err(|e| HashError::from_io(path, e))?
                .len();
            if size == 0 {
                log::trace!("Skipping empty file {}", path.display());
                return Ok(false);
            }
        }

        match self.options.compare {
            CompareBy::Content => {
                let fingerprint = self.hasher.fingerprint(path)?;
                artifact.hashes.push(fingerprint, path.to_path_buf());
            }
            CompareBy::Name => {
                artifact.names.push(name_key(path), path.to_path_buf());
            }
        }
        Ok(true)
    }

    /// Scan `files` in order.
    ///
    /// Unreadable files are collected in [`ScanOutcome::errors`] and the
    /// scan continues with the next file.
    pub fn scan(&self, files: &[PathBuf], progress: Option<&dyn ProgressCallback>) -> ScanOutcome {
        let mut outcome = ScanOutcome {
            compare: self.options.compare,
            ..ScanOutcome::default()
        };

        if let Some(cb) = progress {
            cb.on_phase_start(HASH_PHASE, files.len());
        }

        for (i, path) in files.iter().enumerate() {
            match self.scan_file(path, &mut outcome.artifact) {
                Ok(true) => {}
                Ok(false) => outcome.skipped_empty += 1,
                Err(e) => {
                    log::debug!("Excluding unreadable file: {}", e);
                    outcome.errors.push(e);
                }
            }

            if let Some(cb) = progress {
                let shown = if self.options.show_path {
                    path.to_string_lossy()
                } else {
                    "".into()
                };
                cb.on_progress(i + 1, &shown);
            }
        }

        if let Some(cb) = progress {
            cb.on_phase_end(HASH_PHASE);
        }

        log::debug!(
            "Fingerprinted {} of {} files ({} failed, {} empty skipped)",
            outcome.artifact.path_count(),
            files.len(),
            outcome.errors.len(),
            outcome.skipped_empty
        );
        outcome
    }
}

fn name_key(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.to_string_lossy(), |n| n.to_string_lossy())
        .into_owned()
}

/// Configuration for the duplicate finder.
#[derive(Clone, Default)]
pub struct FinderConfig {
    /// Number of workers; 0 or 1 runs the engine directly.
    pub threads: usize,
    /// Engine options shared by all workers.
    pub options: ScanOptions,
    /// Progress callback for the single-threaded path.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
    /// Per-worker status display for the pooled path.
    pub worker_progress: Option<Arc<dyn WorkerProgress>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("threads", &self.threads)
            .field("options", &self.options)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .field(
                "worker_progress",
                &self.worker_progress.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl FinderConfig {
    /// Set the worker count.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the engine options.
    #[must_use]
    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Set the per-worker status display.
    #[must_use]
    pub fn with_worker_progress(mut self, progress: Arc<dyn WorkerProgress>) -> Self {
        self.worker_progress = Some(progress);
        self
    }
}

/// Runs the fingerprint engine over a file list.
#[derive(Debug, Default)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Configuration this finder runs with.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Fingerprint `files` and return the aggregate outcome.
    pub fn find(&self, files: &[PathBuf]) -> ScanOutcome {
        if self.config.threads <= 1 {
            log::info!("Fingerprinting {} files on one thread", files.len());
            let engine = FingerprintEngine::new(self.config.options.clone());
            return engine.scan(files, self.config.progress_callback.as_deref());
        }

        log::info!(
            "Fingerprinting {} files with up to {} workers",
            files.len(),
            self.config.threads
        );
        WorkerPool::new(self.config.threads, self.config.options.clone())
            .run(files, self.config.worker_progress.as_deref())
    }
}
