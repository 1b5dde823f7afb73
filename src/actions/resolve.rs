//! Applying a classification to the filesystem.
//!
//! # Overview
//!
//! For every path in [`Classification::removed`], in order:
//! 1. capture its size, before anything is touched;
//! 2. with a backup root, copy it to the mirrored location
//!    (`/bk` + `/data/a.txt` → `/bk/data/a.txt`), creating directories and
//!    overwriting an existing copy;
//! 3. unless dry-run, delete the original.
//!
//! A failed copy is reported and deletion still proceeds. A failed delete
//! is reported and does not count. Kept paths are reported, never touched.
//!
//! # Example
//!
//! ```no_run
//! use dupesweep::actions::{Counters, ResolveOptions, Resolver};
//! use dupesweep::policy::Classification;
//! use dupesweep::report::ConsoleReporter;
//! use std::path::PathBuf;
//!
//! let classification = Classification {
//!     kept: vec![PathBuf::from("/data/a.txt")],
//!     removed: vec![PathBuf::from("/data/b.txt")],
//!     issues: Vec::new(),
//! };
//!
//! let reporter = ConsoleReporter::new(true, false);
//! let resolver = Resolver::new(ResolveOptions::default().with_dry_run(true));
//! let mut counters = Counters::default();
//! resolver.apply(&classification, &reporter, &mut counters);
//! ```

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::policy::Classification;
use crate::report::Reporter;

/// A file-level failure while resolving a group.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The file vanished before its size could be read.
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied on the file or its directory.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The backup copy could not be written.
    #[error("backup of {path} to {destination} failed: {source}")]
    Backup {
        /// File being backed up
        path: PathBuf,
        /// Mirrored destination
        destination: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl ResolveError {
    fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

/// Run-wide totals. Only ever increase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    /// Groups processed
    pub duplicate_groups: u64,
    /// Paths across all processed groups
    pub duplicate_files: u64,
    /// Bytes across all processed groups
    pub duplicate_bytes: u64,
    /// Files removed (or that would be, in dry-run)
    pub deleted_files: u64,
    /// Bytes removed (or that would be, in dry-run)
    pub deleted_bytes: u64,
    /// Successful backup copies
    pub backed_up_files: u64,
}

/// How removals are carried out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Mirror removed files under this directory first
    pub backup_root: Option<PathBuf>,
    /// Report removals without deleting
    pub dry_run: bool,
}

impl ResolveOptions {
    /// Set the backup root.
    #[must_use]
    pub fn with_backup_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.backup_root = Some(root.into());
        self
    }

    /// Enable or disable dry-run.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Destination of `path` under `root`: `root` joined with the normal
/// components of `path`. Root, prefix, `.` and `..` components are dropped so
/// the copy never lands outside `root`.
#[must_use]
pub fn mirrored_path(root: &Path, path: &Path) -> PathBuf {
    let relative: PathBuf = path
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();
    root.join(relative)
}

/// Executes classifications.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    options: ResolveOptions,
}

impl Resolver {
    /// Create a resolver.
    #[must_use]
    pub fn new(options: ResolveOptions) -> Self {
        Self { options }
    }

    /// Options this resolver runs with.
    #[must_use]
    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Apply `classification`, reporting each step and updating `counters`.
    ///
    /// Returns the file-level failures; none of them stop the remaining
    /// removals.
    pub fn apply(
        &self,
        classification: &Classification,
        reporter: &dyn Reporter,
        counters: &mut Counters,
    ) -> Vec<ResolveError> {
        let mut failures = Vec::new();

        for issue in &classification.issues {
            reporter.error(&issue.to_string());
        }

        for path in &classification.kept {
            reporter.ok(&format!("Keep: {}", path.display()));
        }

        for path in &classification.removed {
            if let Err(e) = self.remove_one(path, reporter, counters, &mut failures) {
                reporter.error(&e.to_string());
                failures.push(e);
            }
        }

        failures
    }

    fn remove_one(
        &self,
        path: &Path,
        reporter: &dyn Reporter,
        counters: &mut Counters,
        failures: &mut Vec<ResolveError>,
    ) -> Result<(), ResolveError> {
        let size = fs::symlink_metadata(path)
            .map_err(|e| ResolveError::from_io(path, e))?
            .len();

        if let Some(root) = &self.options.backup_root {
            match backup(root, path) {
                Ok(destination) => {
                    counters.backed_up_files += 1;
                    reporter.ok(&format!(
                        "Copy: {} to {}",
                        path.display(),
                        destination.display()
                    ));
                }
                Err(e) => {
                    reporter.error(&e.to_string());
                    failures.push(e);
                }
            }
        }

        if self.options.dry_run {
            reporter.ok(&format!("Would remove: {}", path.display()));
        } else {
            fs::remove_file(path).map_err(|e| ResolveError::from_io(path, e))?;
            reporter.ok(&format!("Removed: {}", path.display()));
        }

        counters.deleted_files += 1;
        counters.deleted_bytes += size;
        Ok(())
    }
}

fn backup(root: &Path, path: &Path) -> Result<PathBuf, ResolveError> {
    let destination = mirrored_path(root, path);
    let wrap = |source| ResolveError::Backup {
        path: path.to_path_buf(),
        destination: destination.clone(),
        source,
    };

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(wrap)?;
    }
    fs::copy(path, &destination).map_err(wrap)?;
    log::debug!("Backed up {} to {}", path.display(), destination.display());
    Ok(destination)
}
