//! Scanner module for file collection, metadata and fingerprinting.
//!
//! This module provides functionality for:
//! - Collecting a flat, ordered file list from source paths
//! - Size-based pre-filtering before any content is read
//! - Content fingerprinting with BLAKE3 (full file or fixed-length prefix)
//! - Reading the metadata policy predicates are evaluated against
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Source traversal and file discovery
//! - [`prefilter`]: Minimum-size and same-size filters
//! - [`hasher`]: BLAKE3 file fingerprints (streaming)
//! - [`metadata`]: Timestamps, permission bits, owner and group
//!
//! # Example
//!
//! ```no_run
//! use dupesweep::scanner::{collect_files, Hasher};
//! use std::path::PathBuf;
//!
//! let (files, errors) = collect_files(&[PathBuf::from(".")]);
//! for err in errors {
//!     eprintln!("Warning: {}", err);
//! }
//!
//! let hasher = Hasher::new();
//! for file in &files {
//!     match hasher.fingerprint(file) {
//!         Ok(fp) => println!("{}  {}", fp, file.display()),
//!         Err(e) => eprintln!("{}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod metadata;
pub mod prefilter;
pub mod walker;

use std::io;
use std::path::{Path, PathBuf};

// Re-export main types
pub use hasher::{Fingerprint, Hasher, BUFFER_SIZE};
pub use metadata::{file_size, FileMeta, FsMetadata, MetadataAccessor};
pub use prefilter::{filter_by_min_size, keep_same_size};
pub use walker::collect_files;

/// Errors that can occur while collecting the file list.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// A symlink loop was detected during traversal.
    #[error("Filesystem loop detected at {0}")]
    Loop(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    pub(crate) fn from_io(path: &Path, err: io::Error) -> Self {
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

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl HashError {
    pub(crate) fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// Path of the file that could not be hashed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Io { path: p, .. } => p,
        }
    }
}

/// Errors that can occur while reading file metadata.
#[derive(thiserror::Error, Debug)]
pub enum MetadataError {
    /// The file disappeared before its metadata could be read.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the metadata.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Any other I/O failure.
    #[error("Cannot read metadata of {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl MetadataError {
    pub(crate) fn from_io(path: &Path, err: io::Error) -> Self {
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
