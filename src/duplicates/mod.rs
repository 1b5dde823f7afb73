//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Fingerprinting a file list into an ordered fingerprint map
//! - Spreading that work over a fixed pool of worker threads
//! - Reducing the map to groups of two or more distinct paths
//!
//! Path order is scan order everywhere: within a group the first path is the
//! first one scanned, and groups appear in the order their first member was
//! scanned, whatever the number of workers.

pub mod finder;
pub mod groups;
pub mod workers;

pub use finder::{
    CompareBy, DuplicateFinder, FingerprintEngine, FinderConfig, ScanArtifact, ScanOptions,
    ScanOutcome, HASH_PHASE,
};
pub use groups::{
    duplicate_groups, name_groups, DuplicateGroup, FingerprintMap, GroupKey, NameMap,
    OrderedGroups,
};
pub use workers::{
    StatusMessage, StatusReporter, WorkerError, WorkerEvent, WorkerPool, WorkerStatus,
};
