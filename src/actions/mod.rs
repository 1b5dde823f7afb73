//! File actions module.
//!
//! This module carries out what a disposition decided:
//! - Optional backup of each removed file to a mirrored path
//! - Deletion, or a report of what would be deleted in dry-run
//! - Run-wide [`Counters`] for the end-of-run summary
//!
//! ```no_run
//! use dupesweep::actions::{mirrored_path, ResolveOptions};
//! use std::path::Path;
//!
//! let options = ResolveOptions::default().with_backup_root("/backup");
//! let copy = mirrored_path(Path::new("/backup"), Path::new("/data/a.txt"));
//! assert_eq!(copy, Path::new("/backup/data/a.txt"));
//! ```

pub mod resolve;

pub use resolve::{mirrored_path, Counters, ResolveError, ResolveOptions, Resolver};
