//! Source traversal producing the flat file list.
//!
//! Each source is walked with [`walkdir`], entries sorted by file name so
//! that the scan order (and with it the default "keep first" choice) is
//! stable between runs. Symbolic links are not followed. A source that is a
//! regular file is taken as-is.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::ScanError;

/// Collect every regular file below `sources`, in scan order.
///
/// Traversal errors do not stop the walk; they are returned alongside the
/// files that could be collected.
///
/// # Example
///
/// ```no_run
/// use dupesweep::scanner::collect_files;
/// use std::path::PathBuf;
///
/// let (files, errors) = collect_files(&[PathBuf::from("/data"), PathBuf::from("/backup")]);
/// println!("{} files, {} errors", files.len(), errors.len());
/// ```
#[must_use]
pub fn collect_files(sources: &[PathBuf]) -> (Vec<PathBuf>, Vec<ScanError>) {
    let mut files = Vec::new();
    let mut errors = Vec::new();

    for source in sources {
        log::debug!("Walking {}", source.display());
        let before = files.len();

        for entry in WalkDir::new(source).follow_links(false).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
                Ok(_) => {}
                Err(err) => errors.push(walk_error(source, err)),
            }
        }

        log::debug!(
            "Collected {} files from {}",
            files.len() - before,
            source.display()
        );
    }

    (files, errors)
}

fn walk_error(source: &Path, err: walkdir::Error) -> ScanError {
    let path = err.path().unwrap_or(source).to_path_buf();

    if err.loop_ancestor().is_some() {
        return ScanError::Loop(path);
    }

    match err.into_io_error() {
        Some(io) => ScanError::from_io(&path, io),
        None => ScanError::Loop(path),
    }
}
