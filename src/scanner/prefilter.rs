//! Size-based pre-filters applied before fingerprinting.
//!
//! Both filters only `stat` files. Metadata is read in parallel with rayon;
//! `collect` preserves input order, so scan order survives filtering.

use std::collections::HashMap;
use std::path::PathBuf;

use rayon::prelude::*;

use super::metadata::file_size;
use super::MetadataError;

/// Drop files smaller than `min_size` bytes.
///
/// Files whose size cannot be read are kept; the fingerprint step will
/// report them.
#[must_use]
pub fn filter_by_min_size(files: Vec<PathBuf>, min_size: u64) -> Vec<PathBuf> {
    if min_size == 0 {
        return files;
    }

    let before = files.len();
    let kept: Vec<PathBuf> = files
        .into_par_iter()
        .filter(|path| file_size(path).map_or(true, |size| size >= min_size))
        .collect();

    log::debug!(
        "Minimum size {} removed {} of {} files",
        min_size,
        before - kept.len(),
        before
    );
    kept
}

/// Keep only files whose size is shared by at least one other file.
///
/// Content duplicates must have equal sizes, so this removes files that
/// cannot have a duplicate without reading their content. Files whose size
/// cannot be read are dropped and returned as errors next to the kept list.
///
/// # Example
///
/// ```no_run
/// use dupesweep::scanner::keep_same_size;
/// use std::path::PathBuf;
///
/// let (candidates, errors) = keep_same_size(vec![PathBuf::from("a"), PathBuf::from("b")]);
/// for err in &errors {
///     eprintln!("{}", err);
/// }
/// if candidates.is_empty() {
///     println!("no files share a size");
/// }
/// ```
#[must_use]
pub fn keep_same_size(files: Vec<PathBuf>) -> (Vec<PathBuf>, Vec<MetadataError>) {
    let sized: Vec<(PathBuf, Result<u64, MetadataError>)> = files
        .into_par_iter()
        .map(|path| {
            let size = file_size(&path);
            (path, size)
        })
        .collect();

    let mut counts: HashMap<u64, usize> = HashMap::new();
    for size in sized.iter().filter_map(|(_, size)| size.as_ref().ok()) {
        *counts.entry(*size).or_default() += 1;
    }

    let mut kept = Vec::new();
    let mut errors = Vec::new();
    for (path, size) in sized {
        match size {
            Ok(size) if counts.get(&size).copied().unwrap_or(0) > 1 => kept.push(path),
            Ok(_) => {}
            Err(e) => {
                log::debug!("Size unavailable for {}: {}", path.display(), e);
                errors.push(e);
            }
        }
    }
    (kept, errors)
}
