//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`Progress`] struct, which implements both
//! [`ProgressCallback`] (one bar for a single-threaded scan) and
//! [`WorkerProgress`] (one line per hashing worker, refreshed in place).

use std::collections::HashMap;
use std::sync::Mutex;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::duplicates::WorkerStatus;

/// Progress callback for a scan phase.
///
/// Implement this trait to receive progress updates while files are
/// fingerprinted.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase (e.g., "hashing")
    /// * `total` - Total number of items to process
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based)
    /// * `path` - Path being processed, or empty when paths are not shown
    fn on_progress(&self, current: usize, path: &str);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Called to update the progress message.
    fn on_message(&self, _message: &str) {}
}

/// Per-worker status display for the worker pool.
pub trait WorkerProgress: Send + Sync {
    /// A worker was assigned `total` files.
    fn on_worker_start(&self, worker: usize, total: usize);

    /// A worker reported its status.
    fn on_worker_status(&self, worker: usize, status: WorkerStatus);

    /// A worker finished; `ok` is false when its partition was lost.
    fn on_worker_exit(&self, worker: usize, ok: bool);
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    phase: Mutex<Option<ProgressBar>>,
    workers: Mutex<HashMap<usize, ProgressBar>>,
    quiet: bool,
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("quiet", &self.quiet)
            .finish_non_exhaustive()
    }
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupesweep::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            phase: Mutex::new(None),
            workers: Mutex::new(HashMap::new()),
            quiet,
        }
    }

    fn phase_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn worker_style() -> ProgressStyle {
        ProgressStyle::with_template("{prefix:>10} [{bar:30.green/blue}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-")
    }

    fn with_phase(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.phase.lock() {
            if let Some(pb) = guard.as_ref() {
                f(pb);
            }
        }
    }

    fn with_worker(&self, worker: usize, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.workers.lock() {
            if let Some(pb) = guard.get(&worker) {
                f(pb);
            }
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let pb = self.multi.add(ProgressBar::new(total as u64));
        pb.set_style(Self::phase_style());
        pb.set_message(phase.to_string());
        if let Ok(mut slot) = self.phase.lock() {
            *slot = Some(pb);
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }

        self.with_phase(|pb| {
            pb.set_position(current as u64);
            if !path.is_empty() {
                pb.set_message(truncate_path(path, 40));
            }
        });
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        if let Ok(mut slot) = self.phase.lock() {
            if let Some(pb) = slot.take() {
                pb.finish_with_message(format!("{phase} complete"));
            }
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.with_phase(|pb| pb.set_message(message.to_string()));
    }
}

impl WorkerProgress for Progress {
    fn on_worker_start(&self, worker: usize, total: usize) {
        if self.quiet {
            return;
        }

        let pb = self.multi.add(ProgressBar::new(total as u64));
        pb.set_style(Self::worker_style());
        pb.set_prefix(format!("Thread {worker}"));
        pb.set_message(format!("{total}/{total}"));
        if let Ok(mut workers) = self.workers.lock() {
            workers.insert(worker, pb);
        }
    }

    fn on_worker_status(&self, worker: usize, status: WorkerStatus) {
        if self.quiet {
            return;
        }

        self.with_worker(worker, |pb| {
            pb.set_length(status.all as u64);
            pb.set_position(status.all.saturating_sub(status.left) as u64);
            pb.set_message(worker_line(status));
        });
    }

    fn on_worker_exit(&self, worker: usize, ok: bool) {
        if self.quiet {
            return;
        }

        let finished = self.workers.lock().ok().and_then(|mut w| w.remove(&worker));
        if let Some(pb) = finished {
            let outcome = if ok { "ok" } else { "failed" };
            pb.finish_with_message(format!("exited: {outcome}"));
        }
    }
}

/// Status line body for one worker: `all/left`.
fn worker_line(status: WorkerStatus) -> String {
    format!("{}/{}", status.all, status.left)
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let tail: String = file_name.chars().skip(name_len + 3 - max_len).collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
