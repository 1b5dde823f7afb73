//! Partitioned fingerprinting on a fixed pool of worker threads.
//!
//! # Overview
//!
//! The file list is cut into contiguous partitions of `ceil(len / threads)`
//! files. Each partition runs on its own named thread with a private
//! [`FingerprintEngine`]; workers share no mutable state with the
//! orchestrator. A worker's partial [`ScanArtifact`] is its thread return
//! value. Status updates and per-file errors travel over a
//! `crossbeam-channel` as [`WorkerEvent`]s.
//!
//! The orchestrator drains the channel until every worker has dropped its
//! sender, then joins workers in partition order and merges their artifacts
//! in that order. The aggregate is therefore identical to a single-threaded
//! scan of the whole list. A worker that fails or panics costs only its own
//! partition, recorded as a [`WorkerError`].

use std::any::Any;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Sender};
use serde::{Deserialize, Serialize};

use super::finder::{FingerprintEngine, ScanArtifact, ScanOptions, ScanOutcome};
use crate::progress::{ProgressCallback, WorkerProgress};
use crate::scanner::HashError;

/// Minimum delay between two status events from the same worker.
const STATUS_INTERVAL: Duration = Duration::from_millis(100);

/// Progress of one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStatus {
    /// Files in the partition
    pub all: usize,
    /// Files not yet processed
    pub left: usize,
}

/// Wire shape of a status update: `{"status": {"all": N, "left": M}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    /// Reported progress
    pub status: WorkerStatus,
}

/// Message from a worker to the orchestrator.
#[derive(Debug)]
pub enum WorkerEvent {
    /// Periodic progress update
    Status {
        /// Partition index
        worker: usize,
        /// Current progress
        status: WorkerStatus,
    },
    /// A file in the partition could not be fingerprinted
    FileError {
        /// Partition index
        worker: usize,
        /// The failure
        error: HashError,
    },
}

/// A partition whose results are missing from the aggregate.
#[derive(thiserror::Error, Debug)]
pub enum WorkerError {
    /// The worker finished without producing a result.
    #[error("Worker {worker} failed: {reason}")]
    Failed {
        /// Partition index
        worker: usize,
        /// Failure description
        reason: String,
    },

    /// The worker thread panicked.
    #[error("Worker {worker} panicked: {message}")]
    Panicked {
        /// Partition index
        worker: usize,
        /// Panic payload, if it was a string
        message: String,
    },

    /// The worker thread could not be started.
    #[error("Worker {worker} could not be started: {source}")]
    Spawn {
        /// Partition index
        worker: usize,
        /// The underlying OS error
        #[source]
        source: io::Error,
    },
}

impl WorkerError {
    /// Partition index of the failed worker.
    #[must_use]
    pub fn worker(&self) -> usize {
        match self {
            Self::Failed { worker, .. }
            | Self::Panicked { worker, .. }
            | Self::Spawn { worker, .. } => *worker,
        }
    }
}

/// Worker-side end of the status channel.
///
/// Implements [`ProgressCallback`] so the fingerprint engine can drive it
/// directly. Status events are throttled; the first and last update of a
/// partition are always sent.
#[derive(Debug)]
pub struct StatusReporter {
    worker: usize,
    sender: Sender<WorkerEvent>,
    total: Mutex<usize>,
    last_sent: Mutex<Option<Instant>>,
}

impl StatusReporter {
    fn new(worker: usize, sender: Sender<WorkerEvent>) -> Self {
        Self {
            worker,
            sender,
            total: Mutex::new(0),
            last_sent: Mutex::new(None),
        }
    }

    /// Partition index this reporter belongs to.
    #[must_use]
    pub fn worker(&self) -> usize {
        self.worker
    }

    /// Send a progress update, bypassing throttling.
    pub fn status(&self, status: WorkerStatus) {
        self.send(WorkerEvent::Status {
            worker: self.worker,
            status,
        });
    }

    /// Report a file that could not be fingerprinted.
    pub fn file_error(&self, error: HashError) {
        self.send(WorkerEvent::FileError {
            worker: self.worker,
            error,
        });
    }

    fn send(&self, event: WorkerEvent) {
        // The receiver outlives every worker; a send can only fail if the
        // orchestrator itself is gone.
        if self.sender.send(event).is_err() {
            log::trace!("Worker {} status channel closed", self.worker);
        }
    }

    fn due(&self, done: usize, all: usize) -> bool {
        let Ok(mut last) = self.last_sent.lock() else {
            return true;
        };
        let now = Instant::now();
        let due =
            done == all || last.map_or(true, |t| now.duration_since(t) >= STATUS_INTERVAL);
        if due {
            *last = Some(now);
        }
        due
    }
}

impl ProgressCallback for StatusReporter {
    fn on_phase_start(&self, _phase: &str, total: usize) {
        if let Ok(mut t) = self.total.lock() {
            *t = total;
        }
        self.due(0, total);
        self.status(WorkerStatus {
            all: total,
            left: total,
        });
    }

    fn on_progress(&self, current: usize, _path: &str) {
        let all = self.total.lock().map_or(0, |t| *t);
        if self.due(current, all) {
            self.status(WorkerStatus {
                all,
                left: all.saturating_sub(current),
            });
        }
    }

    fn on_phase_end(&self, _phase: &str) {}
}

/// Fixed-size pool of fingerprinting workers.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    threads: usize,
    options: ScanOptions,
}

impl WorkerPool {
    /// Create a pool of at most `threads` workers (minimum 1).
    #[must_use]
    pub fn new(threads: usize, options: ScanOptions) -> Self {
        Self {
            threads: threads.max(1),
            options,
        }
    }

    /// Split `files` into contiguous partitions of `ceil(len / threads)`.
    ///
    /// The last partition may be smaller; fewer than `threads` partitions
    /// are produced when the list is short, none when it is empty.
    #[must_use]
    pub fn partition<'a>(&self, files: &'a [PathBuf]) -> Vec<&'a [PathBuf]> {
        if files.is_empty() {
            return Vec::new();
        }
        files.chunks(files.len().div_ceil(self.threads)).collect()
    }

    /// Fingerprint `files` with one [`FingerprintEngine`] per partition.
    pub fn run(&self, files: &[PathBuf], progress: Option<&dyn WorkerProgress>) -> ScanOutcome {
        let options = &self.options;
        self.run_with(
            files,
            |_, partition, reporter| {
                let engine = FingerprintEngine::new(options.clone());
                let outcome = engine.scan(partition, Some(reporter));
                for error in outcome.errors {
                    reporter.file_error(error);
                }
                Ok(outcome.artifact)
            },
            progress,
        )
    }

    /// Run a custom worker function over each partition.
    ///
    /// `worker` receives the partition index, its files, and the reporter
    /// for its status channel. Any `Err` or panic becomes a
    /// [`WorkerError`] for that partition.
    pub fn run_with<F>(
        &self,
        files: &[PathBuf],
        worker: F,
        progress: Option<&dyn WorkerProgress>,
    ) -> ScanOutcome
    where
        F: Fn(usize, &[PathBuf], &StatusReporter) -> Result<ScanArtifact, WorkerError> + Sync,
    {
        let partitions = self.partition(files);
        let mut outcome = ScanOutcome {
            compare: self.options.compare,
            ..ScanOutcome::default()
        };

        log::debug!(
            "Split {} files into {} partitions",
            files.len(),
            partitions.len()
        );

        let (sender, receiver) = unbounded();
        let worker = &worker;

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(partitions.len());

            for (index, &partition) in partitions.iter().enumerate() {
                if let Some(p) = progress {
                    p.on_worker_start(index, partition.len());
                }

                let reporter = StatusReporter::new(index, sender.clone());
                let spawned = thread::Builder::new()
                    .name(format!("hash-worker-{index}"))
                    .spawn_scoped(scope, move || worker(index, partition, &reporter));

                match spawned {
                    Ok(handle) => handles.push((index, handle)),
                    Err(source) => {
                        outcome.worker_errors.push(WorkerError::Spawn {
                            worker: index,
                            source,
                        });
                        if let Some(p) = progress {
                            p.on_worker_exit(index, false);
                        }
                    }
                }
            }
            drop(sender);

            for event in receiver.iter() {
                match event {
                    WorkerEvent::Status { worker, status } => {
                        log::trace!("Worker {}: {}", worker, status_line(status));
                        if let Some(p) = progress {
                            p.on_worker_status(worker, status);
                        }
                    }
                    WorkerEvent::FileError { worker, error } => {
                        log::error!("Worker {}: {}", worker, error);
                        outcome.errors.push(error);
                    }
                }
            }

            for (index, handle) in handles {
                let result = match handle.join() {
                    Ok(result) => result,
                    Err(payload) => Err(WorkerError::Panicked {
                        worker: index,
                        message: panic_message(payload.as_ref()),
                    }),
                };

                let ok = match result {
                    Ok(artifact) => {
                        outcome.artifact.merge(artifact);
                        true
                    }
                    Err(e) => {
                        log::error!("{}", e);
                        outcome.worker_errors.push(e);
                        false
                    }
                };
                if let Some(p) = progress {
                    p.on_worker_exit(index, ok);
                }
            }
        });

        outcome
    }
}

fn status_line(status: WorkerStatus) -> String {
    serde_json::to_string(&StatusMessage { status })
        .unwrap_or_else(|_| format!("{}/{}", status.all, status.left))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
