use dupesweep::duplicates::{
    FingerprintEngine, ScanArtifact, ScanOptions, WorkerError, WorkerPool, WorkerStatus,
};
use dupesweep::progress::WorkerProgress;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::{tempdir, TempDir};

/// Eight files in four content pairs; with four workers each partition
/// holds exactly one pair.
fn pairs() -> (TempDir, Vec<PathBuf>) {
    let dir = tempdir().unwrap();
    let files = (0..8)
        .map(|i| {
            let path = dir.path().join(format!("f{i}"));
            fs::write(&path, format!("pair {}", i / 2)).unwrap();
            path
        })
        .collect();
    (dir, files)
}

#[derive(Default)]
struct Exits(Mutex<Vec<(usize, bool)>>);

impl WorkerProgress for Exits {
    fn on_worker_start(&self, _worker: usize, _total: usize) {}
    fn on_worker_status(&self, _worker: usize, _status: WorkerStatus) {}
    fn on_worker_exit(&self, worker: usize, ok: bool) {
        self.0.lock().unwrap().push((worker, ok));
    }
}

#[test]
fn test_lost_partition_does_not_stop_siblings() {
    let (_dir, files) = pairs();
    let pool = WorkerPool::new(4, ScanOptions::default());
    let engine = FingerprintEngine::new(ScanOptions::default());
    let exits = Exits::default();

    let outcome = pool.run_with(
        &files,
        |index, partition, _reporter| {
            if index == 1 {
                return Err(WorkerError::Failed {
                    worker: index,
                    reason: "result artifact missing".into(),
                });
            }
            let mut artifact = ScanArtifact::default();
            for path in partition {
                engine
                    .scan_file(path, &mut artifact)
                    .map_err(|e| WorkerError::Failed {
                        worker: index,
                        reason: e.to_string(),
                    })?;
            }
            Ok(artifact)
        },
        Some(&exits as &dyn WorkerProgress),
    );

    assert_eq!(outcome.worker_errors.len(), 1);
    assert_eq!(outcome.worker_errors[0].worker(), 1);
    assert!(outcome.errors.is_empty());

    let groups = outcome.groups();
    let expected: Vec<Vec<PathBuf>> = [0, 2, 3]
        .iter()
        .map(|p| files[p * 2..p * 2 + 2].to_vec())
        .collect();
    let actual: Vec<Vec<PathBuf>> = groups.iter().map(|g| g.paths().to_vec()).collect();
    assert_eq!(actual, expected);

    let mut exits = exits.0.into_inner().unwrap();
    exits.sort();
    assert_eq!(exits, vec![(0, true), (1, false), (2, true), (3, true)]);
}

#[test]
fn test_pool_matches_single_thread() {
    let (_dir, files) = pairs();
    let single = FingerprintEngine::new(ScanOptions::default()).scan(&files, None);
    let pooled = WorkerPool::new(3, ScanOptions::default()).run(&files, None);

    assert_eq!(pooled.artifact, single.artifact);
    assert!(pooled.worker_errors.is_empty());
}

#[test]
fn test_more_workers_than_files() {
    let (_dir, files) = pairs();
    let pool = WorkerPool::new(32, ScanOptions::default());

    assert_eq!(pool.partition(&files).len(), files.len());
    assert_eq!(pool.run(&files, None).groups().len(), 4);
}
