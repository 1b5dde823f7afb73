use clap::Parser;
use dupesweep::cli::Cli;
use dupesweep::config::{DispositionMode, RunConfig, Settings};
use dupesweep::error::ExitCode;
use dupesweep::duplicates::WorkerStatus;
use dupesweep::progress::{ProgressCallback, WorkerProgress};
use dupesweep::report::{MemoryReporter, Severity};
use dupesweep::strategy::{ChoicePresenter, InteractiveStrategy, ListStrategy};
use dupesweep::{build_strategy, execute, execute_with_progress, run_app, NO_SAME_SIZE};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

fn write(root: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn config(args: &[&str]) -> RunConfig {
    let mut argv = vec!["dupesweep"];
    argv.extend_from_slice(args);
    RunConfig::from_cli(&Cli::try_parse_from(argv).unwrap(), &Settings::default()).unwrap()
}

/// Always removes the last listed copy.
struct RemoveLast;

impl ChoicePresenter for RemoveLast {
    fn choose(&mut self, _prompt: &str, labels: &[String]) -> io::Result<Vec<usize>> {
        Ok(vec![labels.len() - 1])
    }
}

/// Records every progress event it receives.
#[derive(Default)]
struct Recorded {
    phases: Mutex<Vec<(String, usize)>>,
    paths: Mutex<Vec<String>>,
    statuses: Mutex<Vec<(usize, WorkerStatus)>>,
    exits: Mutex<Vec<(usize, bool)>>,
}

impl ProgressCallback for Recorded {
    fn on_phase_start(&self, phase: &str, total: usize) {
        self.phases.lock().unwrap().push((phase.to_string(), total));
    }
    fn on_progress(&self, _current: usize, path: &str) {
        self.paths.lock().unwrap().push(path.to_string());
    }
    fn on_phase_end(&self, _phase: &str) {}
}

impl WorkerProgress for Recorded {
    fn on_worker_start(&self, _worker: usize, _total: usize) {}
    fn on_worker_status(&self, worker: usize, status: WorkerStatus) {
        self.statuses.lock().unwrap().push((worker, status));
    }
    fn on_worker_exit(&self, worker: usize, ok: bool) {
        self.exits.lock().unwrap().push((worker, ok));
    }
}

fn run_recorded(config: &RunConfig) -> (ExitCode, Arc<Recorded>) {
    let recorded = Arc::new(Recorded::default());
    let mut strategy = ListStrategy::new(Vec::new(), true);
    let code = execute_with_progress(
        config,
        &mut strategy,
        &MemoryReporter::new(),
        recorded.clone(),
        recorded.clone(),
    )
    .unwrap();
    (code, recorded)
}

#[test]
fn test_worker_status_is_reported_by_default() {
    let dir = tempdir().unwrap();
    for name in ["a", "b", "c", "d"] {
        write(dir.path(), name, b"same");
    }

    let config = config(&["-t", "2", dir.path().to_str().unwrap()]);
    assert!(!config.progress_info);
    let (code, recorded) = run_recorded(&config);

    assert_eq!(code, ExitCode::Success);
    let statuses = recorded.statuses.lock().unwrap();
    for worker in [0, 1] {
        assert!(statuses.iter().any(|(w, s)| *w == worker && s.all == 2));
        assert!(statuses.iter().any(|(w, s)| *w == worker && s.left == 0));
    }
    assert_eq!(*recorded.exits.lock().unwrap(), vec![(0, true), (1, true)]);
}

#[test]
fn test_progress_info_only_adds_file_names() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"same");
    write(dir.path(), "b", b"same");
    let root = dir.path().to_str().unwrap();

    let (_, plain) = run_recorded(&config(&[root]));
    assert_eq!(plain.phases.lock().unwrap().len(), 1);
    assert!(plain.paths.lock().unwrap().iter().all(String::is_empty));

    let (_, named) = run_recorded(&config(&["-p", root]));
    let paths = named.paths.lock().unwrap();
    assert_eq!(paths.len(), 2);
    assert!(paths[0].ends_with('a'));
}

#[test]
fn test_auto_delete_run() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.txt", b"X");
    let b = write(dir.path(), "b.txt", b"X");
    write(dir.path(), "c.txt", b"Y");

    let root = dir.path().to_str().unwrap();
    let config = config(&["-d", "-t", "2", root]);
    let mut strategy = build_strategy(&config).unwrap();
    let reporter = MemoryReporter::new();

    let code = execute(&config, strategy.as_mut(), &reporter).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(a.exists());
    assert!(!b.exists());

    let info = reporter.with_severity(Severity::Info);
    assert!(info.contains(&"Duplicate groups: 1".to_string()));
    assert!(info.iter().any(|l| l.starts_with("Removed files: 1")));
}

#[test]
fn test_dry_run_and_dump_map() {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let a = write(dir.path(), "a.txt", b"X");
    let b = write(dir.path(), "b.txt", b"X");
    let map = out.path().join("map.json");

    let config = config(&[
        "-d",
        "-T",
        "--dump-map",
        map.to_str().unwrap(),
        dir.path().to_str().unwrap(),
    ]);
    let mut strategy = build_strategy(&config).unwrap();
    let reporter = MemoryReporter::new();

    assert_eq!(
        execute(&config, strategy.as_mut(), &reporter).unwrap(),
        ExitCode::Success
    );
    assert!(a.exists() && b.exists());

    let dumped: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&map).unwrap()).unwrap();
    assert_eq!(dumped["hashes"].as_object().unwrap().len(), 1);
    assert!(reporter
        .with_severity(Severity::Info)
        .iter()
        .any(|l| l.starts_with("Would be removed files: 1")));
}

#[test]
fn test_no_duplicates_exit_code() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"1");
    write(dir.path(), "b", b"2");

    let config = config(&["-l", dir.path().to_str().unwrap()]);
    assert_eq!(config.mode(), DispositionMode::ListOnly);
    let mut strategy = ListStrategy::new(Vec::new(), false);

    let code = execute(&config, &mut strategy, &MemoryReporter::new()).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
    assert!(strategy.into_inner().is_empty());
}

#[test]
fn test_size_check_without_matches_warns() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"1");
    write(dir.path(), "b", b"22");

    let config = config(&["-S", dir.path().to_str().unwrap()]);
    let reporter = MemoryReporter::new();
    let mut strategy = ListStrategy::new(Vec::new(), true);

    let code = execute(&config, &mut strategy, &reporter).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
    assert_eq!(reporter.with_severity(Severity::Warning), vec![NO_SAME_SIZE]);
}

#[test]
fn test_interactive_run_with_scripted_choices() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a", b"dup");
    let b = write(dir.path(), "b", b"dup");

    let config = config(&["-i", dir.path().to_str().unwrap()]);
    let mut strategy = InteractiveStrategy::new(RemoveLast);
    let reporter = MemoryReporter::new();

    let code = execute(&config, &mut strategy, &reporter).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(a.exists());
    assert!(!b.exists());
    assert!(reporter
        .with_severity(Severity::Info)
        .contains(&"Duplication 1 of 1".to_string()));
}

#[test]
fn test_list_run_summary_has_no_removals() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"dup");
    write(dir.path(), "b", b"dup");

    let config = config(&["-l", dir.path().to_str().unwrap()]);
    let reporter = MemoryReporter::new();
    let mut strategy = ListStrategy::new(Vec::new(), false);

    assert_eq!(
        execute(&config, &mut strategy, &reporter).unwrap(),
        ExitCode::Success
    );
    let info = reporter.with_severity(Severity::Info);
    assert!(info.contains(&"Duplicate groups: 1".to_string()));
    assert!(info.iter().all(|l| !l.contains("removed") && !l.contains("Removed")));
}

#[cfg(target_os = "linux")]
#[test]
fn test_dump_map_failure_does_not_stop_the_run() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    write(dir.path(), "plain", b"dup");
    let odd = dir.path().join(OsStr::from_bytes(b"\xff-b"));
    fs::write(&odd, b"dup").unwrap();
    let map = out.path().join("map.json");

    let config = config(&[
        "-l",
        "--dump-map",
        map.to_str().unwrap(),
        dir.path().to_str().unwrap(),
    ]);
    let reporter = MemoryReporter::new();
    let mut strategy = ListStrategy::new(Vec::new(), false);

    let code = execute(&config, &mut strategy, &reporter).unwrap();
    assert_eq!(code, ExitCode::PartialSuccess);
    assert!(reporter
        .with_severity(Severity::Error)
        .iter()
        .any(|l| l.contains("fingerprint map")));
    assert!(!strategy.into_inner().is_empty());
}

#[test]
fn test_unreadable_policy_fails_before_scanning() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a", b"dup");
    let b = write(dir.path(), "b", b"dup");
    let policy = write(dir.path(), "policy.json", br#"{"keep_rule": {"bogus": "x"}}"#);

    let config = config(&["-d", "-D", policy.to_str().unwrap(), dir.path().to_str().unwrap()]);
    let err = build_strategy(&config).err().unwrap();

    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(format!("{err:#}").contains("bogus"));
    assert!(a.exists() && b.exists());
}

#[test]
fn test_conflicting_modes_are_config_errors() {
    let cli = Cli::try_parse_from(["dupesweep", "-i", "-d", "/nonexistent"]).unwrap();
    let err = run_app(cli).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::ConfigError);
}

#[test]
fn test_policy_example_flag() {
    let cli = Cli::try_parse_from(["dupesweep", "-E"]).unwrap();
    assert_eq!(run_app(cli).unwrap(), ExitCode::Success);
}
