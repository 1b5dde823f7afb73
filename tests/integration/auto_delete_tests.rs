use dupesweep::actions::{mirrored_path, ResolveOptions, Resolver};
use dupesweep::duplicates::{DuplicateFinder, DuplicateGroup};
use dupesweep::policy::{PolicyDocument, PolicyEngine};
use dupesweep::report::{MemoryReporter, Severity};
use dupesweep::scanner::collect_files;
use dupesweep::strategy::{run_strategy, AutoStrategy, RunTotals};
use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(root: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn groups_under(root: &Path) -> Vec<DuplicateGroup> {
    let (files, _) = collect_files(&[root.to_path_buf()]);
    DuplicateFinder::default().find(&files).groups()
}

fn auto(policy: &str, options: ResolveOptions, groups: &[DuplicateGroup]) -> RunTotals {
    let document = PolicyDocument::from_json(policy).unwrap();
    let mut strategy = AutoStrategy::new(PolicyEngine::new(document), Resolver::new(options));
    run_strategy(&mut strategy, groups, &MemoryReporter::new())
}

#[test]
fn test_default_policy_keeps_first_scanned() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.txt", b"X");
    let b = write(dir.path(), "b.txt", b"X");
    let c = write(dir.path(), "c.txt", b"Y");

    let groups = groups_under(dir.path());
    assert_eq!(groups.len(), 1);

    let totals = auto("{}", ResolveOptions::default(), &groups);
    assert!(a.exists());
    assert!(!b.exists());
    assert!(c.exists());
    assert_eq!(totals.counters.deleted_files, 1);
    assert_eq!(totals.counters.deleted_bytes, 1);
    assert_eq!(totals.counters.duplicate_groups, 1);
    assert_eq!(totals.counters.duplicate_bytes, 2);
}

#[test]
fn test_keep_rule_selects_archive_copy() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.txt", b"X");
    let b = write(dir.path(), "archive/b.txt", b"X");

    let groups = groups_under(dir.path());
    assert_eq!(groups[0].paths()[0], a);

    auto(
        r#"{"keep_rule": {"path_is": "/archive/$"}}"#,
        ResolveOptions::default(),
        &groups,
    );
    assert!(!a.exists());
    assert!(b.exists());
}

#[test]
fn test_delete_rule_by_modify_time_removes_only_old_copy() {
    let dir = tempdir().unwrap();
    let first = write(dir.path(), "1.txt", b"same");
    let old = write(dir.path(), "2.txt", b"same");
    let third = write(dir.path(), "3.txt", b"same");
    set_file_mtime(&old, FileTime::from_unix_time(946_684_800, 0)).unwrap();

    let groups = groups_under(dir.path());
    assert_eq!(groups[0].len(), 3);

    let totals = auto(
        r#"{"delete_rule": {"m_datetime_lt": "2010-01-01T00:00:00Z"}}"#,
        ResolveOptions::default(),
        &groups,
    );

    assert!(first.exists());
    assert!(!old.exists());
    assert!(third.exists());
    assert_eq!(totals.counters.deleted_files, 1);
}

#[test]
fn test_dry_run_with_backup_copies_but_keeps_originals() {
    let dir = tempdir().unwrap();
    let backup = tempdir().unwrap();
    let a = write(dir.path(), "a.bin", b"payload");
    let b = write(dir.path(), "nested/b.bin", b"payload");

    let groups = groups_under(dir.path());
    let options = ResolveOptions::default()
        .with_backup_root(backup.path())
        .with_dry_run(true);
    let totals = auto("{}", options, &groups);

    assert_eq!(fs::read(&a).unwrap(), b"payload");
    assert_eq!(fs::read(&b).unwrap(), b"payload");
    assert_eq!(fs::read(mirrored_path(backup.path(), &b)).unwrap(), b"payload");
    assert!(!mirrored_path(backup.path(), &a).exists());
    assert_eq!(totals.counters.backed_up_files, 1);
    assert_eq!(totals.counters.deleted_files, 1);
    assert_eq!(totals.counters.deleted_bytes, 7);
}

#[test]
fn test_vanished_file_is_reported_and_skipped() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"dup");
    let b = write(dir.path(), "b", b"dup");
    let c = write(dir.path(), "c", b"dup");

    let groups = groups_under(dir.path());
    fs::remove_file(&b).unwrap();

    let document = PolicyDocument::default();
    let mut strategy =
        AutoStrategy::new(PolicyEngine::new(document), Resolver::new(ResolveOptions::default()));
    let reporter = MemoryReporter::new();
    let totals = run_strategy(&mut strategy, &groups, &reporter);

    assert!(!c.exists());
    assert_eq!(totals.failures, 1);
    assert_eq!(totals.counters.deleted_files, 1);
    assert_eq!(reporter.with_severity(Severity::Error).len(), 1);
}
