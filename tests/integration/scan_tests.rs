use dupesweep::duplicates::{
    CompareBy, DuplicateFinder, FinderConfig, GroupKey, ScanArtifact, ScanOptions,
};
use dupesweep::scanner::{collect_files, filter_by_min_size, keep_same_size};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(root: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn scan(root: &Path, threads: usize, options: ScanOptions) -> Vec<Vec<PathBuf>> {
    let (files, errors) = collect_files(&[root.to_path_buf()]);
    assert!(errors.is_empty());
    let finder = DuplicateFinder::new(
        FinderConfig::default()
            .with_threads(threads)
            .with_options(options),
    );
    finder
        .find(&files)
        .groups()
        .into_iter()
        .map(|g| g.paths().to_vec())
        .collect()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    assert!(scan(dir.path(), 1, ScanOptions::default()).is_empty());
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"content a");
    write(dir.path(), "b.txt", b"content b");
    write(dir.path(), "c.txt", b"content c");

    assert!(scan(dir.path(), 1, ScanOptions::default()).is_empty());
}

#[test]
fn test_scan_groups_identical_content() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.txt", b"X");
    let b = write(dir.path(), "b.txt", b"X");
    write(dir.path(), "c.txt", b"Y");

    let groups = scan(dir.path(), 1, ScanOptions::default());
    assert_eq!(groups, vec![vec![a, b]]);
}

#[test]
fn test_scan_order_follows_sources_then_names() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    let z = write(first.path(), "z.bin", b"dup");
    let a = write(first.path(), "sub/a.bin", b"dup");
    let m = write(second.path(), "m.bin", b"dup");

    let (files, _) = collect_files(&[first.path().to_path_buf(), second.path().to_path_buf()]);
    let outcome = DuplicateFinder::default().find(&files);
    let groups = outcome.groups();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].paths(), &[a, z, m]);
}

#[test]
fn test_thread_counts_agree() {
    let dir = tempdir().unwrap();
    for i in 0..24 {
        write(dir.path(), &format!("d{}/f{:02}", i % 3, i), format!("{}", i % 5).as_bytes());
    }

    let single = scan(dir.path(), 0, ScanOptions::default());
    for threads in [2, 3, 8, 64] {
        assert_eq!(scan(dir.path(), threads, ScanOptions::default()), single);
    }
    assert_eq!(single.len(), 5);
}

#[test]
fn test_chunk_groups_by_prefix() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"header-one");
    write(dir.path(), "b", b"header-two");

    assert!(scan(dir.path(), 1, ScanOptions::default()).is_empty());
    let chunked = scan(dir.path(), 1, ScanOptions::default().with_chunk(7));
    assert_eq!(chunked.len(), 1);
}

#[test]
fn test_skip_empty_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "e1", b"");
    write(dir.path(), "e2", b"");

    assert_eq!(scan(dir.path(), 1, ScanOptions::default()).len(), 1);
    assert!(scan(dir.path(), 1, ScanOptions::default().with_skip_empty(true)).is_empty());
}

#[test]
fn test_compare_by_name_ignores_content() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "one/report.txt", b"first");
    let b = write(dir.path(), "two/report.txt", b"second");
    write(dir.path(), "two/other.txt", b"first");

    let options = ScanOptions::default().with_compare(CompareBy::Name);
    let (files, _) = collect_files(&[dir.path().to_path_buf()]);
    let outcome = DuplicateFinder::new(FinderConfig::default().with_options(options)).find(&files);
    let groups = outcome.groups();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].key(), &GroupKey::Name("report.txt".into()));
    assert_eq!(groups[0].paths(), &[a, b]);
}

#[test]
fn test_prefilters_before_hashing() {
    let dir = tempdir().unwrap();
    let small = write(dir.path(), "small", b"ab");
    let big1 = write(dir.path(), "big1", b"abcdef");
    let big2 = write(dir.path(), "big2", b"uvwxyz");
    let odd = write(dir.path(), "odd", b"abcdefgh");

    let files = vec![small, big1.clone(), big2.clone(), odd];
    let files = filter_by_min_size(files, 3);
    assert_eq!(files.len(), 3);

    let (files, errors) = keep_same_size(files);
    assert_eq!(files, vec![big1, big2]);
    assert!(errors.is_empty());
}

#[test]
fn test_dumped_map_reloads() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"same");
    write(dir.path(), "b", b"same");

    let (files, _) = collect_files(&[dir.path().to_path_buf()]);
    let outcome = DuplicateFinder::default().find(&files);
    let json = outcome.artifact.to_json().unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["hashes"].is_object());
    assert!(value.get("names").is_some());

    let reloaded = ScanArtifact::from_json(&json).unwrap();
    assert_eq!(reloaded, outcome.artifact);
    assert_eq!(reloaded.groups(CompareBy::Content).len(), 1);
}
