use dupesweep::duplicates::{DuplicateGroup, GroupKey};
use dupesweep::policy::{PolicyDocument, PolicyEngine, PolicyParseError, Predicate, EXAMPLE_POLICY};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn group(paths: &[&str]) -> DuplicateGroup {
    DuplicateGroup::from_paths(GroupKey::Name("g".into()), paths.iter().map(PathBuf::from))
        .unwrap()
}

#[test]
fn test_load_policy_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("policy.json");
    fs::write(
        &path,
        r#"{"keep_rule": {"path_is": "/archive/$"}, "delete_rule": {"filename_is": "\\.bak$"}}"#,
    )
    .unwrap();

    let document = PolicyDocument::load(&path).unwrap();
    assert_eq!(document.keep_rule().rules().len(), 1);
    assert_eq!(document.delete_rule().rules()[0].predicate(), Predicate::FilenameIs);
}

#[test]
fn test_missing_policy_file() {
    let err = PolicyDocument::load(&PathBuf::from("/nonexistent/policy.json")).unwrap_err();
    assert!(matches!(err, PolicyParseError::Io { .. }));
}

#[test]
fn test_malformed_policy_is_rejected() {
    for (json, check) in [
        ("{not json", "json"),
        (r#"{"keep_rule": {"size_is": "1"}}"#, "unknown"),
        (r#"{"keep_rule": {"filename_is": "("}}"#, "pattern"),
        (r#"{"delete_rule": {"m_datetime_lt": "yesterday-ish"}}"#, "date"),
        (r#"{"delete_rule": {"permissions": "rwx"}}"#, "permissions"),
        (r#"{"keep_rule": {"owner": "root"}}"#, "type"),
    ] {
        let err = PolicyDocument::from_json(json).unwrap_err();
        let matched = match check {
            "json" => matches!(err, PolicyParseError::Json(_)),
            "unknown" => matches!(err, PolicyParseError::UnknownPredicate(_)),
            "pattern" => matches!(err, PolicyParseError::InvalidPattern { .. }),
            "date" => matches!(err, PolicyParseError::InvalidDate { .. }),
            "permissions" => matches!(err, PolicyParseError::InvalidPermissions(_)),
            _ => matches!(err, PolicyParseError::WrongType { .. }),
        };
        assert!(matched, "{json} gave {err:?}");
    }
}

#[test]
fn test_example_policy_parses() {
    let document = PolicyDocument::from_json(EXAMPLE_POLICY).unwrap();
    assert!(!document.is_empty());
}

#[test]
fn test_keep_rule_overrides_scan_order() {
    let document =
        PolicyDocument::from_json(r#"{"keep_rule": {"path_is": "^/archive/$"}}"#).unwrap();
    let engine = PolicyEngine::new(document);

    let result = engine.classify(&group(&["/data/a.txt", "/archive/b.txt"]));
    assert_eq!(result.kept, vec![PathBuf::from("/archive/b.txt")]);
    assert_eq!(result.removed, vec![PathBuf::from("/data/a.txt")]);
}

#[test]
fn test_delete_rule_protects_unmatched() {
    let document =
        PolicyDocument::from_json(r#"{"delete_rule": {"filename_is": "copy"}}"#).unwrap();
    let engine = PolicyEngine::new(document);

    let result = engine.classify(&group(&["/a.txt", "/b.txt", "/a copy.txt"]));
    assert_eq!(
        result.kept,
        vec![PathBuf::from("/a.txt"), PathBuf::from("/b.txt")]
    );
    assert_eq!(result.removed, vec![PathBuf::from("/a copy.txt")]);
}

#[test]
fn test_inverted_predicates() {
    let document = PolicyDocument::from_json(
        r#"{"keep_rule": {"path_not_is": "^/tmp/$"}, "delete_rule": {"filename_not_is": "^keep"}}"#,
    )
    .unwrap();
    let engine = PolicyEngine::new(document);

    let result = engine.classify(&group(&["/tmp/x", "/home/x", "/tmp/keep-me", "/tmp/y"]));
    assert_eq!(result.kept, vec![PathBuf::from("/home/x"), PathBuf::from("/tmp/keep-me")]);
    assert_eq!(result.removed, vec![PathBuf::from("/tmp/x"), PathBuf::from("/tmp/y")]);
}
