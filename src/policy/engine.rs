//! Two-phase classification of a duplicate group.
//!
//! 1. Keep phase: each active keep rule, in document order, captures the
//!    remaining candidates it matches. A candidate is captured at most once.
//!    When nothing was captured, the first candidate in scan order is kept.
//! 2. Delete phase: with no active delete rule, every remaining candidate
//!    is removed. Otherwise only candidates matched by a delete rule are
//!    removed and the rest join `kept`.
//!
//! Metadata is read lazily, at most once per candidate, and only for
//! predicates that need it.

use std::path::{Path, PathBuf};

use super::document::{PolicyDocument, RuleSet};
use super::predicate::Rule;
use crate::duplicates::DuplicateGroup;
use crate::scanner::{FileMeta, FsMetadata, MetadataAccessor, MetadataError};

/// Disposition of every path of one group.
#[derive(Debug, Default)]
pub struct Classification {
    /// Paths that survive, in capture order
    pub kept: Vec<PathBuf>,
    /// Paths to remove, in capture order
    pub removed: Vec<PathBuf>,
    /// Metadata failures met while evaluating rules
    pub issues: Vec<MetadataError>,
}

impl Classification {
    /// Number of classified paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kept.len() + self.removed.len()
    }

    /// Whether nothing was classified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `path` is in the removal list.
    #[must_use]
    pub fn is_removed(&self, path: &Path) -> bool {
        self.removed.iter().any(|p| p == path)
    }
}

struct Candidate {
    path: PathBuf,
    meta: Option<Option<FileMeta>>,
}

impl Candidate {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            meta: None,
        }
    }

    fn load_metadata<M: MetadataAccessor>(
        &mut self,
        accessor: &M,
        issues: &mut Vec<MetadataError>,
    ) {
        if self.meta.is_some() {
            return;
        }
        let meta = match accessor.metadata(&self.path) {
            Ok(meta) => Some(meta),
            Err(e) => {
                log::warn!("Policy cannot inspect {}: {}", self.path.display(), e);
                issues.push(e);
                None
            }
        };
        self.meta = Some(meta);
    }

    fn metadata(&self) -> Option<&FileMeta> {
        self.meta.as_ref().and_then(Option::as_ref)
    }
}

/// Applies a [`PolicyDocument`] to duplicate groups.
///
/// # Example
///
/// ```
/// use dupesweep::duplicates::{DuplicateGroup, GroupKey};
/// use dupesweep::policy::{PolicyDocument, PolicyEngine};
/// use std::path::PathBuf;
///
/// let group = DuplicateGroup::from_paths(
///     GroupKey::Name("b.txt".into()),
///     vec![PathBuf::from("/data/b.txt"), PathBuf::from("/archive/b.txt")],
/// )
/// .unwrap();
///
/// let policy = PolicyDocument::from_json(r#"{"keep_rule": {"path_is": "^/archive/"}}"#).unwrap();
/// let result = PolicyEngine::new(policy).classify(&group);
///
/// assert_eq!(result.kept, vec![PathBuf::from("/archive/b.txt")]);
/// assert_eq!(result.removed, vec![PathBuf::from("/data/b.txt")]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PolicyEngine<M = FsMetadata> {
    document: PolicyDocument,
    accessor: M,
}

impl PolicyEngine<FsMetadata> {
    /// Create an engine reading metadata from the filesystem.
    #[must_use]
    pub fn new(document: PolicyDocument) -> Self {
        Self::with_accessor(document, FsMetadata)
    }
}

impl<M: MetadataAccessor> PolicyEngine<M> {
    /// Create an engine with a custom metadata source.
    #[must_use]
    pub fn with_accessor(document: PolicyDocument, accessor: M) -> Self {
        Self { document, accessor }
    }

    /// The loaded policy.
    #[must_use]
    pub fn document(&self) -> &PolicyDocument {
        &self.document
    }

    /// Classify one duplicate group.
    ///
    /// `kept` is never empty and `kept` and `removed` together hold every
    /// path of the group exactly once.
    #[must_use]
    pub fn classify(&self, group: &DuplicateGroup) -> Classification {
        self.classify_paths(group.paths())
    }

    /// Classify an ordered list of distinct paths.
    ///
    /// An empty list yields an empty classification.
    #[must_use]
    pub fn classify_paths(&self, paths: &[PathBuf]) -> Classification {
        let mut candidates: Vec<Candidate> = paths.iter().map(|p| Candidate::new(p)).collect();
        let mut result = Classification::default();

        let keep_rule = self.document.keep_rule();
        result.kept = self.capture(keep_rule, &mut candidates, &mut result.issues);

        if result.kept.is_empty() && !candidates.is_empty() {
            let first = candidates.remove(0);
            log::debug!("No keep rule matched; keeping {}", first.path.display());
            result.kept.push(first.path);
        }

        let delete_rule = self.document.delete_rule();
        if delete_rule.has_active() {
            result.removed = self.capture(delete_rule, &mut candidates, &mut result.issues);
            result.kept.extend(candidates.into_iter().map(|c| c.path));
        } else {
            result.removed = candidates.into_iter().map(|c| c.path).collect();
        }

        result
    }

    /// Move every candidate matched by an active rule of `rules` out of
    /// `candidates`, first matching rule wins.
    fn capture(
        &self,
        rules: &RuleSet,
        candidates: &mut Vec<Candidate>,
        issues: &mut Vec<MetadataError>,
    ) -> Vec<PathBuf> {
        let mut captured = Vec::new();

        for rule in rules.active() {
            let mut i = 0;
            while i < candidates.len() {
                if self.satisfies(rule, &mut candidates[i], issues) {
                    let candidate = candidates.remove(i);
                    log::trace!("{} captured {}", rule.predicate(), candidate.path.display());
                    captured.push(candidate.path);
                } else {
                    i += 1;
                }
            }
        }

        captured
    }

    fn satisfies(
        &self,
        rule: &Rule,
        candidate: &mut Candidate,
        issues: &mut Vec<MetadataError>,
    ) -> bool {
        if !rule.predicate().needs_metadata() {
            return rule.matches(&candidate.path, None);
        }

        candidate.load_metadata(&self.accessor, issues);
        match candidate.metadata() {
            Some(meta) => rule.matches(&candidate.path, Some(meta)),
            None => false,
        }
    }
}
