//! Ordered fingerprint maps and duplicate groups.
//!
//! # Overview
//!
//! [`OrderedGroups`] is the multimap every scan produces: key → paths, where
//! both the key order and the path order are insertion (scan) order. The
//! order is a property of the type itself, not of any hash map iteration, so
//! "the first scanned copy" is always well defined.
//!
//! [`DuplicateGroup`] is a validated view over one entry: literal repeats of
//! the same path are coalesced and only entries with two or more distinct
//! paths become groups.
//!
//! # Example
//!
//! ```
//! use dupesweep::duplicates::{duplicate_groups, FingerprintMap};
//! use dupesweep::scanner::Hasher;
//! use std::path::PathBuf;
//!
//! let hasher = Hasher::new();
//! let x = hasher.fingerprint_bytes(b"X");
//! let y = hasher.fingerprint_bytes(b"Y");
//!
//! let mut map = FingerprintMap::new();
//! map.push(x, PathBuf::from("/a.txt"));
//! map.push(x, PathBuf::from("/b.txt"));
//! map.push(y, PathBuf::from("/c.txt"));
//!
//! let groups = duplicate_groups(&map);
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].paths(), [PathBuf::from("/a.txt"), PathBuf::from("/b.txt")]);
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::scanner::Fingerprint;

/// Insertion-ordered multimap from a grouping key to file paths.
#[derive(Debug, Clone)]
pub struct OrderedGroups<K: Eq + Hash> {
    entries: Vec<(K, Vec<PathBuf>)>,
    index: HashMap<K, usize>,
}

/// Content fingerprint → paths, in scan order.
pub type FingerprintMap = OrderedGroups<Fingerprint>;

/// Exact file name → paths, in scan order.
pub type NameMap = OrderedGroups<String>;

impl<K: Eq + Hash> Default for OrderedGroups<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> OrderedGroups<K> {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` to the entry for `key`, creating it if needed.
    pub fn push(&mut self, key: K, path: PathBuf) {
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1.push(path),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, vec![path]));
            }
        }
    }

    /// Concatenate `other` onto this map.
    ///
    /// Keys new to this map are appended in `other`'s order; paths for an
    /// existing key are appended after the ones already present.
    pub fn merge(&mut self, other: Self) {
        for (key, paths) in other.entries {
            for path in paths {
                self.push(key.clone(), path);
            }
        }
    }

    /// Paths recorded for `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&[PathBuf]> {
        self.index
            .get(key)
            .map(|&slot| self.entries[slot].1.as_slice())
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of recorded paths across all keys.
    #[must_use]
    pub fn path_count(&self) -> usize {
        self.entries.iter().map(|(_, paths)| paths.len()).sum()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[PathBuf])> {
        self.entries
            .iter()
            .map(|(key, paths)| (key, paths.as_slice()))
    }
}

impl<K: Eq + Hash> PartialEq for OrderedGroups<K> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Eq + Hash> Eq for OrderedGroups<K> {}

impl<K: Eq + Hash + Serialize> Serialize for OrderedGroups<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, paths) in &self.entries {
            map.serialize_entry(key, paths)?;
        }
        map.end()
    }
}

impl<'de, K> Deserialize<'de> for OrderedGroups<K>
where
    K: Eq + Hash + Clone + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedGroupsVisitor(PhantomData))
    }
}

struct OrderedGroupsVisitor<K>(PhantomData<K>);

impl<'de, K> Visitor<'de> for OrderedGroupsVisitor<K>
where
    K: Eq + Hash + Clone + Deserialize<'de>,
{
    type Value = OrderedGroups<K>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of keys to path lists")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut groups = OrderedGroups::new();
        while let Some((key, paths)) = access.next_entry::<K, Vec<PathBuf>>()? {
            for path in paths {
                groups.push(key.clone(), path);
            }
        }
        Ok(groups)
    }
}

/// What the members of a duplicate group have in common.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    /// Identical content fingerprint
    Content(Fingerprint),
    /// Identical file name
    Name(String),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content(fp) => write!(f, "{fp}"),
            Self::Name(name) => write!(f, "name:{name}"),
        }
    }
}

/// Two or more distinct paths sharing one [`GroupKey`], in scan order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    key: GroupKey,
    paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Build a group from raw paths.
    ///
    /// Literal repeats are coalesced, keeping the first occurrence. Returns
    /// `None` when fewer than two distinct paths remain.
    #[must_use]
    pub fn from_paths(key: GroupKey, paths: impl IntoIterator<Item = PathBuf>) -> Option<Self> {
        let mut seen = HashSet::new();
        let paths: Vec<PathBuf> = paths
            .into_iter()
            .filter(|p| seen.insert(p.clone()))
            .collect();

        (paths.len() > 1).then_some(Self { key, paths })
    }

    /// Shared key of this group.
    #[must_use]
    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    /// Member paths in scan order.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Number of members (always 2 or more).
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Always false; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Whether `path` is a member.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }
}

/// Duplicate groups of a content map, in first-scan order.
#[must_use]
pub fn duplicate_groups(map: &FingerprintMap) -> Vec<DuplicateGroup> {
    collect_groups(map, |fp| GroupKey::Content(*fp))
}

/// Duplicate groups of a name map, in first-scan order.
#[must_use]
pub fn name_groups(map: &NameMap) -> Vec<DuplicateGroup> {
    collect_groups(map, |name| GroupKey::Name(name.clone()))
}

fn collect_groups<K, F>(map: &OrderedGroups<K>, to_key: F) -> Vec<DuplicateGroup>
where
    K: Eq + Hash + Clone,
    F: Fn(&K) -> GroupKey,
{
    let groups: Vec<DuplicateGroup> = map
        .iter()
        .filter_map(|(key, paths)| {
            let group = DuplicateGroup::from_paths(to_key(key), paths.iter().cloned());
            if group.is_none() {
                log::trace!("Eliminated unique entry with {} path(s)", paths.len());
            }
            group
        })
        .collect();

    log::debug!(
        "{} of {} keys have duplicates",
        groups.len(),
        map.len()
    );
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Hasher;

    fn fp(data: &[u8]) -> Fingerprint {
        Hasher::new().fingerprint_bytes(data)
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_push_keeps_insertion_order() {
        let mut map = FingerprintMap::new();
        map.push(fp(b"2"), PathBuf::from("/x"));
        map.push(fp(b"1"), PathBuf::from("/y"));
        map.push(fp(b"2"), PathBuf::from("/z"));

        let keys: Vec<_> = map.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![fp(b"2"), fp(b"1")]);
        assert_eq!(map.get(&fp(b"2")).unwrap(), paths(&["/x", "/z"]).as_slice());
        assert_eq!(map.path_count(), 3);
    }

    #[test]
    fn test_merge_concatenates_per_key() {
        let mut first = FingerprintMap::new();
        first.push(fp(b"a"), PathBuf::from("/1"));
        first.push(fp(b"b"), PathBuf::from("/2"));

        let mut second = FingerprintMap::new();
        second.push(fp(b"c"), PathBuf::from("/3"));
        second.push(fp(b"a"), PathBuf::from("/4"));

        first.merge(second);

        let keys: Vec<_> = first.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![fp(b"a"), fp(b"b"), fp(b"c")]);
        assert_eq!(first.get(&fp(b"a")).unwrap(), paths(&["/1", "/4"]).as_slice());
    }

    #[test]
    fn test_group_coalesces_literal_repeats() {
        let group = DuplicateGroup::from_paths(
            GroupKey::Name("a".into()),
            paths(&["/a", "/b", "/a"]),
        )
        .unwrap();
        assert_eq!(group.paths(), paths(&["/a", "/b"]).as_slice());

        let none = DuplicateGroup::from_paths(GroupKey::Name("a".into()), paths(&["/a", "/a"]));
        assert!(none.is_none());
    }

    #[test]
    fn test_duplicate_groups_filters_singletons() {
        let mut map = FingerprintMap::new();
        map.push(fp(b"X"), PathBuf::from("/a.txt"));
        map.push(fp(b"X"), PathBuf::from("/b.txt"));
        map.push(fp(b"Y"), PathBuf::from("/c.txt"));

        let groups = duplicate_groups(&map);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key(), &GroupKey::Content(fp(b"X")));
        assert!(groups[0].contains(Path::new("/b.txt")));
        assert!(!groups[0].contains(Path::new("/c.txt")));
    }

    #[test]
    fn test_name_groups() {
        let mut map = NameMap::new();
        map.push("report.pdf".to_string(), PathBuf::from("/one/report.pdf"));
        map.push("other.pdf".to_string(), PathBuf::from("/one/other.pdf"));
        map.push("report.pdf".to_string(), PathBuf::from("/two/report.pdf"));

        let groups = name_groups(&map);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key().to_string(), "name:report.pdf");
    }

    #[test]
    fn test_serde_keeps_order() {
        let mut map = NameMap::new();
        map.push("z".to_string(), PathBuf::from("/z1"));
        map.push("a".to_string(), PathBuf::from("/a1"));
        map.push("z".to_string(), PathBuf::from("/z2"));

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"z":["/z1","/z2"],"a":["/a1"]}"#);

        let back: NameMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_deserialize_skips_empty_lists() {
        let map: NameMap = serde_json::from_str(r#"{"empty":[],"x":["/x"]}"#).unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.get(&"empty".to_string()).is_none());
    }
}
