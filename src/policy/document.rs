//! Policy document loading.
//!
//! A policy document is JSON with two optional sections:
//!
//! ```json
//! {
//!     "keep_rule":   { "path_is": "^/archive/" },
//!     "delete_rule": { "m_datetime_lt": "2020-01-01 00:00:00" }
//! }
//! ```
//!
//! Rule order inside each section is significant, so sections are read with
//! an order-preserving map visitor instead of `serde_json::Map`.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use super::predicate::{RawValue, Rule};
use super::PolicyParseError;

/// An ordered list of compiled rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Compile `(name, value)` pairs in order.
    ///
    /// # Errors
    ///
    /// Returns the first [`PolicyParseError`] encountered.
    pub fn compile<I>(entries: I) -> Result<Self, PolicyParseError>
    where
        I: IntoIterator<Item = (String, RawValue)>,
    {
        let rules = entries
            .into_iter()
            .map(|(name, value)| Rule::compile(&name, value))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Every rule in document order, including empty ones.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules with a non-empty value, in document order.
    pub fn active(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|rule| !rule.is_empty())
    }

    /// Whether at least one rule has a non-empty value.
    #[must_use]
    pub fn has_active(&self) -> bool {
        self.active().next().is_some()
    }
}

/// Keep and delete rules, loaded once per run.
#[derive(Debug, Clone, Default)]
pub struct PolicyDocument {
    keep_rule: RuleSet,
    delete_rule: RuleSet,
}

impl PolicyDocument {
    /// Build a document from compiled sections.
    #[must_use]
    pub fn new(keep_rule: RuleSet, delete_rule: RuleSet) -> Self {
        Self {
            keep_rule,
            delete_rule,
        }
    }

    /// Parse a document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyParseError`] if the JSON is malformed, contains an
    /// unknown section or predicate, or a rule value cannot be compiled.
    pub fn from_json(json: &str) -> Result<Self, PolicyParseError> {
        let raw: RawDocument = serde_json::from_str(json)?;
        Ok(Self {
            keep_rule: RuleSet::compile(raw.keep_rule.0)?,
            delete_rule: RuleSet::compile(raw.delete_rule.0)?,
        })
    }

    /// Read and parse a document file.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyParseError::Io`] if the file cannot be read, or any
    /// error of [`PolicyDocument::from_json`].
    pub fn load(path: &Path) -> Result<Self, PolicyParseError> {
        let json = fs::read_to_string(path).map_err(|source| PolicyParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document = Self::from_json(&json)?;
        log::info!(
            "Loaded policy {} ({} keep, {} delete rules)",
            path.display(),
            document.keep_rule.rules().len(),
            document.delete_rule.rules().len()
        );
        Ok(document)
    }

    /// Rules that capture paths to keep.
    #[must_use]
    pub fn keep_rule(&self) -> &RuleSet {
        &self.keep_rule
    }

    /// Rules that mark paths for removal.
    #[must_use]
    pub fn delete_rule(&self) -> &RuleSet {
        &self.delete_rule
    }

    /// Whether neither section has an active rule.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.keep_rule.has_active() && !self.delete_rule.has_active()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDocument {
    #[serde(default)]
    keep_rule: RawSection,
    #[serde(default)]
    delete_rule: RawSection,
}

#[derive(Default)]
struct RawSection(Vec<(String, RawValue)>);

impl<'de> Deserialize<'de> for RawSection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RawSectionVisitor)
    }
}

struct RawSectionVisitor;

impl<'de> Visitor<'de> for RawSectionVisitor {
    type Value = RawSection;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of predicate names to rule values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries: Vec<(String, RawValue)> =
            Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, value)) = access.next_entry::<String, RawValue>()? {
            // A repeated key overwrites the earlier value in its original slot.
            match entries.iter_mut().find(|(existing, _)| *existing == name) {
                Some(slot) => slot.1 = value,
                None => entries.push((name, value)),
            }
        }
        Ok(RawSection(entries))
    }
}

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawValueVisitor)
    }
}

struct RawValueVisitor;

impl<'de> Visitor<'de> for RawValueVisitor {
    type Value = RawValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or a list of strings")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(RawValue::Text(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
        Ok(RawValue::Text(value))
    }

    fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element::<String>()? {
            items.push(item);
        }
        Ok(RawValue::List(items))
    }
}
