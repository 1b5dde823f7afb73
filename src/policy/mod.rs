//! Rule-driven classification of duplicate groups.
//!
//! # Overview
//!
//! A [`PolicyDocument`] holds two ordered rule sets, `keep_rule` and
//! `delete_rule`. The [`PolicyEngine`] applies them to each duplicate group
//! and returns a [`Classification`]: a non-empty `kept` list and a
//! `removed` list that together cover the group exactly once.
//!
//! # Predicates
//!
//! | name | matches when |
//! |---|---|
//! | `filename_is` / `filename_not_is` | base name matches / does not match the regex |
//! | `path_is` / `path_not_is` | containing directory (with trailing `/`) matches / does not match |
//! | `a_datetime_gt` / `a_datetime_lt` | last access is later / earlier than the rule time |
//! | `c_datetime_gt` / `c_datetime_lt` | last metadata change is later / earlier |
//! | `m_datetime_gt` / `m_datetime_lt` | last modification is later / earlier |
//! | `permissions` | permission bits as 3 octal digits equal the value |
//! | `owner` / `group` | owning user / group is in the list |

pub mod document;
pub mod engine;
pub mod predicate;

use std::io;
use std::path::PathBuf;

pub use document::{PolicyDocument, RuleSet};
pub use engine::{Classification, PolicyEngine};
pub use predicate::{parse_datetime, Condition, Predicate, RawValue, Rule};

/// Example policy printed by `--delete-policy-example`.
pub const EXAMPLE_POLICY: &str = include_str!("../../etc/delete_policy.json");

/// A policy document that cannot be used.
#[derive(thiserror::Error, Debug)]
pub enum PolicyParseError {
    /// The document file could not be read.
    #[error("Cannot read policy {path}: {source}")]
    Io {
        /// Document path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The document is not valid JSON or has an unexpected shape.
    #[error("Malformed policy: {0}")]
    Json(#[from] serde_json::Error),

    /// A rule name outside the predicate vocabulary.
    #[error("Unknown policy rule: {0}")]
    UnknownPredicate(String),

    /// A regular expression that does not compile.
    #[error("Invalid pattern for {rule}: {source}")]
    InvalidPattern {
        /// Rule name
        rule: String,
        /// Regex compile error
        #[source]
        source: regex::Error,
    },

    /// A date literal that cannot be parsed.
    #[error("Invalid date for {rule}: {value}")]
    InvalidDate {
        /// Rule name
        rule: String,
        /// Offending literal
        value: String,
    },

    /// A permission value that is not three octal digits.
    #[error("Invalid permissions: {0} (expected e.g. 644)")]
    InvalidPermissions(String),

    /// A value of the wrong JSON type for its rule.
    #[error("Rule {rule} expects {expected}")]
    WrongType {
        /// Rule name
        rule: String,
        /// Expected value type
        expected: &'static str,
    },
}
