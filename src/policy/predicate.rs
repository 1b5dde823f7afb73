//! Policy predicates and compiled rules.
//!
//! Every rule name in a policy document maps to one [`Predicate`]. A rule
//! value is compiled once, at load time, into a [`Condition`]: a regular
//! expression, an absolute timestamp, a normalized permission string, or an
//! owner / group allow-list. Evaluation is a single exhaustive `match`.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

use super::PolicyParseError;
use crate::scanner::FileMeta;

/// The fixed predicate vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// Base name matches the pattern
    FilenameIs,
    /// Base name does not match the pattern
    FilenameNotIs,
    /// Containing directory matches the pattern
    PathIs,
    /// Containing directory does not match the pattern
    PathNotIs,
    /// Last access is later than the rule time
    AccessedAfter,
    /// Last access is earlier than the rule time
    AccessedBefore,
    /// Last metadata change is later than the rule time
    ChangedAfter,
    /// Last metadata change is earlier than the rule time
    ChangedBefore,
    /// Last modification is later than the rule time
    ModifiedAfter,
    /// Last modification is earlier than the rule time
    ModifiedBefore,
    /// Permission bits equal the rule value
    Permissions,
    /// Owning user is in the allow-list
    Owner,
    /// Owning group is in the allow-list
    Group,
}

impl Predicate {
    /// Every predicate, in documentation order.
    pub const ALL: [Predicate; 13] = [
        Self::FilenameIs,
        Self::FilenameNotIs,
        Self::PathIs,
        Self::PathNotIs,
        Self::AccessedAfter,
        Self::AccessedBefore,
        Self::ChangedAfter,
        Self::ChangedBefore,
        Self::ModifiedAfter,
        Self::ModifiedBefore,
        Self::Permissions,
        Self::Owner,
        Self::Group,
    ];

    /// Look up a predicate by its policy document name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Name used in policy documents.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::FilenameIs => "filename_is",
            Self::FilenameNotIs => "filename_not_is",
            Self::PathIs => "path_is",
            Self::PathNotIs => "path_not_is",
            Self::AccessedAfter => "a_datetime_gt",
            Self::AccessedBefore => "a_datetime_lt",
            Self::ChangedAfter => "c_datetime_gt",
            Self::ChangedBefore => "c_datetime_lt",
            Self::ModifiedAfter => "m_datetime_gt",
            Self::ModifiedBefore => "m_datetime_lt",
            Self::Permissions => "permissions",
            Self::Owner => "owner",
            Self::Group => "group",
        }
    }

    /// Whether evaluating this predicate needs file metadata.
    #[must_use]
    pub fn needs_metadata(self) -> bool {
        !matches!(
            self,
            Self::FilenameIs | Self::FilenameNotIs | Self::PathIs | Self::PathNotIs
        )
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw rule value as found in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// A single string
    Text(String),
    /// A list of strings
    List(Vec<String>),
}

impl RawValue {
    fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }
}

/// A compiled rule value.
#[derive(Debug, Clone)]
pub enum Condition {
    /// Empty value; never evaluated
    Empty,
    /// Regular expression over a name or directory
    Pattern(Regex),
    /// Absolute timestamp
    Time(DateTime<Utc>),
    /// Three octal digits, e.g. `"644"`
    Mode(String),
    /// Allowed user or group names
    Names(HashSet<String>),
}

/// One predicate with its compiled value.
#[derive(Debug, Clone)]
pub struct Rule {
    predicate: Predicate,
    condition: Condition,
}

impl Rule {
    /// Compile a rule from its document name and raw value.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyParseError`] for unknown names, values of the wrong
    /// type, invalid patterns, unparsable dates, or non-octal permissions.
    pub fn compile(name: &str, value: RawValue) -> Result<Self, PolicyParseError> {
        let predicate = Predicate::from_name(name)
            .ok_or_else(|| PolicyParseError::UnknownPredicate(name.to_string()))?;

        if value.is_empty() {
            return Ok(Self {
                predicate,
                condition: Condition::Empty,
            });
        }

        let condition = match (predicate, value) {
            (
                Predicate::FilenameIs
                | Predicate::FilenameNotIs
                | Predicate::PathIs
                | Predicate::PathNotIs,
                RawValue::Text(pattern),
            ) => Regex::new(&pattern)
                .map(Condition::Pattern)
                .map_err(|source| PolicyParseError::InvalidPattern {
                    rule: name.to_string(),
                    source,
                })?,
            (
                Predicate::AccessedAfter
                | Predicate::AccessedBefore
                | Predicate::ChangedAfter
                | Predicate::ChangedBefore
                | Predicate::ModifiedAfter
                | Predicate::ModifiedBefore,
                RawValue::Text(literal),
            ) => parse_datetime(&literal).map(Condition::Time).ok_or_else(|| {
                PolicyParseError::InvalidDate {
                    rule: name.to_string(),
                    value: literal.clone(),
                }
            })?,
            (Predicate::Permissions, RawValue::Text(mode)) => normalize_permissions(&mode)
                .map(Condition::Mode)
                .ok_or_else(|| PolicyParseError::InvalidPermissions(mode.clone()))?,
            (Predicate::Owner | Predicate::Group, RawValue::List(names)) => {
                Condition::Names(names.into_iter().collect())
            }
            (Predicate::Owner | Predicate::Group, RawValue::Text(_)) => {
                return Err(PolicyParseError::WrongType {
                    rule: name.to_string(),
                    expected: "a list of names",
                })
            }
            (_, RawValue::List(_)) => {
                return Err(PolicyParseError::WrongType {
                    rule: name.to_string(),
                    expected: "a string",
                })
            }
        };

        Ok(Self {
            predicate,
            condition,
        })
    }

    /// The predicate this rule tests.
    #[must_use]
    pub fn predicate(&self) -> Predicate {
        self.predicate
    }

    /// The compiled value.
    #[must_use]
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Whether the rule has an empty value and is skipped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.condition, Condition::Empty)
    }

    /// Test `path` against this rule.
    ///
    /// `meta` is only consulted by metadata predicates; without it they
    /// never match. Empty rules never match.
    #[must_use]
    pub fn matches(&self, path: &Path, meta: Option<&FileMeta>) -> bool {
        match (&self.condition, self.predicate) {
            (Condition::Empty, _) => false,

            (Condition::Pattern(re), Predicate::FilenameIs) => re.is_match(&file_name(path)),
            (Condition::Pattern(re), Predicate::FilenameNotIs) => !re.is_match(&file_name(path)),
            (Condition::Pattern(re), Predicate::PathIs) => re.is_match(&directory(path)),
            (Condition::Pattern(re), Predicate::PathNotIs) => !re.is_match(&directory(path)),

            (Condition::Time(at), predicate) => match predicate {
                Predicate::AccessedAfter => later(meta.and_then(|m| m.accessed), at),
                Predicate::AccessedBefore => earlier(meta.and_then(|m| m.accessed), at),
                Predicate::ChangedAfter => later(meta.and_then(|m| m.changed), at),
                Predicate::ChangedBefore => earlier(meta.and_then(|m| m.changed), at),
                Predicate::ModifiedAfter => later(meta.and_then(|m| m.modified), at),
                Predicate::ModifiedBefore => earlier(meta.and_then(|m| m.modified), at),
                _ => false,
            },

            (Condition::Mode(mode), Predicate::Permissions) => meta
                .and_then(FileMeta::permissions_octal)
                .is_some_and(|actual| actual == *mode),

            (Condition::Names(names), Predicate::Owner) => meta
                .and_then(|m| m.owner.as_ref())
                .is_some_and(|owner| names.contains(owner)),
            (Condition::Names(names), Predicate::Group) => meta
                .and_then(|m| m.group.as_ref())
                .is_some_and(|group| names.contains(group)),

            // `compile` never pairs a condition with a foreign predicate.
            _ => false,
        }
    }
}

fn later(file_time: Option<DateTime<Utc>>, rule_time: &DateTime<Utc>) -> bool {
    file_time.is_some_and(|t| t > *rule_time)
}

fn earlier(file_time: Option<DateTime<Utc>>, rule_time: &DateTime<Utc>) -> bool {
    file_time.is_some_and(|t| t < *rule_time)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Containing directory with a trailing separator, e.g. `/archive/`.
fn directory(path: &Path) -> String {
    let mut dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_string_lossy().into_owned(),
        _ => ".".to_string(),
    };
    if !dir.ends_with('/') {
        dir.push('/');
    }
    dir
}

/// Parse a policy date literal.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`,
/// `YYYY-MM-DD` and `@<unix seconds>`. Literals without an offset are
/// local time.
#[must_use]
pub fn parse_datetime(literal: &str) -> Option<DateTime<Utc>> {
    let literal = literal.trim();

    if let Some(secs) = literal.strip_prefix('@') {
        return secs
            .parse::<i64>()
            .ok()
            .and_then(|s| DateTime::from_timestamp(s, 0));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(literal) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(literal, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(literal, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Normalize `644`, `0644` or `0o644` to three octal digits.
#[must_use]
pub fn normalize_permissions(value: &str) -> Option<String> {
    let value = value.trim();
    let digits = value
        .strip_prefix("0o")
        .or_else(|| value.strip_prefix('0').filter(|rest| rest.len() == 3))
        .unwrap_or(value);

    (digits.len() == 3 && digits.chars().all(|c| ('0'..='7').contains(&c)))
        .then(|| digits.to_string())
}
