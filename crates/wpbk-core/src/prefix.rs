//! # Table Prefixes
//!
//! The host installation prepends a base prefix (for example `wp_`) to
//! every table it owns. Portable dumps replace it with an intermediate
//! prefix that no installation uses, so the dump can be replayed under a
//! different base prefix.
//!
//! Prefixes end up inside regular expressions and SQL `LIKE` patterns, so
//! they are restricted to the unquoted-identifier alphabet at construction.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A validated table prefix.
///
/// Holds only ASCII letters, digits, `_` and `$`. The empty prefix is
/// representable (identity mode for the intermediate prefix); use
/// [`TablePrefix::base`] where an empty value must be rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TablePrefix(pub(crate) String);

impl TablePrefix {
    /// Validate a prefix. Empty input is accepted.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        {
            return Err(ValidationError::InvalidPrefix(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Validate an installation base prefix, which may not be empty.
    pub fn base(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::EmptyBasePrefix);
        }
        Self::new(s)
    }

    /// Return the prefix as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty prefix.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Strip this prefix from `name`, if `name` starts with it.
    pub fn strip<'a>(&self, name: &'a str) -> Option<&'a str> {
        name.strip_prefix(self.0.as_str())
    }
}

impl std::fmt::Display for TablePrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TablePrefix {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<TablePrefix> for String {
    fn from(value: TablePrefix) -> Self {
        value.0
    }
}

impl PartialEq<str> for TablePrefix {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TablePrefix {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_conventional_prefixes() {
        for p in ["wp_", "wp2_", "LIVE_", "site$1_", ""] {
            assert!(TablePrefix::new(p).is_ok(), "{p:?} should be accepted");
        }
    }

    #[test]
    fn rejects_sql_metacharacters() {
        for p in ["wp-", "wp_`", "wp_'; --", "wp %", "préfixe_"] {
            assert_eq!(
                TablePrefix::new(p),
                Err(ValidationError::InvalidPrefix(p.to_string()))
            );
        }
    }

    #[test]
    fn base_prefix_must_not_be_empty() {
        assert_eq!(TablePrefix::base(""), Err(ValidationError::EmptyBasePrefix));
        assert_eq!(TablePrefix::base("wp_").unwrap(), "wp_");
    }

    #[test]
    fn strip_only_matches_leading_prefix() {
        let p = TablePrefix::new("wp_").unwrap();
        assert_eq!(p.strip("wp_posts"), Some("posts"));
        assert_eq!(p.strip("xwp_posts"), None);
        assert_eq!(p.strip("wp_"), Some(""));
    }

    #[test]
    fn serde_rejects_invalid_prefix() {
        let ok: TablePrefix = serde_yaml::from_str("wp_").unwrap();
        assert_eq!(ok, "wp_");
        assert!(serde_yaml::from_str::<TablePrefix>("\"wp-\"").is_err());
    }
}
