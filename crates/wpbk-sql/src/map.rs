//! # Identifier Map
//!
//! Ordered key → target pairs. Keys are unique; inserting an existing key
//! replaces its target in place, so discovery order is kept.

use serde::ser::{Serialize, Serializer};

/// Mapping from a context-dependent key to a canonical target identifier.
///
/// In portable mode the key is the placeholder-prefixed name and the target
/// the live name (`LIVE_posts → wp_posts`). In identity mode both are the
/// live name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierMap {
    pairs: Vec<(String, String)>,
}

impl IdentifierMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair. An existing key keeps its position and takes the new
    /// target.
    pub fn insert(&mut self, key: impl Into<String>, target: impl Into<String>) {
        let key = key.into();
        let target = target.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = target,
            None => self.pairs.push((key, target)),
        }
    }

    /// Target for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All pairs in discovery order.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Iterate `(key, target)` in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when no pairs exist.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Serializes as an object whose keys appear in discovery order.
impl Serialize for IdentifierMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}
