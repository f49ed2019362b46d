//! # Permission Entries
//!
//! A permission entry is a flat permission node plus a grant/revoke flag.
//! Entries are stored in their raw form (`"node"` grants, `"-node"`
//! revokes) and folded into an [`EffectivePermissions`] map by the
//! resolver.

use serde::{Deserialize, Serialize};
use std::collections::hash_map;
use std::collections::HashMap;
use std::fmt;

/// Prefix marking a revoked entry in raw form.
pub const NEGATION_PREFIX: char = '-';

/// A single parsed permission entry.
///
/// # Example
///
/// ```
/// use perms_model::entry::PermissionEntry;
///
/// let entry = PermissionEntry::parse("-build.use");
/// assert_eq!(entry.node, "build.use");
/// assert!(!entry.granted);
/// assert_eq!(entry.to_string(), "-build.use");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PermissionEntry {
    /// The permission node, without any negation marker.
    pub node: String,
    /// `true` grants the node, `false` explicitly revokes it.
    pub granted: bool,
}

impl PermissionEntry {
    /// Create a granting entry.
    pub fn grant(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            granted: true,
        }
    }

    /// Create a revoking entry.
    pub fn revoke(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            granted: false,
        }
    }

    /// Parse a raw entry.
    ///
    /// Exactly one leading `-` is stripped and marks a revoke; anything
    /// else is a grant of the whole string.
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(NEGATION_PREFIX) {
            Some(node) => Self::revoke(node),
            None => Self::grant(raw),
        }
    }
}

impl fmt::Display for PermissionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.granted {
            f.write_str(&self.node)
        } else {
            write!(f, "{}{}", NEGATION_PREFIX, self.node)
        }
    }
}

impl From<&str> for PermissionEntry {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

/// Flattened permission map produced by the resolver.
///
/// `true` means granted, `false` means explicitly revoked; a missing node
/// means no source had an opinion on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectivePermissions {
    entries: HashMap<String, bool>,
}

impl EffectivePermissions {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Apply a parsed entry, overwriting any earlier value for its node.
    pub fn apply(&mut self, entry: &PermissionEntry) {
        self.entries.insert(entry.node.clone(), entry.granted);
    }

    /// Parse and apply a raw entry.
    pub fn apply_raw(&mut self, raw: &str) {
        self.apply(&PermissionEntry::parse(raw));
    }

    /// Value stored for a node, if any source mentioned it.
    pub fn get(&self, node: &str) -> Option<bool> {
        self.entries.get(node).copied()
    }

    /// Check whether a node is granted.
    pub fn is_granted(&self, node: &str) -> bool {
        self.get(node) == Some(true)
    }

    /// Check whether a node is explicitly revoked.
    pub fn is_revoked(&self, node: &str) -> bool {
        self.get(node) == Some(false)
    }

    /// Number of nodes with an opinion.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no node has an opinion.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(node, value)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.entries.iter().map(|(node, value)| (node.as_str(), *value))
    }
}

impl<'a> FromIterator<&'a str> for EffectivePermissions {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        let mut perms = EffectivePermissions::new();
        for raw in iter {
            perms.apply_raw(raw);
        }
        perms
    }
}

impl IntoIterator for EffectivePermissions {
    type Item = (String, bool);
    type IntoIter = hash_map::IntoIter<String, bool>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
