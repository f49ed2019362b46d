//! Group store
//!
//! In-memory registry of groups by name, owning the configured default
//! group. Definitions are validated here (unknown parents, duplicates,
//! inheritance cycles) before any group can reach a resolver.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{PermsError, PermsResult};
use crate::group::Group;

/// Declarative group definition, as read from configuration.
///
/// # Examples
///
/// ```
/// use perms_model::store::GroupDefinition;
///
/// let def: GroupDefinition = serde_json::from_str(
///     r#"{"name": "staff", "parents": ["default"], "permissions": ["kick", "-build"]}"#,
/// ).unwrap();
/// assert_eq!(def.parents, vec!["default"]);
/// assert!(def.prefix.is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupDefinition {
    /// Group name
    pub name: String,

    /// Parent group names, in inheritance order
    #[serde(default)]
    pub parents: Vec<String>,

    /// Raw permission entries
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Display prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Display suffix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

impl GroupDefinition {
    /// Creates an empty definition for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a parent group name.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(parent.into());
        self
    }

    /// Add a raw permission entry.
    pub fn with_permission(mut self, raw: impl Into<String>) -> Self {
        self.permissions.push(raw.into());
        self
    }

    /// Snapshot a live group back into a definition.
    pub fn from_group(group: &Group) -> Self {
        Self {
            name: group.name().to_string(),
            parents: group.parents().iter().map(|p| p.name().to_string()).collect(),
            permissions: group.permissions(),
            prefix: group.prefix(),
            suffix: group.suffix(),
        }
    }
}

/// Registry of groups keyed by name.
pub struct GroupStore {
    groups: RwLock<HashMap<String, Arc<Group>>>,
    default_group: Arc<Group>,
}

impl GroupStore {
    /// Create a store holding only an empty default group.
    pub fn new(default_group: impl Into<String>) -> Self {
        let default_group = Arc::new(Group::new(default_group));
        let mut groups = HashMap::new();
        groups.insert(default_group.name().to_string(), default_group.clone());

        Self {
            groups: RwLock::new(groups),
            default_group,
        }
    }

    /// Build a store from definitions.
    ///
    /// All groups are created first, then parent edges are linked in
    /// definition order.
    ///
    /// # Errors
    ///
    /// - `DuplicateGroup` if two definitions share a name
    /// - `DefaultGroupMissing` if `default_group` is not defined
    /// - `UnknownGroup` if a parent name is not defined
    /// - `InheritanceCycle` if the parent edges form a cycle
    pub fn from_definitions(default_group: &str, definitions: &[GroupDefinition]) -> PermsResult<Self> {
        let mut groups: HashMap<String, Arc<Group>> = HashMap::with_capacity(definitions.len());

        for def in definitions {
            if groups.contains_key(&def.name) {
                return Err(PermsError::DuplicateGroup(def.name.clone()));
            }
            let group = Group::new(def.name.clone());
            for raw in &def.permissions {
                group.add_permission(raw.clone());
            }
            group.set_prefix(def.prefix.clone());
            group.set_suffix(def.suffix.clone());
            groups.insert(def.name.clone(), Arc::new(group));
        }

        let default = groups
            .get(default_group)
            .cloned()
            .ok_or_else(|| PermsError::DefaultGroupMissing(default_group.to_string()))?;

        for def in definitions {
            let child = &groups[&def.name];
            for parent_name in &def.parents {
                let parent = groups
                    .get(parent_name)
                    .cloned()
                    .ok_or_else(|| PermsError::UnknownGroup(parent_name.clone()))?;
                child.add_parent(parent)?;
            }
        }

        tracing::debug!(
            groups = groups.len(),
            default_group = %default_group,
            "Group store built from definitions"
        );

        Ok(Self {
            groups: RwLock::new(groups),
            default_group: default,
        })
    }

    /// Build a store from a JSON array of [`GroupDefinition`]s.
    pub fn from_json(default_group: &str, json: &str) -> PermsResult<Self> {
        let definitions: Vec<GroupDefinition> = serde_json::from_str(json)?;
        Self::from_definitions(default_group, &definitions)
    }

    /// The group every new subject starts in.
    pub fn default_group(&self) -> Arc<Group> {
        self.default_group.clone()
    }

    /// Check whether `group` is the default group.
    pub fn is_default_group(&self, group: &Group) -> bool {
        *group == *self.default_group
    }

    /// Look up a group by name.
    pub fn get(&self, name: &str) -> Option<Arc<Group>> {
        self.groups.read().get(name).cloned()
    }

    /// Look up a group, creating an empty one if missing.
    pub fn get_or_create(&self, name: &str) -> Arc<Group> {
        if let Some(group) = self.get(name) {
            return group;
        }
        self.groups
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Group::new(name)))
            .clone()
    }

    /// Insert a new group.
    ///
    /// # Errors
    ///
    /// `DuplicateGroup` if a group with the same name exists
    pub fn insert(&self, group: Group) -> PermsResult<Arc<Group>> {
        let mut groups = self.groups.write();
        if groups.contains_key(group.name()) {
            return Err(PermsError::DuplicateGroup(group.name().to_string()));
        }
        let group = Arc::new(group);
        groups.insert(group.name().to_string(), group.clone());
        Ok(group)
    }

    /// Add a parent edge between two stored groups.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the edge was added, `Ok(false)` if it already existed
    pub fn link(&self, child: &str, parent: &str) -> PermsResult<bool> {
        let child_group = self.get(child).ok_or_else(|| PermsError::UnknownGroup(child.to_string()))?;
        let parent_group = self.get(parent).ok_or_else(|| PermsError::UnknownGroup(parent.to_string()))?;

        child_group.add_parent(parent_group)
    }

    /// Remove a parent edge between two stored groups.
    pub fn unlink(&self, child: &str, parent: &str) -> PermsResult<bool> {
        let child_group = self.get(child).ok_or_else(|| PermsError::UnknownGroup(child.to_string()))?;
        Ok(child_group.remove_parent(parent))
    }

    /// Names of all stored groups, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Snapshot all groups back into definitions, sorted by name.
    pub fn definitions(&self) -> Vec<GroupDefinition> {
        let mut defs: Vec<GroupDefinition> = self
            .groups
            .read()
            .values()
            .map(|g| GroupDefinition::from_group(g))
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }
}

impl std::fmt::Debug for GroupStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupStore")
            .field("default_group", &self.default_group.name())
            .field("groups", &self.len())
            .finish()
    }
}
