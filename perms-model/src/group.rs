//! # Groups
//!
//! A group is a named bundle of raw permission entries plus display
//! metadata. Groups inherit from parent groups, forming a directed acyclic
//! graph. Equality and hashing are by name only.

use parking_lot::{const_mutex, Mutex, RwLock};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{PermsError, PermsResult};

/// Held across the reachability check and the insert of every parent
/// edge, so two opposite edges cannot both pass the check.
static EDGE_LOCK: Mutex<()> = const_mutex(());

/// Mutable part of a group.
#[derive(Default)]
struct GroupState {
    parents: Vec<Arc<Group>>,
    permissions: Vec<String>,
    prefix: Option<String>,
    suffix: Option<String>,
}

/// A named, inheritable permission group.
///
/// Groups are shared as `Arc<Group>` between subjects and the group store,
/// so all mutable state sits behind an internal lock. Accessors return
/// snapshots.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use perms_model::group::Group;
///
/// let base = Arc::new(Group::new("base"));
/// let staff = Arc::new(Group::new("staff"));
/// staff.add_parent(base.clone()).unwrap();
/// staff.add_permission("kick");
///
/// assert!(staff.inherits_from("base"));
/// assert!(base.add_parent(staff.clone()).is_err()); // would be a cycle
/// ```
pub struct Group {
    name: String,
    state: RwLock<GroupState>,
}

impl Group {
    /// Create an empty group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(GroupState::default()),
        }
    }

    /// Get the group name (its identity).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a parent group.
    ///
    /// Rejects an edge to the group itself and any edge whose parent
    /// already inherits, directly or transitively, from this group. Edge
    /// insertions are serialized process-wide.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the edge was added, `Ok(false)` if it already existed
    pub fn add_parent(&self, parent: Arc<Group>) -> PermsResult<bool> {
        let _edge = EDGE_LOCK.lock();
        if parent.name == self.name || parent.inherits_from(&self.name) {
            return Err(PermsError::InheritanceCycle {
                group: self.name.clone(),
                parent: parent.name.clone(),
            });
        }

        let mut state = self.state.write();
        if state.parents.iter().any(|p| p.name == parent.name) {
            return Ok(false);
        }
        state.parents.push(parent);
        Ok(true)
    }

    /// Remove a parent group by name.
    pub fn remove_parent(&self, name: &str) -> bool {
        let mut state = self.state.write();
        let before = state.parents.len();
        state.parents.retain(|p| p.name != name);
        state.parents.len() != before
    }

    /// Check for a direct parent edge.
    pub fn has_parent(&self, name: &str) -> bool {
        self.state.read().parents.iter().any(|p| p.name == name)
    }

    /// Snapshot of the direct parents, in insertion order.
    pub fn parents(&self) -> Vec<Arc<Group>> {
        self.state.read().parents.clone()
    }

    /// Check whether `name` is reachable through parent edges.
    pub fn inherits_from(&self, name: &str) -> bool {
        let mut visited = HashSet::new();
        let mut stack = self.parents();

        while let Some(group) = stack.pop() {
            if group.name == name {
                return true;
            }
            if visited.insert(group.name.clone()) {
                stack.extend(group.parents());
            }
        }

        false
    }

    /// Append a raw permission entry.
    ///
    /// # Returns
    ///
    /// `false` if the exact raw entry was already present
    pub fn add_permission(&self, raw: impl Into<String>) -> bool {
        let raw = raw.into();
        let mut state = self.state.write();
        if state.permissions.contains(&raw) {
            return false;
        }
        state.permissions.push(raw);
        true
    }

    /// Remove a raw permission entry.
    pub fn remove_permission(&self, raw: &str) -> bool {
        let mut state = self.state.write();
        let before = state.permissions.len();
        state.permissions.retain(|p| p != raw);
        state.permissions.len() != before
    }

    /// Snapshot of the raw permission entries, in stored order.
    pub fn permissions(&self) -> Vec<String> {
        self.state.read().permissions.clone()
    }

    /// Run `f` over the raw entries without copying them.
    pub fn for_each_permission(&self, mut f: impl FnMut(&str)) {
        for raw in self.state.read().permissions.iter() {
            f(raw);
        }
    }

    pub fn prefix(&self) -> Option<String> {
        self.state.read().prefix.clone()
    }

    pub fn set_prefix(&self, prefix: Option<String>) {
        self.state.write().prefix = prefix;
    }

    pub fn suffix(&self) -> Option<String> {
        self.state.read().suffix.clone()
    }

    pub fn set_suffix(&self, suffix: Option<String>) {
        self.state.write().suffix = suffix;
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Group {}

impl Hash for Group {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        let parents: Vec<&str> = state.parents.iter().map(|p| p.name()).collect();
        f.debug_struct("Group")
            .field("name", &self.name)
            .field("parents", &parents)
            .field("permissions", &state.permissions)
            .field("prefix", &state.prefix)
            .field("suffix", &state.suffix)
            .finish()
    }
}
