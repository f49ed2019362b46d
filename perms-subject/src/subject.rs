//! Subject domain model
//!
//! A subject is an identity (usually a player) with a main group, sub
//! groups, subject-level permission overrides and display overrides. It
//! caches its effective permissions and guards that cache together with
//! the fields feeding it behind one reader/writer lock.

use parking_lot::{RwLock, RwLockReadGuard};
use perms_model::{resolve, EffectivePermissions, Group, GroupStore};
use std::fmt;
use std::sync::{Arc, Weak};
use uuid::Uuid;

use crate::publisher::CachePublisher;
use crate::seeding::DefaultSeeder;
use crate::view::EffectivePermissionsView;

/// Whether a mutation rebuilds the permission cache immediately.
///
/// `Deferred` is for batching several mutations; finish the batch with
/// [`Subject::recalculate_permissions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Recalculate {
    /// Rebuild the cache and notify the runtime bridge.
    #[default]
    Now,
    /// Only mutate; the cache keeps its previous contents.
    Deferred,
}

/// Everything guarded by the subject lock.
struct SubjectState {
    main_group: Arc<Group>,
    sub_groups: Vec<Arc<Group>>,
    additional: Vec<String>,
    prefix: Option<String>,
    suffix: Option<String>,
    last_name: Option<String>,
    effective: EffectivePermissions,
}

impl SubjectState {
    fn rebuild(&mut self) {
        self.effective = resolve(&self.main_group, &self.sub_groups, &self.additional);
    }
}

/// A subject with a cached effective-permission map.
///
/// Subjects are always handed out as `Arc<Subject>` so that a deferred
/// runtime refresh can find them again later.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use perms_model::GroupStore;
/// use perms_subject::{CachePublisher, Subject};
/// use uuid::Uuid;
///
/// let store = Arc::new(GroupStore::new("default"));
/// store.default_group().add_permission("chat");
///
/// let subject = Subject::new(Uuid::now_v7(), store, CachePublisher::disabled());
/// assert!(subject.is_default());
/// assert!(subject.has_permission("chat"));
///
/// subject.add_additional_permission("-chat");
/// assert_eq!(subject.permission_value("chat"), Some(false));
/// assert!(!subject.is_default());
/// ```
pub struct Subject {
    id: Uuid,
    me: Weak<Subject>,
    store: Arc<GroupStore>,
    publisher: CachePublisher,
    state: RwLock<SubjectState>,
}

impl Subject {
    /// Creates a subject in the default group without seeding.
    pub fn new(id: Uuid, store: Arc<GroupStore>, publisher: CachePublisher) -> Arc<Self> {
        Self::create(id, store, publisher, None)
    }

    /// Creates a subject and applies `seeder` before the first
    /// recalculation.
    pub fn with_seeder(
        id: Uuid,
        store: Arc<GroupStore>,
        publisher: CachePublisher,
        seeder: &dyn DefaultSeeder,
    ) -> Arc<Self> {
        Self::create(id, store, publisher, Some(seeder))
    }

    fn create(
        id: Uuid,
        store: Arc<GroupStore>,
        publisher: CachePublisher,
        seeder: Option<&dyn DefaultSeeder>,
    ) -> Arc<Self> {
        let subject = Arc::new_cyclic(|me| Self {
            id,
            me: me.clone(),
            state: RwLock::new(SubjectState {
                main_group: store.default_group(),
                sub_groups: Vec::new(),
                additional: Vec::new(),
                prefix: None,
                suffix: None,
                last_name: None,
                effective: EffectivePermissions::new(),
            }),
            store,
            publisher,
        });

        if let Some(seeder) = seeder {
            seeder.seed(&subject);
        }
        // No live session can exist yet, so the first build is not published.
        subject.state.write().rebuild();

        subject
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The group store this subject resolves default groups against.
    pub fn store(&self) -> &Arc<GroupStore> {
        &self.store
    }

    pub(crate) fn downgrade(&self) -> Weak<Subject> {
        self.me.clone()
    }

    /// Check whether the subject carries nothing beyond the defaults and
    /// so does not need to be persisted.
    pub fn is_default(&self) -> bool {
        let state = self.state.read();
        self.store.is_default_group(&state.main_group)
            && state.sub_groups.is_empty()
            && state.additional.is_empty()
            && state.prefix.is_none()
            && state.suffix.is_none()
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Apply `f` under the exclusive lock, rebuild if requested, then
    /// publish once the lock is released.
    fn mutate<R>(&self, recalculate: Recalculate, f: impl FnOnce(&mut SubjectState) -> R) -> R {
        let result = {
            let mut state = self.state.write();
            let result = f(&mut state);
            if recalculate == Recalculate::Now {
                state.rebuild();
            }
            result
        };

        if recalculate == Recalculate::Now {
            tracing::debug!(subject_id = %self.id, "Subject permissions recalculated");
            self.publisher.publish(self);
        }
        result
    }

    /// Rebuild the permission cache from the current state.
    pub fn recalculate_permissions(&self) {
        self.mutate(Recalculate::Now, |_| ());
    }

    /// Publish the cached permissions again without rebuilding them.
    ///
    /// Goes through the publisher like any recalculation, so the refresh
    /// runs on the designated context.
    pub fn republish(&self) {
        self.publisher.publish(self);
    }

    /// Set the main group and recalculate.
    pub fn set_main_group(&self, group: Arc<Group>) {
        self.set_main_group_with(group, Recalculate::Now);
    }

    pub fn set_main_group_with(&self, group: Arc<Group>, recalculate: Recalculate) {
        self.mutate(recalculate, |state| state.main_group = group);
    }

    /// Add a sub group and recalculate.
    ///
    /// # Returns
    ///
    /// `false` if the group was already a sub group
    pub fn add_sub_group(&self, group: Arc<Group>) -> bool {
        self.add_sub_group_with(group, Recalculate::Now)
    }

    pub fn add_sub_group_with(&self, group: Arc<Group>, recalculate: Recalculate) -> bool {
        self.mutate(recalculate, |state| {
            if state.sub_groups.iter().any(|g| **g == *group) {
                return false;
            }
            state.sub_groups.push(group);
            true
        })
    }

    /// Remove a sub group and recalculate.
    pub fn remove_sub_group(&self, group: &Group) -> bool {
        self.remove_sub_group_with(group, Recalculate::Now)
    }

    pub fn remove_sub_group_with(&self, group: &Group, recalculate: Recalculate) -> bool {
        self.mutate(recalculate, |state| {
            let before = state.sub_groups.len();
            state.sub_groups.retain(|g| **g != *group);
            state.sub_groups.len() != before
        })
    }

    /// Add a subject-level raw permission entry and recalculate.
    pub fn add_additional_permission(&self, raw: impl Into<String>) -> bool {
        self.add_additional_permission_with(raw, Recalculate::Now)
    }

    pub fn add_additional_permission_with(&self, raw: impl Into<String>, recalculate: Recalculate) -> bool {
        let raw = raw.into();
        self.mutate(recalculate, |state| {
            if state.additional.contains(&raw) {
                return false;
            }
            state.additional.push(raw);
            true
        })
    }

    /// Remove a subject-level raw permission entry and recalculate.
    pub fn remove_additional_permission(&self, raw: &str) -> bool {
        self.remove_additional_permission_with(raw, Recalculate::Now)
    }

    pub fn remove_additional_permission_with(&self, raw: &str, recalculate: Recalculate) -> bool {
        self.mutate(recalculate, |state| {
            let before = state.additional.len();
            state.additional.retain(|p| p != raw);
            state.additional.len() != before
        })
    }

    /// Set or clear the prefix override. Display only; never recalculates.
    pub fn set_prefix(&self, prefix: Option<String>) {
        self.mutate(Recalculate::Deferred, |state| state.prefix = prefix);
    }

    /// Set or clear the suffix override. Display only; never recalculates.
    pub fn set_suffix(&self, suffix: Option<String>) {
        self.mutate(Recalculate::Deferred, |state| state.suffix = suffix);
    }

    /// Record the last known display name.
    pub fn set_last_name(&self, name: Option<String>) {
        self.mutate(Recalculate::Deferred, |state| state.last_name = name);
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn main_group(&self) -> Arc<Group> {
        self.state.read().main_group.clone()
    }

    pub fn has_sub_group(&self, group: &Group) -> bool {
        self.state.read().sub_groups.iter().any(|g| **g == *group)
    }

    /// Snapshot of the sub groups, in insertion order.
    pub fn sub_groups(&self) -> Vec<Arc<Group>> {
        self.state.read().sub_groups.clone()
    }

    pub fn has_additional_permission(&self, raw: &str) -> bool {
        self.state.read().additional.iter().any(|p| p == raw)
    }

    /// Snapshot of the subject-level raw entries, in insertion order.
    pub fn additional_permissions(&self) -> Vec<String> {
        self.state.read().additional.clone()
    }

    /// The prefix override, falling back to the main group's prefix.
    pub fn prefix(&self) -> Option<String> {
        let state = self.state.read();
        state.prefix.clone().or_else(|| state.main_group.prefix())
    }

    /// The suffix override, falling back to the main group's suffix.
    pub fn suffix(&self) -> Option<String> {
        let state = self.state.read();
        state.suffix.clone().or_else(|| state.main_group.suffix())
    }

    pub fn last_name(&self) -> Option<String> {
        self.state.read().last_name.clone()
    }

    /// Independent copy of the cached effective permissions.
    pub fn effective_permissions(&self) -> EffectivePermissions {
        self.state.read().effective.clone()
    }

    /// Non-copying view of the cached effective permissions.
    ///
    /// The view keeps this subject's shared lock held until released;
    /// mutations of this subject block until then.
    pub fn direct_effective_permissions(&self) -> EffectivePermissionsView<'_> {
        EffectivePermissionsView::new(RwLockReadGuard::map(self.state.read(), |state| &state.effective))
    }

    /// Cached value for one node: granted, revoked, or no opinion.
    pub fn permission_value(&self, node: &str) -> Option<bool> {
        self.state.read().effective.get(node)
    }

    /// Check whether one node is granted.
    pub fn has_permission(&self, node: &str) -> bool {
        self.state.read().effective.is_granted(node)
    }

    /// Check whether the subject's main or sub groups are, or inherit
    /// from, the named group.
    pub fn is_member_of(&self, group_name: &str) -> bool {
        let state = self.state.read();
        std::iter::once(&state.main_group)
            .chain(state.sub_groups.iter())
            .any(|g| g.name() == group_name || g.inherits_from(group_name))
    }
}

impl fmt::Debug for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        let sub_groups: Vec<&str> = state.sub_groups.iter().map(|g| g.name()).collect();
        f.debug_struct("Subject")
            .field("id", &self.id)
            .field("main_group", &state.main_group.name())
            .field("sub_groups", &sub_groups)
            .field("additional", &state.additional)
            .field("prefix", &state.prefix)
            .field("suffix", &state.suffix)
            .field("effective", &state.effective.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perms_model::GroupDefinition;

    fn store() -> Arc<GroupStore> {
        Arc::new(
            GroupStore::from_definitions(
                "default",
                &[
                    GroupDefinition::new("default").with_permission("chat"),
                    GroupDefinition::new("a").with_permission("p"),
                    GroupDefinition::new("b").with_parent("a").with_permission("-p"),
                    GroupDefinition::new("c").with_parent("b").with_permission("p"),
                    GroupDefinition::new("g").with_permission("x"),
                    GroupDefinition::new("builder").with_permission("build.use"),
                    GroupDefinition::new("jailed").with_permission("-build.use"),
                ],
            )
            .unwrap(),
        )
    }

    fn subject(store: &Arc<GroupStore>) -> Arc<Subject> {
        Subject::new(Uuid::now_v7(), store.clone(), CachePublisher::disabled())
    }

    #[test]
    fn test_new_subject_is_default() {
        let store = store();
        let subject = subject(&store);
        assert!(subject.is_default());
        assert_eq!(subject.main_group().name(), "default");
        assert!(subject.has_permission("chat"));
    }

    #[test]
    fn test_is_default_round_trips() {
        let store = store();
        let s = subject(&store);
        let g = store.get("g").unwrap();

        s.set_main_group(g.clone());
        assert!(!s.is_default());
        s.set_main_group(store.default_group());
        assert!(s.is_default());

        s.add_sub_group(g.clone());
        assert!(!s.is_default());
        s.remove_sub_group(&g);
        assert!(s.is_default());

        s.add_additional_permission("fly");
        assert!(!s.is_default());
        s.remove_additional_permission("fly");
        assert!(s.is_default());

        s.set_prefix(Some("[x]".to_string()));
        assert!(!s.is_default());
        s.set_prefix(None);
        assert!(s.is_default());

        s.set_suffix(Some("!".to_string()));
        assert!(!s.is_default());
        s.set_suffix(None);
        assert!(s.is_default());

        s.set_last_name(Some("Notch".to_string()));
        assert!(s.is_default());
    }

    #[test]
    fn test_subject_override_wins() {
        let store = store();
        let s = subject(&store);
        s.set_main_group_with(store.get("g").unwrap(), Recalculate::Deferred);
        s.add_additional_permission("-x");
        assert_eq!(s.effective_permissions().get("x"), Some(false));
    }

    #[test]
    fn test_ancestor_chain() {
        let store = store();
        let s = subject(&store);
        s.set_main_group(store.get("c").unwrap());
        assert_eq!(s.permission_value("p"), Some(true));

        s.set_main_group(store.get("b").unwrap());
        assert_eq!(s.permission_value("p"), Some(false));
    }

    #[test]
    fn test_recalculate_is_idempotent() {
        let store = store();
        let s = subject(&store);
        s.add_sub_group(store.get("c").unwrap());
        s.add_additional_permission("-chat");

        s.recalculate_permissions();
        let first = s.effective_permissions();
        s.recalculate_permissions();
        assert_eq!(first, s.effective_permissions());
    }

    #[test]
    fn test_additional_round_trip_leaves_no_residue() {
        let store = store();
        let s = subject(&store);
        assert!(s.add_additional_permission("a"));
        assert_eq!(s.permission_value("a"), Some(true));
        assert!(s.remove_additional_permission_with("a", Recalculate::Now));
        assert_eq!(s.permission_value("a"), None);

        s.add_additional_permission("-chat");
        s.remove_additional_permission("-chat");
        assert_eq!(s.permission_value("chat"), Some(true));
    }

    #[test]
    fn test_deferred_leaves_cache_untouched() {
        let store = store();
        let s = subject(&store);
        s.add_additional_permission_with("fly", Recalculate::Deferred);
        assert!(s.has_additional_permission("fly"));
        assert_eq!(s.permission_value("fly"), None);

        s.recalculate_permissions();
        assert_eq!(s.permission_value("fly"), Some(true));
    }

    #[test]
    fn test_set_semantics_are_silent() {
        let store = store();
        let s = subject(&store);
        let g = store.get("g").unwrap();
        assert!(s.add_sub_group(g.clone()));
        assert!(!s.add_sub_group(g.clone()));
        assert_eq!(s.sub_groups().len(), 1);
        assert!(s.has_sub_group(&g));

        assert!(!s.remove_additional_permission("missing"));
        assert!(s.add_additional_permission("fly"));
        assert!(!s.add_additional_permission("fly"));
        assert_eq!(s.additional_permissions(), vec!["fly"]);
    }

    #[test]
    fn test_negation_parsing_through_merge() {
        let store = store();
        let s = subject(&store);
        s.add_sub_group(store.get("builder").unwrap());
        assert_eq!(s.permission_value("build.use"), Some(true));

        s.add_sub_group(store.get("jailed").unwrap());
        assert_eq!(s.permission_value("build.use"), Some(false));
    }

    #[test]
    fn test_prefix_falls_back_to_main_group() {
        let store = store();
        let s = subject(&store);
        let g = store.get("g").unwrap();
        g.set_prefix(Some("[G] ".to_string()));
        g.set_suffix(Some(" g".to_string()));

        assert_eq!(s.prefix(), None);
        s.set_main_group(g);
        assert_eq!(s.prefix().as_deref(), Some("[G] "));
        assert_eq!(s.suffix().as_deref(), Some(" g"));

        s.set_prefix(Some("[Me] ".to_string()));
        assert_eq!(s.prefix().as_deref(), Some("[Me] "));
        assert_eq!(s.suffix().as_deref(), Some(" g"));
    }

    #[test]
    fn test_direct_view() {
        let store = store();
        let s = subject(&store);
        let view = s.direct_effective_permissions();
        assert!(view.is_granted("chat"));
        assert_eq!(view.len(), 1);
        view.release();

        s.add_additional_permission("fly");
        let view = s.direct_effective_permissions();
        assert!(view.is_granted("fly"));
    }

    #[test]
    fn test_is_member_of() {
        let store = store();
        let s = subject(&store);
        s.add_sub_group(store.get("c").unwrap());
        assert!(s.is_member_of("default"));
        assert!(s.is_member_of("c"));
        assert!(s.is_member_of("a"));
        assert!(!s.is_member_of("g"));
    }

    #[test]
    fn test_last_name() {
        let store = store();
        let s = subject(&store);
        assert_eq!(s.last_name(), None);
        s.set_last_name(Some("Steve".to_string()));
        assert_eq!(s.last_name().as_deref(), Some("Steve"));
    }
}
