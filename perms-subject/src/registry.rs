//! Subject registry
//!
//! Owns the live subjects of one host, keyed by id, together with the
//! group store, seeder and publisher every new subject is built with.

use parking_lot::RwLock;
use perms_model::GroupStore;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::publisher::CachePublisher;
use crate::seeding::DefaultSeeder;
use crate::subject::Subject;

/// Whether a new subject gets the default seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedPolicy {
    /// Run the configured seeder, if any
    #[default]
    Apply,
    /// Construct with nothing but the default group (e.g. when the caller
    /// is about to load stored state into the subject)
    Skip,
}

/// Concurrent map of live subjects.
pub struct SubjectRegistry {
    subjects: RwLock<HashMap<Uuid, Arc<Subject>>>,
    store: Arc<GroupStore>,
    publisher: CachePublisher,
    seeder: Option<Arc<dyn DefaultSeeder>>,
}

impl SubjectRegistry {
    /// Create an empty registry.
    pub fn new(store: Arc<GroupStore>, publisher: CachePublisher) -> Self {
        Self {
            subjects: RwLock::new(HashMap::new()),
            store,
            publisher,
            seeder: None,
        }
    }

    /// Seed every subject created with [`SeedPolicy::Apply`].
    pub fn with_seeder(mut self, seeder: Arc<dyn DefaultSeeder>) -> Self {
        self.seeder = Some(seeder);
        self
    }

    pub fn store(&self) -> &Arc<GroupStore> {
        &self.store
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<Subject>> {
        self.subjects.read().get(id).cloned()
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.subjects.read().contains_key(id)
    }

    /// Get a subject, creating a seeded one if missing.
    pub fn get_or_create(&self, id: Uuid) -> Arc<Subject> {
        if let Some(subject) = self.get(&id) {
            return subject;
        }

        let mut subjects = self.subjects.write();
        subjects
            .entry(id)
            .or_insert_with(|| self.build(id, SeedPolicy::Apply))
            .clone()
    }

    /// Create a subject, replacing any existing one with the same id.
    pub fn insert_with(&self, id: Uuid, policy: SeedPolicy) -> Arc<Subject> {
        let subject = self.build(id, policy);
        self.subjects.write().insert(id, subject.clone());
        subject
    }

    fn build(&self, id: Uuid, policy: SeedPolicy) -> Arc<Subject> {
        match (&self.seeder, policy) {
            (Some(seeder), SeedPolicy::Apply) => {
                Subject::with_seeder(id, self.store.clone(), self.publisher.clone(), seeder.as_ref())
            }
            _ => Subject::new(id, self.store.clone(), self.publisher.clone()),
        }
    }

    pub fn remove(&self, id: &Uuid) -> Option<Arc<Subject>> {
        self.subjects.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.subjects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.read().is_empty()
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.subjects.read().keys().copied().collect()
    }

    /// Snapshot of the registered subjects, so callers never hold the
    /// registry lock while touching a subject lock.
    fn snapshot(&self) -> Vec<Arc<Subject>> {
        self.subjects.read().values().cloned().collect()
    }

    /// Recalculate every subject, e.g. after a bulk group reload.
    pub fn recalculate_all(&self) -> usize {
        let subjects = self.snapshot();
        for subject in &subjects {
            subject.recalculate_permissions();
        }
        tracing::debug!(subjects = subjects.len(), "Recalculated all subjects");
        subjects.len()
    }

    /// Recalculate subjects whose groups are, or inherit from,
    /// `group_name`. Call after editing that group.
    pub fn recalculate_members(&self, group_name: &str) -> usize {
        let members: Vec<Arc<Subject>> = self
            .snapshot()
            .into_iter()
            .filter(|s| s.is_member_of(group_name))
            .collect();
        for subject in &members {
            subject.recalculate_permissions();
        }
        tracing::debug!(group = %group_name, subjects = members.len(), "Recalculated group members");
        members.len()
    }

    /// Drop subjects that carry nothing beyond the defaults.
    ///
    /// # Returns
    ///
    /// The ids of the dropped subjects
    pub fn prune_defaults(&self) -> Vec<Uuid> {
        let mut subjects = self.subjects.write();
        let pruned: Vec<Uuid> = subjects
            .iter()
            .filter(|(_, s)| s.is_default())
            .map(|(id, _)| *id)
            .collect();
        for id in &pruned {
            subjects.remove(id);
        }
        pruned
    }
}

impl fmt::Debug for SubjectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubjectRegistry")
            .field("subjects", &self.len())
            .field("publisher", &self.publisher)
            .field("seeded", &self.seeder.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeding::DefaultPermissions;
    use perms_model::GroupDefinition;

    fn registry() -> SubjectRegistry {
        let store = GroupStore::from_definitions(
            "default",
            &[
                GroupDefinition::new("default").with_permission("chat"),
                GroupDefinition::new("staff").with_parent("default").with_permission("kick"),
                GroupDefinition::new("admin").with_parent("staff"),
            ],
        )
        .unwrap();
        SubjectRegistry::new(Arc::new(store), CachePublisher::disabled())
    }

    #[test]
    fn test_get_or_create_is_stable() {
        let registry = registry();
        let id = Uuid::now_v7();
        let first = registry.get_or_create(id);
        let second = registry.get_or_create(id);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&id));
    }

    #[test]
    fn test_seed_policy() {
        let seed = DefaultPermissions::new().with_permission("home.set");
        let registry = registry().with_seeder(Arc::new(seed));

        let seeded = registry.insert_with(Uuid::now_v7(), SeedPolicy::Apply);
        assert!(seeded.has_permission("home.set"));

        let bare = registry.insert_with(Uuid::now_v7(), SeedPolicy::Skip);
        assert!(!bare.has_permission("home.set"));
        assert!(bare.is_default());
    }

    #[test]
    fn test_recalculate_members_after_group_edit() {
        let registry = registry();
        let store = registry.store().clone();

        let admin = registry.get_or_create(Uuid::now_v7());
        admin.set_main_group(store.get("admin").unwrap());
        let member = registry.get_or_create(Uuid::now_v7());

        store.get("staff").unwrap().add_permission("ban");
        assert!(!admin.has_permission("ban"));

        assert_eq!(registry.recalculate_members("staff"), 1);
        assert!(admin.has_permission("ban"));
        assert!(!member.has_permission("ban"));

        assert_eq!(registry.recalculate_all(), 2);
    }

    #[test]
    fn test_prune_defaults() {
        let registry = registry();
        let keep = registry.get_or_create(Uuid::now_v7());
        keep.add_additional_permission("fly");
        let drop_id = registry.get_or_create(Uuid::now_v7()).id();

        let pruned = registry.prune_defaults();
        assert_eq!(pruned, vec![drop_id]);
        assert_eq!(registry.ids(), vec![keep.id()]);
        assert!(registry.remove(&keep.id()).is_some());
        assert!(registry.is_empty());
    }
}
