//! Default seeding applied to new subjects.

use perms_model::PermsConfig;
use serde::{Deserialize, Serialize};

use crate::subject::{Recalculate, Subject};

/// Populates a freshly constructed subject before its first
/// recalculation.
///
/// Implementations should mutate with [`Recalculate::Deferred`]; the
/// constructor rebuilds the cache once seeding returns.
pub trait DefaultSeeder: Send + Sync {
    fn seed(&self, subject: &Subject);
}

/// Seed state read from configuration.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use perms_model::GroupStore;
/// use perms_subject::{CachePublisher, DefaultPermissions, Subject};
/// use uuid::Uuid;
///
/// let store = Arc::new(GroupStore::new("default"));
/// let seed = DefaultPermissions::new().with_permission("spawn.use");
///
/// let subject = Subject::with_seeder(Uuid::now_v7(), store, CachePublisher::disabled(), &seed);
/// assert!(subject.has_permission("spawn.use"));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DefaultPermissions {
    /// Sub group names to add
    #[serde(default)]
    pub sub_groups: Vec<String>,

    /// Raw permission entries to add
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl DefaultPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the seed lists from the resolver configuration.
    pub fn from_config(config: &PermsConfig) -> Self {
        Self {
            sub_groups: config.default_sub_groups.clone(),
            permissions: config.default_permissions.clone(),
        }
    }

    pub fn with_sub_group(mut self, name: impl Into<String>) -> Self {
        self.sub_groups.push(name.into());
        self
    }

    pub fn with_permission(mut self, raw: impl Into<String>) -> Self {
        self.permissions.push(raw.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sub_groups.is_empty() && self.permissions.is_empty()
    }
}

impl DefaultSeeder for DefaultPermissions {
    fn seed(&self, subject: &Subject) {
        for name in &self.sub_groups {
            match subject.store().get(name) {
                Some(group) => {
                    subject.add_sub_group_with(group, Recalculate::Deferred);
                }
                None => {
                    tracing::warn!(
                        subject_id = %subject.id(),
                        group = %name,
                        "Skipping unknown default sub group"
                    );
                }
            }
        }
        for raw in &self.permissions {
            subject.add_additional_permission_with(raw.clone(), Recalculate::Deferred);
        }
    }
}
