//! Resolver configuration.
//!
//! Names the default group and the seed state applied to new subjects.
//! Configuration is loaded from environment variables with defaults
//! suitable for a single-server setup.

use serde::{Deserialize, Serialize};

use crate::error::{PermsError, PermsResult};
use crate::store::GroupStore;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermsConfig {
    /// Name of the group every new subject starts in.
    pub default_group: String,

    /// Sub groups added to every new subject.
    #[serde(default)]
    pub default_sub_groups: Vec<String>,

    /// Raw permission entries added to every new subject.
    #[serde(default)]
    pub default_permissions: Vec<String>,
}

impl Default for PermsConfig {
    fn default() -> Self {
        Self {
            default_group: "default".to_string(),
            default_sub_groups: Vec::new(),
            default_permissions: Vec::new(),
        }
    }
}

impl PermsConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PERMS_DEFAULT_GROUP`: default group name (default: default)
    /// - `PERMS_DEFAULT_SUB_GROUPS`: comma-separated seed sub groups
    /// - `PERMS_DEFAULT_PERMISSIONS`: comma-separated seed permissions
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            default_group: std::env::var("PERMS_DEFAULT_GROUP").unwrap_or(default.default_group),
            default_sub_groups: std::env::var("PERMS_DEFAULT_SUB_GROUPS")
                .map(|s| parse_list(&s))
                .unwrap_or(default.default_sub_groups),
            default_permissions: std::env::var("PERMS_DEFAULT_PERMISSIONS")
                .map(|s| parse_list(&s))
                .unwrap_or(default.default_permissions),
        }
    }

    /// Check the configuration is usable on its own.
    pub fn validate(&self) -> PermsResult<()> {
        if self.default_group.trim().is_empty() {
            return Err(PermsError::Config("default_group must not be empty".to_string()));
        }
        if self.default_permissions.iter().any(|p| p.is_empty() || p == "-") {
            return Err(PermsError::Config(
                "default_permissions contains an empty entry".to_string(),
            ));
        }
        Ok(())
    }

    /// Check every group the configuration names exists in `store`.
    pub fn validate_against(&self, store: &GroupStore) -> PermsResult<()> {
        self.validate()?;
        if store.default_group().name() != self.default_group {
            return Err(PermsError::DefaultGroupMissing(self.default_group.clone()));
        }
        for name in &self.default_sub_groups {
            if store.get(name).is_none() {
                return Err(PermsError::UnknownGroup(name.clone()));
            }
        }
        Ok(())
    }
}

/// Split a comma-separated list, dropping blanks.
fn parse_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
