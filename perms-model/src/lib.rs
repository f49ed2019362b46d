//! # Permission Model
//!
//! This crate provides the group model and the resolver that flattens a
//! subject's permission sources into one effective map.
//!
//! ## Overview
//!
//! The perms-model crate handles:
//! - **Entries**: Raw permission strings and their grant/revoke parsing
//! - **Groups**: Named, inheritable bundles of entries with display metadata
//! - **Group Store**: Validated registry of groups and the default group
//! - **Resolver**: The merge algorithm producing effective permissions
//!
//! ## Architecture
//!
//! ```text
//! Raw entry = ["-"] node
//!
//! Examples:
//!   "build.use"      - grant build.use
//!   "-build.use"     - revoke build.use
//!
//! Merge order (later wins):
//!   sub groups -> main group -> subject overrides
//!   (each group: ancestors first, then itself)
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use perms_model::{resolve, GroupDefinition, GroupStore};
//!
//! let store = GroupStore::from_definitions(
//!     "default",
//!     &[
//!         GroupDefinition::new("default").with_permission("chat"),
//!         GroupDefinition::new("staff").with_parent("default").with_permission("kick"),
//!     ],
//! ).unwrap();
//!
//! let staff = store.get("staff").unwrap();
//! let perms = resolve(&staff, &[], &["-chat".to_string()]);
//! assert!(perms.is_granted("kick"));
//! assert!(perms.is_revoked("chat"));
//! ```
//!
//! ## Inheritance Graph
//!
//! Parent edges must form a DAG. Edges are checked for reachability when
//! they are inserted, so a cycle is rejected with
//! [`PermsError::InheritanceCycle`] instead of reaching the resolver.

pub mod config;
pub mod entry;
pub mod error;
pub mod group;
pub mod resolver;
pub mod store;

// Re-export main types for convenience
pub use config::PermsConfig;
pub use entry::{EffectivePermissions, PermissionEntry};
pub use error::{PermsError, PermsResult};
pub use group::Group;
pub use resolver::{expand_group, resolve};
pub use store::{GroupDefinition, GroupStore};
