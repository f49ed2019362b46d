//! # Subject Permissions
//!
//! This crate provides the per-subject side of permission resolution: the
//! subject record, its cached effective permissions, and the protocol that
//! keeps that cache consistent under concurrent reads and mutations.
//!
//! ## Overview
//!
//! The perms-subject crate handles:
//! - **Subjects**: Main group, sub groups, overrides and the cached map
//! - **Views**: Scoped, non-copying reads that hold the shared lock
//! - **Publishing**: Notifying the host runtime after a recalculation
//! - **Seeding**: Default state for freshly created subjects
//! - **Registry**: Live subjects of one host, keyed by id
//!
//! ## Architecture
//!
//! ```text
//! mutation ──► write lock ──► mutate fields ──► rebuild cache ──► unlock
//!                                                                  │
//!                          CachePublisher ◄────────────────────────┘
//!                            ├─ on designated context: refresh inline
//!                            └─ elsewhere: schedule refresh there
//!
//! reads ──► read lock ──► copy (effective_permissions)
//!                     └─► view (direct_effective_permissions, held until release)
//! ```
//!
//! Each subject has its own lock; there is no global lock and subjects can
//! be mutated fully independently.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use perms_model::GroupStore;
//! use perms_subject::{CachePublisher, Recalculate, SubjectRegistry};
//! use uuid::Uuid;
//!
//! let store = Arc::new(GroupStore::new("default"));
//! let registry = SubjectRegistry::new(store.clone(), CachePublisher::disabled());
//!
//! let subject = registry.get_or_create(Uuid::now_v7());
//! subject.add_additional_permission_with("fly", Recalculate::Deferred);
//! subject.add_additional_permission_with("-pvp", Recalculate::Deferred);
//! subject.recalculate_permissions();
//!
//! let view = subject.direct_effective_permissions();
//! assert!(view.is_granted("fly"));
//! view.release();
//! ```

pub mod publisher;
pub mod registry;
pub mod seeding;
pub mod subject;
pub mod view;

// Re-export main types for convenience
pub use publisher::{CachePublisher, ExecutionContext, InlineContext, RuntimeBridge, Task};
pub use registry::{SeedPolicy, SubjectRegistry};
pub use seeding::{DefaultPermissions, DefaultSeeder};
pub use subject::{Recalculate, Subject};
pub use view::EffectivePermissionsView;
