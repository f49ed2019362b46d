//! # Permission Runtime
//!
//! This crate provides the host-side glue that pushes recalculated
//! permissions into live sessions.
//!
//! ## Overview
//!
//! The perms-runtime crate handles:
//! - **Main Thread**: The designated single-threaded context refreshes run on
//! - **Session Bridge**: Live sessions keyed by subject id
//! - **Refresh Events**: Broadcast notifications for each handled refresh
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use perms_model::GroupStore;
//! use perms_runtime::{MainThread, RecordingAttachment, SessionBridge};
//! use perms_subject::{CachePublisher, SubjectRegistry};
//! use uuid::Uuid;
//!
//! // Bind the host's main thread and build the publisher
//! let (main_thread, mut pump) = MainThread::bind_current();
//! let bridge = Arc::new(SessionBridge::new());
//! let publisher = CachePublisher::new(Arc::new(main_thread), bridge.clone());
//!
//! let store = Arc::new(GroupStore::new("default"));
//! let registry = SubjectRegistry::new(store, publisher);
//!
//! // A player joins
//! let subject = registry.get_or_create(Uuid::now_v7());
//! bridge.attach_subject(&subject, Arc::new(RecordingAttachment::new()));
//!
//! // Mutations on the main thread refresh inline; elsewhere they queue
//! // until the next tick
//! subject.add_additional_permission("fly");
//! pump.run_pending().unwrap();
//! ```
//!
//! ## Threading
//!
//! A refresh runs inline when the mutating thread already is the
//! designated context. Otherwise it is scheduled there and re-reads the
//! subject when it runs, so it reflects at least the state as of
//! scheduling.

pub mod bridge;
pub mod error;
pub mod main_thread;
pub mod types;

// Re-export main types
pub use bridge::{PermissionAttachment, RecordingAttachment, SessionBridge};
pub use error::{RuntimeError, RuntimeResult};
pub use main_thread::{MainThread, TaskPump};
pub use types::{RefreshEvent, RefreshOutcome};
