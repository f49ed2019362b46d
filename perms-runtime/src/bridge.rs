//! Session bridge implementation
//!
//! This module provides the [`RuntimeBridge`] that applies a subject's
//! recalculated permissions to its live session, if it has one.

use parking_lot::{Mutex, RwLock};
use perms_model::EffectivePermissions;
use perms_subject::{RuntimeBridge, Subject};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::types::{RefreshEvent, RefreshOutcome};

/// Runtime-side permission attachment of one live session.
pub trait PermissionAttachment: Send + Sync {
    /// Replace the session's permissions with `permissions`.
    fn apply(&self, permissions: &EffectivePermissions);
}

/// Attachment that records what was applied.
///
/// Useful for hosts that poll permissions instead of pushing them, and in
/// tests.
#[derive(Debug, Default)]
pub struct RecordingAttachment {
    /// Last applied map and apply count, updated together
    recorded: Mutex<(Option<EffectivePermissions>, u64)>,
}

impl RecordingAttachment {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently applied map.
    pub fn current(&self) -> Option<EffectivePermissions> {
        self.recorded.lock().0.clone()
    }

    /// How many times permissions were applied.
    pub fn applications(&self) -> u64 {
        self.recorded.lock().1
    }

    /// The last applied map together with the apply count that produced it.
    pub fn snapshot(&self) -> (Option<EffectivePermissions>, u64) {
        self.recorded.lock().clone()
    }
}

impl PermissionAttachment for RecordingAttachment {
    fn apply(&self, permissions: &EffectivePermissions) {
        let mut recorded = self.recorded.lock();
        recorded.0 = Some(permissions.clone());
        recorded.1 += 1;
    }
}

/// Bridge from subjects to live sessions.
///
/// Sessions are keyed by subject id. Each refresh is broadcast as a
/// [`RefreshEvent`] to every subscriber.
pub struct SessionBridge {
    /// Live sessions
    sessions: RwLock<HashMap<Uuid, Arc<dyn PermissionAttachment>>>,
    /// Refresh notifications
    events: broadcast::Sender<RefreshEvent>,
}

impl fmt::Debug for SessionBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBridge")
            .field("active_sessions", &self.active_count())
            .field("subscribers", &self.events.receiver_count())
            .finish()
    }
}

impl SessionBridge {
    /// Create a new bridge.
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create with custom event channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self {
            sessions: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Register a live session for `subject_id`, replacing any previous one.
    pub fn attach(&self, subject_id: Uuid, attachment: Arc<dyn PermissionAttachment>) {
        self.sessions.write().insert(subject_id, attachment);
    }

    /// Register a live session for `subject` and publish its current
    /// permissions.
    ///
    /// The initial apply goes through the subject's publisher: inline on
    /// the designated context, queued from any other thread. The subject's
    /// publisher must target this bridge.
    pub fn attach_subject(&self, subject: &Subject, attachment: Arc<dyn PermissionAttachment>) {
        self.attach(subject.id(), attachment);
        subject.republish();
    }

    /// Remove a live session.
    pub fn detach(&self, subject_id: &Uuid) -> bool {
        self.sessions.write().remove(subject_id).is_some()
    }

    /// Check whether a subject has a live session.
    pub fn is_active(&self, subject_id: &Uuid) -> bool {
        self.sessions.read().contains_key(subject_id)
    }

    pub fn active_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Subscribe to refresh notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.events.subscribe()
    }
}

impl Default for SessionBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeBridge for SessionBridge {
    fn refresh(&self, subject: &Subject) {
        let subject_id = subject.id();
        let attachment = self.sessions.read().get(&subject_id).cloned();

        let event = match attachment {
            Some(attachment) => {
                let permissions = subject.effective_permissions();
                attachment.apply(&permissions);
                tracing::debug!(
                    subject_id = %subject_id,
                    entries = permissions.len(),
                    "Applied permissions to live session"
                );
                RefreshEvent::new(subject_id, RefreshOutcome::Applied, permissions.len())
            }
            None => RefreshEvent::no_session(subject_id),
        };

        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
