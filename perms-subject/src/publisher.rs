//! Cache publisher
//!
//! After a subject's effective permissions are rebuilt, the host runtime
//! must re-apply them to any live session for that subject. The host owns
//! both sides of that step and plugs them in through two traits:
//!
//! - [`ExecutionContext`]: the designated single-threaded context the
//!   refresh must run on, and a way to schedule work onto it
//! - [`RuntimeBridge`]: re-fetches a subject's permissions and applies them
//!   to its live session, if one exists
//!
//! [`CachePublisher`] glues the two together. It is always invoked after
//! the subject's exclusive lock is released.

use std::fmt;
use std::sync::Arc;

use crate::subject::Subject;

/// A unit of work scheduled onto an [`ExecutionContext`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// The designated context permission refreshes run on.
pub trait ExecutionContext: Send + Sync {
    /// Check whether the calling thread is the designated context.
    fn is_current(&self) -> bool;

    /// Run `task` on the designated context later.
    fn schedule(&self, task: Task);
}

/// Host-side bridge into live sessions.
pub trait RuntimeBridge: Send + Sync {
    /// Re-fetch `subject`'s effective permissions and apply them to its
    /// live session. Subjects without a live session are ignored.
    fn refresh(&self, subject: &Subject);
}

/// Context for hosts without thread affinity: every thread is current.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineContext;

impl ExecutionContext for InlineContext {
    fn is_current(&self) -> bool {
        true
    }

    fn schedule(&self, task: Task) {
        task();
    }
}

struct PublisherInner {
    context: Arc<dyn ExecutionContext>,
    bridge: Arc<dyn RuntimeBridge>,
}

/// Notifies the runtime bridge that a subject's permissions changed.
///
/// Cloning is cheap; all subjects of one host usually share one publisher.
#[derive(Clone, Default)]
pub struct CachePublisher {
    inner: Option<Arc<PublisherInner>>,
}

impl CachePublisher {
    /// Create a publisher dispatching `bridge` refreshes onto `context`.
    pub fn new(context: Arc<dyn ExecutionContext>, bridge: Arc<dyn RuntimeBridge>) -> Self {
        Self {
            inner: Some(Arc::new(PublisherInner { context, bridge })),
        }
    }

    /// A publisher that drops every notification.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Signal that `subject`'s effective permissions changed.
    ///
    /// Runs the refresh inline when already on the designated context,
    /// otherwise schedules it there. A scheduled refresh re-reads the
    /// subject when it runs, so it reflects at least the state as of
    /// scheduling; it is skipped if the subject has been dropped by then.
    pub fn publish(&self, subject: &Subject) {
        let Some(inner) = &self.inner else {
            return;
        };

        if inner.context.is_current() {
            tracing::debug!(subject_id = %subject.id(), "Refreshing live permissions inline");
            inner.bridge.refresh(subject);
            return;
        }

        tracing::debug!(subject_id = %subject.id(), "Scheduling live permission refresh");
        let weak = subject.downgrade();
        let bridge = inner.bridge.clone();
        inner.context.schedule(Box::new(move || {
            if let Some(subject) = weak.upgrade() {
                bridge.refresh(&subject);
            }
        }));
    }
}

impl fmt::Debug for CachePublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachePublisher")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
