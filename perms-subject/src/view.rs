//! Scoped read view over a subject's cached permissions.

use parking_lot::MappedRwLockReadGuard;
use perms_model::EffectivePermissions;
use std::fmt;
use std::ops::Deref;

/// Read-only, non-copying view into a subject's live permission cache.
///
/// The view holds the subject's shared lock for its whole lifetime, so no
/// mutation of that subject can proceed until it is released, either via
/// [`release`](Self::release) or by dropping it. The cached map is only
/// reachable through the view, which makes a stale read after release
/// impossible.
///
/// Do not call a mutator on the same subject while holding a view on the
/// same thread; the write lock would wait on the view forever.
pub struct EffectivePermissionsView<'a> {
    guard: MappedRwLockReadGuard<'a, EffectivePermissions>,
}

impl<'a> EffectivePermissionsView<'a> {
    pub(crate) fn new(guard: MappedRwLockReadGuard<'a, EffectivePermissions>) -> Self {
        Self { guard }
    }

    /// Release the shared lock.
    pub fn release(self) {
        drop(self);
    }
}

impl Deref for EffectivePermissionsView<'_> {
    type Target = EffectivePermissions;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl fmt::Debug for EffectivePermissionsView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EffectivePermissionsView").field(&*self.guard).finish()
    }
}
