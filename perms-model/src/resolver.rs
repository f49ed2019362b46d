//! # Resolver
//!
//! Flattens a subject's permission sources into one [`EffectivePermissions`]
//! map. Sources are applied in a fixed order and later entries overwrite
//! earlier ones for the same node:
//!
//! ```text
//! 1. sub groups      (each: ancestors first, then the group itself)
//! 2. main group      (ancestors first, then the group itself)
//! 3. additional      (subject-level overrides)
//! ```
//!
//! Ancestors are expanded depth-first in stored parent order, so a group's
//! own entries always beat anything it inherits. Sub groups are applied in
//! their stored order, which makes the last sub group win ties between
//! siblings.
//!
//! The group graph must be acyclic; [`Group::add_parent`] refuses edges
//! that would close a cycle, so the recursion here always terminates.

use std::sync::Arc;

use crate::entry::EffectivePermissions;
use crate::group::Group;

/// Apply `group` and all of its ancestors to `perms`.
pub fn expand_group(group: &Group, perms: &mut EffectivePermissions) {
    for parent in group.parents() {
        expand_group(&parent, perms);
    }
    group.for_each_permission(|raw| perms.apply_raw(raw));
}

/// Build the effective permissions for one subject's sources.
///
/// # Arguments
///
/// * `main` - The subject's main group
/// * `sub_groups` - The subject's sub groups, in stored order
/// * `additional` - Subject-level raw entries, in stored order
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use perms_model::group::Group;
/// use perms_model::resolver::resolve;
///
/// let main = Arc::new(Group::new("member"));
/// main.add_permission("x");
///
/// let perms = resolve(&main, &[], &["-x".to_string()]);
/// assert_eq!(perms.get("x"), Some(false));
/// ```
pub fn resolve(main: &Group, sub_groups: &[Arc<Group>], additional: &[String]) -> EffectivePermissions {
    let mut perms = EffectivePermissions::new();

    for group in sub_groups {
        expand_group(group, &mut perms);
    }
    expand_group(main, &mut perms);
    for raw in additional {
        perms.apply_raw(raw);
    }

    perms
}
