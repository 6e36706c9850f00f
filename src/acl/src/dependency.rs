//! Reconciles a role's proposed permissions against declared resource options
//!
//! Run before a role's rule set is persisted:
//!
//! - an empty grant on a `sub_resource` is a no-op and is dropped, unless
//!   another edited resource depends on it;
//! - every resource named in the `depend` list of an edited resource that is
//!   not itself a sub-resource is granted in full when the edits do not already
//!   mention it.

use crate::catalog::RuleCatalog;
use crate::types::PermissionDescriptor;
use tracing::debug;

/// Expand a role's permission edits
///
/// Later edits for the same resource replace earlier ones in place. Resources
/// the catalog does not know pass through untouched.
pub fn expand(edits: Vec<PermissionDescriptor>, catalog: &RuleCatalog) -> Vec<PermissionDescriptor> {
    let mut result: Vec<PermissionDescriptor> = Vec::with_capacity(edits.len());
    for edit in edits {
        match result.iter_mut().find(|d| d.resource == edit.resource) {
            Some(existing) => *existing = edit,
            None => result.push(edit),
        }
    }

    let mut sub_resources: Vec<String> = Vec::new();
    let mut dependencies: Vec<String> = Vec::new();

    for desc in &result {
        let Some(options) = catalog.options_of(&desc.resource) else {
            continue;
        };

        if options.sub_resource {
            sub_resources.push(desc.resource.clone());
            continue;
        }
        for dep in options.depend {
            if !dependencies.contains(&dep) {
                dependencies.push(dep);
            }
        }
    }

    result.retain(|desc| {
        let drop = sub_resources.contains(&desc.resource)
            && !dependencies.contains(&desc.resource)
            && desc.values.is_empty();
        if drop {
            debug!("Dropping empty sub-resource grant '{}'", desc.resource);
        }
        !drop
    });

    for dep in dependencies {
        if !result.iter().any(|d| d.resource == dep) {
            debug!("Granting dependency '{}'", dep);
            result.push(PermissionDescriptor::allow_all(dep));
        }
    }

    result
}
