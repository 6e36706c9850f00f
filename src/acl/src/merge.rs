//! Pairwise merge of permission descriptors
//!
//! Combines two descriptors for the same resource, typically granted by two
//! different roles of one user, into the single descriptor the user effectively
//! holds. Allows generally win over denies, and a deny survives only on tokens
//! that every deny-side role names.

use crate::types::PermissionDescriptor;

/// Result of merging two descriptors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Merged {
    /// Both inputs described the same resource
    One(PermissionDescriptor),
    /// Inputs described different resources and are returned unmerged
    Pair(PermissionDescriptor, PermissionDescriptor),
}

impl Merged {
    /// The merged descriptor, if the inputs were mergeable
    pub fn into_one(self) -> Option<PermissionDescriptor> {
        match self {
            Merged::One(desc) => Some(desc),
            Merged::Pair(..) => None,
        }
    }
}

/// Merge two descriptors
pub fn merge(a: PermissionDescriptor, b: PermissionDescriptor) -> Merged {
    if a.resource != b.resource {
        return Merged::Pair(a, b);
    }

    // Both allow, or a wildcard allow on either side
    if (a.allowed && b.allowed) || (a.allowed && a.is_wildcard()) || (b.allowed && b.is_wildcard()) {
        let values = if a.is_wildcard() || b.is_wildcard() {
            Default::default()
        } else {
            a.values.union(&b.values).cloned().collect()
        };
        return Merged::One(PermissionDescriptor {
            resource: a.resource,
            values,
            allowed: true,
        });
    }

    // Exactly one side allows, and it is scoped
    if a.allowed || b.allowed {
        let (allow, deny) = if a.allowed { (a, b) } else { (b, a) };

        if deny.is_wildcard() {
            return Merged::One(allow);
        }

        let values = deny.values.difference(&allow.values).cloned().collect();
        return Merged::One(PermissionDescriptor {
            resource: deny.resource,
            values,
            allowed: false,
        });
    }

    // Both deny
    match (a.is_wildcard(), b.is_wildcard()) {
        (true, true) => Merged::One(a),
        (false, false) => {
            let values = a.values.intersection(&b.values).cloned().collect();
            Merged::One(PermissionDescriptor {
                resource: a.resource,
                values,
                allowed: false,
            })
        }
        // A role's explicit scoped deny is kept over another role's wildcard deny
        (false, true) => Merged::One(a),
        (true, false) => Merged::One(b),
    }
}
