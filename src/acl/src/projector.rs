//! Conversion between raw rule rows and per-resource descriptors

use crate::catalog::RuleCatalog;
use crate::types::{PermissionDescriptor, PermissionRule, RoleId, ValueSet};
use tracing::warn;

/// Group rule rows into descriptors
///
/// Produces one descriptor per (resource, polarity), ordered by the first row
/// seen for each. Wildcard rows contribute no token. Rows for resources missing
/// from the catalog are skipped.
pub fn project(rows: &[PermissionRule], catalog: &RuleCatalog) -> Vec<PermissionDescriptor> {
    // resource -> descriptors per polarity, both in first-seen order
    let mut groups: Vec<(&str, Vec<PermissionDescriptor>)> = Vec::new();

    for row in rows {
        let Some(resource) = catalog.resource_name_of(row.resource_id) else {
            warn!("Skipping rule for unknown resource id {}", row.resource_id);
            continue;
        };

        let gi = match groups.iter().position(|(name, _)| *name == resource) {
            Some(pos) => pos,
            None => {
                groups.push((resource, Vec::new()));
                groups.len() - 1
            }
        };
        let group = &mut groups[gi].1;

        let di = match group.iter().position(|d| d.allowed == row.allowed) {
            Some(pos) => pos,
            None => {
                group.push(PermissionDescriptor {
                    resource: resource.to_string(),
                    values: ValueSet::new(),
                    allowed: row.allowed,
                });
                group.len() - 1
            }
        };

        if let Some(value) = row.scoped_value() {
            group[di].values.insert(value.to_string());
        }
    }

    groups.into_iter().flat_map(|(_, descriptors)| descriptors).collect()
}

/// Expand descriptors back into rule rows for `role_id`
///
/// One rule per value, or a single wildcard rule when the descriptor has no
/// values. Descriptors for resources missing from the catalog are skipped.
pub fn flatten(role_id: RoleId, descriptors: &[PermissionDescriptor], catalog: &RuleCatalog) -> Vec<PermissionRule> {
    let mut rules = Vec::new();

    for desc in descriptors {
        let Some(resource_id) = catalog.resource_id_of(&desc.resource) else {
            warn!("Skipping permission for unknown resource '{}'", desc.resource);
            continue;
        };

        if desc.values.is_empty() {
            rules.push(PermissionRule {
                role_id,
                resource_id,
                value: None,
                allowed: desc.allowed,
            });
        } else {
            rules.extend(desc.values.iter().map(|value| PermissionRule {
                role_id,
                resource_id,
                value: Some(value.clone()),
                allowed: desc.allowed,
            }));
        }
    }

    rules
}
