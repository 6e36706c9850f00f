//! Core ACL types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Numeric resource (permission group) identifier
pub type ResourceId = u64;

/// Numeric role identifier
pub type RoleId = u64;

/// Numeric user identifier
pub type UserId = u64;

/// Order-irrelevant set of value tokens (record ids and the like)
pub type ValueSet = BTreeSet<String>;

/// One role's allow/deny assertion for a resource
///
/// A `value` of `None` (or the empty string) is a wildcard and applies to the
/// resource as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRule {
    pub role_id: RoleId,
    pub resource_id: ResourceId,
    #[serde(default)]
    pub value: Option<String>,
    pub allowed: bool,
}

impl PermissionRule {
    /// Wildcard allow rule
    pub fn allow_all(role_id: RoleId, resource_id: ResourceId) -> Self {
        Self { role_id, resource_id, value: None, allowed: true }
    }

    /// Wildcard deny rule
    pub fn deny_all(role_id: RoleId, resource_id: ResourceId) -> Self {
        Self { role_id, resource_id, value: None, allowed: false }
    }

    /// Allow rule scoped to one value
    pub fn allow(role_id: RoleId, resource_id: ResourceId, value: impl Into<String>) -> Self {
        Self { role_id, resource_id, value: Some(value.into()), allowed: true }
    }

    /// Deny rule scoped to one value
    pub fn deny(role_id: RoleId, resource_id: ResourceId, value: impl Into<String>) -> Self {
        Self { role_id, resource_id, value: Some(value.into()), allowed: false }
    }

    /// The scoped value, or `None` for a wildcard rule
    pub fn scoped_value(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.is_empty())
    }

    pub fn is_wildcard(&self) -> bool {
        self.scoped_value().is_none()
    }
}

/// Normalized per-resource aggregate of one or more rules
///
/// Empty `values` means the whole resource is allowed (or denied); otherwise the
/// descriptor is scoped to exactly those tokens with the given polarity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDescriptor {
    pub resource: String,
    #[serde(default)]
    pub values: ValueSet,
    #[serde(default = "default_allowed")]
    pub allowed: bool,
}

fn default_allowed() -> bool {
    true
}

impl PermissionDescriptor {
    pub fn new<I, S>(resource: impl Into<String>, values: I, allowed: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            resource: resource.into(),
            values: values.into_iter().map(Into::into).collect(),
            allowed,
        }
    }

    /// Full allow on `resource`
    pub fn allow_all(resource: impl Into<String>) -> Self {
        Self { resource: resource.into(), values: ValueSet::new(), allowed: true }
    }

    /// Full deny on `resource`
    pub fn deny_all(resource: impl Into<String>) -> Self {
        Self { resource: resource.into(), values: ValueSet::new(), allowed: false }
    }

    pub fn is_wildcard(&self) -> bool {
        self.values.is_empty()
    }
}

/// Outcome of a query-scoping evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterResult {
    /// No restriction
    Allowed,
    /// Nothing may be returned
    Disallowed,
    /// Restricted by an include or exclude value set
    PartlyAllowed,
}

impl FilterResult {
    /// Map the configured boolean default onto the tri-state result
    pub fn from_default(default_permission: bool) -> Self {
        if default_permission {
            FilterResult::Allowed
        } else {
            FilterResult::Disallowed
        }
    }
}

/// Tri-state decision usable to scope a bulk query
///
/// With `PartlyAllowed`, `include == true` makes `values` an allow-list and
/// `include == false` makes it a deny-list. For the other results `values` is
/// empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDecision {
    pub result: FilterResult,
    pub values: ValueSet,
    pub include: bool,
}

impl FilterDecision {
    pub fn allowed() -> Self {
        Self::with_result(FilterResult::Allowed)
    }

    pub fn disallowed() -> Self {
        Self::with_result(FilterResult::Disallowed)
    }

    /// Decision used when no rule data applies
    pub fn default_for(default_permission: bool) -> Self {
        Self::with_result(FilterResult::from_default(default_permission))
    }

    /// Only the given values are permitted
    pub fn only<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            result: FilterResult::PartlyAllowed,
            values: values.into_iter().map(Into::into).collect(),
            include: true,
        }
    }

    /// Everything except the given values is permitted
    pub fn except<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            result: FilterResult::PartlyAllowed,
            values: values.into_iter().map(Into::into).collect(),
            include: false,
        }
    }

    fn with_result(result: FilterResult) -> Self {
        Self { result, values: ValueSet::new(), include: true }
    }
}

/// Role record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub admin: bool,
}
