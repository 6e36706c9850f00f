//! ACL decision engine
//!
//! Resolves a user's roles, maps the requested resource to its permission id
//! through the catalog, fetches the matching rules from the store and runs one
//! of the two evaluation algorithms:
//!
//! ```text
//! check()           → roles → catalog → rules → scoped::evaluate → bool
//! check_for_where() → roles → catalog → rules → filter::fold     → FilterDecision
//! ```
//!
//! Missing users, unmapped resources and empty rule sets never raise; they fall
//! back to the configured default permission.

pub mod filter;
pub mod polarity;
pub mod scoped;

pub use polarity::Polarity;

use crate::catalog::RuleCatalog;
use crate::config::AclConfig;
use crate::error::{AclError, Result};
use crate::merge::{merge, Merged};
use crate::projector::project;
use crate::query::{apply_filter, QueryScope};
use crate::store::PermissionStore;
use crate::types::{FilterDecision, PermissionDescriptor, RoleId, UserId};

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-call evaluation context
///
/// Carries the guard flag. Disabling the guard bypasses every check for the
/// evaluations that receive this context and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalContext {
    pub guard: bool,
}

impl EvalContext {
    /// Checks enforced
    pub const fn guarded() -> Self {
        Self { guard: true }
    }

    /// Checks bypassed
    pub const fn unguarded() -> Self {
        Self { guard: false }
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::guarded()
    }
}

/// ACL engine
pub struct AclEngine {
    /// Static resource catalog
    catalog: Arc<RuleCatalog>,

    /// Rule and role storage backend
    store: Arc<dyn PermissionStore>,

    /// Fallback when no rule data applies
    default_permission: bool,

    /// Resources never checked
    always_allow: HashSet<String>,
}

impl AclEngine {
    /// Create an engine from configuration
    pub fn new(config: &AclConfig, store: Arc<dyn PermissionStore>) -> Result<Self> {
        let catalog = RuleCatalog::from_config(config)?;
        Ok(Self::with_catalog(
            Arc::new(catalog),
            store,
            config.default_permission,
            config.always_allow.iter().cloned(),
        ))
    }

    /// Create an engine around an already built catalog
    pub fn with_catalog<I>(
        catalog: Arc<RuleCatalog>,
        store: Arc<dyn PermissionStore>,
        default_permission: bool,
        always_allow: I,
    ) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            catalog,
            store,
            default_permission,
            always_allow: always_allow.into_iter().collect(),
        }
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &Arc<dyn PermissionStore> {
        &self.store
    }

    pub fn default_permission(&self) -> bool {
        self.default_permission
    }

    /// Whether the user holds any admin role
    pub async fn is_admin(&self, ctx: EvalContext, user: Option<UserId>) -> Result<bool> {
        if !ctx.guard {
            return Ok(true);
        }
        let Some(user) = user else {
            return Ok(false);
        };
        let roles = self.store.roles_for(user).await?;
        self.any_admin(&roles).await
    }

    /// Scoped boolean check
    ///
    /// `context_values` are the record values the action touches; leave it
    /// empty to ask about the resource as a whole.
    pub async fn check(
        &self,
        ctx: EvalContext,
        resource: &str,
        context_values: &[String],
        user: Option<UserId>,
    ) -> Result<bool> {
        if !ctx.guard {
            debug!("Guard disabled, allowing '{}'", resource);
            return Ok(true);
        }

        if self.always_allow.contains(resource) {
            debug!("Resource '{}' is always allowed", resource);
            return Ok(true);
        }

        let Some(user) = user else {
            debug!("No user context for '{}', denying", resource);
            return Ok(false);
        };

        let roles = self.store.roles_for(user).await?;
        if self.any_admin(&roles).await? {
            debug!("User {} is admin, allowing '{}'", user, resource);
            return Ok(true);
        }

        let Some(resource_id) = self.catalog.resource_id_of(resource) else {
            debug!("Resource '{}' is not mapped, using default", resource);
            return Ok(self.default_permission);
        };
        if roles.is_empty() {
            return Ok(self.default_permission);
        }

        let rules = self.store.rules_for(resource_id, &roles).await?;
        if rules.is_empty() {
            return Ok(self.default_permission);
        }

        let allowed = scoped::evaluate(&rules, context_values, self.default_permission);
        debug!(
            "Check '{}' for user {} over {} rules (values={:?}): {}",
            resource,
            user,
            rules.len(),
            context_values,
            allowed
        );
        Ok(allowed)
    }

    /// Tri-state decision for scoping a bulk query over `resource`
    pub async fn check_for_where(
        &self,
        ctx: EvalContext,
        resource: &str,
        user: Option<UserId>,
    ) -> Result<FilterDecision> {
        if !ctx.guard {
            return Ok(FilterDecision::allowed());
        }

        if self.always_allow.contains(resource) {
            return Ok(FilterDecision::allowed());
        }

        let Some(user) = user else {
            debug!("No user context for '{}', disallowing", resource);
            return Ok(FilterDecision::disallowed());
        };

        let roles = self.store.roles_for(user).await?;
        if self.any_admin(&roles).await? {
            return Ok(FilterDecision::allowed());
        }

        let Some(resource_id) = self.catalog.resource_id_of(resource) else {
            debug!("Resource '{}' is not mapped, using default", resource);
            return Ok(FilterDecision::default_for(self.default_permission));
        };

        let rules = if roles.is_empty() {
            Vec::new()
        } else {
            self.store.rules_for(resource_id, &roles).await?
        };

        let decision = filter::fold(&rules, self.default_permission);
        debug!("Filter '{}' for user {}: {:?}", resource, user, decision);
        Ok(decision)
    }

    /// Tri-state decision for one role rather than a user
    pub async fn check_for_role_where(
        &self,
        ctx: EvalContext,
        role_id: RoleId,
        resource: &str,
    ) -> Result<FilterDecision> {
        if !ctx.guard {
            return Ok(FilterDecision::allowed());
        }

        let role = self
            .store
            .role(role_id)
            .await?
            .ok_or(AclError::RoleNotFound(role_id))?;

        if role.admin {
            return Ok(FilterDecision::allowed());
        }

        let Some(resource_id) = self.catalog.resource_id_of(resource) else {
            return Ok(FilterDecision::default_for(self.default_permission));
        };

        let rules = self.store.rules_for(resource_id, &[role_id]).await?;
        Ok(filter::fold(&rules, self.default_permission))
    }

    /// Restrict `query` on `field` to what the user may see of `resource`
    ///
    /// Returns `false` when nothing may be returned; the caller must then not
    /// execute the query.
    pub async fn add_where<Q>(
        &self,
        ctx: EvalContext,
        resource: &str,
        user: Option<UserId>,
        query: &mut Q,
        field: &str,
    ) -> Result<bool>
    where
        Q: QueryScope + ?Sized,
    {
        let decision = self.check_for_where(ctx, resource, user).await?;
        Ok(apply_filter(&decision, field, query)?.may_execute())
    }

    /// Restrict `query` on `field` to what one role may see of `resource`
    pub async fn add_where_for_role<Q>(
        &self,
        ctx: EvalContext,
        role_id: RoleId,
        resource: &str,
        query: &mut Q,
        field: &str,
    ) -> Result<bool>
    where
        Q: QueryScope + ?Sized,
    {
        let decision = self.check_for_role_where(ctx, role_id, resource).await?;
        Ok(apply_filter(&decision, field, query)?.may_execute())
    }

    /// Effective permissions of a user, merged across all of their roles
    ///
    /// Admins get every catalog resource fully allowed.
    pub async fn user_permissions(
        &self,
        ctx: EvalContext,
        user: Option<UserId>,
    ) -> Result<Vec<PermissionDescriptor>> {
        if self.is_admin(ctx, user).await? {
            return Ok(self
                .catalog
                .resource_names()
                .map(PermissionDescriptor::allow_all)
                .collect());
        }

        let Some(user) = user else {
            return Ok(Vec::new());
        };

        let mut result: Vec<PermissionDescriptor> = Vec::new();
        for role_id in self.store.roles_for(user).await? {
            let rows = self.store.rules_for_role(role_id).await?;
            for desc in project(&rows, &self.catalog) {
                match result.iter().position(|d| d.resource == desc.resource) {
                    Some(pos) => {
                        let current = result[pos].clone();
                        match merge(current, desc) {
                            Merged::One(merged) => result[pos] = merged,
                            Merged::Pair(..) => warn!("Unexpected resource mismatch while merging"),
                        }
                    }
                    None => result.push(desc),
                }
            }
        }

        Ok(result)
    }

    async fn any_admin(&self, roles: &[RoleId]) -> Result<bool> {
        for &role in roles {
            if self.store.is_admin_role(role).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
