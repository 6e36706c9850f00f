//! Role management on top of the permission store

use crate::dependency::expand;
use crate::engine::{AclEngine, EvalContext};
use crate::error::Result;
use crate::projector::{flatten, project};
use crate::types::{PermissionDescriptor, Role, RoleId, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Role as submitted for creation or update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRole {
    pub name: String,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub permissions: Vec<PermissionDescriptor>,
    #[serde(default)]
    pub users: Vec<UserId>,
}

impl NewRole {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn admin(mut self) -> Self {
        self.admin = true;
        self
    }

    pub fn with_permissions(mut self, permissions: Vec<PermissionDescriptor>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_users(mut self, users: Vec<UserId>) -> Self {
        self.users = users;
        self
    }
}

/// Role with its projected permissions and members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleView {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<PermissionDescriptor>,
    pub users: Vec<UserId>,
}

/// Reference to a role by id or by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleRef {
    Id(RoleId),
    Name(String),
}

impl From<RoleId> for RoleRef {
    fn from(id: RoleId) -> Self {
        RoleRef::Id(id)
    }
}

impl From<&str> for RoleRef {
    fn from(name: &str) -> Self {
        RoleRef::Name(name.to_string())
    }
}

/// Creates, edits and lists roles
///
/// Permission edits pass through dependency expansion before they are
/// persisted, and the admin flag is only granted when the acting user is an
/// admin.
#[derive(Clone)]
pub struct RoleManager {
    engine: Arc<AclEngine>,
}

impl RoleManager {
    pub fn new(engine: Arc<AclEngine>) -> Self {
        Self { engine }
    }

    /// Create a role, its rules and its memberships
    pub async fn add_role(&self, ctx: EvalContext, acting_user: Option<UserId>, role: NewRole) -> Result<RoleId> {
        let admin = self.grantable_admin(ctx, acting_user, role.admin).await?;

        let created = self.engine.store().create_role(&role.name, admin).await?;
        info!("Created role '{}' ({}), admin={}", created.name, created.id, admin);

        self.replace_permissions(created.id, role.permissions).await?;
        self.engine.store().set_role_users(created.id, &role.users).await?;

        Ok(created.id)
    }

    /// Create several roles, stopping at the first failure
    pub async fn add_roles(&self, ctx: EvalContext, acting_user: Option<UserId>, roles: Vec<NewRole>) -> Result<Vec<RoleId>> {
        let mut ids = Vec::with_capacity(roles.len());
        for role in roles {
            ids.push(self.add_role(ctx, acting_user, role).await?);
        }
        Ok(ids)
    }

    /// Update a role; `None` when the role does not exist
    pub async fn update_role(
        &self,
        ctx: EvalContext,
        acting_user: Option<UserId>,
        role_id: RoleId,
        role: NewRole,
    ) -> Result<Option<RoleId>> {
        let Some(existing) = self.engine.store().role(role_id).await? else {
            return Ok(None);
        };

        let admin = self.grantable_admin(ctx, acting_user, role.admin).await?;
        if existing.name != role.name || existing.admin != admin {
            self.engine
                .store()
                .update_role(Role {
                    id: role_id,
                    name: role.name.clone(),
                    admin,
                })
                .await?;
        }

        self.replace_permissions(role_id, role.permissions).await?;
        self.engine.store().set_role_users(role_id, &role.users).await?;
        info!("Updated role '{}' ({})", role.name, role_id);

        Ok(Some(role_id))
    }

    /// Remove a role with its rules and memberships
    pub async fn remove_role(&self, role: impl Into<RoleRef>) -> Result<Option<Role>> {
        let Some(found) = self.resolve(role.into()).await? else {
            return Ok(None);
        };

        let removed = self.engine.store().delete_role(found.id).await?;
        info!("Removed role '{}' ({})", found.name, found.id);
        Ok(removed)
    }

    /// One role with its permissions, optionally restricted to `resources`
    pub async fn get_role(&self, role: impl Into<RoleRef>, resources: &[&str]) -> Result<Option<RoleView>> {
        let Some(found) = self.resolve(role.into()).await? else {
            return Ok(None);
        };

        let mut views = self.get_roles(resources, &[found.id]).await?;
        Ok(views.pop())
    }

    /// Roles with their permissions and members
    ///
    /// An empty `role_ids` lists every role; an empty `resources` keeps every
    /// permission.
    pub async fn get_roles(&self, resources: &[&str], role_ids: &[RoleId]) -> Result<Vec<RoleView>> {
        let store = self.engine.store();
        let mut views = Vec::new();

        for role in store.list_roles(role_ids).await? {
            let rows = store.rules_for_role(role.id).await?;
            let permissions = project(&rows, self.engine.catalog())
                .into_iter()
                .filter(|d| resources.is_empty() || resources.contains(&d.resource.as_str()))
                .collect();
            let users = store.users_for(role.id).await?;

            views.push(RoleView { role, permissions, users });
        }

        Ok(views)
    }

    /// Replace the roles a user belongs to
    pub async fn update_user_roles(&self, user: UserId, role_ids: &[RoleId]) -> Result<()> {
        self.engine.store().set_user_roles(user, role_ids).await?;
        info!("User {} now has roles {:?}", user, role_ids);
        Ok(())
    }

    async fn replace_permissions(&self, role_id: RoleId, permissions: Vec<PermissionDescriptor>) -> Result<()> {
        let catalog = self.engine.catalog();
        let expanded = expand(permissions, catalog);
        let rules = flatten(role_id, &expanded, catalog);
        self.engine.store().replace_role_rules(role_id, rules).await
    }

    async fn grantable_admin(&self, ctx: EvalContext, acting_user: Option<UserId>, requested: bool) -> Result<bool> {
        if !requested {
            return Ok(false);
        }
        let granted = self.engine.is_admin(ctx, acting_user).await?;
        if !granted {
            warn!("Admin flag requested by non-admin user {:?}, ignoring", acting_user);
        }
        Ok(granted)
    }

    async fn resolve(&self, role: RoleRef) -> Result<Option<Role>> {
        match role {
            RoleRef::Id(id) => self.engine.store().role(id).await,
            RoleRef::Name(name) => self.engine.store().role_by_name(&name).await,
        }
    }
}
