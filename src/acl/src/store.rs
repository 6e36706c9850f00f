//! Permission store collaborator and in-memory implementation

use crate::error::{AclError, Result};
use crate::types::{PermissionRule, ResourceId, Role, RoleId, UserId};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Storage backend for roles, rules and role memberships
///
/// Rule and membership queries must return rows in insertion order; the
/// filter fold depends on it.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Rules for one resource across the given roles
    async fn rules_for(&self, resource_id: ResourceId, role_ids: &[RoleId]) -> Result<Vec<PermissionRule>>;

    /// All rules of one role
    async fn rules_for_role(&self, role_id: RoleId) -> Result<Vec<PermissionRule>>;

    /// Roles the user belongs to
    async fn roles_for(&self, user_id: UserId) -> Result<Vec<RoleId>>;

    /// Users belonging to the role
    async fn users_for(&self, role_id: RoleId) -> Result<Vec<UserId>>;

    /// Whether the role carries the admin flag
    async fn is_admin_role(&self, role_id: RoleId) -> Result<bool>;

    /// Create a role; fails with `DuplicateRole` if the name is taken
    async fn create_role(&self, name: &str, admin: bool) -> Result<Role>;

    /// Get a role by id
    async fn role(&self, role_id: RoleId) -> Result<Option<Role>>;

    /// Get a role by name
    async fn role_by_name(&self, name: &str) -> Result<Option<Role>>;

    /// Overwrite a role's name and admin flag
    async fn update_role(&self, role: Role) -> Result<()>;

    /// Delete a role together with its rules and memberships
    async fn delete_role(&self, role_id: RoleId) -> Result<Option<Role>>;

    /// List roles by id (all roles when `role_ids` is empty)
    async fn list_roles(&self, role_ids: &[RoleId]) -> Result<Vec<Role>>;

    /// Atomically replace every rule of a role
    async fn replace_role_rules(&self, role_id: RoleId, rules: Vec<PermissionRule>) -> Result<()>;

    /// Replace the members of a role
    async fn set_role_users(&self, role_id: RoleId, users: &[UserId]) -> Result<()>;

    /// Replace the roles of a user
    async fn set_user_roles(&self, user_id: UserId, roles: &[RoleId]) -> Result<()>;
}

#[derive(Debug, Default)]
struct StoreState {
    next_role_id: RoleId,
    roles: BTreeMap<RoleId, Role>,
    rules: Vec<PermissionRule>,
    /// (role, user) edges in insertion order
    memberships: Vec<(RoleId, UserId)>,
}

/// In-memory permission store
#[derive(Clone, Default)]
pub struct InMemoryPermissionStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryPermissionStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PermissionStore for InMemoryPermissionStore {
    async fn rules_for(&self, resource_id: ResourceId, role_ids: &[RoleId]) -> Result<Vec<PermissionRule>> {
        let state = self.state.read().await;
        Ok(state
            .rules
            .iter()
            .filter(|r| r.resource_id == resource_id && role_ids.contains(&r.role_id))
            .cloned()
            .collect())
    }

    async fn rules_for_role(&self, role_id: RoleId) -> Result<Vec<PermissionRule>> {
        let state = self.state.read().await;
        Ok(state.rules.iter().filter(|r| r.role_id == role_id).cloned().collect())
    }

    async fn roles_for(&self, user_id: UserId) -> Result<Vec<RoleId>> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .iter()
            .filter(|(_, user)| *user == user_id)
            .map(|(role, _)| *role)
            .collect())
    }

    async fn users_for(&self, role_id: RoleId) -> Result<Vec<UserId>> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .iter()
            .filter(|(role, _)| *role == role_id)
            .map(|(_, user)| *user)
            .collect())
    }

    async fn is_admin_role(&self, role_id: RoleId) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state.roles.get(&role_id).map(|r| r.admin).unwrap_or(false))
    }

    async fn create_role(&self, name: &str, admin: bool) -> Result<Role> {
        let mut state = self.state.write().await;
        if state.roles.values().any(|r| r.name == name) {
            return Err(AclError::DuplicateRole(name.to_string()));
        }

        state.next_role_id += 1;
        let role = Role {
            id: state.next_role_id,
            name: name.to_string(),
            admin,
        };
        state.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn role(&self, role_id: RoleId) -> Result<Option<Role>> {
        let state = self.state.read().await;
        Ok(state.roles.get(&role_id).cloned())
    }

    async fn role_by_name(&self, name: &str) -> Result<Option<Role>> {
        let state = self.state.read().await;
        Ok(state.roles.values().find(|r| r.name == name).cloned())
    }

    async fn update_role(&self, role: Role) -> Result<()> {
        let mut state = self.state.write().await;
        if state.roles.values().any(|r| r.name == role.name && r.id != role.id) {
            return Err(AclError::DuplicateRole(role.name));
        }

        match state.roles.get_mut(&role.id) {
            Some(existing) => {
                *existing = role;
                Ok(())
            }
            None => Err(AclError::RoleNotFound(role.id)),
        }
    }

    async fn delete_role(&self, role_id: RoleId) -> Result<Option<Role>> {
        let mut state = self.state.write().await;
        let removed = state.roles.remove(&role_id);
        state.rules.retain(|r| r.role_id != role_id);
        state.memberships.retain(|(role, _)| *role != role_id);
        Ok(removed)
    }

    async fn list_roles(&self, role_ids: &[RoleId]) -> Result<Vec<Role>> {
        let state = self.state.read().await;
        Ok(state
            .roles
            .values()
            .filter(|r| role_ids.is_empty() || role_ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn replace_role_rules(&self, role_id: RoleId, rules: Vec<PermissionRule>) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.roles.contains_key(&role_id) {
            return Err(AclError::RoleNotFound(role_id));
        }
        if let Some(stray) = rules.iter().find(|r| r.role_id != role_id) {
            return Err(AclError::InvalidInput(format!(
                "Rule for role {} passed when replacing rules of role {}",
                stray.role_id, role_id
            )));
        }

        state.rules.retain(|r| r.role_id != role_id);
        state.rules.extend(rules);
        Ok(())
    }

    async fn set_role_users(&self, role_id: RoleId, users: &[UserId]) -> Result<()> {
        let mut state = self.state.write().await;
        state.memberships.retain(|(role, _)| *role != role_id);
        state.memberships.extend(users.iter().map(|&user| (role_id, user)));
        Ok(())
    }

    async fn set_user_roles(&self, user_id: UserId, roles: &[RoleId]) -> Result<()> {
        let mut state = self.state.write().await;
        state.memberships.retain(|(_, user)| *user != user_id);
        state.memberships.extend(roles.iter().map(|&role| (role, user_id)));
        Ok(())
    }
}
