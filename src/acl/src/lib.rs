//! # CretoAI ACL Engine
//!
//! Role-based access control with value-scoped rules.
//!
//! Each role holds allow/deny rules per resource, optionally scoped to a single
//! value such as a record id. The engine answers two questions:
//!
//! - **check**: may this user act on these records of a resource?
//! - **check_for_where**: which records of a resource may this user see? The
//!   answer is all, none, or an include/exclude value set ready to become a
//!   query predicate.
//!
//! ## Features
//!
//! - **Scoped boolean checks** with first-rule-wins value marking
//! - **Tri-state query filters** applied through the [`QueryScope`] trait
//! - **Permission merge algebra** for combining rules across roles
//! - **Dependency expansion** of role edits from static resource options
//! - **Async store trait** with an in-memory implementation
//!
//! ## Example
//!
//! ```rust
//! use cretoai_acl::{AclConfig, AclEngine, EvalContext, InMemoryPermissionStore, NewRole, PermissionDescriptor, RoleManager};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AclConfig::from_toml_str(r#"
//!     [[resources]]
//!     id = 1
//!     name = "documents"
//! "#)?;
//! let engine = Arc::new(AclEngine::new(&config, Arc::new(InMemoryPermissionStore::new()))?);
//! let roles = RoleManager::new(engine.clone());
//!
//! let ctx = EvalContext::guarded();
//! roles.add_role(ctx, None, NewRole::new("editors")
//!     .with_permissions(vec![PermissionDescriptor::new("documents", ["42"], true)])
//!     .with_users(vec![7])).await?;
//!
//! assert!(engine.check(ctx, "documents", &["42".to_string()], Some(7)).await?);
//! assert!(!engine.check(ctx, "documents", &["43".to_string()], Some(7)).await?);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod dependency;
pub mod engine;
pub mod error;
pub mod merge;
pub mod projector;
pub mod query;
pub mod roles;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use catalog::{ResourceOptions, RuleCatalog};
pub use config::{AclConfig, ResourceDef};
pub use engine::{AclEngine, EvalContext, Polarity};
pub use error::{AclError, Result};
pub use merge::{merge, Merged};
pub use query::{apply_filter, FilterOutcome, Predicate, PredicateSet, QueryScope};
pub use roles::{NewRole, RoleManager, RoleRef, RoleView};
pub use store::{InMemoryPermissionStore, PermissionStore};
pub use types::{
    FilterDecision, FilterResult, PermissionDescriptor, PermissionRule,
    ResourceId, Role, RoleId, UserId, ValueSet,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
