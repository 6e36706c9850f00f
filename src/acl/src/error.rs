//! Error types for the ACL engine

use crate::types::RoleId;
use thiserror::Error;

/// ACL engine errors
///
/// Decision paths never produce these for missing users, unmapped resources or
/// empty rule sets; those fall back to the configured default permission.
#[derive(Debug, Error)]
pub enum AclError {
    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A role with this name already exists
    #[error("Role already exists: {0}")]
    DuplicateRole(String),

    /// Role id not known to the store
    #[error("Role not found: {0}")]
    RoleNotFound(RoleId),

    /// Invalid catalog or engine configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Permission store failure
    #[error("Store error: {0}")]
    Store(String),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ACL operations
pub type Result<T> = std::result::Result<T, AclError>;
