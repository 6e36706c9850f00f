//! Engine configuration loading

use crate::error::Result;
use crate::types::ResourceId;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete ACL configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AclConfig {
    /// Fallback decision when no rule data applies
    #[serde(default)]
    pub default_permission: bool,

    /// Resource or route names that are never checked
    #[serde(default)]
    pub always_allow: Vec<String>,

    /// Static resource catalog
    #[serde(default)]
    pub resources: Vec<ResourceDef>,
}

/// One protected resource group
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResourceDef {
    pub id: ResourceId,
    pub name: String,
    /// Route names resolving to this resource
    #[serde(default)]
    pub routes: Vec<String>,
    /// An empty grant on a sub-resource is not persisted
    #[serde(default)]
    pub sub_resource: bool,
    /// Resources implicitly granted with this one
    #[serde(default)]
    pub depend: Vec<String>,
}

impl ResourceDef {
    pub fn new(id: ResourceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            routes: Vec::new(),
            sub_resource: false,
            depend: Vec::new(),
        }
    }

    pub fn with_routes(mut self, routes: &[&str]) -> Self {
        self.routes = routes.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn sub_resource(mut self) -> Self {
        self.sub_resource = true;
        self
    }

    pub fn depends_on(mut self, depend: &[&str]) -> Self {
        self.depend = depend.iter().map(|d| d.to_string()).collect();
        self
    }
}

impl AclConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }
}
