//! Resource catalog: name ↔ id mapping and static resource options

use crate::config::{AclConfig, ResourceDef};
use crate::error::{AclError, Result};
use crate::types::ResourceId;
use std::collections::HashMap;

/// Static options attached to a resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceOptions {
    pub sub_resource: bool,
    pub depend: Vec<String>,
}

/// Immutable resource catalog
///
/// Resources are looked up by their own name or by any of their route names;
/// both resolve to the resource id.
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    /// Resource definitions in declaration order
    resources: Vec<ResourceDef>,

    /// Resource or route name -> index into `resources`
    by_name: HashMap<String, usize>,

    /// Resource id -> index into `resources`
    by_id: HashMap<ResourceId, usize>,
}

impl RuleCatalog {
    /// Build a catalog from resource definitions
    ///
    /// Fails on duplicate ids or names and on dependencies naming an unknown
    /// resource.
    pub fn new(resources: Vec<ResourceDef>) -> Result<Self> {
        let mut by_name = HashMap::new();
        let mut by_id = HashMap::new();

        for (idx, def) in resources.iter().enumerate() {
            if def.name.is_empty() {
                return Err(AclError::Config(format!(
                    "Resource {} has an empty name",
                    def.id
                )));
            }

            if by_id.insert(def.id, idx).is_some() {
                return Err(AclError::Config(format!("Duplicate resource id: {}", def.id)));
            }

            for name in std::iter::once(&def.name).chain(def.routes.iter()) {
                if let Some(prev) = by_name.insert(name.clone(), idx) {
                    if prev != idx || name != &def.name {
                        return Err(AclError::Config(format!(
                            "Duplicate resource or route name: {}",
                            name
                        )));
                    }
                }
            }
        }

        for def in &resources {
            for dep in &def.depend {
                let known = by_name
                    .get(dep)
                    .map(|&idx| resources[idx].name == *dep)
                    .unwrap_or(false);
                if !known {
                    return Err(AclError::Config(format!(
                        "Resource '{}' depends on unknown resource '{}'",
                        def.name, dep
                    )));
                }
            }
        }

        Ok(Self { resources, by_name, by_id })
    }

    /// Build the catalog declared in an engine configuration
    pub fn from_config(config: &AclConfig) -> Result<Self> {
        Self::new(config.resources.clone())
    }

    /// Resolve a resource or route name to its resource id
    pub fn resource_id_of(&self, name: &str) -> Option<ResourceId> {
        self.by_name.get(name).map(|&idx| self.resources[idx].id)
    }

    /// Canonical resource name for an id
    pub fn resource_name_of(&self, id: ResourceId) -> Option<&str> {
        self.by_id.get(&id).map(|&idx| self.resources[idx].name.as_str())
    }

    /// Static options of a resource, looked up by canonical name
    pub fn options_of(&self, name: &str) -> Option<ResourceOptions> {
        let def = self.definition(name)?;
        Some(ResourceOptions {
            sub_resource: def.sub_resource,
            depend: def.depend.clone(),
        })
    }

    /// Canonical resource names in declaration order
    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.resources.iter().map(|def| def.name.as_str())
    }

    fn definition(&self, name: &str) -> Option<&ResourceDef> {
        self.by_name
            .get(name)
            .map(|&idx| &self.resources[idx])
            .filter(|def| def.name == name)
    }
}
