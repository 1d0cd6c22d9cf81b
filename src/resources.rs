//! Built-in resource definitions embedded in the binary
//!
//! The supported API collections, their identity columns and their
//! replication key live in `resources/tapfiliate.yaml`.

use crate::error::{Error, Result};
use crate::pagination::LastPageRule;
use crate::types::{JsonValue, ReplicationKey, ReplicationMethod};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Embedded registry YAML
pub const BUILTIN_RESOURCES_YAML: &str = include_str!("../resources/tapfiliate.yaml");

/// Page size enforced by the API
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// A named API collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDefinition {
    /// Resource path segment, also used as the stream name
    pub name: String,
    /// Identity columns
    #[serde(default)]
    pub key_properties: Vec<String>,
    /// Bookmark column, `None` for full-table resources
    #[serde(default)]
    pub replication_key: Option<ReplicationKey>,
    /// How the last page of a fetch sequence is recognised
    #[serde(default)]
    pub last_page: LastPageRule,
    /// JSON schema for emitted records
    #[serde(default = "default_schema")]
    pub schema: JsonValue,
}

fn default_schema() -> JsonValue {
    json!({
        "type": ["null", "object"],
        "additionalProperties": true,
        "properties": {}
    })
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl ResourceDefinition {
    /// Create a resource with the default schema
    pub fn new(name: impl Into<String>, replication_key: Option<ReplicationKey>) -> Self {
        Self {
            name: name.into(),
            key_properties: vec!["id".to_string()],
            replication_key,
            last_page: LastPageRule::default(),
            schema: default_schema(),
        }
    }

    /// Set the last-page rule
    #[must_use]
    pub fn with_last_page(mut self, rule: LastPageRule) -> Self {
        self.last_page = rule;
        self
    }

    /// Replication method advertised for this resource
    pub fn replication_method(&self) -> ReplicationMethod {
        ReplicationMethod::for_key(self.replication_key)
    }
}

/// The set of resources a run may extract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRegistry {
    /// API name
    pub name: String,
    /// Records per full page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Supported resources, in extraction order
    pub resources: Vec<ResourceDefinition>,
}

impl ResourceRegistry {
    /// Load the embedded registry
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_RESOURCES_YAML)
    }

    /// Parse a registry from YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let registry: Self = serde_yaml::from_str(yaml)?;
        if registry.page_size == 0 {
            return Err(Error::config("page_size must be greater than zero"));
        }
        Ok(registry)
    }

    /// Look up a resource, failing on names the API variant does not support
    pub fn get(&self, name: &str) -> Result<&ResourceDefinition> {
        self.resources
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| Error::unknown_resource(name))
    }

    /// Check whether a resource is supported
    pub fn contains(&self, name: &str) -> bool {
        self.resources.iter().any(|r| r.name == name)
    }

    /// Resource names in registry order
    pub fn names(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.name.as_str()).collect()
    }
}
