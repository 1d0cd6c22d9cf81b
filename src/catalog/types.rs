//! Catalog types

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root metadata key marking a stream as selected
pub const SELECTED_KEY: &str = "selected";

/// Field inclusion level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Inclusion {
    /// Always extracted
    Automatic,
    /// Extracted when selected
    Available,
    /// Never extracted
    Unsupported,
}

impl Inclusion {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::Available => "available",
            Self::Unsupported => "unsupported",
        }
    }
}

/// Metadata attached to one breadcrumb of a stream
///
/// An empty breadcrumb addresses the stream itself; `["properties", "id"]`
/// addresses a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Path into the schema
    pub breadcrumb: Vec<String>,
    /// Metadata values
    pub metadata: JsonObject,
}

impl MetadataEntry {
    /// Create an entry
    pub fn new(breadcrumb: Vec<String>, metadata: JsonObject) -> Self {
        Self {
            breadcrumb,
            metadata,
        }
    }

    /// Create a field entry with only an inclusion value
    pub fn field(breadcrumb: Vec<String>, inclusion: Inclusion) -> Self {
        let mut metadata = JsonObject::new();
        metadata.insert(
            "inclusion".to_string(),
            JsonValue::String(inclusion.as_str().to_string()),
        );
        Self::new(breadcrumb, metadata)
    }

    /// Check whether this entry addresses the stream itself
    pub fn is_root(&self) -> bool {
        self.breadcrumb.is_empty()
    }
}

/// One stream of a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stream identifier
    pub tap_stream_id: String,
    /// Stream name
    pub stream: String,
    /// JSON schema of the records
    pub schema: JsonValue,
    /// Identity columns
    #[serde(default)]
    pub key_properties: Vec<String>,
    /// Breadcrumb metadata
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

impl CatalogEntry {
    /// Root (stream-level) metadata
    pub fn root_metadata(&self) -> Option<&JsonObject> {
        self.metadata
            .iter()
            .find(|m| m.is_root())
            .map(|m| &m.metadata)
    }

    /// Check whether the stream was selected for extraction
    pub fn is_selected(&self) -> bool {
        self.root_metadata()
            .and_then(|m| m.get(SELECTED_KEY))
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
    }

    /// Mark the stream as selected or not, creating root metadata if needed
    pub fn set_selected(&mut self, selected: bool) {
        let value = JsonValue::Bool(selected);
        match self.metadata.iter_mut().find(|m| m.is_root()) {
            Some(root) => {
                root.metadata.insert(SELECTED_KEY.to_string(), value);
            }
            None => {
                let mut metadata = JsonObject::new();
                metadata.insert(SELECTED_KEY.to_string(), value);
                self.metadata.insert(0, MetadataEntry::new(Vec::new(), metadata));
            }
        }
    }
}

/// A set of stream descriptions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Streams, in extraction order
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    /// Load a catalog from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::catalog(format!("Failed to read catalog {}: {e}", path.display()))
        })?;
        Self::from_json_str(&contents)
    }

    /// Parse a catalog from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::catalog(format!("Invalid catalog: {e}")))
    }

    /// Serialise as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Find a stream by identifier
    pub fn get(&self, stream_id: &str) -> Option<&CatalogEntry> {
        self.streams.iter().find(|s| s.tap_stream_id == stream_id)
    }

    /// Streams whose root metadata carries `selected: true`
    pub fn selected_streams(&self) -> Vec<&CatalogEntry> {
        self.streams.iter().filter(|s| s.is_selected()).collect()
    }
}
