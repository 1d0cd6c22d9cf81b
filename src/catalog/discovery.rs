//! Catalog discovery and stream selection

use super::types::{Catalog, CatalogEntry, Inclusion, MetadataEntry};
use crate::error::{Error, Result};
use crate::resources::{ResourceDefinition, ResourceRegistry};
use crate::types::{JsonObject, JsonValue, ReplicationMethod};
use serde_json::json;
use tracing::{debug, warn};

impl Catalog {
    /// Build a catalog describing every resource of the registry
    ///
    /// Nothing is selected; callers mark streams themselves or pass the
    /// catalog back in with `selected: true` set.
    pub fn discover(registry: &ResourceRegistry) -> Self {
        let streams = registry
            .resources
            .iter()
            .map(CatalogEntry::from_resource)
            .collect();
        Self { streams }
    }
}

impl CatalogEntry {
    /// Describe a single resource
    pub fn from_resource(resource: &ResourceDefinition) -> Self {
        Self {
            tap_stream_id: resource.name.clone(),
            stream: resource.name.clone(),
            schema: resource.schema.clone(),
            key_properties: resource.key_properties.clone(),
            metadata: resource_metadata(resource),
        }
    }
}

/// Stream and field metadata for a resource
///
/// Object-typed properties are described through their nested properties
/// only. Identity and bookmark columns are `automatic`, everything else
/// `available`.
pub fn resource_metadata(resource: &ResourceDefinition) -> Vec<MetadataEntry> {
    let replication_key = resource.replication_key.map(|k| k.as_str().to_string());

    let mut root = JsonObject::new();
    root.insert("inclusion".to_string(), json!(Inclusion::Available.as_str()));
    root.insert(
        "forced-replication-method".to_string(),
        json!(resource.replication_method()),
    );
    if resource.replication_method() == ReplicationMethod::Incremental {
        root.insert("valid-replication-keys".to_string(), json!([replication_key]));
    }
    if !resource.key_properties.is_empty() {
        root.insert(
            "table-key-properties".to_string(),
            json!(resource.key_properties),
        );
    }

    let mut entries = vec![MetadataEntry::new(Vec::new(), root)];

    let Some(properties) = resource.schema.get("properties").and_then(JsonValue::as_object)
    else {
        return entries;
    };

    for (name, property) in properties {
        if is_object_type(property) {
            let nested = property
                .get("properties")
                .and_then(JsonValue::as_object)
                .into_iter()
                .flat_map(|p| p.keys());
            for child in nested {
                entries.push(MetadataEntry::field(
                    vec![
                        "properties".to_string(),
                        name.clone(),
                        "properties".to_string(),
                        child.clone(),
                    ],
                    Inclusion::Available,
                ));
            }
        } else {
            let automatic = resource.key_properties.contains(name)
                || replication_key.as_deref() == Some(name.as_str());
            let inclusion = if automatic {
                Inclusion::Automatic
            } else {
                Inclusion::Available
            };
            entries.push(MetadataEntry::field(
                vec!["properties".to_string(), name.clone()],
                inclusion,
            ));
        }
    }

    entries
}

fn is_object_type(schema: &JsonValue) -> bool {
    match schema.get("type") {
        Some(JsonValue::String(t)) => t == "object",
        Some(JsonValue::Array(types)) => types.iter().any(|t| t == "object"),
        _ => false,
    }
}

/// Resolve the streams a run extracts, in order
///
/// With a catalog, the streams it marks selected; without one, every
/// registry resource. `filter` narrows the result further. Filter names
/// unknown to the registry are rejected before any extraction starts.
pub fn select_streams(
    registry: &ResourceRegistry,
    catalog: Option<&Catalog>,
    filter: Option<&[String]>,
) -> Result<Vec<CatalogEntry>> {
    let mut selected: Vec<CatalogEntry> = match catalog {
        Some(catalog) => catalog.selected_streams().into_iter().cloned().collect(),
        None => Catalog::discover(registry).streams,
    };

    if let Some(filter) = filter {
        if let Some(unknown) = filter.iter().find(|name| !registry.contains(name)) {
            return Err(Error::unknown_resource(unknown.as_str()));
        }
        for name in filter {
            if !selected.iter().any(|s| &s.tap_stream_id == name) {
                warn!("Stream {name} was requested but is not selected in the catalog");
            }
        }
        selected.retain(|s| filter.contains(&s.tap_stream_id));
    }

    debug!(
        "Selected streams: {}",
        selected
            .iter()
            .map(|s| s.tap_stream_id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(selected)
}
