//! Tests for the catalog module

use super::*;
use crate::error::Error;
use crate::resources::{ResourceDefinition, ResourceRegistry};
use crate::types::ReplicationKey;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::tempdir;

fn registry() -> ResourceRegistry {
    ResourceRegistry::builtin().unwrap()
}

fn field_inclusion<'a>(entries: &'a [MetadataEntry], breadcrumb: &[&str]) -> Option<&'a str> {
    entries
        .iter()
        .find(|m| m.breadcrumb == breadcrumb)
        .and_then(|m| m.metadata.get("inclusion"))
        .and_then(|v| v.as_str())
}

// ============================================================================
// Discovery Tests
// ============================================================================

#[test]
fn test_discover_lists_every_resource() {
    let catalog = Catalog::discover(&registry());
    let ids: Vec<&str> = catalog
        .streams
        .iter()
        .map(|s| s.tap_stream_id.as_str())
        .collect();
    assert_eq!(
        ids,
        vec![
            "affiliate-groups",
            "affiliate-prospects",
            "affiliates",
            "commissions",
            "conversions",
            "customers",
            "programs",
        ]
    );
    assert!(catalog.streams.iter().all(|s| s.tap_stream_id == s.stream));
    assert!(catalog.selected_streams().is_empty());
}

#[test]
fn test_page_resource_root_metadata() {
    let catalog = Catalog::discover(&registry());
    let affiliates = catalog.get("affiliates").unwrap();

    assert_eq!(affiliates.key_properties, vec!["id".to_string()]);
    assert_eq!(
        serde_json::to_value(affiliates.root_metadata().unwrap()).unwrap(),
        json!({
            "inclusion": "available",
            "forced-replication-method": "INCREMENTAL",
            "valid-replication-keys": ["page"],
            "table-key-properties": ["id"]
        })
    );
}

#[test]
fn test_date_resource_root_metadata() {
    let catalog = Catalog::discover(&registry());
    let root = catalog.get("conversions").unwrap().root_metadata().unwrap();
    assert_eq!(root["valid-replication-keys"], json!(["date_from"]));
}

#[test]
fn test_full_table_resource_metadata() {
    let resource = ResourceDefinition::new("balances", None);
    let metadata = resource_metadata(&resource);
    let root = &metadata[0].metadata;

    assert_eq!(root["forced-replication-method"], json!("FULL_TABLE"));
    assert!(root.get("valid-replication-keys").is_none());
    assert_eq!(metadata.len(), 1);
}

#[test]
fn test_field_inclusion() {
    let mut resource = ResourceDefinition::new("affiliates", Some(ReplicationKey::Page));
    resource.schema = json!({
        "type": ["null", "object"],
        "properties": {
            "id": {"type": ["null", "string"]},
            "email": {"type": ["null", "string"]},
            "page": {"type": ["null", "integer"]},
            "company": {
                "type": ["null", "object"],
                "properties": {
                    "name": {"type": ["null", "string"]},
                    "description": {"type": ["null", "string"]}
                }
            }
        }
    });

    let metadata = resource_metadata(&resource);
    assert_eq!(field_inclusion(&metadata, &["properties", "id"]), Some("automatic"));
    assert_eq!(field_inclusion(&metadata, &["properties", "page"]), Some("automatic"));
    assert_eq!(field_inclusion(&metadata, &["properties", "email"]), Some("available"));
    assert_eq!(
        field_inclusion(&metadata, &["properties", "company", "properties", "name"]),
        Some("available")
    );
    assert_eq!(
        field_inclusion(&metadata, &["properties", "company", "properties", "description"]),
        Some("available")
    );
    // The object itself gets no entry of its own
    assert_eq!(field_inclusion(&metadata, &["properties", "company"]), None);
}

#[test]
fn test_builtin_nested_objects_expand() {
    let catalog = Catalog::discover(&registry());
    let conversions = catalog.get("conversions").unwrap();
    assert!(conversions
        .metadata
        .iter()
        .any(|m| m.breadcrumb.len() == 4 && m.breadcrumb[1] == "affiliate"));
}

// ============================================================================
// Selection Tests
// ============================================================================

#[test]
fn test_set_selected() {
    let mut entry = Catalog::discover(&registry()).streams.remove(0);
    assert!(!entry.is_selected());
    entry.set_selected(true);
    assert!(entry.is_selected());
    entry.set_selected(false);
    assert!(!entry.is_selected());
}

#[test]
fn test_set_selected_without_root_metadata() {
    let mut entry = CatalogEntry {
        tap_stream_id: "programs".to_string(),
        stream: "programs".to_string(),
        schema: json!({}),
        key_properties: vec![],
        metadata: vec![],
    };
    entry.set_selected(true);
    assert!(entry.is_selected());
    assert!(entry.metadata[0].is_root());
}

#[test]
fn test_select_all_without_catalog() {
    let selected = select_streams(&registry(), None, None).unwrap();
    assert_eq!(selected.len(), 7);
}

#[test]
fn test_select_from_catalog() {
    let registry = registry();
    let mut catalog = Catalog::discover(&registry);
    for entry in &mut catalog.streams {
        if entry.tap_stream_id == "customers" || entry.tap_stream_id == "affiliates" {
            entry.set_selected(true);
        }
    }

    let selected = select_streams(&registry, Some(&catalog), None).unwrap();
    let ids: Vec<&str> = selected.iter().map(|s| s.tap_stream_id.as_str()).collect();
    assert_eq!(ids, vec!["affiliates", "customers"]);
}

#[test]
fn test_select_with_filter() {
    let filter = vec!["programs".to_string(), "commissions".to_string()];
    let selected = select_streams(&registry(), None, Some(&filter)).unwrap();
    let ids: Vec<&str> = selected.iter().map(|s| s.tap_stream_id.as_str()).collect();
    assert_eq!(ids, vec!["commissions", "programs"]);
}

#[test]
fn test_select_filter_rejects_unknown_resource() {
    let filter = vec!["payments".to_string()];
    let err = select_streams(&registry(), None, Some(&filter)).unwrap_err();
    assert!(matches!(err, Error::UnknownResource { ref resource } if resource.as_str() == "payments"));
}

// ============================================================================
// Loading Tests
// ============================================================================

#[test]
fn test_catalog_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.json");

    let mut catalog = Catalog::discover(&registry());
    catalog.streams[2].set_selected(true);
    std::fs::write(&path, catalog.to_json_pretty().unwrap()).unwrap();

    let loaded = Catalog::from_file(&path).unwrap();
    assert_eq!(loaded, catalog);
    assert_eq!(loaded.selected_streams()[0].tap_stream_id, "affiliates");
}

#[test]
fn test_catalog_minimal_json() {
    let catalog = Catalog::from_json_str(
        r#"{"streams": [{
            "tap_stream_id": "programs",
            "stream": "programs",
            "schema": {"type": "object"},
            "metadata": [{"breadcrumb": [], "metadata": {"selected": true}}]
        }]}"#,
    )
    .unwrap();

    assert_eq!(catalog.selected_streams().len(), 1);
    assert!(catalog.streams[0].key_properties.is_empty());
}

#[test]
fn test_catalog_errors() {
    let err = Catalog::from_json_str("{\"streams\": 5}").unwrap_err();
    assert!(matches!(err, Error::Catalog { .. }));

    let err = Catalog::from_file("/nonexistent/catalog.json").unwrap_err();
    assert!(err.to_string().contains("Failed to read catalog"));
}
