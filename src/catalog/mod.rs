//! Catalog module
//!
//! Describes the extractable streams: schema, identity columns and
//! replication metadata.
//!
//! # Overview
//!
//! - `Catalog::discover` builds a catalog from the resource registry
//! - `Catalog::from_file` loads a catalog with user stream selections
//! - `select_streams` resolves which resources a run extracts

mod discovery;
mod types;

pub use discovery::{resource_metadata, select_streams};
pub use types::{Catalog, CatalogEntry, Inclusion, MetadataEntry};

#[cfg(test)]
mod tests;
