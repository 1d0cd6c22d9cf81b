//! Common types used throughout tapfiliate-sync
//!
//! Shared type aliases and small enums used across multiple modules.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Replication Key
// ============================================================================

/// Bookmark column used to resume a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicationKey {
    /// Incrementing page number
    Page,
    /// Single-day `date_from`/`date_to` filter
    DateFrom,
}

impl ReplicationKey {
    /// Name of the bookmark column in state and metadata
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::DateFrom => "date_from",
        }
    }
}

impl fmt::Display for ReplicationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Replication Method
// ============================================================================

/// How a stream is replicated, as advertised in catalog metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplicationMethod {
    /// Resume from a bookmark
    Incremental,
    /// Re-extract the whole collection every run
    #[default]
    FullTable,
}

impl ReplicationMethod {
    /// Replication method implied by an optional replication key
    pub fn for_key(key: Option<ReplicationKey>) -> Self {
        if key.is_some() {
            Self::Incremental
        } else {
            Self::FullTable
        }
    }
}
