//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs.

use crate::bookmark::Cursor;
use crate::error::Result;
use crate::types::{JsonObject, JsonValue, ReplicationKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete run state
///
/// Keys other than `bookmarks` are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream bookmark columns
    #[serde(default)]
    pub bookmarks: BTreeMap<String, JsonObject>,

    /// Unrecognised top-level keys
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bookmark value for a stream column
    pub fn get_bookmark(&self, stream: &str, key: &str) -> Option<&JsonValue> {
        self.bookmarks.get(stream)?.get(key)
    }

    /// Set a raw bookmark value
    pub fn set_bookmark(&mut self, stream: &str, key: &str, value: JsonValue) {
        self.bookmarks
            .entry(stream.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    /// Typed cursor for a stream, if one was committed
    pub fn get_cursor(&self, stream: &str, key: ReplicationKey) -> Result<Option<Cursor>> {
        match self.get_bookmark(stream, key.as_str()) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(value) => Cursor::from_json(key, value).map(Some),
        }
    }

    /// Commit a cursor for a stream
    pub fn set_cursor(&mut self, stream: &str, cursor: Cursor) {
        self.set_bookmark(stream, cursor.key().as_str(), cursor.to_json());
    }

    /// Serialize to a JSON value
    pub fn to_value(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or_default()
    }
}
