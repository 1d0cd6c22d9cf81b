//! Cursor types

use crate::config::DATE_FORMAT;
use crate::error::{Error, Result};
use crate::types::{JsonValue, ReplicationKey};
use chrono::NaiveDate;
use std::fmt;

/// Resumable position of one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// Next page to fetch, starting at 1
    Page(u32),
    /// Next day to query
    Date(NaiveDate),
}

impl Cursor {
    /// Replication key this cursor is stored under
    pub fn key(&self) -> ReplicationKey {
        match self {
            Self::Page(_) => ReplicationKey::Page,
            Self::Date(_) => ReplicationKey::DateFrom,
        }
    }

    /// JSON form written to state
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Page(page) => JsonValue::from(*page),
            Self::Date(date) => JsonValue::String(date.format(DATE_FORMAT).to_string()),
        }
    }

    /// Read a persisted bookmark value
    ///
    /// Page bookmarks may be stored as numbers or numeric strings. Date
    /// bookmarks accept a bare date or a timestamp starting with one.
    pub fn from_json(key: ReplicationKey, value: &JsonValue) -> Result<Self> {
        match key {
            ReplicationKey::Page => {
                let page = match value {
                    JsonValue::Number(n) => n.as_u64(),
                    JsonValue::String(s) => s.trim().parse::<u64>().ok(),
                    _ => None,
                }
                .and_then(|p| u32::try_from(p).ok())
                .ok_or_else(|| Error::state(format!("invalid page bookmark: {value}")))?;
                Ok(Self::Page(page))
            }
            ReplicationKey::DateFrom => {
                let raw = value
                    .as_str()
                    .ok_or_else(|| Error::state(format!("invalid date bookmark: {value}")))?;
                parse_date(raw).map(Self::Date)
            }
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(page) => write!(f, "page {page}"),
            Self::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), DATE_FORMAT))
        .map_err(|e| Error::state(format!("invalid date bookmark '{raw}': {e}")))
}
