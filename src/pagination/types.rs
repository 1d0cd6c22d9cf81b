//! Pagination types

use crate::types::JsonValue;
use serde::{Deserialize, Serialize};

/// Query parameter carrying the page number
pub const PAGE_PARAM: &str = "page";

/// Rule deciding whether a page ends the sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastPageRule {
    /// Last page when it holds fewer records than the page size
    #[default]
    ShortPage,
    /// Last page when it holds at most one record
    AtMostOne,
}

impl LastPageRule {
    /// Check whether a page of `count` records is the last one
    pub fn is_last(self, count: usize, page_size: usize) -> bool {
        match self {
            Self::ShortPage => count < page_size,
            Self::AtMostOne => count <= 1,
        }
    }
}

/// One decoded page
#[derive(Debug, Clone)]
pub struct Page {
    /// Page number the records were fetched with
    pub number: u32,
    /// Records in response order
    pub records: Vec<JsonValue>,
    /// Whether the sequence ends here
    pub is_last: bool,
    /// `Link` header, informational only
    pub link: Option<String>,
}

impl Page {
    /// Number of records on the page
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the page is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
