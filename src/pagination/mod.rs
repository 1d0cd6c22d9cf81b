//! Pagination module
//!
//! The paginated fetcher: walks the `page` parameter of one collection
//! request until the API returns a short page.
//!
//! # Overview
//!
//! - `PageReader` issues one request per page, guarded by the retry budget,
//!   and exposes both a page-at-a-time API and a lazy `(page, record)` stream
//! - `LastPageRule` decides when a page is the final one

mod reader;
mod types;

pub use reader::PageReader;
pub use types::{LastPageRule, Page, PAGE_PARAM};

#[cfg(test)]
mod tests;
