//! Bookmark module
//!
//! Cursor strategies that turn a persisted bookmark into a starting position
//! and decide how far to re-read on resume.
//!
//! # Overview
//!
//! - `Cursor` - a page number or a calendar day
//! - `PageCursorStrategy` - resumes page cursors with a rewind window
//! - `DateCursorStrategy` - walks single-day buckets from a lookback date to today

mod strategies;
mod types;

pub use strategies::{DateCursorStrategy, DayRange, PageCursorStrategy, PAGE_REWIND_THRESHOLD};
pub use types::Cursor;
