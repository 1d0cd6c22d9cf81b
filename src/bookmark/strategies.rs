//! Cursor strategy implementations

use chrono::{Days, NaiveDate};
use tracing::info;

/// Persisted pages above this value are rewound on resume
pub const PAGE_REWIND_THRESHOLD: u32 = 10;

// ============================================================================
// Page Cursor
// ============================================================================

/// Page-number cursor with a resume rewind window
///
/// Bookmarks above [`PAGE_REWIND_THRESHOLD`] restart at
/// `floor(page * offset_percentage / 100)`; the pages in between are read
/// and delivered again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursorStrategy {
    offset_percentage: u32,
}

impl PageCursorStrategy {
    /// Create a strategy keeping `offset_percentage` percent of the bookmark
    pub fn new(offset_percentage: u32) -> Self {
        Self {
            offset_percentage: offset_percentage.min(100),
        }
    }

    /// Percentage of the persisted page kept on resume
    pub fn offset_percentage(&self) -> u32 {
        self.offset_percentage
    }

    /// Page to start from given the persisted bookmark
    ///
    /// Never above the bookmark and never below 1.
    pub fn start_page(&self, persisted: Option<u32>) -> u32 {
        let Some(page) = persisted else {
            return 1;
        };

        if page <= PAGE_REWIND_THRESHOLD {
            return page.max(1);
        }

        let rewound = u64::from(page) * u64::from(self.offset_percentage) / 100;
        let start = u32::try_from(rewound).unwrap_or(page).clamp(1, page);
        info!("Rewinding page bookmark {page} to {start}");
        start
    }
}

// ============================================================================
// Date Cursor
// ============================================================================

/// Single-day cursor walking from a lookback date up to today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateCursorStrategy {
    lookback_days: u32,
}

impl DateCursorStrategy {
    /// Create a strategy re-reading `lookback_days` before the bookmark
    pub fn new(lookback_days: u32) -> Self {
        Self { lookback_days }
    }

    /// Days re-read before the bookmark
    pub fn lookback_days(&self) -> u32 {
        self.lookback_days
    }

    /// First day to query for a bookmark
    pub fn start_date(&self, bookmark: NaiveDate) -> NaiveDate {
        bookmark
            .checked_sub_days(Days::new(u64::from(self.lookback_days)))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Every day from the lookback start through `today`, inclusive
    pub fn days(&self, bookmark: NaiveDate, today: NaiveDate) -> DayRange {
        DayRange::new(self.start_date(bookmark), today)
    }
}

/// Inclusive iterator over calendar days
#[derive(Debug, Clone)]
pub struct DayRange {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl DayRange {
    /// Create a range; empty when `start` is after `end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            next: (start <= end).then_some(start),
            end,
        }
    }
}

impl Iterator for DayRange {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = current.succ_opt().filter(|d| *d <= self.end);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self
            .next
            .map_or(0, |d| (self.end - d).num_days() as usize + 1);
        (len, Some(len))
    }
}

impl ExactSizeIterator for DayRange {}
