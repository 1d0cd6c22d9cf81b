//! Page reader
//!
//! State is explicit: the next page number, the caller's query parameters
//! and the retry budget. Suspension happens only inside network calls and
//! sleeps.

use super::types::{LastPageRule, Page, PAGE_PARAM};
use crate::error::{Error, Result};
use crate::http::{HttpClient, QueryParams, RetryBudget, RetryPolicy};
use crate::resources::DEFAULT_PAGE_SIZE;
use crate::types::JsonValue;
use futures::stream::{self, Stream};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

/// Fetches the pages of one collection request
#[derive(Debug)]
pub struct PageReader {
    client: Arc<HttpClient>,
    resource: String,
    params: QueryParams,
    page: u32,
    page_size: usize,
    last_page: LastPageRule,
    retry: RetryBudget,
    pages_fetched: u64,
    records_fetched: u64,
    done: bool,
}

impl PageReader {
    /// Create a reader starting at `start_page`
    ///
    /// `params` holds any filters besides the page number, e.g. the
    /// `date_from`/`date_to` pair of a day bucket.
    pub fn new(
        client: Arc<HttpClient>,
        resource: impl Into<String>,
        params: QueryParams,
        start_page: u32,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            resource: resource.into(),
            params,
            page: start_page.max(1),
            page_size: DEFAULT_PAGE_SIZE,
            last_page: LastPageRule::default(),
            retry: RetryBudget::new(retry),
            pages_fetched: 0,
            records_fetched: 0,
            done: false,
        }
    }

    /// Set the page size used by [`LastPageRule::ShortPage`]
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the last-page rule
    #[must_use]
    pub fn with_last_page(mut self, rule: LastPageRule) -> Self {
        self.last_page = rule;
        self
    }

    /// Page number the next request will use
    pub fn current_page(&self) -> u32 {
        self.page
    }

    /// Pages fetched so far
    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    /// Records fetched so far
    pub fn records_fetched(&self) -> u64 {
        self.records_fetched
    }

    /// Retries spent over the reader's lifetime
    pub fn retries(&self) -> u32 {
        self.retry.total()
    }

    /// Check whether the last page has been read
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Fetch the next page, or `None` after the last one
    pub async fn next_page(&mut self) -> Result<Option<Page>> {
        if self.done {
            return Ok(None);
        }

        self.params
            .insert(PAGE_PARAM.to_string(), self.page.to_string());
        let url = self.client.build_url(&self.resource, &self.params)?;

        let first_call = self.pages_fetched == 0;
        if first_call {
            info!("Get from URL (first call): {url}");
        } else {
            debug!("Get from URL: {url}");
        }

        let response = loop {
            match self.client.get_page(&url).await {
                Ok(response) => {
                    self.retry.reset();
                    break response;
                }
                Err(e) => {
                    self.retry
                        .backoff(url.as_str(), e, self.client.sleeper())
                        .await?;
                }
            }
        };

        if first_call {
            if let Some(link) = &response.link {
                info!("Links: {link}");
            }
        }

        let count = response.records.len();
        let number = self.page;
        self.pages_fetched += 1;
        self.records_fetched += count as u64;
        info!(
            "Call for {} page {number} returned {count} records",
            self.resource
        );

        let is_last = self.last_page.is_last(count, self.page_size);
        if is_last {
            info!("No more pages to fetch for {}", self.resource);
            self.done = true;
        } else {
            self.page += 1;
            if self.page % 10 == 0 {
                info!(
                    "Next {} page to get: {}. Links: {}",
                    self.resource,
                    self.page,
                    response.link.as_deref().unwrap_or("-")
                );
            }
        }

        Ok(Some(Page {
            number,
            records: response.records,
            is_last,
            link: response.link,
        }))
    }

    /// Lazy stream of `(page, record)` pairs
    ///
    /// Each record is tagged with the page number it was fetched with. A new
    /// request is only issued once every record of the previous page has
    /// been consumed.
    pub fn records(&mut self) -> impl Stream<Item = Result<(u32, JsonValue)>> + '_ {
        stream::try_unfold(
            (self, VecDeque::new()),
            |(reader, mut buffered)| async move {
                loop {
                    if let Some(item) = buffered.pop_front() {
                        return Ok::<_, Error>(Some((item, (reader, buffered))));
                    }

                    match reader.next_page().await? {
                        Some(page) => {
                            let number = page.number;
                            buffered.extend(page.records.into_iter().map(|r| (number, r)));
                        }
                        None => return Ok(None),
                    }
                }
            },
        )
    }
}
