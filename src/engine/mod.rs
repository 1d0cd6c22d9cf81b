//! Execution engine module
//!
//! Stream orchestration: cursor resolution, record emission and bookmark
//! commits.
//!
//! # Overview
//!
//! - `SyncEngine` - extracts resources one after another into a sink
//! - `SyncStats` / `StreamStats` - run statistics
//!
//! Page-cursor resources commit a bookmark and emit state after every
//! record. Date-cursor resources commit once per day bucket, after every
//! record of that day has been emitted. Resources without a replication
//! key are read in full and never bookmarked.

mod types;

pub use types::{StreamStats, SyncStats};

use crate::bookmark::{Cursor, DateCursorStrategy, PageCursorStrategy};
use crate::catalog::CatalogEntry;
use crate::config::{TapConfig, DATE_FORMAT};
use crate::error::Result;
use crate::http::{HttpClient, HttpClientConfig, QueryParams, RetryPolicy};
use crate::output::RecordSink;
use crate::pagination::PageReader;
use crate::resources::{ResourceDefinition, ResourceRegistry};
use crate::state::StateManager;
use crate::types::{JsonValue, ReplicationKey};
use chrono::{NaiveDate, Utc};
use futures::TryStreamExt;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Query parameter for the first day of a date filter
pub const DATE_FROM_PARAM: &str = "date_from";
/// Query parameter for the last day of a date filter
pub const DATE_TO_PARAM: &str = "date_to";

/// Sync engine for orchestrating data extraction
pub struct SyncEngine<S: RecordSink> {
    client: Arc<HttpClient>,
    state: StateManager,
    sink: S,
    config: TapConfig,
    registry: ResourceRegistry,
    today: Option<NaiveDate>,
    stats: SyncStats,
}

impl<S: RecordSink> SyncEngine<S> {
    /// Create an engine with a client built from `config`
    pub fn new(
        config: TapConfig,
        registry: ResourceRegistry,
        state: StateManager,
        sink: S,
    ) -> Result<Self> {
        let client = HttpClient::new(HttpClientConfig::from_tap_config(&config))?;
        Ok(Self::with_client(client, config, registry, state, sink))
    }

    /// Create an engine around an existing client
    pub fn with_client(
        client: HttpClient,
        config: TapConfig,
        registry: ResourceRegistry,
        state: StateManager,
        sink: S,
    ) -> Self {
        Self {
            client: Arc::new(client),
            state,
            sink,
            config,
            registry,
            today: None,
            stats: SyncStats::default(),
        }
    }

    /// Pin the date treated as "today" by date cursors
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Get the sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the engine, returning its sink
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Get the HTTP client
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.config.max_retries).with_delay(self.config.retry_delay)
    }

    /// Extract every stream in order
    ///
    /// Stream names are checked against the registry before anything is
    /// emitted. The incoming state is written to the sink once up front.
    pub async fn run(&mut self, streams: &[CatalogEntry]) -> Result<&SyncStats> {
        for entry in streams {
            self.registry.get(&entry.tap_stream_id)?;
        }

        let start = Instant::now();
        self.emit_state().await?;

        for entry in streams {
            self.sync_entry(entry).await?;
        }

        #[allow(clippy::cast_possible_truncation)]
        self.stats.set_duration(start.elapsed().as_millis() as u64);

        info!(
            "Sync finished: {} streams, {} records, {} pages, {} retries, {} throttles in {}ms",
            self.stats.streams_synced,
            self.stats.records_synced,
            self.stats.pages_fetched,
            self.stats.retries,
            self.stats.throttles,
            self.stats.duration_ms
        );

        Ok(&self.stats)
    }

    /// Extract one resource using its built-in schema
    pub async fn sync_resource(&mut self, name: &str) -> Result<StreamStats> {
        let resource = self.registry.get(name)?.clone();
        let schema = resource.schema.clone();
        let key_properties = resource.key_properties.clone();
        self.sync_with_schema(&resource, &schema, &key_properties)
            .await
    }

    /// Extract one catalog stream, declaring the catalog's schema
    pub async fn sync_entry(&mut self, entry: &CatalogEntry) -> Result<StreamStats> {
        let resource = self.registry.get(&entry.tap_stream_id)?.clone();
        self.sync_with_schema(&resource, &entry.schema, &entry.key_properties)
            .await
    }

    async fn sync_with_schema(
        &mut self,
        resource: &ResourceDefinition,
        schema: &JsonValue,
        key_properties: &[String],
    ) -> Result<StreamStats> {
        info!("Syncing stream: {}", resource.name);

        let bookmark_properties: Vec<String> = resource
            .replication_key
            .iter()
            .map(|k| k.as_str().to_string())
            .collect();
        self.sink
            .write_schema(&resource.name, schema, key_properties, &bookmark_properties)?;

        let throttles_before = self.client.governor().throttle_count();
        let mut stats = StreamStats::new();

        match resource.replication_key {
            Some(ReplicationKey::Page) => self.sync_pages(resource, &mut stats).await?,
            Some(ReplicationKey::DateFrom) => self.sync_days(resource, &mut stats).await?,
            None => self.sync_full_table(resource, &mut stats).await?,
        }

        stats.throttles = self.client.governor().throttle_count() - throttles_before;
        info!(
            "Finished {}: {} records, {} pages, {} retries, {} throttles",
            resource.name, stats.records, stats.pages, stats.retries, stats.throttles
        );
        self.stats.add_stream(&resource.name, stats.clone());

        Ok(stats)
    }

    async fn sync_pages(
        &mut self,
        resource: &ResourceDefinition,
        stats: &mut StreamStats,
    ) -> Result<()> {
        let persisted = match self
            .state
            .get_cursor(&resource.name, ReplicationKey::Page)
            .await?
        {
            Some(Cursor::Page(page)) => Some(page),
            _ => None,
        };
        let start_page =
            PageCursorStrategy::new(self.config.page_offset_percentage).start_page(persisted);

        let mut reader = self.reader(resource, QueryParams::new(), start_page);
        {
            let records = reader.records();
            futures::pin_mut!(records);
            while let Some((page, record)) = records.try_next().await? {
                self.sink.write_record(&resource.name, record)?;
                stats.records += 1;
                self.state
                    .set_cursor(&resource.name, Cursor::Page(page))
                    .await?;
                self.emit_state().await?;
            }
        }

        stats.pages += reader.pages_fetched();
        stats.retries += u64::from(reader.retries());
        Ok(())
    }

    async fn sync_days(
        &mut self,
        resource: &ResourceDefinition,
        stats: &mut StreamStats,
    ) -> Result<()> {
        let bookmark = match self
            .state
            .get_cursor(&resource.name, ReplicationKey::DateFrom)
            .await?
        {
            Some(Cursor::Date(date)) => date,
            _ => self.config.start_date,
        };
        let days = DateCursorStrategy::new(self.config.date_offset_days)
            .days(bookmark, self.today());
        info!(
            "Querying {} for {} days starting {}",
            resource.name,
            days.len(),
            bookmark
        );

        for day in days {
            let date = day.format(DATE_FORMAT).to_string();
            let mut params = QueryParams::new();
            params.insert(DATE_FROM_PARAM.to_string(), date.clone());
            params.insert(DATE_TO_PARAM.to_string(), date);

            let mut reader = self.reader(resource, params, 1);
            {
                let records = reader.records();
                futures::pin_mut!(records);
                while let Some((_, record)) = records.try_next().await? {
                    self.sink.write_record(&resource.name, record)?;
                    stats.records += 1;
                }
            }
            stats.pages += reader.pages_fetched();
            stats.retries += u64::from(reader.retries());

            self.state
                .set_cursor(&resource.name, Cursor::Date(day))
                .await?;
            self.emit_state().await?;
            stats.days += 1;
        }

        Ok(())
    }

    async fn sync_full_table(
        &mut self,
        resource: &ResourceDefinition,
        stats: &mut StreamStats,
    ) -> Result<()> {
        let mut reader = self.reader(resource, QueryParams::new(), 1);
        {
            let records = reader.records();
            futures::pin_mut!(records);
            while let Some((_, record)) = records.try_next().await? {
                self.sink.write_record(&resource.name, record)?;
                stats.records += 1;
            }
        }
        stats.pages += reader.pages_fetched();
        stats.retries += u64::from(reader.retries());
        Ok(())
    }

    fn reader(
        &self,
        resource: &ResourceDefinition,
        params: QueryParams,
        start_page: u32,
    ) -> PageReader {
        PageReader::new(
            Arc::clone(&self.client),
            &resource.name,
            params,
            start_page,
            self.retry_policy(),
        )
        .with_page_size(self.registry.page_size)
        .with_last_page(resource.last_page)
    }

    async fn emit_state(&mut self) -> Result<()> {
        let state = self.state.snapshot().await.to_value();
        self.sink.write_state(state)
    }
}

impl<S: RecordSink> std::fmt::Debug for SyncEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("registry", &self.registry.name)
            .field("today", &self.today)
            .finish_non_exhaustive()
    }
}
