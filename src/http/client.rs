//! API client
//!
//! One call to [`HttpClient::get_page`] is one HTTP request: it honours any
//! pending rate-limit throttle, sends the request, classifies the status and
//! decodes the body. Retrying is left to the caller's [`RetryBudget`].
//!
//! [`RetryBudget`]: super::RetryBudget

use super::rate_limit::{RateLimitConfig, RateLimitGovernor, RateLimitState};
use super::sleep::{Sleeper, TokioSleeper};
use crate::config::{TapConfig, DEFAULT_API_BASE, DEFAULT_API_VERSION};
use crate::error::{Error, Result};
use crate::types::JsonValue;
use reqwest::header::{HeaderMap, CONTENT_TYPE, LINK};
use reqwest::Client;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Header carrying the API credential
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Query parameters, kept ordered so URLs are stable in logs and tests
pub type QueryParams = BTreeMap<String, String>;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// API host, e.g. `https://api.tapfiliate.com`
    pub base_url: String,
    /// Version path segment, e.g. `1.6`
    pub api_version: String,
    /// Value of the `X-Api-Key` header
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Rate-limit thresholds
    pub rate_limit: RateLimitConfig,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            api_key: None,
            timeout: Duration::from_secs(60),
            rate_limit: RateLimitConfig::default(),
            user_agent: format!("tapfiliate-sync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }

    /// Derive client settings from the run configuration
    pub fn from_tap_config(config: &TapConfig) -> Self {
        let mut builder = Self::builder()
            .base_url(&config.api_base)
            .api_version(&config.api_version)
            .api_key(&config.api_token)
            .timeout(config.request_timeout);
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent);
        }
        builder.build()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the API host
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the API version segment
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.config.api_version = version.into();
        self
    }

    /// Set the API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set rate-limit thresholds
    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.config.rate_limit = config;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// A decoded page
#[derive(Debug, Clone)]
pub struct PageResponse {
    /// HTTP status
    pub status: u16,
    /// Records in response order
    pub records: Vec<JsonValue>,
    /// Quota snapshot, when the headers were present
    pub rate_limit: Option<RateLimitState>,
    /// Pagination hint from the `Link` header
    pub link: Option<String>,
}

/// Client for the collection endpoints
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    governor: RateLimitGovernor,
    sleeper: Arc<dyn Sleeper>,
}

impl HttpClient {
    /// Create a client that sleeps on the tokio timer
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        Self::with_sleeper(config, Arc::new(TokioSleeper))
    }

    /// Create a client with a custom sleeper
    pub fn with_sleeper(config: HttpClientConfig, sleeper: Arc<dyn Sleeper>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            governor: RateLimitGovernor::new(config.rate_limit),
            config,
            sleeper,
        })
    }

    /// Client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// The rate-limit governor fed by this client's responses
    pub fn governor(&self) -> &RateLimitGovernor {
        &self.governor
    }

    /// The sleeper used for throttling and retries
    pub fn sleeper(&self) -> &dyn Sleeper {
        self.sleeper.as_ref()
    }

    /// Build `{base}/{version}/{resource}/?{query}`
    pub fn build_url(&self, resource: &str, params: &QueryParams) -> Result<Url> {
        let base = self.config.base_url.trim_end_matches('/');
        let version = self.config.api_version.trim_matches('/');
        let resource = resource.trim_matches('/');

        let mut url = Url::parse(&format!("{base}/{version}/{resource}/"))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    /// Issue one GET and decode the page
    pub async fn get_page(&self, url: &Url) -> Result<PageResponse> {
        self.governor.wait(self.sleeper.as_ref()).await;

        let mut req = self
            .client
            .get(url.clone())
            .header(CONTENT_TYPE, "application/json");

        if let Some(key) = &self.config.api_key {
            req = req.header(API_KEY_HEADER, key.as_str());
        }

        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::http_status(status.as_u16(), body));
        }

        let headers = response.headers().clone();
        let body = response.text().await?;
        let records = decode_records(&body)?;

        let rate_limit = RateLimitState::from_headers(&headers);
        self.governor
            .observe(rate_limit, chrono::Utc::now().timestamp());

        debug!("GET {url} succeeded with {} records", records.len());

        Ok(PageResponse {
            status: status.as_u16(),
            records,
            rate_limit,
            link: link_header(&headers),
        })
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.config.base_url)
            .field("api_version", &self.config.api_version)
            .field("has_api_key", &self.config.api_key.is_some())
            .field("governor", &self.governor)
            .finish_non_exhaustive()
    }
}

/// Decode a response body into records
///
/// A JSON array yields its elements. A single object is a one-record page:
/// the API drops the array wrapper when only one result matches.
pub fn decode_records(body: &str) -> Result<Vec<JsonValue>> {
    match serde_json::from_str::<JsonValue>(body)? {
        JsonValue::Array(records) => Ok(records),
        record @ JsonValue::Object(_) => {
            debug!("Response was a single document, treating it as a one-record page");
            Ok(vec![record])
        }
        other => Err(Error::decode(format!(
            "expected a JSON array or object, got {other}"
        ))),
    }
}

fn link_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(LINK)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}
