//! Run configuration
//!
//! The config file is a flat JSON object. Numeric settings are accepted
//! either as numbers or as numeric strings, since most deployments write
//! every value as a string.

use crate::error::{Error, Result};
use crate::types::JsonValue;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Date format used by the API and by date bookmarks
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Keys that must be present in every config file
pub const REQUIRED_CONFIG_KEYS: &[&str] = &[
    "x-api-token",
    "date_from",
    "page_offset_percentage",
    "date_offset_days",
    "max_retries",
];

/// Default API host
pub const DEFAULT_API_BASE: &str = "https://api.tapfiliate.com";

/// Default API version path segment
pub const DEFAULT_API_VERSION: &str = "1.6";

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_RETRY_DELAY_SECS: u64 = 60;
const MAX_RETRIES_LIMIT: u32 = 100;

/// Validated configuration for a sync run
#[derive(Clone)]
pub struct TapConfig {
    /// API key sent as `X-Api-Key`
    pub api_token: String,
    /// Start date for date-cursor resources with no bookmark
    pub start_date: NaiveDate,
    /// Share of the persisted page kept on restart (0-100)
    pub page_offset_percentage: u32,
    /// Days subtracted from a date bookmark on restart
    pub date_offset_days: u32,
    /// Consecutive transient failures tolerated per request
    pub max_retries: u32,
    /// API host
    pub api_base: String,
    /// API version path segment
    pub api_version: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Fixed sleep before each retry
    pub retry_delay: Duration,
    /// User agent override
    pub user_agent: Option<String>,
}

impl TapConfig {
    /// Load and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&contents)
    }

    /// Parse and validate config from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// Build config from an already-parsed JSON object
    pub fn from_value(value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::config("Config must be a JSON object"));
        }

        let raw = RawConfig::deserialize(value)
            .map_err(|e| Error::config(format!("Invalid config: {e}")))?;
        let config = raw.into_config()?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.api_token.trim().is_empty() {
            return Err(Error::invalid_value("x-api-token", "must not be empty"));
        }
        if self.page_offset_percentage > 100 {
            return Err(Error::invalid_value(
                "page_offset_percentage",
                format!("{} is not between 0 and 100", self.page_offset_percentage),
            ));
        }
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(Error::invalid_value(
                "max_retries",
                format!("{} exceeds {MAX_RETRIES_LIMIT}", self.max_retries),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for TapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TapConfig")
            .field("api_token", &"<redacted>")
            .field("start_date", &self.start_date)
            .field("page_offset_percentage", &self.page_offset_percentage)
            .field("date_offset_days", &self.date_offset_days)
            .field("max_retries", &self.max_retries)
            .field("api_base", &self.api_base)
            .field("api_version", &self.api_version)
            .field("request_timeout", &self.request_timeout)
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}

/// Config file as written, before required keys and ranges are checked
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    #[serde(rename = "x-api-token")]
    api_token: Option<String>,
    date_from: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    page_offset_percentage: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    date_offset_days: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    max_retries: Option<String>,
    api_base: Option<String>,
    api_version: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    request_timeout_seconds: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    retry_delay_seconds: Option<String>,
    user_agent: Option<String>,
}

impl RawConfig {
    /// First required key that is absent or null, in declaration order
    fn missing_key(&self) -> Option<&'static str> {
        let present = [
            self.api_token.is_some(),
            self.date_from.is_some(),
            self.page_offset_percentage.is_some(),
            self.date_offset_days.is_some(),
            self.max_retries.is_some(),
        ];
        REQUIRED_CONFIG_KEYS
            .iter()
            .zip(present)
            .find_map(|(key, present)| (!present).then_some(*key))
    }

    fn into_config(self) -> Result<TapConfig> {
        if let Some(key) = self.missing_key() {
            return Err(Error::missing_field(key));
        }

        let date_from = self.date_from.unwrap_or_default();
        let start_date = NaiveDate::parse_from_str(&date_from, DATE_FORMAT)
            .map_err(|e| Error::invalid_value("date_from", format!("{date_from}: {e}")))?;

        Ok(TapConfig {
            api_token: self.api_token.unwrap_or_default(),
            start_date,
            page_offset_percentage: required_u32(
                "page_offset_percentage",
                self.page_offset_percentage,
            )?,
            date_offset_days: required_u32("date_offset_days", self.date_offset_days)?,
            max_retries: required_u32("max_retries", self.max_retries)?,
            api_base: self
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_version: self
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            request_timeout: Duration::from_secs(
                parse_u32("request_timeout_seconds", self.request_timeout_seconds)?
                    .map_or(DEFAULT_TIMEOUT_SECS, u64::from),
            ),
            retry_delay: Duration::from_secs(
                parse_u32("retry_delay_seconds", self.retry_delay_seconds)?
                    .map_or(DEFAULT_RETRY_DELAY_SECS, u64::from),
            ),
            user_agent: self.user_agent,
        })
    }
}

/// Accept a JSON number or string, keeping its text for per-key parsing
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(serde_json::Number),
    }

    Ok(
        Option::<StringOrNumber>::deserialize(deserializer)?.map(|value| match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }),
    )
}

fn required_u32(key: &str, raw: Option<String>) -> Result<u32> {
    parse_u32(key, raw)?.ok_or_else(|| Error::missing_field(key))
}

fn parse_u32(key: &str, raw: Option<String>) -> Result<Option<u32>> {
    raw.map(|raw| {
        raw.trim().parse::<u32>().map_err(|_| {
            Error::invalid_value(key, format!("{raw} is not a non-negative integer"))
        })
    })
    .transpose()
}
