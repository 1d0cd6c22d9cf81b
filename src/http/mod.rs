//! HTTP layer
//!
//! Provides the API client together with the two controls wrapped around
//! every page request.
//!
//! # Features
//!
//! - **Retry budget**: fixed-delay retry of the same request, fatal once the
//!   per-sequence budget is spent
//! - **Rate-limit governor**: reads `X-Ratelimit-Remaining`/`X-Ratelimit-Reset`
//!   and sleeps until the window resets when quota runs low
//! - **Sleeper**: every suspension goes through one trait so tests never wait

mod client;
mod rate_limit;
mod retry;
mod sleep;

pub use client::{decode_records, HttpClient, HttpClientConfig, PageResponse, QueryParams};
pub use rate_limit::{
    RateLimitConfig, RateLimitGovernor, RateLimitState, RATE_LIMIT_REMAINING_HEADER,
    RATE_LIMIT_RESET_HEADER,
};
pub use retry::{RetryBudget, RetryPolicy};
pub use sleep::{RecordingSleeper, Sleeper, TokioSleeper};
