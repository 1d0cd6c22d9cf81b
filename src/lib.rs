// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # tapfiliate-sync
//!
//! Incremental extractor for the Tapfiliate REST API.
//!
//! Pulls the supported collections page by page (or one calendar day at a
//! time), emits every record to an ordered sink, and checkpoints a bookmark
//! per resource so an interrupted run resumes close to where it stopped.
//! Delivery is at-least-once.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tapfiliate_sync::{
//!     catalog::select_streams, engine::SyncEngine, output::JsonLinesSink,
//!     resources::ResourceRegistry, state::StateManager, TapConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> tapfiliate_sync::Result<()> {
//!     let config = TapConfig::from_file("config.json")?;
//!     let registry = ResourceRegistry::builtin()?;
//!     let streams = select_streams(&registry, None, None)?;
//!
//!     let state = StateManager::from_file("state.json")?;
//!     let mut engine = SyncEngine::new(config, registry, state, JsonLinesSink::stdout())?;
//!     engine.run(&streams).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        SyncEngine                            │
//! │  per resource: SCHEMA → RECORD... → STATE (bookmark commit)  │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌────────────┬────────────────┴──┬───────────────┬─────────────┐
//! │  Bookmark  │    Pagination     │     HTTP      │   Output    │
//! ├────────────┼───────────────────┼───────────────┼─────────────┤
//! │ Page rewind│ PageReader        │ HttpClient    │ JSON lines  │
//! │ Day buckets│ (page, record)    │ RetryBudget   │ Memory      │
//! │            │ stream            │ RateLimit     │             │
//! └────────────┴───────────────────┴───────────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Run configuration
pub mod config;

/// Built-in resource registry
pub mod resources;

/// HTTP client with retry and rate limiting
pub mod http;

/// Page-by-page collection reader
pub mod pagination;

/// Cursor strategies
pub mod bookmark;

/// State management and checkpointing
pub mod state;

/// Stream catalog and selection
pub mod catalog;

/// Sink messages and writers
pub mod output;

/// Main execution engine
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::TapConfig;
pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
