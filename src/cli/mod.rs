//! CLI module
//!
//! Command-line interface for the extractor.
//!
//! # Commands
//!
//! - `discover` - Print the catalog of supported streams
//! - `sync` - Extract selected streams as JSON lines on stdout

mod commands;
mod runner;

pub use commands::{parse_stream_list, Cli, Commands};
pub use runner::Runner;
