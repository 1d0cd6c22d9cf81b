//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Incremental extractor for the Tapfiliate REST API
#[derive(Parser, Debug)]
#[command(name = "tapfiliate-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// State file (JSON), rewritten after every committed bookmark
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON, kept in memory only
    #[arg(long, global = true, conflicts_with = "state")]
    pub state_json: Option<String>,

    /// Catalog file (JSON) with stream selections
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the catalog of supported streams
    Discover,

    /// Extract selected streams to stdout
    Sync {
        /// Streams to sync (comma-separated, empty = all selected)
        #[arg(long)]
        streams: Option<String>,
    },
}

/// Split a comma-separated stream list, dropping blanks
pub fn parse_stream_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
