// Allow common clippy pedantic lints
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! tapfiliate-sync CLI
//!
//! Command-line interface for the extractor. Messages go to stdout, logs to
//! stderr.

use clap::Parser;
use tapfiliate_sync::cli::{Cli, Runner};
use tracing::error;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let runner = Runner::new(cli);

    if let Err(e) = runner.run().await {
        error!("Sync failed: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
