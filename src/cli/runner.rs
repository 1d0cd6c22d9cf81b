//! CLI runner - executes commands

use crate::catalog::{select_streams, Catalog};
use crate::cli::commands::{parse_stream_list, Cli, Commands};
use crate::config::TapConfig;
use crate::engine::SyncEngine;
use crate::error::{Error, Result, ResultExt};
use crate::output::JsonLinesSink;
use crate::resources::ResourceRegistry;
use crate::state::StateManager;
use std::io::Write;
use tracing::{debug, info};

/// CLI runner
#[derive(Debug)]
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Discover => self.discover(),
            Commands::Sync { streams } => self.sync(streams.as_deref()).await,
        }
    }

    /// Load configuration
    fn load_config(&self) -> Result<TapConfig> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("No config file provided (use --config)"))?;
        let config = TapConfig::from_file(path)?;
        debug!("Loaded config: {config:?}");
        Ok(config)
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        // Inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    /// Load the catalog, if one was given
    fn load_catalog(&self) -> Result<Option<Catalog>> {
        self.cli.catalog.as_ref().map(Catalog::from_file).transpose()
    }

    /// Print the catalog
    fn discover(&self) -> Result<()> {
        let registry = ResourceRegistry::builtin()?;
        let catalog = Catalog::discover(&registry);
        info!("Discovered {} streams", catalog.streams.len());

        let json = catalog.to_json_pretty()?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{json}").context("Failed to write catalog")?;
        Ok(())
    }

    /// Extract selected streams
    async fn sync(&self, streams: Option<&str>) -> Result<()> {
        let config = self.load_config()?;
        let registry = ResourceRegistry::builtin()?;
        let catalog = self.load_catalog()?;
        let filter = streams.map(parse_stream_list);

        let selected = select_streams(&registry, catalog.as_ref(), filter.as_deref())?;
        if selected.is_empty() {
            info!("No streams selected, emitting state only");
        }

        let state = self
            .load_state()
            .with_context(|| "Failed to load state".to_string())?;

        let mut engine = SyncEngine::new(config, registry, state, JsonLinesSink::stdout())?;
        engine.run(&selected).await?;
        Ok(())
    }
}
