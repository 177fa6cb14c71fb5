use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::catalog::JsonCorpus;
use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::search::SearchEngine;
use crate::search::completion::{CompletionCapability, ReplayCompletion, UnavailableCompletion};

/// State shared by every subcommand.
pub struct AppContext {
    pub config: Config,
    pub robot: bool,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let project_root = std::env::current_dir()?;
        let config = Config::load(cli.config.as_deref(), &project_root)?;
        debug!(root = %project_root.display(), "configuration loaded");
        Ok(Self {
            config,
            robot: cli.robot,
        })
    }

    /// Build an engine over the JSON corpus at `corpus`. With `signals`, the
    /// completion capability replays that file; otherwise it is unavailable
    /// and assisted queries fall back to classic search.
    pub async fn engine(&self, corpus: &Path, signals: Option<&Path>) -> Result<SearchEngine> {
        let capability: Arc<dyn CompletionCapability> = match signals {
            Some(path) => {
                let raw = tokio::fs::read_to_string(path).await?;
                Arc::new(ReplayCompletion::from_json(&raw)?)
            }
            None => Arc::new(UnavailableCompletion),
        };
        let provider = JsonCorpus::new(corpus);
        Ok(SearchEngine::from_provider(&provider, capability, &self.config).await)
    }
}
