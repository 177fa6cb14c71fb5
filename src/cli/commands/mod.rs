//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - run() function to execute the command

use clap::Subcommand;

pub mod search;
pub mod stats;

use crate::app::AppContext;
use crate::error::Result;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the catalog
    Search(search::SearchArgs),

    /// Show corpus and index statistics
    Stats(stats::StatsArgs),
}

/// Dispatch a command to its handler
pub async fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Search(args) => search::run(ctx, args).await,
        Commands::Stats(args) => stats::run(ctx, args).await,
    }
}
