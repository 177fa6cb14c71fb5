//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

pub mod commands;
pub mod output;

pub use commands::Commands;

#[derive(Parser, Debug)]
#[command(name = "repsearch", version, about = "Search an exercise catalog")]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Machine-readable JSON output and JSON logs
    #[arg(long, global = true, env = "REPSEARCH_ROBOT")]
    pub robot: bool,

    /// Explicit config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search_with_flags() {
        let cli = Cli::try_parse_from([
            "repsearch",
            "-vv",
            "--robot",
            "search",
            "goblet squat",
            "--corpus",
            "catalog.json",
            "--require",
            "kettlebell",
            "--limit",
            "5",
        ])
        .expect("parse");
        assert_eq!(cli.verbose, 2);
        assert!(cli.robot);
        let Commands::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.query, "goblet squat");
        assert_eq!(args.limit, Some(5));
        assert_eq!(args.require, vec!["kettlebell".to_string()]);
        assert!(!args.classic);
    }

    #[test]
    fn test_parse_stats() {
        let cli = Cli::try_parse_from(["repsearch", "stats", "--corpus", "c.json", "--top", "3"])
            .expect("parse");
        let Commands::Stats(args) = cli.command else {
            panic!("expected stats");
        };
        assert_eq!(args.top, 3);
    }
}
