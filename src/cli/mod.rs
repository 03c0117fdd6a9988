//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use commands::{BuildArgs, Commands};

/// Distforge - production builds for full-stack JavaScript apps
///
/// Builds the frontend and backend, keeps native dependencies out of the
/// bundle and writes a production package.json that installs them.
#[derive(Parser, Debug)]
#[command(name = "distforge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Project directory
    #[arg(short = 'C', long, global = true, default_value = ".")]
    pub project_dir: PathBuf,

    /// Config file (default: distforge.toml in the project directory)
    #[arg(long, global = true, env = "DISTFORGE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Execute the CLI command
    ///
    /// Without a subcommand the pipeline runs with configured defaults.
    pub async fn run(self) -> Result<()> {
        let command = self
            .command
            .unwrap_or_else(|| Commands::Build(BuildArgs::default()));
        command.run(&self.project_dir, self.config.as_deref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_parses() {
        let cli = Cli::try_parse_from(["distforge", "-C", "app", "-vv"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.project_dir, PathBuf::from("app"));
    }

    #[test]
    fn test_build_overrides_parse() {
        let cli = Cli::try_parse_from([
            "distforge",
            "build",
            "--strategy",
            "source-copy",
            "--policy",
            "minimal",
            "--verify-gate",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Build(args)) => {
                assert_eq!(args.strategy, Some(crate::core::config::StrategyKind::SourceCopy));
                assert_eq!(args.policy, Some(crate::core::config::ManifestPolicy::Minimal));
                assert!(args.verify_gate);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        assert!(Cli::try_parse_from(["distforge", "build", "--strategy", "rollup"]).is_err());
    }
}
