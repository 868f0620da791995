//! CLI argument definitions using clap
//!
//! Commands:
//! - ghostnodes replay --scenario <path> [--config <path>]
//! - ghostnodes summary --scenario <path> [--replay] [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// GhostNodes - keeps coincident line endpoints moving together
#[derive(Parser, Debug)]
#[command(name = "ghostnodes")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a scripted edit scenario and print the resulting report
    Replay {
        /// Path to scenario file
        #[arg(long)]
        scenario: PathBuf,

        /// Path to engine configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print a feature summary for each layer of a scenario
    Summary {
        /// Path to scenario file
        #[arg(long)]
        scenario: PathBuf,

        /// Replay the scenario's operations before summarizing
        #[arg(long)]
        replay: bool,

        /// Path to engine configuration file (used with --replay)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_replay() {
        let cli = Cli::try_parse_from([
            "ghostnodes",
            "replay",
            "--scenario",
            "edit.json",
            "--config",
            "ghostnodes.json",
        ])
        .unwrap();
        match cli.command {
            Command::Replay { scenario, config } => {
                assert_eq!(scenario, PathBuf::from("edit.json"));
                assert_eq!(config, Some(PathBuf::from("ghostnodes.json")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_summary_flags() {
        let cli =
            Cli::try_parse_from(["ghostnodes", "summary", "--scenario", "edit.json", "--replay"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Command::Summary { replay: true, config: None, .. }
        ));
    }

    #[test]
    fn test_scenario_is_required() {
        assert!(Cli::try_parse_from(["ghostnodes", "replay"]).is_err());
    }
}
