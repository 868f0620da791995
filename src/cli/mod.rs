//! CLI module for GhostNodes
//!
//! Provides command-line interface for:
//! - replay: Play a scripted edit scenario through the engine
//! - summary: Summarize a scenario's features per layer

mod args;
mod commands;
mod errors;
mod io;
mod scenario;

pub use args::{Cli, Command};
pub use commands::{replay, replay_report, run, run_command, summary, summary_report};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
pub use scenario::{
    DrawReport, EventReport, FeatureReport, FeatureSpec, IndexReport, LayerSpec, Operation,
    PieceSpec, Replay, ReplayReport, Scenario, SplitSpec,
};
