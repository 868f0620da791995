//! CLI command implementations
//!
//! Each command loads its inputs, runs to completion and writes exactly
//! one JSON response line to stdout. Engine logs go to stderr.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use crate::config::GhostNodesConfig;
use crate::observability::{log_event, Event};
use crate::summary::FeatureSummary;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};
use super::scenario::{Replay, ReplayReport, Scenario};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command. A failure
/// is also reported as an error response line.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let result = run_command(cli.command);
    if let Err(e) = &result {
        write_error(e.code_str(), e.message())?;
    }
    result
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Replay { scenario, config } => replay(&scenario, config.as_deref()),
        Command::Summary {
            scenario,
            replay,
            config,
        } => summary(&scenario, replay, config.as_deref()),
    }
}

/// Replay a scenario and print its report
pub fn replay(scenario_path: &Path, config_path: Option<&Path>) -> CliResult<()> {
    let report = replay_report(scenario_path, config_path)?;
    write_response(serde_json::to_value(&report)?)
}

/// Replay a scenario and return its report
pub fn replay_report(scenario_path: &Path, config_path: Option<&Path>) -> CliResult<ReplayReport> {
    let config = load_config(config_path)?;
    let scenario = load_scenario(scenario_path)?;
    Ok(Replay::run(&scenario, config)?)
}

/// Print the feature summary of every layer in a scenario
pub fn summary(scenario_path: &Path, replay: bool, config_path: Option<&Path>) -> CliResult<()> {
    let data = summary_report(scenario_path, replay, config_path)?;
    write_response(data)
}

/// Feature summaries keyed by layer name, optionally after replaying the
/// scenario's operations
pub fn summary_report(
    scenario_path: &Path,
    replay: bool,
    config_path: Option<&Path>,
) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let scenario = load_scenario(scenario_path)?;

    let mut session = Replay::new(&scenario, config)?;
    if replay {
        for op in &scenario.operations {
            session.apply(op)?;
        }
    }

    let layers: BTreeMap<String, FeatureSummary> = session
        .layers()
        .iter()
        .map(|layer| (layer.name().to_string(), FeatureSummary::collect(layer)))
        .collect();
    Ok(serde_json::to_value(&layers)?)
}

/// Load the engine configuration. Logs always go to stderr so stdout
/// carries only the response line.
fn load_config(path: Option<&Path>) -> CliResult<GhostNodesConfig> {
    let Some(path) = path else {
        return Ok(GhostNodesConfig {
            log_stderr: true,
            ..GhostNodesConfig::default()
        });
    };
    let mut config = GhostNodesConfig::load(path)?;
    config.log_stderr = true;
    let logger = config.logger()?;
    log_event(
        &logger,
        Event::ConfigLoaded,
        &[("path", path.display().to_string().as_str())],
    );
    Ok(config)
}

fn load_scenario(path: &Path) -> CliResult<Scenario> {
    Scenario::load(path)
        .map_err(|e| CliError::scenario_error(format!("{}: {}", path.display(), e)))
}
