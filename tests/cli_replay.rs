//! Scenario Replay Tests
//!
//! Tests for replaying scripted edit sessions from files:
//! - Propagated edits show up in the report with their originals
//! - Delivered events and redraws are reported per feature key
//! - Split scenarios reconcile the index
//! - Bad inputs map to the right CLI error codes
//! - The binary writes exactly one response line to stdout

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use ghostnodes::cli::{replay_report, summary_report, CliErrorCode, ReplayReport};
use ghostnodes::geometry::Geometry;
use ghostnodes::source::FeatureState;
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn write_json(dir: &TempDir, name: &str, value: &Value) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

fn quiet_config(dir: &TempDir) -> PathBuf {
    write_json(dir, "ghostnodes.json", &json!({"log_level": "FATAL", "check_consistency": true}))
}

fn line_json(coords: &[(f64, f64)]) -> Value {
    let coordinates: Vec<Value> = coords.iter().map(|(x, y)| json!([x, y])).collect();
    json!({"type": "LineString", "coordinates": coordinates})
}

fn three_lines() -> Value {
    json!({
        "layers": [{"name": "roads", "features": [
            {"key": "L1", "fid": "roads.1", "geometry": line_json(&[(0.0, 0.0), (1.0, 1.0)])},
            {"key": "L2", "fid": "roads.2", "geometry": line_json(&[(1.0, 1.0), (2.0, 2.0)])},
            {"key": "L3", "fid": "roads.3", "geometry": line_json(&[(5.0, 5.0), (6.0, 6.0)])}
        ]}],
        "operations": [
            {"op": "move_vertex", "feature": "L1", "vertex": 1, "to": [1.0, 2.0]},
            {"op": "modify", "feature": "L1"},
            {"op": "end_session", "feature": "L1"}
        ]
    })
}

fn run(scenario: &Value) -> ReplayReport {
    let dir = TempDir::new().unwrap();
    let config = quiet_config(&dir);
    let path = write_json(&dir, "scenario.json", scenario);
    replay_report(&path, Some(&config)).unwrap()
}

// =============================================================================
// Edit Session Replay
// =============================================================================

/// The three-line session leaves L2 moved and committed, L3 untouched.
#[test]
fn test_three_line_replay() {
    let report = run(&three_lines());

    let l2 = report.feature("L2").unwrap();
    assert_eq!(l2.state, FeatureState::Update);
    assert_eq!(l2.geometry, Some(Geometry::line(vec![(1.0, 2.0), (2.0, 2.0)])));
    assert_eq!(l2.original, Some(Geometry::line(vec![(1.0, 1.0), (2.0, 2.0)])));

    let l3 = report.feature("L3").unwrap();
    assert_eq!(l3.state, FeatureState::None);
    assert_eq!(l3.original, None);

    assert_eq!(report.feature("L1").unwrap().state, FeatureState::Update);

    assert_eq!(report.event_count("featuremodified", "L1"), 1);
    assert_eq!(report.event_count("featuremodified", "L2"), 1);
    assert_eq!(report.event_count("featuremodified", "L3"), 0);
    assert_eq!(report.event_count("afterfeaturemodified", "L2"), 1);

    let closed = report
        .events
        .iter()
        .find(|e| e.event == "afterfeaturemodified" && e.features == ["L2"])
        .unwrap();
    assert_eq!(closed.modified, Some(true));
}

/// Siblings are drawn in the edit style, then in the committed style.
#[test]
fn test_replay_draws_and_counters() {
    let report = run(&three_lines());

    let intents: Vec<&str> = report
        .draws
        .iter()
        .filter(|d| d.feature == "L2")
        .map(|d| d.intent.as_str())
        .collect();
    assert_eq!(intents, ["select", "default"]);
    assert!(report.draws.iter().all(|d| d.feature == "L2"));

    assert_eq!(report.index.features, 3);
    assert_eq!(report.index.nodes, 5);
    assert_eq!(report.metrics.vertices_propagated, 1);
    assert_eq!(report.metrics.modifications_committed, 1);
    assert!(!report.split_attached);
}

/// The report serializes with feature keys in place of ids.
#[test]
fn test_report_json_shape() {
    let report = run(&three_lines());
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["index"]["features"], 3);
    let first = &value["events"][0];
    assert_eq!(first["layer"], "roads");
    assert_eq!(first["event"], "vertexmodified");
    assert_eq!(first["features"], json!(["L1"]));
}

// =============================================================================
// Split Replay
// =============================================================================

/// Splitting a line through the scenario's split tool reconciles the index.
#[test]
fn test_split_replay() {
    let scenario = json!({
        "layers": [{"name": "roads", "features": [
            {"key": "S", "fid": "roads.1", "geometry": line_json(&[(0.0, 0.0), (2.0, 0.0)])},
            {"key": "N", "fid": "roads.2", "geometry": line_json(&[(2.0, 0.0), (3.0, 1.0)])}
        ]}],
        "split": {"layer": "roads"},
        "operations": [
            {"op": "split", "feature": "S", "pieces": [
                {"key": "P1", "geometry": line_json(&[(0.0, 0.0), (1.0, 0.0)])},
                {"key": "P2", "geometry": line_json(&[(1.0, 0.0), (2.0, 0.0)])}
            ]},
            {"op": "move_vertex", "feature": "P2", "vertex": 1, "to": [2.0, 1.0]}
        ]
    });
    let report = run(&scenario);

    assert!(report.split_attached);
    assert_eq!(report.metrics.splits_reconciled, 1);
    assert_eq!(report.index.features, 3);
    assert_eq!(report.feature("S").unwrap().state, FeatureState::Delete);
    assert_eq!(report.feature("P1").unwrap().state, FeatureState::Insert);
    assert_eq!(
        report.feature("N").unwrap().geometry,
        Some(Geometry::line(vec![(2.0, 1.0), (3.0, 1.0)]))
    );
    assert_eq!(
        report.feature("S").unwrap().geometry,
        Some(Geometry::line(vec![(0.0, 0.0), (2.0, 0.0)]))
    );
}

/// Summaries reflect the deferred delete and the inserted pieces.
#[test]
fn test_split_summary() {
    let dir = TempDir::new().unwrap();
    let config = quiet_config(&dir);
    let scenario = write_json(
        &dir,
        "scenario.json",
        &json!({
            "layers": [{"name": "roads", "features": [
                {"key": "S", "fid": "roads.1", "geometry": line_json(&[(0.0, 0.0), (2.0, 0.0)])}
            ]}],
            "split": {"layer": "roads"},
            "operations": [
                {"op": "split", "feature": "S", "pieces": [
                    {"key": "P1", "geometry": line_json(&[(0.0, 0.0), (1.0, 0.0)])},
                    {"key": "P2", "geometry": line_json(&[(1.0, 0.0), (2.0, 0.0)])}
                ]}
            ]
        }),
    );

    let summary = summary_report(&scenario, true, Some(&config)).unwrap();
    assert_eq!(summary["roads"]["total"], 3);
    assert_eq!(summary["roads"]["states"]["DELETE fid:true"], 1);
    assert_eq!(summary["roads"]["states"]["INSERT fid:false"], 2);
}

// =============================================================================
// Error Handling
// =============================================================================

/// Unknown feature keys are scenario errors.
#[test]
fn test_unknown_key_is_scenario_error() {
    let dir = TempDir::new().unwrap();
    let config = quiet_config(&dir);
    let path = write_json(
        &dir,
        "scenario.json",
        &json!({
            "layers": [{"name": "roads"}],
            "operations": [{"op": "modify", "feature": "missing"}]
        }),
    );

    let err = replay_report(&path, Some(&config)).unwrap_err();
    assert_eq!(err.code(), &CliErrorCode::ScenarioError);
    assert!(err.message().contains("missing"));
}

/// Malformed scenario files are scenario errors naming the file.
#[test]
fn test_malformed_scenario() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scenario.json");
    fs::write(&path, "{ not json").unwrap();

    let err = replay_report(&path, None).unwrap_err();
    assert_eq!(err.code(), &CliErrorCode::ScenarioError);
    assert!(err.message().contains("scenario.json"));
}

/// Engine failures while replaying are operation failures.
#[test]
fn test_out_of_range_vertex_fails() {
    let dir = TempDir::new().unwrap();
    let config = quiet_config(&dir);
    let path = write_json(
        &dir,
        "scenario.json",
        &json!({
            "layers": [{"name": "roads", "features": [
                {"key": "L1", "geometry": line_json(&[(0.0, 0.0), (1.0, 1.0)])}
            ]}],
            "operations": [{"op": "move_vertex", "feature": "L1", "vertex": 7, "to": [0, 0]}]
        }),
    );

    let err = replay_report(&path, Some(&config)).unwrap_err();
    assert_eq!(err.code(), &CliErrorCode::OperationFailed);
}

// =============================================================================
// Binary Output
// =============================================================================

/// With the default config, logs go to stderr and stdout holds one response.
#[test]
fn test_replay_stdout_is_one_line() {
    let dir = TempDir::new().unwrap();
    let path = write_json(&dir, "scenario.json", &three_lines());

    let output = Command::new(env!("CARGO_BIN_EXE_ghostnodes"))
        .arg("replay")
        .arg("--scenario")
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1);
    let response: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(response["status"], "ok");
    assert_eq!(response["data"]["metrics"]["vertices_propagated"], 1);

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("GHOST_PROPAGATED"));
}

/// A failing command still writes a single error line to stdout.
#[test]
fn test_failed_replay_stdout_is_one_line() {
    let dir = TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_ghostnodes"))
        .arg("replay")
        .arg("--scenario")
        .arg(dir.path().join("missing.json"))
        .output()
        .unwrap();
    assert!(!output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 1);
    let response: Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(response["status"], "error");
}
