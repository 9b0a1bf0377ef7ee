//! Integration tests for the memdump CLI.
//!
//! These tests run the binary against small dump files and check what it
//! prints and writes.

use rstest::{fixture, rstest};
use tempfile::TempDir;

mod common;
use common::{parse_lines, run_memdump_in_dir, write_dump};

const BEFORE: &[&str] = &[
    r#"{"type":"ROOT","root":"vm","references":["0x1"]}"#,
    r#"{"address":"0x1","type":"OBJECT","references":["0x2"]}"#,
    r#"{"address":"0x2","type":"STRING"}"#,
];

const AFTER: &[&str] = &[
    r#"{"type":"ROOT","root":"vm","references":["0x1"]}"#,
    r#"{"address":"0x1","type":"OBJECT","references":["0x2","0x3"]}"#,
    r#"{"address":"0x2","type":"STRING"}"#,
    r#"{"address":"0x3","type":"HASH","references":["0x4"]}"#,
    r#"{"address":"0x4","type":"STRING"}"#,
];

// ============================================================================
// Test Fixtures
// ============================================================================

/// Provides a fresh temporary directory for each test
#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Provides a temporary directory holding `before.json` and `after.json`
#[fixture]
fn dumps_dir() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp directory");
    write_dump(temp.path(), "before.json", BEFORE);
    write_dump(temp.path(), "after.json", AFTER);
    temp
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[rstest]
fn test_cli_help(temp_dir: TempDir) {
    let output = run_memdump_in_dir(temp_dir.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("memdump"));
    assert!(stdout.contains("Usage:"));
    for command in ["diff", "root-of", "keepalive", "remove-node", "collapse", "gml"] {
        assert!(stdout.contains(command), "help does not list {command}");
    }
}

#[rstest]
fn test_cli_version(temp_dir: TempDir) {
    let output = run_memdump_in_dir(temp_dir.path(), &["--version"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("0.1.0"));
}

#[rstest]
fn test_cli_no_args(temp_dir: TempDir) {
    let output = run_memdump_in_dir(temp_dir.path(), &[]);
    assert!(output.status.success());
}

// ============================================================================
// Command Tests
// ============================================================================

#[rstest]
fn test_diff_writes_new_objects(dumps_dir: TempDir) {
    let output = run_memdump_in_dir(
        dumps_dir.path(),
        &["diff", "before.json", "after.json", "leaks.json"],
    );
    assert!(
        output.status.success(),
        "diff failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("Wrote 4 records"));

    let written = std::fs::read(dumps_dir.path().join("leaks.json")).unwrap();
    let mut addresses: Vec<String> = parse_lines(&written)
        .iter()
        .map(|record| record["address"].as_str().unwrap().to_string())
        .collect();
    addresses.sort();
    assert_eq!(addresses, ["0x1", "0x3", "0x4", "vm"]);
}

#[rstest]
fn test_root_of_prints_json_lines(dumps_dir: TempDir) {
    let output = run_memdump_in_dir(dumps_dir.path(), &["root-of", "after.json", "0x4"]);
    assert!(output.status.success());

    let records = parse_lines(&output.stdout);
    assert_eq!(records.len(), 4);
    assert!(records.iter().any(|record| record["address"] == "vm"));
    assert!(records.iter().all(|record| record["address"] != "0x2"));
}

#[rstest]
fn test_root_of_unknown_address_fails(dumps_dir: TempDir) {
    let output = run_memdump_in_dir(dumps_dir.path(), &["root-of", "after.json", "0x99"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("0x99"));
}

#[rstest]
fn test_stats_json(dumps_dir: TempDir) {
    let output = run_memdump_in_dir(dumps_dir.path(), &["--json", "stats", "after.json"]);
    assert!(output.status.success());

    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["unknown"], 0);
    let total: u64 = stats["by_class"]
        .as_object()
        .unwrap()
        .values()
        .map(|count| count.as_u64().unwrap())
        .sum();
    assert_eq!(total, 5);
}

#[rstest]
fn test_stats_text(dumps_dir: TempDir) {
    let output = run_memdump_in_dir(dumps_dir.path(), &["stats", "before.json"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("Total: 3 objects"));
}

#[rstest]
fn test_validate_reports_dangling_references(temp_dir: TempDir) {
    write_dump(
        temp_dir.path(),
        "broken.json",
        &[r#"{"address":"0x1","references":["0x2","0x3"]}"#, r#"{"address":"0x2"}"#],
    );

    let output = run_memdump_in_dir(temp_dir.path(), &["--json", "validate", "broken.json"]);
    assert!(!output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["records"], 2);
    assert_eq!(report["valid"], false);
    assert!(report["error"].as_str().unwrap().contains("0x3"));
}

#[rstest]
fn test_cleanup_refs_then_validate(temp_dir: TempDir) {
    write_dump(
        temp_dir.path(),
        "broken.json",
        &[r#"{"address":"0x1","references":["0x2","0x3"]}"#, r#"{"address":"0x2"}"#],
    );

    let cleanup = run_memdump_in_dir(temp_dir.path(), &["cleanup-refs", "broken.json", "clean.json"]);
    assert!(cleanup.status.success());

    let validate = run_memdump_in_dir(temp_dir.path(), &["validate", "clean.json"]);
    assert!(validate.status.success());
}

#[rstest]
fn test_collapse_common(dumps_dir: TempDir) {
    let output = run_memdump_in_dir(
        dumps_dir.path(),
        &["collapse", "after.json", "collapsed.json", "--common"],
    );
    assert!(output.status.success());

    let written = std::fs::read(dumps_dir.path().join("collapsed.json")).unwrap();
    let records = parse_lines(&written);
    assert!(records.iter().all(|record| record["address"] != "0x3"));
    let object = records.iter().find(|record| record["address"] == "0x1").unwrap();
    assert_eq!(object["references"], serde_json::json!(["0x2", "0x4"]));
}

#[rstest]
fn test_collapse_requires_a_selection(dumps_dir: TempDir) {
    let output = run_memdump_in_dir(dumps_dir.path(), &["collapse", "after.json", "out.json"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Nothing to collapse"));
}

#[rstest]
fn test_gml_default_path(dumps_dir: TempDir) {
    let output = run_memdump_in_dir(dumps_dir.path(), &["gml", "before.json"]);
    assert!(output.status.success());

    let gml = std::fs::read_to_string(dumps_dir.path().join("before.gml")).unwrap();
    assert!(gml.starts_with("graph"));
    assert_eq!(gml.matches("\n  node\n").count(), 3);
    assert_eq!(gml.matches("\n  edge\n").count(), 2);
}

#[rstest]
fn test_missing_dump_file_fails(temp_dir: TempDir) {
    let output = run_memdump_in_dir(temp_dir.path(), &["stats", "nope.json"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nope.json"));
}

#[rstest]
fn test_config_file_controls_common_cleanup(dumps_dir: TempDir) {
    std::fs::write(
        dumps_dir.path().join("memdump.yaml"),
        "collapse_types: [STRING]\ncollapse_classes: []\n",
    )
    .unwrap();

    let output = run_memdump_in_dir(
        dumps_dir.path(),
        &["collapse", "after.json", "collapsed.json", "--common"],
    );
    assert!(output.status.success());

    let written = std::fs::read(dumps_dir.path().join("collapsed.json")).unwrap();
    let records = parse_lines(&written);
    assert_eq!(records.len(), 3);
    assert!(records.iter().any(|record| record["address"] == "0x3"));
}
