use std::path::Path;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;

fn pstate(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pstate"))
        .args(args)
        .env_remove("PSTATE_LOG")
        .output()
        .unwrap()
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "pstate failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn write(dir: &TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path_str(&path)
}

fn path_str(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}

#[test]
fn extract_options_list() {
    let dir = TempDir::new().unwrap();
    let file = write(
        &dir,
        "ctrl.json",
        r#"{"type": "options-list", "dataViewId": "dv-1", "title": "Hosts"}"#,
    );

    let out = stdout_json(&pstate(&["extract", &file]));

    assert_eq!(out["state"], json!({"type": "options-list", "title": "Hosts"}));
    assert_eq!(
        out["references"],
        json!([{"name": "optionsListDataView", "type": "index-pattern", "id": "dv-1"}])
    );
}

#[test]
fn extract_reads_yaml() {
    let dir = TempDir::new().unwrap();
    let file = write(
        &dir,
        "ctrl.yaml",
        "type: range-slider\ndataViewId: dv-2\nstep: 5\n",
    );

    let out = stdout_json(&pstate(&["extract", &file]));

    assert_eq!(out["references"][0]["name"], json!("rangeSliderDataView"));
    assert_eq!(out["state"], json!({"type": "range-slider", "step": 5}));
}

#[test]
fn inject_saved_object() {
    let dir = TempDir::new().unwrap();
    let file = write(
        &dir,
        "record.json",
        r#"{
            "id": "ctrl-1",
            "type": "options-list",
            "attributes": {"title": "Hosts"},
            "references": [{"name": "optionsListDataView", "type": "index-pattern", "id": "dv-1"}],
            "schemaVersion": 2
        }"#,
    );

    let out = stdout_json(&pstate(&["inject", &file]));

    assert_eq!(
        out,
        json!({"type": "options-list", "dataViewId": "dv-1", "title": "Hosts"})
    );
}

#[test]
fn migrate_rule_to_latest_and_to_version() {
    let dir = TempDir::new().unwrap();
    let file = write(
        &dir,
        "rule.json",
        r#"{
            "id": "r-1",
            "type": "rule",
            "attributes": {"name": "cpu", "notify_when": "onActiveAlert", "legacyId": "x"},
            "schemaVersion": 1
        }"#,
    );

    let latest = stdout_json(&pstate(&["migrate", &file]));
    assert_eq!(latest["schemaVersion"], json!(5));
    assert_eq!(
        latest["attributes"],
        json!({"name": "cpu", "notifyWhen": "onActiveAlert", "revision": 0})
    );

    let v2 = stdout_json(&pstate(&["migrate", &file, "--to", "2"]));
    assert_eq!(v2["schemaVersion"], json!(2));
    assert_eq!(v2["attributes"]["notify_when"], json!("onActiveAlert"));
}

#[test]
fn migrate_downgrade_fails() {
    let dir = TempDir::new().unwrap();
    let file = write(
        &dir,
        "rule.json",
        r#"{"id": "r-1", "type": "rule", "attributes": {"name": "cpu"}, "schemaVersion": 5}"#,
    );

    let output = pstate(&["migrate", &file, "--to", "3"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("downgrade"));
}

#[test]
fn load_reports_user_message_on_failure() {
    let dir = TempDir::new().unwrap();
    let file = write(
        &dir,
        "rule.json",
        r#"{"id": "r-1", "type": "rule", "attributes": {"name": 7}, "schemaVersion": 1}"#,
    );

    let output = pstate(&["load", &file]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("this saved item could not be loaded"));
}

#[test]
fn telemetry_over_files() {
    let dir = TempDir::new().unwrap();
    let a = write(
        &dir,
        "a.json",
        r#"{"type": "options-list", "dataViewId": "dv-1", "title": "Hosts", "singleSelect": true}"#,
    );
    let b = write(&dir, "b.json", r#"{"type": "options-list", "dataViewId": "dv-2"}"#);

    let output = pstate(&["telemetry", &a, &b]);
    let out = stdout_json(&output);

    assert_eq!(out["sampled"], json!(2));
    assert_eq!(out["metrics"]["options-list.total"], json!(2));
    assert_eq!(out["metrics"]["options-list.singleSelect"], json!(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("dataViewId"));
    assert!(!stdout.contains("dv-1"));
}

#[test]
fn config_file_changes_behaviour() {
    let dir = TempDir::new().unwrap();
    let config = write(&dir, "pstate.toml", "[telemetry]\ninclude_unknown_kinds = true\n");
    let blob = write(&dir, "x.json", r#"{"type": "mystery"}"#);

    let out = stdout_json(&pstate(&["--config", &config, "telemetry", &blob]));

    assert_eq!(out["metrics"]["unknown.total"], json!(1));
}

#[test]
fn kinds_lists_builtins() {
    let out = stdout_json(&pstate(&["kinds"]));
    let names: Vec<&str> = out
        .as_array()
        .unwrap()
        .iter()
        .map(|kind| kind["type"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["options-list", "range-slider", "rule", "search-embeddable", "time-slider"]
    );
}

#[test]
fn missing_file_is_an_error() {
    let output = pstate(&["extract", "/nonexistent/blob.json"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot read"));
}
