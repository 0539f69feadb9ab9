//! Integration tests for Strata
//!
//! These tests run the whole pipeline: unit records on disk, configuration,
//! context assembly, compression and the CLI output format.

use std::io::Write;
use std::process::Command;

use serde_json::{Value, json};
use strata_context::{CompressionLevel, ContextBuilder, render_context};
use strata_core::{Registry, StrataConfig};
use tempfile::{NamedTempFile, TempDir};

fn long_body(call: &str, lines: usize) -> String {
    let mut body: Vec<String> = (0..lines)
        .map(|i| format!("    step_{i} = prepare({i})"))
        .collect();
    body[lines / 2] = format!("    result = {call}(step_0)");
    body.join("\n")
}

/// Parser output for a small Flask-style service.
fn service_units() -> Value {
    json!([
        {
            "name": "login_required",
            "params": ["view"],
            "file_path": "app/auth.py",
            "start_line": 1,
            "code": "def login_required(view):\n    def wrapper(*args):\n        \
                     return view(*args)\n    return wrapper"
        },
        {
            "name": "get_profile",
            "params": ["user_id"],
            "decorators": ["route", "login_required"],
            "calls": ["load_user"],
            "file_path": "app/views/profile.py",
            "start_line": 12,
            "code": "@route('/profile/<user_id>')\n@login_required\n\
                     def get_profile(user_id):\n    return load_user(user_id)"
        },
        {
            "name": "load_user",
            "params": ["user_id"],
            "calls": ["query"],
            "file_path": "app/models.py",
            "start_line": 3,
            "code": "def load_user(user_id):\n    return query(user_id)"
        },
        {
            "name": "nightly_report",
            "calls": ["load_user"],
            "file_path": "app/jobs.py",
            "start_line": 40,
            "code": format!("def nightly_report():\n{}", long_body("load_user", 80))
        },
        {
            "name": "audit",
            "calls": ["load_user"],
            "file_path": "app/audit.py",
            "start_line": 5,
            "code": format!(
                "def audit():\n    try:\n{}\n    except KeyError:\n        pass",
                long_body("load_user", 8)
            )
        }
    ])
}

fn write_units(dir: &TempDir, units: &Value) -> std::path::PathBuf {
    let path = dir.path().join("units.json");
    std::fs::write(&path, serde_json::to_string_pretty(units).unwrap()).unwrap();
    path
}

fn strata() -> Command {
    Command::new(env!("CARGO_BIN_EXE_strata"))
}

#[test]
fn test_pipeline_from_json_records() {
    let registry = Registry::from_json_str(&service_units().to_string()).unwrap();
    let builder = ContextBuilder::new(&registry, &StrataConfig::default()).unwrap();

    let profile = builder.build_named("get_profile").unwrap();
    assert!(profile.compressed.bundle.is_public_api);
    assert_eq!(profile.compressed.bundle.inferred_callers.len(), 1);
    assert_eq!(profile.compressed.bundle.inferred_callers[0].hint, "@login_required decorator");

    let load_user = builder.build_named("load_user").unwrap();
    let callers: Vec<&str> = load_user
        .compressed
        .bundle
        .callers
        .iter()
        .map(|c| c.source_unit.as_str())
        .collect();
    // The short caller with error handling outranks the long batch job.
    assert_eq!(callers[0], "audit");
    assert_eq!(callers.len(), 3);
    assert!(!load_user.compressed.bundle.is_public_api);
}

#[test]
fn test_tight_config_file_forces_compression() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[budget]\nbudget = 120\nmax_callers = 1\nwide_context = 4\nnarrow_context = 2"
    )
    .unwrap();
    let config = StrataConfig::load(file.path()).unwrap();

    let registry = Registry::from_json_str(&service_units().to_string()).unwrap();
    let builder = ContextBuilder::new(&registry, &config).unwrap();
    let built = builder.build_named("load_user").unwrap();

    let compressed = &built.compressed;
    assert!(compressed.level >= CompressionLevel::CallersWide);
    assert!(compressed.size <= 120);
    assert_eq!(
        compressed.bundle.primary_text,
        "def load_user(user_id):\n    return query(user_id)"
    );
    assert_eq!(
        builder.compressor().measure(&compressed.bundle).unwrap(),
        compressed.size
    );
    assert!(render_context(&compressed.bundle).starts_with("def load_user"));
}

#[test]
fn test_cli_bundle_writes_json_lines() {
    let dir = TempDir::new().unwrap();
    let units = write_units(&dir, &service_units());
    let output = dir.path().join("bundles.jsonl");

    let status = strata()
        .args(["bundle", "--units"])
        .arg(&units)
        .arg("--output")
        .arg(&output)
        .status()
        .unwrap();
    assert!(status.success());

    let text = std::fs::read_to_string(&output).unwrap();
    let records: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(records.len(), 5);
    assert_eq!(records[1]["unit"], "get_profile");
    assert_eq!(records[1]["file_path"], "app/views/profile.py");
    assert_eq!(records[1]["level"], 0);
    assert_eq!(records[1]["over_budget"], false);

    let bundle = &records[2]["bundle"];
    assert_eq!(bundle["primary_text"], "def load_user(user_id):\n    return query(user_id)");
    let caller = &bundle["callers"][0];
    assert!(caller["snippet_text"].is_string());
    assert!(caller["highlight_lines"].is_array());
    assert!(caller["source_unit"].is_string());
    assert!(caller["source_file"].is_string());
}

#[test]
fn test_cli_bundle_selected_targets_to_stdout() {
    let dir = TempDir::new().unwrap();
    let units = write_units(&dir, &service_units());

    let output = strata()
        .args(["bundle", "--target", "load_user", "--units"])
        .arg(&units)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1);
    let record: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(record["unit"], "load_user");
}

#[test]
fn test_cli_unknown_target_fails() {
    let dir = TempDir::new().unwrap();
    let units = write_units(&dir, &service_units());

    let output = strata()
        .args(["bundle", "--target", "nope", "--units"])
        .arg(&units)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nope"));
}

#[test]
fn test_cli_config_round_trips() {
    let output = strata().arg("config").output().unwrap();
    assert!(output.status.success());

    let text = String::from_utf8(output.stdout).unwrap();
    let parsed = StrataConfig::from_toml_str(&text).unwrap();
    assert_eq!(parsed, StrataConfig::default());
}

#[test]
fn test_cli_inspect_lists_relations() {
    let dir = TempDir::new().unwrap();
    let units = write_units(&dir, &service_units());

    let output = strata()
        .args(["inspect", "get_profile", "--units"])
        .arg(&units)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["is_public_api"], true);
    assert_eq!(report["lines"], json!([12, 15]));
    let relations = report["relations"].as_array().unwrap();
    assert!(relations.iter().any(|r| r["kind"] == "DirectCallee" && r["target"] == "load_user"));
    assert!(
        relations
            .iter()
            .any(|r| r["kind"] == "InferredCaller" && r["source"] == "login_required")
    );
}
