#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;

fn isolated_config(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "[graph]\nuri = \"bolt://127.0.0.1:1\"\nacquire_timeout_ms = 200\n",
    )
    .expect("write config");
    path
}

fn run_json(config: &Path, args: &[&str]) -> Value {
    let output = cargo_bin_cmd!("rescuenet")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config)
        .args(["--mock", "--format", "json"])
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("json output")
}

#[test]
fn query_prints_team_template_as_json() {
    let dir = TempDir::new().expect("tempdir");
    let config = isolated_config(&dir);
    let json = run_json(
        &config,
        &[
            "query",
            "MATCH (t1:Team)-[r:COORDINATES_WITH]->(t2:Team) RETURN t1, t2, r",
        ],
    );
    let rows = json.as_array().expect("array of records");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["team1"], "Alpha Response");
    assert_eq!(rows[1]["team2"], "Alpha Response");
}

#[test]
fn query_text_output_keeps_column_order() {
    let dir = TempDir::new().expect("tempdir");
    let config = isolated_config(&dir);
    let output = cargo_bin_cmd!("rescuenet")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&config)
        .args([
            "--mock",
            "query",
            "MATCH (t1:Team)-[r:COORDINATES_WITH]->(t2:Team) RETURN t1, t2, r",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf-8 stdout");
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some(r#"team1="Alpha Response" team2="Bravo Medical" reason="Medical Support""#)
    );
    assert_eq!(text.lines().last(), Some("(2 records)"));
}

#[test]
fn query_accepts_typed_params() {
    let dir = TempDir::new().expect("tempdir");
    let config = isolated_config(&dir);
    let json = run_json(
        &config,
        &[
            "query",
            "--read",
            "--param",
            "from=\"Alpha\"",
            "--param",
            "depth=5",
            "MATCH (a {name: $from}) RETURN a LIMIT $depth",
        ],
    );
    assert_eq!(json[0]["name"], "Mock Node");
    assert_eq!(json[0]["value"], 123);
}

#[test]
fn query_rejects_malformed_param() {
    let dir = TempDir::new().expect("tempdir");
    let config = isolated_config(&dir);
    cargo_bin_cmd!("rescuenet")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&config)
        .args(["--mock", "query", "--param", "novalue", "RETURN 1"])
        .assert()
        .failure();
}

#[test]
fn status_reports_degraded_mode() {
    let dir = TempDir::new().expect("tempdir");
    let config = isolated_config(&dir);
    let json = run_json(&config, &["status"]);
    assert_eq!(json["ready"], true);
    assert_eq!(json["mode"], "degraded");
    assert_eq!(json["degraded"], true);
}

#[test]
fn seed_counts_statements() {
    let dir = TempDir::new().expect("tempdir");
    let config = isolated_config(&dir);
    let script = dir.path().join("seed.cypher");
    fs::write(
        &script,
        "CREATE (:Team {name: 'Alpha'});\n\nCREATE (:Zone {name: 'Wayanad'});\n;\n",
    )
    .expect("write seed");
    let json = run_json(&config, &["seed", script.to_str().expect("utf-8 path")]);
    assert_eq!(json["statements"], 2);
    assert_eq!(json["degraded"], true);
}

#[test]
fn seed_fails_for_missing_file() {
    let dir = TempDir::new().expect("tempdir");
    let config = isolated_config(&dir);
    cargo_bin_cmd!("rescuenet")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&config)
        .args(["--mock", "seed"])
        .arg(dir.path().join("absent.cypher"))
        .assert()
        .failure();
}

#[test]
fn invalid_config_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[graph]\nmax_connections = 0\n").expect("write config");
    cargo_bin_cmd!("rescuenet")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&path)
        .arg("status")
        .assert()
        .failure();
}
