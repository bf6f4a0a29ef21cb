use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::{TempDir, tempdir};

fn arbor() -> Command {
    Command::new(env!("CARGO_BIN_EXE_arbor"))
}

fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn stdout_json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).unwrap()
}

#[test]
fn infer_prints_the_schema_tree() {
    let dir = tempdir().unwrap();
    let example = write(&dir, "example.json", r#"{ "a": 1, "b": [2, 3] }"#);

    let output = arbor().arg("infer").arg(&example).assert().success().get_output().stdout.clone();
    assert_eq!(
        stdout_json(&output),
        serde_json::json!({
            "model": "inferred-factory",
            "fields": { "a": { "default": 1 }, "b": { "array": "primitive" } },
        })
    );
}

#[test]
fn build_drops_example_array_contents() {
    let dir = tempdir().unwrap();
    let example = write(&dir, "example.json", r#"{ "a": 1, "b": [2, 3] }"#);

    let output = arbor().arg("build").arg(&example).assert().success().get_output().stdout.clone();
    assert_eq!(stdout_json(&output), serde_json::json!({ "a": 1, "b": [] }));
}

#[test]
fn build_applies_a_snapshot() {
    let dir = tempdir().unwrap();
    let example = write(&dir, "example.json", r#"{ "name": "", "owner": { "id": 0 } }"#);
    let snapshot = write(&dir, "snapshot.json", r#"{ "name": "arbor", "owner": { "id": 7 } }"#);

    let output = arbor()
        .args(["build", "--snapshot"])
        .arg(&snapshot)
        .arg(&example)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(stdout_json(&output), serde_json::json!({ "name": "arbor", "owner": { "id": 7 } }));
}

#[test]
fn build_reads_stdin() {
    let output = arbor()
        .args(["build", "-"])
        .write_stdin(r#"[{ "id": 1 }]"#)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(stdout_json(&output), serde_json::json!([]));
}

#[test]
fn unknown_snapshot_keys_fail_without_config() {
    let dir = tempdir().unwrap();
    let example = write(&dir, "example.json", r#"{ "a": 1 }"#);
    let snapshot = write(&dir, "snapshot.json", r#"{ "a": 2, "extra": true }"#);

    arbor()
        .env_remove("ARBOR__SNAPSHOT__UNKNOWN_KEYS")
        .args(["build", "-s"])
        .arg(&snapshot)
        .arg(&example)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown key 'extra'"));
}

#[test]
fn environment_overrides_apply_without_a_config_file() {
    let dir = tempdir().unwrap();
    let example = write(&dir, "example.json", r#"{ "a": 1 }"#);
    let snapshot = write(&dir, "snapshot.json", r#"{ "a": 2, "extra": true }"#);

    let output = arbor()
        .env("ARBOR__SNAPSHOT__UNKNOWN_KEYS", "ignore")
        .args(["build", "-s"])
        .arg(&snapshot)
        .arg(&example)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(stdout_json(&output), serde_json::json!({ "a": 2 }));
}

#[test]
fn help_lists_supported_config_formats() {
    arbor()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("TOML or JSON"))
        .stdout(predicate::str::contains("YAML").not());
}

#[test]
fn config_can_ignore_unknown_snapshot_keys() {
    let dir = tempdir().unwrap();
    let example = write(&dir, "example.json", r#"{ "a": 1 }"#);
    let snapshot = write(&dir, "snapshot.json", r#"{ "a": 2, "extra": true }"#);
    let config = write(&dir, "arbor.toml", "[snapshot]\nunknown_keys = \"ignore\"\n");

    let output = arbor()
        .arg("--config")
        .arg(&config)
        .args(["build", "-s"])
        .arg(&snapshot)
        .arg(&example)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(stdout_json(&output), serde_json::json!({ "a": 2 }));
}

#[test]
fn primitive_examples_cannot_be_built() {
    arbor()
        .args(["build", "-"])
        .write_stdin("42")
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no fields to build"));
}

#[test]
fn missing_files_are_reported() {
    arbor()
        .args(["infer", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read does-not-exist.json"));
}
