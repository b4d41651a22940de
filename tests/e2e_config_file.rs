/// End-to-end tests for config file loading and environment overrides.
///
/// These tests exercise the flow from a config file on disk through CLI
/// invocation, using `assert_cmd` and `tempfile` for isolated environments.
use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn cmd_in(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("sbom-pipeline");
    cmd.current_dir(dir)
        .env_remove("DX_API_HOST")
        .env_remove("DX_API_KEY")
        .env_remove("SBOM_STORAGE_DIR")
        .env_remove("RUST_LOG");
    cmd
}

fn write_status(root: &Path, job: &str, status: i32) {
    let dir = root.join("status");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join(format!("{}.json", job)),
        format!(
            r#"{{"job_id":"{}","status":{},"updated_at":"2026-01-01T00:00:00Z"}}"#,
            job, status
        ),
    )
    .unwrap();
}

#[test]
fn test_config_auto_discovered() {
    let dir = TempDir::new().unwrap();
    write_status(&dir.path().join("discovered"), "job-1", 2);
    fs::write(
        dir.path().join("sbom-pipeline.config.yml"),
        "storage:\n  root: discovered\n",
    )
    .unwrap();

    cmd_in(dir.path())
        .args(["status", "job-1"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("job-1"));
}

#[test]
fn test_explicit_config_path() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("explicit");
    write_status(&root, "job-2", 0);
    let config = dir.path().join("custom.yml");
    fs::write(&config, format!("storage:\n  root: {}\n", root.display())).unwrap();

    cmd_in(dir.path())
        .args(["status", "job-2", "--config"])
        .arg(&config)
        .assert()
        .code(0);
}

#[test]
fn test_missing_explicit_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    cmd_in(dir.path())
        .args(["tools", "--config", "nope.yml"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn test_storage_dir_environment_override() {
    let dir = TempDir::new().unwrap();
    let from_env = dir.path().join("from-env");
    write_status(&from_env, "job-3", 3);
    fs::write(
        dir.path().join("sbom-pipeline.config.yml"),
        "storage:\n  root: from-file\n",
    )
    .unwrap();

    cmd_in(dir.path())
        .env("SBOM_STORAGE_DIR", &from_env)
        .args(["status", "job-3"])
        .assert()
        .code(0);
}

#[test]
fn test_invalid_value_rejected_with_hint() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("sbom-pipeline.config.yml"),
        "pipeline:\n  max_concurrent_generations: 0\n",
    )
    .unwrap();

    cmd_in(dir.path())
        .arg("tools")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("max_concurrent_generations"))
        .stderr(predicate::str::contains("💡 Hint:"));
}

#[test]
fn test_unknown_fields_warned_not_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("sbom-pipeline.config.yml"),
        "pipeline:\n  max_concurent_generations: 4\n",
    )
    .unwrap();

    cmd_in(dir.path())
        .arg("tools")
        .assert()
        .code(0)
        .stderr(predicate::str::contains("unknown config field"))
        .stderr(predicate::str::contains("pipeline.max_concurent_generations"));
}

#[test]
fn test_invalid_yaml_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("sbom-pipeline.config.yml"),
        "pipeline: [[[broken",
    )
    .unwrap();

    cmd_in(dir.path())
        .arg("tools")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Failed to parse config file"));
}
