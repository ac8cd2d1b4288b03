//! CLI end-to-end tests
//!
//! Tests for the autopub command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{tempdir, TempDir};

/// Get a command for the autopub binary
#[allow(deprecated)]
fn autopub_cmd() -> Command {
    let mut cmd = Command::cargo_bin("autopub").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Write a config rooted in a fresh temp dir, with services on a closed port.
fn write_config(extra: &str) -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("autopub.toml");
    let config = format!(
        r#"
[paths]
data_dir = "{data}"

[endpoints]
upload_url = "http://127.0.0.1:9/upload"
process_url = "http://127.0.0.1:9/video-processing"
publish_url = "http://127.0.0.1:9/publish"
connect_timeout_secs = 1
{extra}
"#,
        data = dir.path().join("data").display(),
        extra = extra,
    );
    fs::write(&config_path, config).unwrap();
    (dir, config_path)
}

fn data(dir: &TempDir) -> PathBuf {
    dir.path().join("data")
}

fn file_count(dir: &Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = autopub_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("autopub"))
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("--pub-bilibili"))
        .stdout(predicate::str::contains("check-tools"));
}

#[test]
fn test_cli_version_flag() {
    let mut cmd = autopub_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("autopub"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = autopub_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_check_tools_command() {
    let (_dir, config) = write_config("");
    let mut cmd = autopub_cmd();
    cmd.arg("--config")
        .arg(&config)
        .arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("Checking external tools"))
        .stdout(predicate::str::contains("ffprobe"));
}

#[test]
fn test_cli_run_flags_conflict_with_subcommand() {
    let mut cmd = autopub_cmd();
    cmd.args(["--no-pub", "version"]).assert().failure();
}

#[test]
fn test_cli_probe_nonexistent_file() {
    let mut cmd = autopub_cmd();
    cmd.args(["probe", "/nonexistent/clip.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cli_config_validation() {
    let (_dir, config) = write_config("");
    let mut cmd = autopub_cmd();
    cmd.arg("validate")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("http://127.0.0.1:9/upload"));
}

#[test]
fn test_cli_config_validation_uses_global_config() {
    let (_dir, config) = write_config("");
    let mut cmd = autopub_cmd();
    cmd.arg("-c")
        .arg(&config)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_cli_config_validation_rejects_bad_values() {
    let (_dir, config) = write_config("\n[video]\nextensions = []\n");
    let mut cmd = autopub_cmd();
    cmd.arg("validate")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("extensions"));
}

#[test]
fn test_cli_config_validation_rejects_malformed_file() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("broken.toml");
    fs::write(&config, "[paths\ndata_dir = ").unwrap();

    let mut cmd = autopub_cmd();
    cmd.arg("validate").arg(&config).assert().failure();
}

#[test]
fn test_cli_run_empty_watch_folder() {
    let (dir, config) = write_config("");
    let mut cmd = autopub_cmd();
    cmd.arg("--config")
        .arg(&config)
        .arg("--no-pub")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to process"));

    let data = data(&dir);
    assert!(data.join("AutoPublish").is_dir());
    assert!(data.join("processed.csv").is_file());
    assert!(data.join("videos_db.csv").is_file());
    assert!(!data.join("autopub.lock").exists());
    // One log file for the run
    assert_eq!(file_count(&data.join("logs")), 1);
}

#[test]
fn test_cli_run_service_down_is_not_fatal() {
    let (dir, config) = write_config("");
    let watch = data(&dir).join("AutoPublish");
    fs::create_dir_all(&watch).unwrap();
    fs::write(watch.join("clip.mp4"), b"fake video").unwrap();

    let mut cmd = autopub_cmd();
    cmd.arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 failed"));

    let processed = fs::read_to_string(data(&dir).join("processed.csv")).unwrap();
    assert!(processed.is_empty());
    let seen = fs::read_to_string(data(&dir).join("videos_db.csv")).unwrap();
    assert_eq!(seen, "clip.mp4\n");
}

#[test]
fn test_cli_run_refuses_when_locked() {
    let (dir, config) = write_config("");
    fs::create_dir_all(data(&dir)).unwrap();
    fs::write(data(&dir).join("autopub.lock"), "1\n").unwrap();

    let mut cmd = autopub_cmd();
    cmd.arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("another run"));

    assert!(data(&dir).join("autopub.lock").exists());
}

#[test]
fn test_cli_run_missing_single_file() {
    let (_dir, config) = write_config("");
    let mut cmd = autopub_cmd();
    cmd.arg("--config")
        .arg(&config)
        .args(["--path", "/nonexistent/clip.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_cli_init_writes_config_and_directories() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("conf/autopub.toml");
    let mut cmd = autopub_cmd();
    cmd.env("AUTOPUB_DATA_DIR", dir.path().join("data"))
        .arg("--config")
        .arg(&config)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote config file"));

    let written = fs::read_to_string(&config).unwrap();
    assert!(written.contains("[paths]"));
    assert!(written.contains("upload_url"));
    assert!(dir.path().join("data/AutoPublish").is_dir());
    assert!(dir.path().join("data/transcription_data").is_dir());
    assert!(dir.path().join("data/processed.csv").is_file());

    // A second init leaves the file alone
    let mut cmd = autopub_cmd();
    cmd.env("AUTOPUB_DATA_DIR", dir.path().join("data"))
        .arg("--config")
        .arg(&config)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}
