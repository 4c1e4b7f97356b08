// ABOUTME: Integration tests for the fastack CLI commands.
// ABOUTME: Validates --help output, create behavior, the version gate, and non-zero exits on failed deploys.

mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use support::rpc_server::RpcServer;

fn fastack_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fastack"));
    cmd.env_remove("FASTACK_SERVER")
        .env_remove("FASTACK_USERNAME")
        .env_remove("FASTACK_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_shows_commands() {
    fastack_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("create"));
}

#[test]
fn deploy_help_shows_flags() {
    fastack_cmd()
        .args(["deploy", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--app"))
        .stdout(predicate::str::contains("--lenient"))
        .stdout(predicate::str::contains("--skip-version-check"));
}

#[test]
fn create_writes_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("fastack.json");

    fastack_cmd()
        .current_dir(temp_dir.path())
        .args(["create", "my-app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fastack.json"));

    assert!(config_path.exists(), "fastack.json should be created");
    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("\"app\": \"my-app\""));
}

#[test]
fn create_refuses_to_overwrite_existing_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("fastack.json"), "{}").unwrap();

    fastack_cmd()
        .current_dir(temp_dir.path())
        .arg("create")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn create_rejects_invalid_app_name() {
    let temp_dir = tempfile::tempdir().unwrap();

    fastack_cmd()
        .current_dir(temp_dir.path())
        .args(["create", "Not_Valid"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid app name"));
}

#[test]
fn deploy_missing_directory_fails() {
    let temp_dir = tempfile::tempdir().unwrap();

    fastack_cmd()
        .args(["deploy"])
        .arg(temp_dir.path().join("missing"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("directory not found"));
}

#[test]
fn deploy_rejects_https_server() {
    let temp_dir = tempfile::tempdir().unwrap();

    fastack_cmd()
        .args(["deploy", "--server", "https://example.com"])
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported scheme"));
}

#[test]
fn deploy_unreachable_server_exits_non_zero_without_package() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join("fastack.json"),
        r#"{"token": "t", "retry": {"attempts": 1}}"#,
    )
    .unwrap();
    fs::write(temp_dir.path().join("index.js"), "1").unwrap();

    // Port 9 (discard) is closed on test machines, so connect is refused.
    fastack_cmd()
        .args(["deploy", "--skip-version-check", "--server", "http://127.0.0.1:9"])
        .arg(temp_dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("connect failed"));

    assert!(
        !temp_dir
            .path()
            .join("fastack-deploy-package.tar.gz")
            .exists()
    );
}

#[test]
fn deploy_without_config_reports_missing_file() {
    let temp_dir = tempfile::tempdir().unwrap();

    fastack_cmd()
        .args(["deploy", "--skip-version-check", "--server", "http://127.0.0.1:9"])
        .arg(temp_dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no fastack.json found"));
}

#[test]
fn deploy_outdated_client_exits_non_zero_without_package() {
    let server = RpcServer::spawn(0, |method| match method {
        "getCliVersion" => json!("0.0.0"),
        "getDeployConfig" => json!({ "acceptableExtensions": [], "ignoreDirectories": [] }),
        _ => Value::Null,
    });
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join("fastack.json"),
        r#"{"token": "t", "retry": {"attempts": 1}}"#,
    )
    .unwrap();
    fs::write(temp_dir.path().join("index.js"), "1").unwrap();

    fastack_cmd()
        .args(["deploy", "--server", server.url()])
        .arg(temp_dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("out of date"))
        .stderr(predicate::str::contains("latest is 0.0.0"));

    assert!(
        !temp_dir
            .path()
            .join("fastack-deploy-package.tar.gz")
            .exists()
    );
    assert_eq!(server.accepted(), 1);
}
