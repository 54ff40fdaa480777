//! Integration tests for argument parsing, version output, and failures
//! that happen before any platform call.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

pub const MANIFEST: &str = r#"
project:
  name: shop-demo
  provider: aws
  region: us-east-1
services:
  - name: frontend
    image: registry.example.com/shop/frontend:1.2
    memory: 512
    cpu: "0.5"
    env:
      API_URL: http://api:8080
load_balancers:
  - name: public
    service: frontend
    port: 80
"#;

/// `demoprov` isolated from the caller's environment and config file.
pub fn demoprov(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("demoprov"));
    cmd.env("NO_COLOR", "1")
        .env("DEMOPROV_CONFIG", dir.path().join("config.yaml"))
        .env_remove("PLATFORM_TOKEN")
        .env_remove("PLATFORM_ENDPOINT")
        .env_remove("DEMOPROV_DRY_RUN")
        .env_remove("DEMOPROV_MANIFEST")
        .env_remove("DEMOPROV_PLATFORM_BIN")
        .env_remove("DEMOPROV_LOG")
        .current_dir(dir.path());
    cmd
}

pub fn workspace() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("demo.yaml"), MANIFEST).expect("write manifest");
    dir
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help() {
    let dir = workspace();
    // clap with arg_required_else_help shows help on stderr and exits 2
    demoprov(&dir)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Idempotently provision"));
}

#[test]
fn test_cli_help_lists_commands() {
    let dir = workspace();
    demoprov(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("wait"))
        .stdout(predicate::str::contains("urls"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_version_command_shows_version() {
    let dir = workspace();
    demoprov(&dir)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(concat!(
            "demoprov ",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_version_command_json() {
    let dir = workspace();
    demoprov(&dir)
        .args(["version", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""version":"#));
}

// --- Precondition failures ---

#[test]
fn test_deploy_without_token_exits_one_and_names_variable() {
    let dir = workspace();
    demoprov(&dir)
        .args(["deploy", "--yes"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("PLATFORM_TOKEN"));
}

#[test]
fn test_deploy_without_token_json_error_code() {
    let dir = workspace();
    let output = demoprov(&dir)
        .args(["--json", "deploy", "--yes"])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json error");
    assert_eq!(value["error"], true);
    assert_eq!(value["code"], "missing_token");
}

#[test]
fn test_missing_manifest_exits_one() {
    let dir = TempDir::new().expect("tempdir");
    demoprov(&dir)
        .env("PLATFORM_TOKEN", "tok")
        .args(["-f", "nope.yaml", "check"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nope.yaml"));
}

#[test]
fn test_unknown_manifest_field_exits_one() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(
        dir.path().join("demo.yaml"),
        "project:\n  name: shop-demo\n  provider: aws\n  region: x\n  size: huge\n",
    )
    .expect("write");
    demoprov(&dir)
        .env("PLATFORM_TOKEN", "tok")
        .arg("check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("size"));
}

#[test]
fn test_missing_platform_binary_exits_one() {
    let dir = workspace();
    demoprov(&dir)
        .env("PLATFORM_TOKEN", "tok")
        .args(["--platform-bin", "demoprov-no-such-platform-cli", "check"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}
