//! Integration tests for the mvpkg CLI
//!
//! These tests drive the compiled binary against temporary Go modules.

mod common;

use assert_cmd::Command;
use common::scenario_module;
use predicates::prelude::*;

/// Test helper to get the CLI binary
fn mvpkg_cmd() -> Command {
    let mut cmd = Command::cargo_bin("mvpkg").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("GOOS")
        .env_remove("GOARCH")
        .env_remove("CGO_ENABLED")
        .env_remove("MVPKG_DRY_RUN");
    cmd
}

#[test]
fn test_help() {
    mvpkg_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--build-flags"));
}

#[test]
fn test_missing_arguments() {
    mvpkg_cmd().arg("only-source").assert().failure();
}

#[test]
fn test_move_succeeds_quietly() {
    let fixture = scenario_module();
    mvpkg_cmd()
        .current_dir(fixture.root())
        .args(["source/testpkg", "destination/testpkg2"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert!(fixture.exists("destination/testpkg2/testpkg.go"));
    assert!(fixture.read("user/user.go").contains("testpkg2.Foo()"));
}

#[test]
fn test_directory_flag() {
    let fixture = scenario_module();
    mvpkg_cmd()
        .arg("-C")
        .arg(fixture.path("user"))
        .args(["source/testpkg", "destination/testpkg"])
        .assert()
        .success();

    assert!(fixture.exists("destination/testpkg/testpkg.go"));
}

#[test]
fn test_dry_run_logs_intents_and_changes_nothing() {
    let fixture = scenario_module();
    let before = fixture.snapshot();

    mvpkg_cmd()
        .current_dir(fixture.root())
        .args(["--dry-run", "source/testpkg", "destination/testpkg2"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Would move"))
        .stderr(predicate::str::contains("Would rewrite"));

    assert_eq!(fixture.snapshot(), before);
}

#[test]
fn test_json_report() {
    let fixture = scenario_module();
    let output = mvpkg_cmd()
        .current_dir(fixture.root())
        .args(["--dry-run", "--json", "source/testpkg", "destination/testpkg2"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["module"], "example.com");
    assert_eq!(report["dry_run"], true);
    assert_eq!(report["plan"][0]["source"], "source/testpkg");
}

#[test]
fn test_no_module_fails() {
    let dir = tempfile::tempdir().unwrap();
    mvpkg_cmd()
        .current_dir(dir.path())
        .args(["a", "b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("go.mod"));
}

#[test]
fn test_path_outside_module_fails() {
    let fixture = scenario_module();
    mvpkg_cmd()
        .current_dir(fixture.root())
        .args(["source/testpkg", "../elsewhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("outside module"));
}

#[test]
fn test_invalid_goos_fails() {
    let fixture = scenario_module();
    mvpkg_cmd()
        .current_dir(fixture.root())
        .args(["--goos", "beos", "source/testpkg", "dst/testpkg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GOOS"));
}
