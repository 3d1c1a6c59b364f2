#![allow(deprecated)] // TODO: migrate from Command::cargo_bin to cargo_bin_cmd!

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("random-number").unwrap();
    cmd.current_dir(dir)
        .env_remove("FLEETFORM_STACK")
        .env_remove("FLEETFORM_STATE_DIR")
        .env_remove("FLEETFORM_PROJECT_PATH")
        .env("NO_COLOR", "1");
    cmd
}

/// Help lists the stack commands
#[test]
fn test_cli_help() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("random integer"))
        .stdout(predicate::str::contains("preview"))
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("destroy"));
}

#[test]
fn test_cli_version() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("random-number"));
}

#[test]
fn test_invalid_command() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path()).arg("invalid-command").assert().failure();
}

#[test]
fn test_preview_on_empty_stack() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .arg("preview")
        .assert()
        .success()
        .stdout(predicate::str::contains("create randomNumber"))
        .stdout(predicate::str::contains("1 create"));

    // Preview leaves no state behind
    assert!(!dir.path().join(".fleetform/stacks/dev.json").exists());
}

#[test]
fn test_up_output_destroy() {
    let dir = tempfile::tempdir().unwrap();

    cmd(dir.path())
        .arg("up")
        .assert()
        .success()
        .stdout(predicate::str::contains("randomNumber"))
        .stdout(predicate::str::contains("Resources: 1 create"));
    assert!(dir.path().join(".fleetform/stacks/dev.json").exists());

    let output = cmd(dir.path())
        .args(["output", "randomNumber"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: i64 = String::from_utf8(output).unwrap().trim().parse().unwrap();
    assert!((1..=100).contains(&value));

    cmd(dir.path())
        .arg("up")
        .assert()
        .success()
        .stdout(predicate::str::contains("Resources: 1 same"));

    cmd(dir.path())
        .args(["output", "missing"])
        .assert()
        .failure();

    cmd(dir.path())
        .arg("destroy")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 delete"));

    cmd(dir.path())
        .arg("output")
        .assert()
        .success()
        .stdout(predicate::str::contains("{}"));
}

#[test]
fn test_project_file_names_stack() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("Fleetform.yaml"),
        "name: sample\nstack: staging\n",
    )
    .unwrap();

    cmd(dir.path()).arg("up").assert().success();
    assert!(dir.path().join(".fleetform/stacks/staging.json").exists());

    cmd(dir.path())
        .args(["--stack", "other", "preview"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sample/other"));
}

#[test]
fn test_export_import() {
    let source = tempfile::tempdir().unwrap();
    cmd(source.path()).arg("up").assert().success();

    let exported = cmd(source.path())
        .arg("export")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let state_file = source.path().join("state.json");
    std::fs::write(&state_file, exported).unwrap();

    let target = tempfile::tempdir().unwrap();
    cmd(target.path())
        .arg("import")
        .arg(&state_file)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 resource"));

    cmd(target.path())
        .arg("preview")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 same"));
}

#[test]
fn test_invalid_stack_names_rejected() {
    let dir = tempfile::tempdir().unwrap();
    for stack in ["", "a::b", "../x"] {
        cmd(dir.path())
            .args(["--stack", stack, "up"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid stack name"));
    }
    assert!(!dir.path().join(".fleetform/stacks").exists());
    assert!(!dir.path().join(".fleetform/x.json").exists());
}
