//! CLI coverage: snapshot-driven runs and resolution through the binary.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn snapshot(dir: &TempDir) -> PathBuf {
    let file = dir.path().join("snapshot.json");
    fs::write(
        &file,
        r#"[
            { "path": "alice.near/widget/Counter", "version": 1, "code": "return 1+1" },
            { "path": "alice.near/widget/Counter", "version": 2, "code": "return 2+2" },
            { "path": "alice.near/widget/Boom", "code": "throw \"boom\"" }
        ]"#,
    )
    .expect("write snapshot");
    file
}

fn cli() -> Command {
    Command::cargo_bin("widget-host").expect("binary built")
}

#[test]
fn test_run_renders_latest_version() {
    let dir = TempDir::new().expect("tempdir");
    cli()
        .args(["run", "alice.near/widget/Counter", "--snapshot"])
        .arg(snapshot(&dir))
        .assert()
        .success()
        .stdout(predicate::str::contains("4"));
}

#[test]
fn test_run_honors_version_pin() {
    let dir = TempDir::new().expect("tempdir");
    cli()
        .args(["run", "alice.near/widget/Counter@1", "--snapshot"])
        .arg(snapshot(&dir))
        .assert()
        .success()
        .stdout(predicate::str::contains("2"));
}

#[test]
fn test_run_missing_widget_fails_with_source_error() {
    let dir = TempDir::new().expect("tempdir");
    cli()
        .args(["run", "alice.near/widget/Gone", "--snapshot"])
        .arg(snapshot(&dir))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_run_faulting_widget_reports_to_stderr() {
    let dir = TempDir::new().expect("tempdir");
    cli()
        .args(["run", "alice.near/widget/Boom", "--snapshot"])
        .arg(snapshot(&dir))
        .assert()
        .failure()
        .stderr(predicate::str::contains("boom"));
}

#[test]
fn test_run_rejects_malformed_props() {
    let dir = TempDir::new().expect("tempdir");
    cli()
        .args([
            "run",
            "alice.near/widget/Counter",
            "--props",
            "{not json",
            "--snapshot",
        ])
        .arg(snapshot(&dir))
        .assert()
        .failure()
        .stderr(predicate::str::contains("props"));
}

#[test]
fn test_resolve_prints_code() {
    let dir = TempDir::new().expect("tempdir");
    cli()
        .args(["resolve", "alice.near/widget/Counter@1", "--snapshot"])
        .arg(snapshot(&dir))
        .assert()
        .success()
        .stdout(predicate::str::contains("return 1+1"));
}

#[test]
fn test_resolve_missing_widget_fails() {
    let dir = TempDir::new().expect("tempdir");
    cli()
        .args(["resolve", "alice.near/widget/Counter@9", "--snapshot"])
        .arg(snapshot(&dir))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_rejects_malformed_source() {
    let dir = TempDir::new().expect("tempdir");
    cli()
        .args(["run", "not-a-path", "--snapshot"])
        .arg(snapshot(&dir))
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid widget path"));
}
