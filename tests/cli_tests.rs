//! Integration tests for the CLI interface.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("docpipe").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("pipeline"));
}

#[test]
fn test_check_valid_pipeline() {
    let mut cmd = Command::cargo_bin("docpipe").unwrap();
    cmd.arg("--check")
        .arg(r#"Load{source:"a.pdf"} | Select{mode:each} | Save"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("pipeline is valid (3 stages)"))
        .stdout(predicate::str::contains("1. Load (generator)"));
}

#[test]
fn test_check_rejects_misplaced_generator() {
    let mut cmd = Command::cargo_bin("docpipe").unwrap();
    cmd.arg("--check")
        .arg(r#"Save | Load{source:"a.pdf"}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid pipeline structure"));
}

#[test]
fn test_check_rejects_unknown_stage() {
    let mut cmd = Command::cargo_bin("docpipe").unwrap();
    cmd.arg("--check")
        .arg("Load | Shred")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown stage 'Shred'"));
}

#[test]
fn test_check_rejects_syntax_error() {
    let mut cmd = Command::cargo_bin("docpipe").unwrap();
    cmd.arg("--check")
        .arg("Load{source}")
        .assert()
        .failure()
        .stderr(predicate::str::contains("parse error"));
}

#[test]
fn test_demo_run_executes() {
    let mut cmd = Command::cargo_bin("docpipe").unwrap();
    cmd.arg(r#"Load{source:"demo.pdf"} | Select{pages:"1..2"} | Concat | Save"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("pipeline complete"));
}

#[test]
fn test_debug_flag_logs_steps() {
    let mut cmd = Command::cargo_bin("docpipe").unwrap();
    cmd.arg("--debug")
        .arg(r#"Load{source:"demo.pdf"} | Select{mode:each} | Save"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("pipeline complete"))
        .stdout(predicate::str::contains("executing stage"));
}

#[test]
fn test_run_failure_exits_nonzero() {
    let mut cmd = Command::cargo_bin("docpipe").unwrap();
    cmd.arg(r#"Load{source:"demo.pdf"} | Concat"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("expects multi input, got single"));
}
