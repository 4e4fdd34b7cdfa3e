mod common;

use assert_cmd::prelude::*;
use common::{config_csv, sample_data_csv, write_project};
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("strata").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("strata"));
}

#[test]
fn missing_arguments_fail() {
    let mut cmd = Command::cargo_bin("strata").unwrap();
    cmd.assert().failure();
}

#[test]
fn nonexistent_directory_fails_with_message() {
    let mut cmd = Command::cargo_bin("strata").unwrap();
    cmd.args(["/no/such/dir", "config.csv"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not a directory"));
}

#[test]
fn full_pipeline_writes_outputs() {
    let dir = tempdir().unwrap();
    write_project(
        dir.path(),
        &config_csv(&[
            ("data export", "on"),
            ("stack plot 1", "on"),
            ("stack 1 calculation", "on"),
            ("stack 1 colours", "6,2,4,5,3"),
        ]),
        &sample_data_csv(),
    );

    let mut cmd = Command::cargo_bin("strata").unwrap();
    cmd.arg(dir.path()).arg("config.csv");
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Wrote"));

    assert!(dir.path().join("diagram.svg").exists());
    assert!(dir.path().join("diagram_scaling.csv").exists());
    assert!(dir.path().join("diagram_stacks.json").exists());
}

#[test]
fn bad_config_value_fails_with_key_name() {
    let dir = tempdir().unwrap();
    write_project(
        dir.path(),
        &config_csv(&[("png dpi", "many")]),
        &sample_data_csv(),
    );
    let mut cmd = Command::cargo_bin("strata").unwrap();
    cmd.arg(dir.path()).arg("config.csv");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("png dpi"));
}
