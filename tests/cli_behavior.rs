//! Black-box tests of the `curlyfmt` binary's subcommands and exit codes
//! (spec §6, §14), driven through `assert_cmd` rather than calling into
//! the library directly.

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use std::fs;
use tempfile::tempdir;

#[test]
fn check_on_a_clean_file_exits_zero() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("Clean.java");
    fs::write(&path, "package com.example;\n\nclass Clean {\n}\n").unwrap();

    Command::cargo_bin("curlyfmt")
        .unwrap()
        .arg("check")
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn check_on_a_misformatted_file_exits_nonzero_and_leaves_it_unchanged() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("Dirty.java");
    let original = "class Dirty\n{\n}\n";
    fs::write(&path, original).unwrap();

    Command::cargo_bin("curlyfmt")
        .unwrap()
        .arg("check")
        .arg(&path)
        .assert()
        .failure();

    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn format_rewrites_the_file_in_place() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("Dirty.java");
    fs::write(&path, "class Dirty\n{\n}\n").unwrap();

    Command::cargo_bin("curlyfmt")
        .unwrap()
        .arg("format")
        .arg(&path)
        .assert()
        .success();

    let rewritten = fs::read_to_string(&path).unwrap();
    assert!(!rewritten.contains("\n{"));
}

#[test]
fn machine_output_is_valid_json() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("Dirty.java");
    fs::write(&path, "class Dirty\n{\n}\n").unwrap();

    let output = Command::cargo_bin("curlyfmt")
        .unwrap()
        .arg("check")
        .arg(&path)
        .arg("--machine")
        .output()
        .unwrap();

    let stdout = String::from_utf8(output.stdout).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("machine output must be valid JSON");
    assert!(parsed.is_array() || parsed.is_object());
}

#[test]
fn missing_path_argument_is_a_usage_error() {
    Command::cargo_bin("curlyfmt")
        .unwrap()
        .arg("check")
        .assert()
        .failure()
        .stderr(contains("Usage").or(contains("required")));
}
