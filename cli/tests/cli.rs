//! # DockMock CLI Integration Tests
//!
//! File: cli/tests/cli.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Runs the compiled `dockmock` binary: top-level flags, the `fixtures`
//! listing of a directory tree, and the configuration errors of `serve`.
//!

mod common;

use common::dockmock_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_version_flag() {
    dockmock_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_lists_subcommands() {
    dockmock_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("fixtures"));
}

#[test]
fn test_fixtures_lists_directory_entries() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("v1/pull/library/node")).unwrap();
    fs::write(
        root.join("v1/pull/library/node/23.jsonl"),
        "{\"status\":\"Pulling\"}\n{\"status\":\"Done\"}\n",
    )
    .unwrap();
    fs::create_dir_all(root.join("*/build/1/app")).unwrap();
    fs::write(root.join("*/build/1/app/latest.jsonl"), "{\"stream\":\"ok\"}\n").unwrap();
    fs::write(root.join("*/build/1/app/latest.error"), "build failed\n").unwrap();
    fs::create_dir_all(root.join("v1/inspect/library/node")).unwrap();
    fs::write(
        root.join("v1/inspect/library/node/23.json"),
        r#"{"Id":"sha256:node","RepoTags":["library/node:23"]}"#,
    )
    .unwrap();

    dockmock_cmd()
        .arg("fixtures")
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("library/node:23 (2 chunks)"))
        .stdout(predicate::str::contains("app:latest (1 chunks, fails)"))
        .stdout(predicate::str::contains("3 fixture(s)"));
}

#[test]
fn test_fixtures_empty_directory() {
    let dir = tempdir().unwrap();
    dockmock_cmd()
        .arg("fixtures")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No fixtures found"));
}

#[test]
fn test_fixtures_missing_directory_fails() {
    let dir = tempdir().unwrap();
    dockmock_cmd()
        .arg("fixtures")
        .arg(dir.path().join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_serve_rejects_missing_fixture_directory() {
    let dir = tempdir().unwrap();
    dockmock_cmd()
        .current_dir(dir.path())
        .args(["serve", "--port", "0", "--fixtures", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Fixture directory"));
}
