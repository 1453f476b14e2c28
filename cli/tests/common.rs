//! # DockMock Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Shared helpers for the integration test crates in `cli/tests/`: a handle
//! on the compiled `dockmock` binary and a fixture-backed engine used by the
//! engine and bridge scenarios.
//!

// Each test crate uses a different subset of these helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;

use dockmock::common::ids::SequentialIds;
use dockmock::mock::fixtures::memory::Script;
use dockmock::mock::fixtures::MemoryFixtures;
use dockmock::mock::images::Image;
use dockmock::mock::DockerMock;
use std::sync::Arc;

pub fn dockmock_cmd() -> Command {
    Command::cargo_bin("dockmock").expect("Failed to find dockmock binary for testing")
}

/// Pull/build fixtures for `node:23`, `node:latest`, `app:latest` and a
/// pull of `broken:1` that fails mid-stream.
pub fn fixtures() -> MemoryFixtures {
    MemoryFixtures::new("integration")
        .with_pull(
            "*",
            "node",
            "23",
            [
                "{\"status\":\"Pulling from library/node\",\"id\":\"23\"}\n",
                "{\"status\":\"Digest: sha256:1f2e\"}\n",
                "{\"status\":\"Status: Downloaded newer image for node:23\"}\n",
            ],
        )
        .with_image(
            "*",
            "node",
            "23",
            Image::new("sha256:node23", ["node:23", "node:latest"]),
        )
        .with_pull_script(
            "*",
            "broken",
            "1",
            Script::new(["{\"status\":\"Pulling from library/broken\"}\n"])
                .failing("manifest unknown"),
        )
        .with_image("*", "broken", "1", Image::new("sha256:broken", ["broken:1"]))
        .with_build(
            "*",
            "1",
            "app",
            "latest",
            [
                "{\"stream\":\"Step 1/2 : FROM node:23\\n\"}\n",
                "{\"stream\":\"Successfully tagged app:latest\\n\"}\n",
            ],
        )
        .with_image("*", "app", "latest", Image::new("sha256:app", ["app:latest"]))
}

/// An engine with deterministic ids and `fixtures()` registered.
pub fn fixture_mock() -> DockerMock {
    DockerMock::with_ids(Arc::new(SequentialIds::default())).with_fixtures(fixtures())
}
