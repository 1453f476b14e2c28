//! # DockMock Library
//!
//! File: cli/src/lib.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! An in-process double of the Docker Engine API. Test suites link the
//! engine (`mock::DockerMock`) directly and drive it through the modem
//! adapter, or start the HTTP bridge and point a `bollard` client at it.
//!
//! - `mock`: router, entity store, controllers, fixtures and streams
//! - `commands`: the `serve` and `fixtures` subcommands of the binary
//! - `common`: id generation and the `bollard` connection helper
//! - `core`: errors and configuration
//!
// The daemon-shaped inspect templates are large `json!` literals.
#![recursion_limit = "512"]

pub mod commands;
pub mod common;
pub mod core;
pub mod mock;
