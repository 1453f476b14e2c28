//! # DockMock Command Modules
//!
//! File: cli/src/commands/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! The subcommands of the `dockmock` binary. Each module defines its own
//! clap arguments struct and an async `handle_*` function called from
//! `main.rs`.
//!
//! - `serve`: exposes a fresh engine over HTTP
//! - `fixtures`: lists what a fixture directory registers
//!

/// `dockmock serve`: the HTTP bridge.
pub mod serve;
/// `dockmock fixtures`: fixture directory inspection.
pub mod fixtures;
