//! # DockMock Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Shared utilities used by the engine and the binary, kept apart from the
//! engine itself (`mock::`) and core infrastructure (`core::`).
//!
//! - **`docker`**: `bollard` client helpers for reaching the HTTP bridge.
//! - **`ids`**: container identifier generation.
//!

/// `bollard` client helpers.
pub mod docker;
/// Identifier generation (random and sequential).
pub mod ids;
