//! # DockMock Docker Client Interface
//!
//! File: cli/src/common/docker/mod.rs
//! Author: Christi Mahu
//!
//! Client-side helpers for talking to DockMock with the `bollard` crate.
//!
//! - **`connect`**: builds a `bollard::Docker` aimed at a `dockmock serve` bridge.
//!

/// Connects `bollard` clients to the HTTP bridge.
pub mod connect;

pub use connect::connect_mock;
