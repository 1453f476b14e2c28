//! # DockMock Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Foundational pieces shared by the engine and the binary:
//! - `config`: loading and merging `.dockmock.toml` settings for `dockmock serve`
//! - `error`: the `DockMockError` enum and the crate-wide `Result` alias
//!
//! ```rust
//! use dockmock::core::config;
//! use dockmock::core::error::{DockMockError, Result};
//! ```
//!
pub mod config;
pub mod error;
