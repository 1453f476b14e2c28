//! # DockMock Error Types
//!
//! File: cli/src/core/error.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module defines the error types used throughout DockMock. Business
//! failures of the emulated daemon (missing container, invalid lifecycle
//! transition, missing fixture) are *not* errors here: controllers turn them into
//! ordinary responses with a status code. What remains are integration failures:
//!
//! - a request that matches no registered route,
//! - a status code the caller did not allow (raised by the modem adapter),
//! - fixture, configuration and filesystem problems,
//! - failures of the HTTP bridge or of a `bollard` client talking to it.
//!
//! ## Architecture
//!
//! - `DockMockError`: a `thiserror` enum covering the cases above.
//! - `Result<T>`: an alias for `anyhow::Result<T>`, so call sites can attach
//!   context and callers can classify with `downcast_ref::<DockMockError>()`.
//!
//! ## Examples
//!
//! ```rust
//! use dockmock::core::error::DockMockError;
//!
//! # fn classify(err: anyhow::Error) {
//! match err.downcast_ref::<DockMockError>() {
//!     Some(DockMockError::RouteNotFound { method, path }) => {
//!         eprintln!("no handler for {} {}", method, path);
//!     }
//!     Some(DockMockError::UnexpectedStatus { status, .. }) => {
//!         eprintln!("daemon answered {}", status);
//!     }
//!     _ => eprintln!("{:#}", err),
//! }
//! # }
//! ```
//!
use thiserror::Error;

/// Custom error type for the DockMock engine and tooling.
#[derive(Error, Debug)]
pub enum DockMockError {
    /// No registered route accepts the method/path pair. This is a wiring bug in
    /// the caller, never an emulated daemon error.
    #[error("No route for {method} {path}")]
    RouteNotFound { method: String, path: String },

    /// The engine answered with a status code the caller did not allow.
    /// `message` follows the `(HTTP code N) reason - detail` convention.
    #[error("{message}")]
    UnexpectedStatus {
        message: String,
        status: u16,
        reason: Option<String>,
        body: serde_json::Value,
    },

    #[error("Fixture error: {0}")]
    Fixture(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Filesystem error: {0}")]
    FileSystem(String),

    #[error("HTTP bridge error: {0}")]
    Bridge(String),

    #[error("Docker API interaction failed: {source}")]
    DockerApi {
        #[from]
        source: bollard::errors::Error,
    },
}

impl DockMockError {
    /// Status code carried by an `UnexpectedStatus` error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            DockMockError::UnexpectedStatus { status, .. } => Some(*status),
            DockMockError::RouteNotFound { .. } => Some(404),
            _ => None,
        }
    }
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;
