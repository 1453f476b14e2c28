//! # DockMock Docker Client Connection Helper
//!
//! File: cli/src/common/docker/connect.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Builds a `bollard::Docker` client pointed at a running `dockmock serve`
//! bridge instead of the local daemon socket. Test suites that already speak
//! `bollard` use this to run unchanged against the double.
//!
//! ```rust,no_run
//! use dockmock::common::docker::connect::connect_mock;
//!
//! # async fn run() -> dockmock::core::error::Result<()> {
//! let docker = connect_mock("127.0.0.1:2375".parse()?)?;
//! let details = docker
//!     .inspect_container("web", None::<bollard::container::InspectContainerOptions>)
//!     .await?;
//! println!("{:?}", details.state);
//! # Ok(())
//! # }
//! ```
//!
use crate::core::error::{DockMockError, Result};
use anyhow::{anyhow, Context};
use bollard::{Docker, API_DEFAULT_VERSION};
use std::net::SocketAddr;
use tracing::instrument;

/// Request timeout handed to bollard, in seconds.
const CLIENT_TIMEOUT_SECS: u64 = 30;

/// Connects a `bollard` client to the bridge listening on `addr`.
///
/// bollard connects lazily, so this only fails on a malformed address; the
/// first request surfaces an unreachable bridge.
#[instrument]
pub fn connect_mock(addr: SocketAddr) -> Result<Docker> {
    Docker::connect_with_http(
        &format!("http://{}", addr),
        CLIENT_TIMEOUT_SECS,
        API_DEFAULT_VERSION,
    )
    .map_err(|e| anyhow!(DockMockError::DockerApi { source: e }))
    .with_context(|| format!("Failed to build Docker client for bridge at {}", addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_mock_builds_client() {
        let addr: SocketAddr = "127.0.0.1:2375".parse().unwrap();
        assert!(connect_mock(addr).is_ok());
    }
}
