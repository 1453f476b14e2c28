//! # DockMock Serve Command
//!
//! File: cli/src/commands/serve/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! `dockmock serve` runs a fresh `DockerMock` behind an HTTP listener so tools
//! that only speak the Docker Engine API over TCP can use it. State lives for
//! the lifetime of the process; fixtures come from the configured directory.
//!
//! ## Architecture
//!
//! - `config.rs`: flag/config-file merging
//! - `bridge.rs`: the axum server translating HTTP to engine dispatches
//!
//! ## Examples
//!
//! ```bash
//! dockmock serve --fixtures ./fixtures
//! DOCKER_HOST=tcp://127.0.0.1:2375 docker ps -a
//! ```
//!
use crate::core::error::Result;
use tracing::info;

pub use config::ServeArgs;

/// Flag and config-file merging for the bridge.
pub mod config;

/// The axum HTTP bridge.
pub mod bridge;

/// Entry point of `dockmock serve`.
pub async fn handle_serve(args: ServeArgs) -> Result<()> {
    info!("Handling serve command with args: {:?}", args);

    let config = config::load_and_merge_config(args)?;
    info!("Effective serve config: {:?}", config);

    bridge::run_server(config).await
}
