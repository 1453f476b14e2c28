//! # DockMock Serve Configuration
//!
//! File: cli/src/commands/serve/config.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Resolves the effective settings of `dockmock serve`. Values come from, in
//! order of precedence:
//!
//! 1. command-line flags (`ServeArgs`),
//! 2. the `.dockmock.toml` project file / user config (`core::config`),
//! 3. built-in defaults (`127.0.0.1:2375`, no fixtures).
//!
//! A relative fixture directory is resolved against the current directory and
//! must exist.
//!
//! ## Examples
//!
//! ```bash
//! dockmock serve --port 2376 --fixtures ./fixtures
//! dockmock serve --api-version v1.47
//! ```
//!
use crate::core::config::{self, Config};
use crate::core::error::{DockMockError, Result};
use anyhow::{anyhow, Context};
use clap::Parser;
use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use tracing::{debug, info};

/// Port of an unencrypted Docker daemon.
pub const DEFAULT_PORT: u16 = 2375;

/// Arguments of `dockmock serve`. Unset flags defer to configuration files.
#[derive(Parser, Debug, Default)]
pub struct ServeArgs {
    /// Port to listen on (default 2375). The next free port is used if taken.
    #[arg(long, short, env = "DOCKMOCK_PORT")]
    pub port: Option<u16>,

    /// Address to bind (default 127.0.0.1).
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Fixture directory to load pull/build outcomes from.
    #[arg(long, short)]
    pub fixtures: Option<PathBuf>,

    /// API version assumed for requests without a `/vX.Y` prefix.
    #[arg(long)]
    pub api_version: Option<String>,
}

/// Effective settings of the bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct ServeConfig {
    pub host: IpAddr,
    pub port: u16,
    pub fixtures: Option<PathBuf>,
    pub api_version: Option<String>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            fixtures: None,
            api_version: None,
        }
    }
}

/// Loads configuration files and applies `args` on top.
pub fn load_and_merge_config(args: ServeArgs) -> Result<ServeConfig> {
    let file_config = config::load_config()?;
    merge(args, file_config)
}

/// Applies `args` over `file_config` over the defaults.
pub fn merge(args: ServeArgs, file_config: Config) -> Result<ServeConfig> {
    let defaults = ServeConfig::default();
    let fixtures = match args.fixtures {
        Some(dir) => Some(dir),
        None => file_config.fixtures.directory.map(PathBuf::from),
    };
    let fixtures = fixtures.map(resolve_directory).transpose()?;

    let api_version = args
        .api_version
        .or(file_config.server.api_version)
        .map(|v| v.trim_matches('/').to_string())
        .filter(|v| !v.is_empty());

    let merged = ServeConfig {
        host: args.host.or(file_config.server.host).unwrap_or(defaults.host),
        port: args.port.or(file_config.server.port).unwrap_or(defaults.port),
        fixtures,
        api_version,
    };
    debug!("Merged serve config: {:?}", merged);
    Ok(merged)
}

fn resolve_directory(dir: PathBuf) -> Result<PathBuf> {
    let absolute = if dir.is_absolute() {
        dir
    } else {
        env::current_dir()
            .context("Failed to get current working directory")?
            .join(dir)
    };
    if !absolute.is_dir() {
        return Err(anyhow!(DockMockError::Config(format!(
            "Fixture directory '{}' does not exist or is not a directory",
            absolute.display()
        ))));
    }
    info!("Using fixtures from {}", absolute.display());
    Ok(absolute)
}
