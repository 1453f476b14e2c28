//! # DockMock Fixtures Command
//!
//! File: cli/src/commands/fixtures/mod.rs
//! Author: Christi Mahu
//!
//! Loads a fixture directory the same way `dockmock serve` does and lists what
//! it registers, so a broken layout shows up before a test run does.
//!
//! ```bash
//! dockmock fixtures ./fixtures
//! dockmock fixtures          # uses `fixtures.directory` from .dockmock.toml
//! ```
//!
use crate::core::config;
use crate::core::error::{DockMockError, Result};
use crate::mock::fixtures::DirFixtures;
use anyhow::anyhow;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug, Default)]
pub struct FixturesArgs {
    /// Fixture directory (defaults to `fixtures.directory` from the config).
    pub directory: Option<PathBuf>,
}

pub async fn handle_fixtures(args: FixturesArgs) -> Result<()> {
    info!("Handling fixtures command with args: {:?}", args);

    let directory = match args.directory {
        Some(dir) => dir,
        None => config::load_config()?
            .fixtures
            .directory
            .map(PathBuf::from)
            .ok_or_else(|| {
                anyhow!(DockMockError::Config(
                    "No fixture directory given and none configured".to_string()
                ))
            })?,
    };

    let fixtures = DirFixtures::load(&directory)?;
    let entries = fixtures.entries();
    if entries.is_empty() {
        println!("No fixtures found in {}", fixtures.root().display());
        return Ok(());
    }

    println!("Fixtures in {}:", fixtures.root().display());
    println!("{:<8} {:<8} {:<4} IMAGE", "KIND", "VERSION", "BLD");
    for entry in &entries {
        println!("{}", entry);
    }
    println!("\n{} fixture(s)", entries.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_lists_loaded_directory() {
        let dir = tempdir().unwrap();
        let pull = dir.path().join("v1").join("pull").join("node");
        fs::create_dir_all(&pull).unwrap();
        fs::write(pull.join("23.jsonl"), "{\"status\":\"done\"}\n").unwrap();

        let args = FixturesArgs {
            directory: Some(dir.path().to_path_buf()),
        };
        assert!(handle_fixtures(args).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_directory_is_config_error() {
        let dir = tempdir().unwrap();
        let args = FixturesArgs {
            directory: Some(dir.path().join("nope")),
        };
        let err = handle_fixtures(args).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DockMockError>(),
            Some(DockMockError::Config(_))
        ));
    }
}
