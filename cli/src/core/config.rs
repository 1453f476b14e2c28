//! # DockMock Configuration System
//!
//! File: cli/src/core/config.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Loading, merging and validation of DockMock configuration files. Only the
//! `dockmock serve` bridge and the fixture tooling read configuration; the
//! in-process engine is configured entirely through its constructors.
//!
//! Configuration sources (in order of precedence):
//! 1. Project-specific `.dockmock.toml` in the current directory or an ancestor
//!    (the search stops at the first directory containing `.git`)
//! 2. User-specific `<config dir>/dockmock/config.toml`
//! 3. Default values
//!
//! Command-line flags override all of these; that last merge happens in
//! `commands::serve::config`.
//!
//! ## Examples
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 2375
//! api_version = "v1.47"
//!
//! [fixtures]
//! directory = "~/dockmock/fixtures"
//! ```
//!
use crate::core::error::{DockMockError, Result};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::net::IpAddr;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub fixtures: FixturesSection,
}

/// Settings for the HTTP bridge. Unset values fall back to CLI defaults.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    pub host: Option<IpAddr>,
    pub port: Option<u16>,
    /// Version segment (e.g. `v1.47`) prepended to requests that arrive without one.
    pub api_version: Option<String>,
}

/// Where fixture trees are loaded from.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FixturesSection {
    /// Fixture root directory (can use ~). Will be expanded.
    pub directory: Option<String>,
}

const PROJECT_CONFIG_FILENAME: &str = ".dockmock.toml";

/// Loads user and project configuration, merges, expands and validates them.
pub fn load_config() -> Result<Config> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    load_config_from(&current_dir)
}

/// Same as `load_config`, starting the project file search at `start`.
pub fn load_config_from(start: &Path) -> Result<Config> {
    let user_config = load_user_config()?;
    let project_config = match find_project_config_path(start) {
        Some(path) => {
            info!("Loading project configuration from: {}", path.display());
            Some(load_config_from_path(&path)?)
        }
        None => {
            debug!("No project configuration file ({}) found.", PROJECT_CONFIG_FILENAME);
            None
        }
    };
    let mut merged = merge_configs(user_config.unwrap_or_default(), project_config);
    expand_config_paths(&mut merged);
    validate_config(&merged).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", merged);
    Ok(merged)
}

fn load_user_config() -> Result<Option<Config>> {
    let Some(proj_dirs) = ProjectDirs::from("com", "DockMock", "dockmock") else {
        warn!("Could not determine user config directory.");
        return Ok(None);
    };
    let config_path = proj_dirs.config_dir().join("config.toml");
    if config_path.exists() {
        info!("Loading user configuration from: {}", config_path.display());
        load_config_from_path(&config_path).map(Some)
    } else {
        debug!("User configuration file not found at {}", config_path.display());
        Ok(None)
    }
}

fn find_project_config_path(start: &Path) -> Option<PathBuf> {
    let mut path = start;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Some(project_config);
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return None;
        }
        path = path.parent()?;
    }
}

/// Reads and parses one TOML configuration file.
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

fn merge_configs(user: Config, project: Option<Config>) -> Config {
    let Some(project) = project else {
        return user;
    };
    Config {
        server: ServerSection {
            host: project.server.host.or(user.server.host),
            port: project.server.port.or(user.server.port),
            api_version: project.server.api_version.or(user.server.api_version),
        },
        fixtures: FixturesSection {
            directory: project.fixtures.directory.or(user.fixtures.directory),
        },
    }
}

fn expand_config_paths(config: &mut Config) {
    if let Some(dir) = config.fixtures.directory.as_mut() {
        *dir = shellexpand::tilde(dir.as_str()).into_owned();
        debug!("Expanded fixtures directory: {}", dir);
    }
}

fn validate_config(config: &Config) -> Result<()> {
    if let Some(dir) = &config.fixtures.directory {
        let path = PathBuf::from(dir);
        if !path.exists() {
            warn!("Configured fixtures directory '{}' does not exist.", path.display());
        } else if !path.is_dir() {
            return Err(anyhow!(DockMockError::Config(format!(
                "Configured fixtures path '{}' exists but is not a directory.",
                path.display()
            ))));
        }
    }
    if let Some(version) = &config.server.api_version {
        if version.is_empty() || version.contains('/') {
            return Err(anyhow!(DockMockError::Config(format!(
                "Invalid api_version '{}'. Expected a single path segment like 'v1.47'.",
                version
            ))));
        }
    }
    Ok(())
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_deserialize_basic_toml() {
        let toml_content = r#"
            [server]
            host = "0.0.0.0"
            port = 9000
            api_version = "v1.47"

            [fixtures]
            directory = "~/fixtures"
        "#;

        let config: Config = toml::from_str(toml_content).expect("Failed to parse TOML");

        assert_eq!(config.server.host, Some("0.0.0.0".parse().unwrap()));
        assert_eq!(config.server.port, Some(9000));
        assert_eq!(config.server.api_version.as_deref(), Some("v1.47"));
        assert_eq!(config.fixtures.directory.as_deref(), Some("~/fixtures")); // Not yet expanded
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str("[server]\nbogus = 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_prefers_project_values() {
        let user = Config {
            server: ServerSection {
                port: Some(1111),
                api_version: Some("v1.40".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let project = Config {
            server: ServerSection {
                port: Some(2222),
                ..Default::default()
            },
            ..Default::default()
        };
        let merged = merge_configs(user, Some(project));
        assert_eq!(merged.server.port, Some(2222));
        assert_eq!(merged.server.api_version.as_deref(), Some("v1.40"));
    }

    #[test]
    fn test_path_expansion() {
        let mut config = Config {
            fixtures: FixturesSection {
                directory: Some("~/fx".to_string()),
            },
            ..Default::default()
        };
        expand_config_paths(&mut config);
        let home_dir = dirs::home_dir().unwrap();
        assert_eq!(
            config.fixtures.directory.as_deref(),
            Some(home_dir.join("fx").to_string_lossy().as_ref())
        );
    }

    #[test]
    fn test_validate_fixtures_path_is_file() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("not_a_dir");
        fs::write(&file_path, "").unwrap();

        let config = Config {
            fixtures: FixturesSection {
                directory: Some(file_path.to_string_lossy().to_string()),
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("is not a directory"));
    }

    #[test]
    fn test_validate_rejects_bad_api_version() {
        let config = Config {
            server: ServerSection {
                api_version: Some("v1/47".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_project_config_found_in_ancestor() {
        let temp_dir = tempdir().unwrap();
        let nested = temp_dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            temp_dir.path().join(PROJECT_CONFIG_FILENAME),
            "[server]\nport = 4242\n",
        )
        .unwrap();

        let found = find_project_config_path(&nested).expect("config should be found");
        let config = load_config_from_path(&found).unwrap();
        assert_eq!(config.server.port, Some(4242));
    }

    #[test]
    fn test_project_config_search_stops_at_git() {
        let temp_dir = tempdir().unwrap();
        fs::write(
            temp_dir.path().join(PROJECT_CONFIG_FILENAME),
            "[server]\nport = 4242\n",
        )
        .unwrap();
        let repo = temp_dir.path().join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();

        assert!(find_project_config_path(&repo).is_none());
    }
}
