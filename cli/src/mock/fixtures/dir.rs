//! # Directory Fixtures
//!
//! File: cli/src/mock/fixtures/dir.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Loads a fixture tree from disk into a `MemoryFixtures` table. The layout is
//! keyed by path:
//!
//! ```text
//! <root>/<version>/pull/<image name...>/<tag>.jsonl
//! <root>/<version>/build/<builder version>/<image name...>/<tag>.jsonl
//! <root>/<version>/inspect/<image name...>/<tag>.json
//! ```
//!
//! Image names may contain slashes (`library/node`), so every directory
//! between the kind (or builder version) and the file is part of the name.
//! Each non-empty line of a `.jsonl` file is one progress chunk. A `.error`
//! file next to a `.jsonl` makes the stream end with that text as its error.
//! An inspect payload without `RepoTags` gets `<name>:<tag>`.
//!
//! The whole tree is read at load time; later requests never touch the disk.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use dockmock::mock::fixtures::{DirFixtures, FixtureProvider};
//! use std::path::Path;
//!
//! # fn run() -> dockmock::core::error::Result<()> {
//! let fixtures = DirFixtures::load(Path::new("./fixtures"))?;
//! for entry in fixtures.entries() {
//!     println!("{}", entry);
//! }
//! assert!(fixtures.has_pull("v1", "node", "23"));
//! # Ok(())
//! # }
//! ```
//!
use super::memory::{MemoryFixtures, Script};
use super::{FixtureEntry, FixtureProvider};
use crate::core::error::{DockMockError, Result};
use crate::mock::images::Image;
use crate::mock::stream::ProgressStream;
use anyhow::{anyhow, Context};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

const CHUNKS_EXT: &str = "jsonl";
const ERROR_EXT: &str = "error";
const INSPECT_EXT: &str = "json";

#[derive(Debug, Clone)]
pub struct DirFixtures {
    root: PathBuf,
    inner: MemoryFixtures,
}

impl DirFixtures {
    /// Reads every fixture under `root`.
    #[instrument]
    pub fn load(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(anyhow!(DockMockError::Config(format!(
                "Fixture directory '{}' does not exist or is not a directory",
                root.display()
            ))));
        }

        let mut inner = MemoryFixtures::new(root.display().to_string());
        for entry_result in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry_result {
                Ok(e) => e,
                Err(e) => {
                    warn!("Failed to access entry in '{}': {}", root.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            load_file(&mut inner, path, relative)?;
        }

        info!(
            "Loaded {} fixture(s) from {}",
            inner.entries().len(),
            root.display()
        );
        Ok(Self {
            root: root.to_path_buf(),
            inner,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> Vec<FixtureEntry> {
        self.inner.entries()
    }
}

fn load_file(inner: &mut MemoryFixtures, path: &Path, relative: &Path) -> Result<()> {
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.iter().any(|p| p.starts_with('.')) {
        debug!("Skipping hidden path: {}", path.display());
        return Ok(());
    }
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let Some(tag) = path.file_stem().and_then(|s| s.to_str()) else {
        return Ok(());
    };

    match (parts.first(), parts.get(1).map(String::as_str), extension) {
        (Some(version), Some("pull"), CHUNKS_EXT) if parts.len() >= 4 => {
            let name = parts[2..parts.len() - 1].join("/");
            debug!("Pull fixture {}:{} ({})", name, tag, version);
            inner.add_pull(version, &name, tag, read_script(path)?);
        }
        (Some(version), Some("build"), CHUNKS_EXT) if parts.len() >= 5 => {
            let builder_version = &parts[2];
            let name = parts[3..parts.len() - 1].join("/");
            debug!(
                "Build fixture {}:{} ({}, builder {})",
                name, tag, version, builder_version
            );
            inner.add_build(version, builder_version, &name, tag, read_script(path)?);
        }
        (Some(version), Some("inspect"), INSPECT_EXT) if parts.len() >= 4 => {
            let name = parts[2..parts.len() - 1].join("/");
            debug!("Inspect fixture {}:{} ({})", name, tag, version);
            inner.add_image(version, &name, tag, read_image(path, &name, tag)?);
        }
        (_, _, ERROR_EXT) => {}
        _ => debug!("Ignoring unrecognized fixture file: {}", path.display()),
    }
    Ok(())
}

fn read_script(path: &Path) -> Result<Script> {
    let content = fs::read_to_string(path).map_err(|e| {
        anyhow!(DockMockError::Fixture(format!(
            "Failed to read '{}': {}",
            path.display(),
            e
        )))
    })?;
    let script = Script::new(
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| format!("{}\n", line))
            .collect::<Vec<_>>(),
    );

    let error_path = path.with_extension(ERROR_EXT);
    if error_path.is_file() {
        let message = fs::read_to_string(&error_path)
            .with_context(|| format!("Failed to read '{}'", error_path.display()))?;
        return Ok(script.failing(message.trim()));
    }
    Ok(script)
}

fn read_image(path: &Path, name: &str, tag: &str) -> Result<Image> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    let mut image: Image = serde_json::from_str(&content).map_err(|e| {
        anyhow!(DockMockError::Fixture(format!(
            "Invalid image payload in '{}': {}",
            path.display(),
            e
        )))
    })?;
    if image.repo_tags.is_empty() {
        image.repo_tags.push(format!("{}:{}", name, tag));
    }
    Ok(image)
}

impl FixtureProvider for DirFixtures {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn has_pull(&self, version: &str, name: &str, tag: &str) -> bool {
        self.inner.has_pull(version, name, tag)
    }

    fn pull(&self, version: &str, name: &str, tag: &str) -> ProgressStream {
        self.inner.pull(version, name, tag)
    }

    fn has_build(&self, version: &str, builder_version: &str, name: &str, tag: &str) -> bool {
        self.inner.has_build(version, builder_version, name, tag)
    }

    fn build(&self, version: &str, builder_version: &str, name: &str, tag: &str) -> ProgressStream {
        self.inner.build(version, builder_version, name, tag)
    }

    fn image_inspect(&self, version: &str, name: &str, tag: &str) -> Option<Image> {
        self.inner.image_inspect(version, name, tag)
    }
}
