//! # DockMock Fixture Providers
//!
//! File: cli/src/mock/fixtures/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! A fixture provider supplies the canned outcomes of long-running image
//! operations: the progress chunks a pull or build streams back, and the image
//! that a finished pull or build resolves to. The engine never invents images;
//! everything that lands in the image store comes from a provider.
//!
//! Providers are consulted in registration order and the first one whose
//! predicate accepts wins.
//!
//! ## Architecture
//!
//! - `FixtureProvider`: the trait the image controller consumes.
//! - `MemoryFixtures` (`memory.rs`): tables built in code, for unit tests.
//! - `DirFixtures` (`dir.rs`): the same tables loaded from a directory tree,
//!   for the `serve` command and file-based test suites.
//!
//! Both match the API version `*` against any requested version.
//!
use super::images::Image;
use super::stream::ProgressStream;

pub mod dir;
pub mod memory;

pub use dir::DirFixtures;
pub use memory::MemoryFixtures;

/// Version (or builder version) key that matches any requested value.
pub const ANY_VERSION: &str = "*";

/// Supplier of pull/build streams and inspect payloads.
pub trait FixtureProvider: Send + Sync {
    /// Label used in logs and listings.
    fn name(&self) -> &str;

    fn has_pull(&self, version: &str, name: &str, tag: &str) -> bool;

    /// A fresh progress stream for a pull. Only called after `has_pull`.
    fn pull(&self, version: &str, name: &str, tag: &str) -> ProgressStream;

    fn has_build(&self, version: &str, builder_version: &str, name: &str, tag: &str) -> bool;

    /// A fresh progress stream for a build. Only called after `has_build`.
    fn build(&self, version: &str, builder_version: &str, name: &str, tag: &str) -> ProgressStream;

    /// The image a finished pull or build of `name:tag` resolves to.
    fn image_inspect(&self, version: &str, name: &str, tag: &str) -> Option<Image>;
}

/// Kind of a listed fixture entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FixtureKind {
    Pull,
    Build,
    Inspect,
}

impl std::fmt::Display for FixtureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            FixtureKind::Pull => "pull",
            FixtureKind::Build => "build",
            FixtureKind::Inspect => "inspect",
        })
    }
}

/// One registered fixture, as reported by `dockmock fixtures`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FixtureEntry {
    pub kind: FixtureKind,
    pub version: String,
    pub builder_version: Option<String>,
    pub name: String,
    pub tag: String,
    pub chunks: usize,
    pub fails: bool,
}

impl std::fmt::Display for FixtureEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:<8} {:<8} ", self.kind, self.version)?;
        match &self.builder_version {
            Some(builder) => write!(f, "{:<4} ", builder)?,
            None => write!(f, "{:<4} ", "-")?,
        }
        write!(f, "{}:{}", self.name, self.tag)?;
        if self.kind != FixtureKind::Inspect {
            write!(f, " ({} chunks", self.chunks)?;
            if self.fails {
                write!(f, ", fails")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

pub(crate) fn version_matches(key: &str, requested: &str) -> bool {
    key == ANY_VERSION || key == requested
}
