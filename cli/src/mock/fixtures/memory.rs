//! # In-Memory Fixtures
//!
//! File: cli/src/mock/fixtures/memory.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! `MemoryFixtures` keeps pull scripts, build scripts and inspect images in
//! plain tables. A script is an ordered list of chunks plus an optional error
//! text; each `pull`/`build` call replays the script into a new stream, ending
//! with `end` or, when the error text is set, with `error`.
//!
//! ## Examples
//!
//! ```rust
//! use dockmock::mock::fixtures::{FixtureProvider, MemoryFixtures};
//! use dockmock::mock::images::Image;
//!
//! let fixtures = MemoryFixtures::new("node")
//!     .with_pull("*", "node", "23", [r#"{"status":"Pulling from library/node"}"#])
//!     .with_image("*", "node", "23", Image::new("sha256:abc", ["node:23"]));
//!
//! assert!(fixtures.has_pull("v1.47", "node", "23"));
//! assert!(!fixtures.has_pull("v1.47", "node", "22"));
//! ```
//!
use super::{version_matches, FixtureEntry, FixtureKind, FixtureProvider};
use crate::mock::images::Image;
use crate::mock::stream::ProgressStream;
use bytes::Bytes;
use tracing::debug;

/// Replayable chunk sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    pub chunks: Vec<Bytes>,
    pub error: Option<String>,
}

impl Script {
    pub fn new<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Bytes>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            error: None,
        }
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    fn play(&self) -> ProgressStream {
        match &self.error {
            Some(message) => ProgressStream::failing(self.chunks.iter().cloned(), message.clone()),
            None => ProgressStream::from_chunks(self.chunks.iter().cloned()),
        }
    }
}

#[derive(Debug, Clone)]
struct PullFixture {
    version: String,
    name: String,
    tag: String,
    script: Script,
}

#[derive(Debug, Clone)]
struct BuildFixture {
    version: String,
    builder_version: String,
    name: String,
    tag: String,
    script: Script,
}

#[derive(Debug, Clone)]
struct InspectFixture {
    version: String,
    name: String,
    tag: String,
    image: Image,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryFixtures {
    name: String,
    pulls: Vec<PullFixture>,
    builds: Vec<BuildFixture>,
    images: Vec<InspectFixture>,
}

impl MemoryFixtures {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_pull<I, C>(self, version: &str, name: &str, tag: &str, chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Bytes>,
    {
        self.with_pull_script(version, name, tag, Script::new(chunks))
    }

    pub fn with_pull_script(mut self, version: &str, name: &str, tag: &str, script: Script) -> Self {
        self.add_pull(version, name, tag, script);
        self
    }

    pub fn with_build<I, C>(
        self,
        version: &str,
        builder_version: &str,
        name: &str,
        tag: &str,
        chunks: I,
    ) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Bytes>,
    {
        self.with_build_script(version, builder_version, name, tag, Script::new(chunks))
    }

    pub fn with_build_script(
        mut self,
        version: &str,
        builder_version: &str,
        name: &str,
        tag: &str,
        script: Script,
    ) -> Self {
        self.add_build(version, builder_version, name, tag, script);
        self
    }

    pub fn with_image(mut self, version: &str, name: &str, tag: &str, image: Image) -> Self {
        self.add_image(version, name, tag, image);
        self
    }

    pub fn add_pull(&mut self, version: &str, name: &str, tag: &str, script: Script) {
        self.pulls.push(PullFixture {
            version: version.to_string(),
            name: name.to_string(),
            tag: tag.to_string(),
            script,
        });
    }

    pub fn add_build(
        &mut self,
        version: &str,
        builder_version: &str,
        name: &str,
        tag: &str,
        script: Script,
    ) {
        self.builds.push(BuildFixture {
            version: version.to_string(),
            builder_version: builder_version.to_string(),
            name: name.to_string(),
            tag: tag.to_string(),
            script,
        });
    }

    pub fn add_image(&mut self, version: &str, name: &str, tag: &str, image: Image) {
        self.images.push(InspectFixture {
            version: version.to_string(),
            name: name.to_string(),
            tag: tag.to_string(),
            image,
        });
    }

    /// Every registered fixture, sorted for display.
    pub fn entries(&self) -> Vec<FixtureEntry> {
        let pulls = self.pulls.iter().map(|p| FixtureEntry {
            kind: FixtureKind::Pull,
            version: p.version.clone(),
            builder_version: None,
            name: p.name.clone(),
            tag: p.tag.clone(),
            chunks: p.script.chunks.len(),
            fails: p.script.error.is_some(),
        });
        let builds = self.builds.iter().map(|b| FixtureEntry {
            kind: FixtureKind::Build,
            version: b.version.clone(),
            builder_version: Some(b.builder_version.clone()),
            name: b.name.clone(),
            tag: b.tag.clone(),
            chunks: b.script.chunks.len(),
            fails: b.script.error.is_some(),
        });
        let images = self.images.iter().map(|i| FixtureEntry {
            kind: FixtureKind::Inspect,
            version: i.version.clone(),
            builder_version: None,
            name: i.name.clone(),
            tag: i.tag.clone(),
            chunks: 0,
            fails: false,
        });
        let mut entries: Vec<FixtureEntry> = pulls.chain(builds).chain(images).collect();
        entries.sort();
        entries
    }

    pub fn is_empty(&self) -> bool {
        self.pulls.is_empty() && self.builds.is_empty() && self.images.is_empty()
    }

    fn find_pull(&self, version: &str, name: &str, tag: &str) -> Option<&PullFixture> {
        self.pulls
            .iter()
            .find(|p| version_matches(&p.version, version) && p.name == name && p.tag == tag)
    }

    fn find_build(
        &self,
        version: &str,
        builder_version: &str,
        name: &str,
        tag: &str,
    ) -> Option<&BuildFixture> {
        self.builds.iter().find(|b| {
            version_matches(&b.version, version)
                && version_matches(&b.builder_version, builder_version)
                && b.name == name
                && b.tag == tag
        })
    }
}

impl FixtureProvider for MemoryFixtures {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_pull(&self, version: &str, name: &str, tag: &str) -> bool {
        self.find_pull(version, name, tag).is_some()
    }

    fn pull(&self, version: &str, name: &str, tag: &str) -> ProgressStream {
        debug!("[{}] replaying pull {}:{} ({})", self.name, name, tag, version);
        match self.find_pull(version, name, tag) {
            Some(fixture) => fixture.script.play(),
            None => ProgressStream::failing(Vec::<Bytes>::new(), format!("no pull fixture for {}:{}", name, tag)),
        }
    }

    fn has_build(&self, version: &str, builder_version: &str, name: &str, tag: &str) -> bool {
        self.find_build(version, builder_version, name, tag).is_some()
    }

    fn build(&self, version: &str, builder_version: &str, name: &str, tag: &str) -> ProgressStream {
        debug!(
            "[{}] replaying build {}:{} ({}, builder {})",
            self.name, name, tag, version, builder_version
        );
        match self.find_build(version, builder_version, name, tag) {
            Some(fixture) => fixture.script.play(),
            None => ProgressStream::failing(Vec::<Bytes>::new(), format!("no build fixture for {}:{}", name, tag)),
        }
    }

    fn image_inspect(&self, version: &str, name: &str, tag: &str) -> Option<Image> {
        self.images
            .iter()
            .find(|i| version_matches(&i.version, version) && i.name == name && i.tag == tag)
            .map(|i| i.image.clone())
    }
}
