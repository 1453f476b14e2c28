//! # DockMock Image Entity
//!
//! File: cli/src/mock/images.rs
//! Author: Christi Mahu
//!
//! Images are created only by fixtures (pull/build) and carry little more than
//! identity: `Id`, the ordered `RepoTags`, and opaque `Labels`/`ParentId`
//! metadata copied from the fixture payload.
//!
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Image {
    pub id: String,
    #[serde(default)]
    pub repo_tags: Vec<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub parent_id: String,
}

impl Image {
    pub fn new(id: impl Into<String>, repo_tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            id: id.into(),
            repo_tags: repo_tags.into_iter().map(Into::into).collect(),
            labels: BTreeMap::new(),
            parent_id: String::new(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.repo_tags.iter().any(|t| t == tag)
    }

    /// An image with no tags left. Dangling images are kept, not pruned.
    pub fn is_dangling(&self) -> bool {
        self.repo_tags.is_empty()
    }

    /// Removes `tag` from `RepoTags`, returning whether it was present.
    pub fn untag(&mut self, tag: &str) -> bool {
        let before = self.repo_tags.len();
        self.repo_tags.retain(|t| t != tag);
        before != self.repo_tags.len()
    }
}

/// Splits a `name:tag` reference on its first colon, defaulting the tag to `latest`.
pub fn split_reference(reference: &str) -> (&str, &str) {
    match reference.split_once(':') {
        Some((name, tag)) if !tag.is_empty() => (name, tag),
        Some((name, _)) => (name, "latest"),
        None => (reference, "latest"),
    }
}
