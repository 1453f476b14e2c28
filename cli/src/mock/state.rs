//! # DockMock Entity Store
//!
//! File: cli/src/mock/state.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! `EntityStore` is the authoritative in-memory collection of containers,
//! images and registered fixture providers. It is plain CRUD: lookups return
//! `Option`, nothing fails, and turning absence into a daemon error is the
//! controllers' job.
//!
//! `SharedStore` is the handle controllers and stream listeners hold. A pull's
//! commit runs after its dispatch has returned, so the store must be reachable
//! from the listener; the handle is a cheap `Arc` clone around a mutex. Callers
//! never hold the lock across an `.await`.
//!
//! ## Usage
//!
//! ```rust
//! use dockmock::mock::lifecycle::Container;
//! use dockmock::mock::state::SharedStore;
//!
//! let store = SharedStore::default();
//! store.write().add_container(Container::new("abc", "web", "node:23"));
//! assert!(store.read().get_container("abc").is_some());
//! store.reset();
//! assert!(store.read().list_containers(|_| true).is_empty());
//! ```
//!
use super::fixtures::FixtureProvider;
use super::images::Image;
use super::lifecycle::Container;
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Effect of removing a tag on one stored image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Untagged {
    /// The image held only this tag and was removed.
    Deleted { id: String },
    /// The tag was stripped from an image that keeps other tags.
    Untagged { id: String },
}

#[derive(Default)]
pub struct EntityStore {
    containers: Vec<Container>,
    images: Vec<Image>,
    fixtures: Vec<Arc<dyn FixtureProvider>>,
}

impl EntityStore {
    pub fn add_container(&mut self, container: Container) {
        debug!("Storing container {} ({})", container.id, container.name);
        self.containers.push(container);
    }

    pub fn get_container(&self, id: &str) -> Option<&Container> {
        self.containers.iter().find(|c| c.id == id)
    }

    pub fn get_container_mut(&mut self, id: &str) -> Option<&mut Container> {
        self.containers.iter_mut().find(|c| c.id == id)
    }

    pub fn remove_container(&mut self, id: &str) -> Option<Container> {
        let index = self.containers.iter().position(|c| c.id == id)?;
        Some(self.containers.remove(index))
    }

    /// Containers satisfying `predicate`, in insertion order.
    pub fn list_containers<P>(&self, predicate: P) -> Vec<&Container>
    where
        P: Fn(&Container) -> bool,
    {
        self.containers.iter().filter(|c| predicate(c)).collect()
    }

    /// Appends an image. Tags already held by another image are not reconciled.
    pub fn add_image(&mut self, image: Image) {
        debug!("Storing image {} {:?}", image.id, image.repo_tags);
        self.images.push(image);
    }

    /// Stores the result of a finished pull or build. An image already stored
    /// under the same `Id` gains the new tags instead of being duplicated.
    pub fn commit_image(&mut self, image: Image) {
        match self.images.iter_mut().find(|i| i.id == image.id) {
            Some(existing) => {
                for tag in image.repo_tags {
                    if !existing.has_tag(&tag) {
                        existing.repo_tags.push(tag);
                    }
                }
                debug!("Updated image {} {:?}", existing.id, existing.repo_tags);
            }
            None => self.add_image(image),
        }
    }

    /// First image whose `RepoTags` contains `tag`.
    pub fn get_image(&self, tag: &str) -> Option<&Image> {
        self.images.iter().find(|image| image.has_tag(tag))
    }

    pub fn list_images(&self) -> &[Image] {
        &self.images
    }

    /// Removes `tag` from every image carrying it. Images whose only tag it
    /// was are deleted; images left with other tags stay. Empty when no image
    /// had the tag.
    pub fn remove_image_tag(&mut self, tag: &str) -> Vec<Untagged> {
        let mut outcomes = Vec::new();
        self.images.retain_mut(|image| {
            if !image.has_tag(tag) {
                return true;
            }
            if image.repo_tags.len() == 1 {
                outcomes.push(Untagged::Deleted {
                    id: image.id.clone(),
                });
                return false;
            }
            image.untag(tag);
            outcomes.push(Untagged::Untagged {
                id: image.id.clone(),
            });
            true
        });
        outcomes
    }

    pub fn register_fixtures(&mut self, provider: Arc<dyn FixtureProvider>) {
        debug!("Registering fixture provider '{}'", provider.name());
        self.fixtures.push(provider);
    }

    pub fn fixtures(&self) -> &[Arc<dyn FixtureProvider>] {
        &self.fixtures
    }

    /// First registered provider accepting `accepts`.
    pub fn find_fixture<P>(&self, accepts: P) -> Option<Arc<dyn FixtureProvider>>
    where
        P: Fn(&dyn FixtureProvider) -> bool,
    {
        self.fixtures
            .iter()
            .find(|provider| accepts(Arc::as_ref(provider)))
            .cloned()
    }

    /// Clears containers, images and fixture registrations.
    pub fn reset(&mut self) {
        self.containers.clear();
        self.images.clear();
        self.fixtures.clear();
    }
}

impl fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStore")
            .field("containers", &self.containers)
            .field("images", &self.images)
            .field(
                "fixtures",
                &self.fixtures.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Cloneable handle to one `EntityStore`.
#[derive(Clone, Default, Debug)]
pub struct SharedStore {
    inner: Arc<Mutex<EntityStore>>,
}

impl SharedStore {
    pub fn new(store: EntityStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn read(&self) -> MutexGuard<'_, EntityStore> {
        self.inner.lock()
    }

    pub fn write(&self) -> MutexGuard<'_, EntityStore> {
        self.inner.lock()
    }

    /// Clears everything under a single lock acquisition.
    pub fn reset(&self) {
        self.inner.lock().reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::fixtures::MemoryFixtures;
    use crate::mock::lifecycle::ContainerStatus;

    fn store_with_containers() -> EntityStore {
        let mut store = EntityStore::default();
        store.add_container(Container::new("a", "web", "node:23"));
        store.add_container(Container::new("b", "db", "node:23"));
        store
    }

    #[test]
    fn test_container_crud() {
        let mut store = store_with_containers();
        assert_eq!(store.get_container("a").map(|c| c.name.as_str()), Some("web"));
        assert!(store.get_container("zzz").is_none());

        store.get_container_mut("b").unwrap().rename("cache");
        assert_eq!(store.get_container("b").unwrap().name, "cache");

        let removed = store.remove_container("a").unwrap();
        assert_eq!(removed.id, "a");
        assert!(store.get_container("a").is_none());
        assert!(store.remove_container("a").is_none());
        assert_eq!(store.list_containers(|_| true).len(), 1);
    }

    #[test]
    fn test_list_containers_predicate() {
        let mut store = store_with_containers();
        store
            .get_container_mut("a")
            .unwrap()
            .start(chrono::Utc::now())
            .unwrap();
        let running = store.list_containers(|c| c.is_running());
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].id, "a");
        let created = store.list_containers(|c| c.status() == ContainerStatus::Created);
        assert_eq!(created[0].id, "b");
    }

    #[test]
    fn test_get_image_by_tag_membership() {
        let mut store = EntityStore::default();
        store.add_image(Image::new("sha256:1", ["node:23", "node:latest"]));
        assert_eq!(store.get_image("node:latest").unwrap().id, "sha256:1");
        assert!(store.get_image("node").is_none());
    }

    #[test]
    fn test_remove_only_tag_deletes_image() {
        let mut store = EntityStore::default();
        store.add_image(Image::new("sha256:1", ["node:23"]));
        assert_eq!(
            store.remove_image_tag("node:23"),
            vec![Untagged::Deleted {
                id: "sha256:1".into()
            }]
        );
        assert!(store.list_images().is_empty());
    }

    #[test]
    fn test_remove_one_of_many_tags_keeps_image() {
        let mut store = EntityStore::default();
        store.add_image(Image::new("sha256:1", ["node:23", "node:latest"]));
        assert_eq!(
            store.remove_image_tag("node:23"),
            vec![Untagged::Untagged {
                id: "sha256:1".into()
            }]
        );
        assert_eq!(store.list_images()[0].repo_tags, vec!["node:latest".to_string()]);
        assert!(store.remove_image_tag("missing:1").is_empty());
    }

    #[test]
    fn test_remove_tag_shared_by_several_images() {
        let mut store = EntityStore::default();
        store.add_image(Image::new("sha256:a", ["app:latest"]));
        store.add_image(Image::new("sha256:b", ["app:latest"]));
        store.add_image(Image::new("sha256:c", ["app:latest", "app:1"]));

        assert_eq!(
            store.remove_image_tag("app:latest"),
            vec![
                Untagged::Deleted {
                    id: "sha256:a".into()
                },
                Untagged::Deleted {
                    id: "sha256:b".into()
                },
                Untagged::Untagged {
                    id: "sha256:c".into()
                },
            ]
        );
        assert!(store.get_image("app:latest").is_none());
        assert_eq!(store.list_images().len(), 1);
        assert_eq!(store.list_images()[0].repo_tags, vec!["app:1".to_string()]);
    }

    #[test]
    fn test_commit_image_merges_by_id() {
        let mut store = EntityStore::default();
        store.commit_image(Image::new("sha256:1", ["node:23"]));
        store.commit_image(Image::new("sha256:1", ["node:23", "node:latest"]));
        store.commit_image(Image::new("sha256:2", ["redis:7"]));
        assert_eq!(store.list_images().len(), 2);
        assert_eq!(
            store.list_images()[0].repo_tags,
            vec!["node:23".to_string(), "node:latest".to_string()]
        );
    }

    #[test]
    fn test_reset_clears_everything() {
        let shared = SharedStore::new(store_with_containers());
        shared.write().add_image(Image::new("sha256:1", ["node:23"]));
        shared
            .write()
            .register_fixtures(Arc::new(MemoryFixtures::new("test")));
        shared.reset();
        let store = shared.read();
        assert!(store.list_containers(|_| true).is_empty());
        assert!(store.list_images().is_empty());
        assert!(store.fixtures().is_empty());
    }

    #[test]
    fn test_shared_handles_see_same_store() {
        let a = SharedStore::default();
        let b = a.clone();
        a.write().add_container(Container::new("x", "n", "i"));
        assert!(b.read().get_container("x").is_some());
    }
}
