//! # DockMock Engine
//!
//! File: cli/src/mock/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! An in-process stand-in for the Docker Engine API. `DockerMock` wires a
//! `Router` to the container, image and session controllers over one shared
//! `EntityStore`, and answers `(method, path, body)` calls with a status code
//! and a body, exactly as a client library would see them from a daemon.
//!
//! ## Architecture
//!
//! - `router.rs` / `http.rs`: path templates, dispatch, request/response types.
//! - `state.rs`: the entity store and its shared handle.
//! - `lifecycle.rs` / `images.rs`: the container state machine and image entity.
//! - `stream.rs`: the progress stream returned by pull and build.
//! - `fixtures/`: where pull/build outcomes come from.
//! - `controllers/`: the request handlers.
//! - `modem.rs`: the adapter that applies a client's status-code allow-list.
//!
//! Each `DockerMock` owns its own store, so independent tests never see each
//! other's containers. Clones share the same store.
//!
//! ## Examples
//!
//! ```rust
//! use dockmock::mock::http::Method;
//! use dockmock::mock::DockerMock;
//! use serde_json::json;
//!
//! # async fn run() -> dockmock::core::error::Result<()> {
//! let mock = DockerMock::new();
//! let res = mock
//!     .dispatch(Method::Post, "/v1.47/containers/create", json!({"name": "web", "Image": "node:23"}))
//!     .await?;
//! assert_eq!(res.status, 201);
//! assert_eq!(mock.store().read().list_containers(|_| true).len(), 1);
//! # Ok(())
//! # }
//! ```
//!
pub mod controllers;
pub mod fixtures;
pub mod http;
pub mod images;
pub mod lifecycle;
pub mod modem;
pub mod router;
pub mod state;
pub mod stream;

use crate::common::ids::{IdGenerator, RandomIds};
use crate::core::error::Result;
use controllers::{ContainerController, ImageController, SessionController};
use fixtures::FixtureProvider;
use http::{Method, Response};
use router::Router;
use serde_json::Value;
use state::SharedStore;
use std::sync::Arc;
use tracing::info;

/// The assembled engine: router, controllers and store.
#[derive(Clone, Debug)]
pub struct DockerMock {
    router: Arc<Router>,
    store: SharedStore,
}

impl Default for DockerMock {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerMock {
    /// An empty engine issuing daemon-style random ids.
    pub fn new() -> Self {
        Self::with_ids(Arc::new(RandomIds::default()))
    }

    /// An empty engine drawing container ids from `ids`.
    pub fn with_ids(ids: Arc<dyn IdGenerator>) -> Self {
        let store = SharedStore::default();
        let mut router = Router::new();

        Arc::new(SessionController).register(&mut router);
        Arc::new(ContainerController::new(store.clone(), ids)).register(&mut router);
        Arc::new(ImageController::new(store.clone())).register(&mut router);

        Self {
            router: Arc::new(router),
            store,
        }
    }

    /// Builder form of `register_fixtures`.
    pub fn with_fixtures(self, provider: impl FixtureProvider + 'static) -> Self {
        self.register_fixtures(Arc::new(provider));
        self
    }

    pub fn register_fixtures(&self, provider: Arc<dyn FixtureProvider>) {
        info!("Registered fixtures '{}'", provider.name());
        self.store.write().register_fixtures(provider);
    }

    /// Routes one request. Fails only when no route matches.
    pub async fn dispatch(&self, method: Method, path: &str, body: Value) -> Result<Response> {
        self.router.dispatch(method, path, body).await
    }

    /// Drops every container, image and fixture registration.
    pub fn reset(&self) {
        self.store.reset();
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ids::SequentialIds;
    use crate::mock::fixtures::MemoryFixtures;
    use serde_json::json;

    #[tokio::test]
    async fn test_instances_are_isolated() {
        let a = DockerMock::new();
        let b = DockerMock::new();
        a.dispatch(Method::Post, "/containers/create", json!({"name": "x"}))
            .await
            .unwrap();
        assert_eq!(a.store().read().list_containers(|_| true).len(), 1);
        assert!(b.store().read().list_containers(|_| true).is_empty());
    }

    #[tokio::test]
    async fn test_reset_clears_fixtures_too() {
        let mock = DockerMock::with_ids(Arc::new(SequentialIds::default())).with_fixtures(
            MemoryFixtures::new("f").with_pull("*", "node", "23", ["{}"]),
        );
        mock.dispatch(Method::Post, "/containers/create", json!({"name": "x"}))
            .await
            .unwrap();
        mock.reset();
        assert!(mock.store().read().fixtures().is_empty());
        let res = mock
            .dispatch(Method::Post, "/images/create", json!({"fromImage": "node", "tag": "23"}))
            .await
            .unwrap();
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn test_session_route_is_registered() {
        let mock = DockerMock::new();
        let res = mock.dispatch(Method::Post, "/session", json!({})).await.unwrap();
        assert_eq!(res.status, 200);
    }
}
