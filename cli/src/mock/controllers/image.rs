//! # Image Controller
//!
//! File: cli/src/mock/controllers/image.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Handlers for `/images/...` and `/build`. Pull and build are the only
//! handlers that defer work: they look up a fixture provider, take a fresh
//! progress stream from it, attach an `end` listener that commits the resulting
//! image, and return the stream as the response body. The dispatch completes
//! with 200 right away; the image appears in the store only once the caller
//! has drained the stream to its `end` event. A stream that errors, or is never
//! drained, commits nothing.
//!
//! The API version used for fixture lookup is the `:version` path segment,
//! `v1` when the request was unversioned.
//!
use super::payloads;
use crate::mock::http::{Request, Response};
use crate::mock::images::split_reference;
use crate::mock::router::{bind, versioned, Router};
use crate::mock::state::{SharedStore, Untagged};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Version assumed for requests without a `/vX.Y` prefix.
pub const DEFAULT_API_VERSION: &str = "v1";

/// Builder version assumed when a build request does not name one.
pub const DEFAULT_BUILDER_VERSION: &str = "1";

/// Image list options the handler understands and ignores.
const LIST_FLAGS: &[&str] = &["all", "digests", "shared-size", "manifests"];

pub struct ImageController {
    store: SharedStore,
}

impl ImageController {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn register(self: &Arc<Self>, router: &mut Router) {
        router
            .get(versioned("/images/json"), bind(self, Self::list))
            .post(versioned("/images/create"), bind(self, Self::pull))
            .post(versioned("/build"), bind(self, Self::build))
            .get(versioned("/images/:tag/json"), bind(self, Self::inspect))
            .delete(versioned("/images/:tag"), bind(self, Self::delete));
    }

    #[instrument(skip_all)]
    async fn list(self: Arc<Self>, req: Request, res: Response) -> Response {
        if has_unsupported_options(&req.body) {
            warn!("Image list options are not supported: {}", req.body);
            return res.status(200).send(json!([]));
        }
        let store = self.store.read();
        let images: Vec<Value> = store.list_images().iter().map(payloads::image_summary).collect();
        res.status(200).send(Value::Array(images))
    }

    #[instrument(skip_all, fields(tag = req.param("tag")))]
    async fn inspect(self: Arc<Self>, req: Request, res: Response) -> Response {
        let tag = req.param("tag");
        let store = self.store.read();
        let image = store.get_image(tag).or_else(|| {
            (!tag.contains(':'))
                .then(|| store.get_image(&format!("{}:latest", tag)))
                .flatten()
        });
        match image {
            Some(image) => res.status(200).send(payloads::image_inspect(image)),
            None => res.status(404).message(format!("Image {} not found", tag)),
        }
    }

    #[instrument(skip_all)]
    async fn pull(self: Arc<Self>, req: Request, res: Response) -> Response {
        let version = api_version(&req);
        let from_image = req.body_str("fromImage").unwrap_or_default();
        let (name, tag) = match req.body_str("tag").filter(|t| !t.is_empty()) {
            Some(tag) => (from_image, tag),
            None => split_reference(from_image),
        };

        let provider = self
            .store
            .read()
            .find_fixture(|f| f.has_pull(&version, name, tag));
        let Some(provider) = provider else {
            warn!("No pull fixture for {}:{} ({})", name, tag, version);
            return res
                .status(404)
                .message(format!("Not image \"{}:{}\" found", name, tag));
        };

        info!("Pulling {}:{} from fixture '{}'", name, tag, provider.name());
        let mut stream = provider.pull(&version, name, tag);
        let store = self.store.clone();
        let (name, tag) = (name.to_string(), tag.to_string());
        stream.on_end(move || match provider.image_inspect(&version, &name, &tag) {
            Some(image) => {
                info!("Pull of {}:{} finished, storing {}", name, tag, image.id);
                store.write().commit_image(image);
            }
            None => warn!("Fixture has no inspect payload for {}:{}", name, tag),
        });
        res.status(200).send(stream)
    }

    #[instrument(skip_all)]
    async fn build(self: Arc<Self>, req: Request, res: Response) -> Response {
        let version = api_version(&req);
        let builder_version = req
            .body_str("version")
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_BUILDER_VERSION)
            .to_string();
        let (name, tag) = split_reference(req.body_str("t").unwrap_or_default());

        let provider = self
            .store
            .read()
            .find_fixture(|f| f.has_build(&version, &builder_version, name, tag));
        let Some(provider) = provider else {
            warn!("No build fixture for {}:{} ({})", name, tag, version);
            return res.status(500).message("Fixture not found");
        };

        info!("Building {}:{} from fixture '{}'", name, tag, provider.name());
        let mut stream = provider.build(&version, &builder_version, name, tag);
        let store = self.store.clone();
        let (name, tag) = (name.to_string(), tag.to_string());
        let reference = format!("{}:{}", name, tag);
        stream
            .on_end(move || {
                let mut store = store.write();
                if let Some(existing) = store.get_image(&reference) {
                    debug!("Build of {} kept existing image {}", reference, existing.id);
                    return;
                }
                match provider.image_inspect(&version, &name, &tag) {
                    Some(image) => {
                        info!("Build of {} finished, storing {}", reference, image.id);
                        store.commit_image(image);
                    }
                    None => warn!("Fixture has no inspect payload for {}", reference),
                }
            })
            .on_error(|err| warn!("Build stream failed: {}", err));
        res.status(200).send(stream)
    }

    #[instrument(skip_all, fields(tag = req.param("tag")))]
    async fn delete(self: Arc<Self>, req: Request, res: Response) -> Response {
        let tag = req.param("tag");
        let outcomes = self.store.write().remove_image_tag(tag);
        if outcomes.is_empty() {
            debug!("Delete of unknown image tag {}", tag);
        }
        let mut items = Vec::new();
        for outcome in outcomes {
            items.push(json!({ "Untagged": tag }));
            match outcome {
                Untagged::Deleted { id } => {
                    info!("Deleted image {} ({})", id, tag);
                    items.push(json!({ "Deleted": id }));
                }
                Untagged::Untagged { id } => info!("Untagged {} from {}", tag, id),
            }
        }
        res.status(200).send(Value::Array(items))
    }
}

fn api_version(req: &Request) -> String {
    match req.param("version") {
        "" => DEFAULT_API_VERSION.to_string(),
        version => version.to_string(),
    }
}

fn has_unsupported_options(body: &Value) -> bool {
    let Value::Object(map) = body else {
        return false;
    };
    map.iter().any(|(key, value)| match key.as_str() {
        "filters" => match value {
            Value::Null => false,
            Value::Object(filters) => !filters.is_empty(),
            Value::String(s) => !s.is_empty() && s != "{}",
            _ => true,
        },
        key => !LIST_FLAGS.contains(&key),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::fixtures::memory::Script;
    use crate::mock::fixtures::MemoryFixtures;
    use crate::mock::http::Method;
    use crate::mock::images::Image;

    fn setup() -> (Router, SharedStore) {
        let store = SharedStore::default();
        store.write().register_fixtures(Arc::new(
            MemoryFixtures::new("test")
                .with_pull("*", "node", "23", [r#"{"status":"Pulling"}"#])
                .with_image("*", "node", "23", Image::new("sha256:node", ["node:23"]))
                .with_pull_script("*", "broken", "1", Script::new(["x"]).failing("boom"))
                .with_image("*", "broken", "1", Image::new("sha256:broken", ["broken:1"]))
                .with_build("v1", "1", "app", "latest", [r#"{"stream":"Step 1/1"}"#])
                .with_image("*", "app", "latest", Image::new("sha256:app", ["app:latest"])),
        ));
        let controller = Arc::new(ImageController::new(store.clone()));
        let mut router = Router::new();
        controller.register(&mut router);
        (router, store)
    }

    #[tokio::test]
    async fn test_pull_commits_only_after_end() {
        let (router, store) = setup();
        let res = router
            .dispatch(Method::Post, "/images/create", json!({"fromImage": "node", "tag": "23"}))
            .await
            .unwrap();
        assert_eq!(res.status, 200);
        assert!(store.read().get_image("node:23").is_none());

        let stream = res.into_stream().unwrap();
        stream.drain().await.unwrap();
        assert_eq!(store.read().get_image("node:23").unwrap().id, "sha256:node");
    }

    #[tokio::test]
    async fn test_pull_reference_in_from_image() {
        let (router, store) = setup();
        let res = router
            .dispatch(Method::Post, "/v1.47/images/create", json!({"fromImage": "node:23", "tag": ""}))
            .await
            .unwrap();
        res.into_stream().unwrap().drain().await.unwrap();
        assert!(store.read().get_image("node:23").is_some());
    }

    #[tokio::test]
    async fn test_pull_unknown_is_404() {
        let (router, _) = setup();
        let res = router
            .dispatch(Method::Post, "/images/create", json!({"fromImage": "not", "tag": "found"}))
            .await
            .unwrap();
        assert_eq!(res.status, 404);
        assert_eq!(res.json().unwrap()["message"], r#"Not image "not:found" found"#);
    }

    #[tokio::test]
    async fn test_failed_pull_commits_nothing() {
        let (router, store) = setup();
        let res = router
            .dispatch(Method::Post, "/images/create", json!({"fromImage": "broken", "tag": "1"}))
            .await
            .unwrap();
        assert!(res.into_stream().unwrap().drain().await.is_err());
        assert!(store.read().list_images().is_empty());
    }

    #[tokio::test]
    async fn test_build_uses_builder_version_and_commits() {
        let (router, store) = setup();
        let missing = router
            .dispatch(Method::Post, "/build", json!({"t": "app", "version": "2"}))
            .await
            .unwrap();
        assert_eq!(missing.status, 500);
        assert_eq!(missing.json().unwrap()["message"], "Fixture not found");

        let res = router
            .dispatch(Method::Post, "/build", json!({"t": "app"}))
            .await
            .unwrap();
        res.into_stream().unwrap().drain().await.unwrap();
        assert_eq!(store.read().get_image("app:latest").unwrap().id, "sha256:app");
    }

    #[tokio::test]
    async fn test_rebuild_keeps_existing_image() {
        let (router, store) = setup();
        store
            .write()
            .add_image(Image::new("sha256:local", ["app:latest"]));
        let res = router
            .dispatch(Method::Post, "/build", json!({"t": "app:latest"}))
            .await
            .unwrap();
        res.into_stream().unwrap().drain().await.unwrap();
        let store = store.read();
        assert_eq!(store.list_images().len(), 1);
        assert_eq!(store.list_images()[0].id, "sha256:local");
    }

    #[tokio::test]
    async fn test_list_with_filters_is_empty() {
        let (router, store) = setup();
        store.write().add_image(Image::new("sha256:1", ["node:23"]));

        let plain = router
            .dispatch(Method::Get, "/images/json", json!({"all": "false"}))
            .await
            .unwrap();
        assert_eq!(plain.json().unwrap().as_array().unwrap().len(), 1);

        let filtered = router
            .dispatch(
                Method::Get,
                "/images/json",
                json!({"filters": {"reference": ["node"]}}),
            )
            .await
            .unwrap();
        assert_eq!(filtered.json(), Some(&json!([])));
    }

    #[tokio::test]
    async fn test_inspect_and_delete() {
        let (router, store) = setup();
        store
            .write()
            .add_image(Image::new("sha256:1", ["node:23", "node:latest"]));

        let found = router
            .dispatch(Method::Get, "/images/node/json", json!({}))
            .await
            .unwrap();
        assert_eq!(found.json().unwrap()["Id"], "sha256:1");

        let res = router
            .dispatch(Method::Delete, "/images/node:23", json!({}))
            .await
            .unwrap();
        assert_eq!(res.json(), Some(&json!([{"Untagged": "node:23"}])));
        let missing = router
            .dispatch(Method::Get, "/images/node:23/json", json!({}))
            .await
            .unwrap();
        assert_eq!(missing.status, 404);
        assert_eq!(missing.json().unwrap()["message"], "Image node:23 not found");
    }

    #[tokio::test]
    async fn test_delete_reaches_every_image_with_the_tag() {
        let (router, store) = setup();
        store.write().commit_image(Image::new("sha256:a", ["app:latest"]));
        store.write().commit_image(Image::new("sha256:b", ["app:latest"]));

        let res = router
            .dispatch(Method::Delete, "/v1.47/images/app:latest", json!({}))
            .await
            .unwrap();
        assert_eq!(res.status, 200);
        assert_eq!(
            res.json(),
            Some(&json!([
                {"Untagged": "app:latest"},
                {"Deleted": "sha256:a"},
                {"Untagged": "app:latest"},
                {"Deleted": "sha256:b"}
            ]))
        );

        let inspect = router
            .dispatch(Method::Get, "/v1.47/images/app:latest/json", json!({}))
            .await
            .unwrap();
        assert_eq!(inspect.status, 404);
        assert!(store.read().list_images().is_empty());
    }
}
