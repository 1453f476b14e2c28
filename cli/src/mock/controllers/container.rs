//! # Container Controller
//!
//! File: cli/src/mock/controllers/container.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Handlers for `/containers/...`. Each handler looks the container up, applies
//! the matching lifecycle transition and maps the outcome to a status code:
//!
//! | Endpoint                  | Success | Failure                                 |
//! |---------------------------|---------|-----------------------------------------|
//! | `GET  /containers/json`   | 200     |                                         |
//! | `POST /containers/create` | 201     |                                         |
//! | `GET  /containers/:id/json` | 200   | 404                                     |
//! | `POST .../start`          | 204     | 304 already started / paused            |
//! | `POST .../stop`           | 200     |                                         |
//! | `POST .../kill`           | 204     | 409 not running                         |
//! | `POST .../pause`          | 204     |                                         |
//! | `POST .../unpause`        | 204     | 304 not paused                          |
//! | `POST .../restart`        | 204     |                                         |
//! | `POST .../rename`         | 204     |                                         |
//! | `POST .../resize`         | 200     |                                         |
//! | `DELETE /containers/:id`  | 200     |                                         |
//!
//! Every `:id` endpoint except delete answers 404 `No such container: <id>`
//! for an unknown id.
//!
use super::payloads;
use crate::common::ids::IdGenerator;
use crate::mock::http::{Request, Response};
use crate::mock::lifecycle::{Container, ContainerStatus, TransitionError};
use crate::mock::router::{bind, versioned, Router};
use crate::mock::state::SharedStore;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub struct ContainerController {
    store: SharedStore,
    ids: Arc<dyn IdGenerator>,
}

impl ContainerController {
    pub fn new(store: SharedStore, ids: Arc<dyn IdGenerator>) -> Self {
        Self { store, ids }
    }

    pub fn register(self: &Arc<Self>, router: &mut Router) {
        router
            .get(versioned("/containers/json"), bind(self, Self::list))
            .post(versioned("/containers/create"), bind(self, Self::create))
            .get(versioned("/containers/:id/json"), bind(self, Self::inspect))
            .post(versioned("/containers/:id/start"), bind(self, Self::start))
            .post(versioned("/containers/:id/stop"), bind(self, Self::stop))
            .post(versioned("/containers/:id/resize"), bind(self, Self::resize))
            .post(versioned("/containers/:id/kill"), bind(self, Self::kill))
            .post(versioned("/containers/:id/restart"), bind(self, Self::restart))
            .post(versioned("/containers/:id/rename"), bind(self, Self::rename))
            .post(versioned("/containers/:id/pause"), bind(self, Self::pause))
            .post(versioned("/containers/:id/unpause"), bind(self, Self::unpause))
            .delete(versioned("/containers/:id"), bind(self, Self::delete));
    }

    #[instrument(skip_all)]
    async fn list(self: Arc<Self>, req: Request, res: Response) -> Response {
        let filter = ListFilter::from_body(&req.body);
        let now = Utc::now();
        let store = self.store.read();
        let summaries: Vec<Value> = store
            .list_containers(|c| filter.accepts(c))
            .into_iter()
            .map(|c| payloads::container_summary(c, now))
            .collect();
        debug!("Listing {} container(s)", summaries.len());
        res.status(200).send(Value::Array(summaries))
    }

    #[instrument(skip_all)]
    async fn create(self: Arc<Self>, req: Request, res: Response) -> Response {
        let id = self.ids.generate();
        let name = req.body_str("name").unwrap_or_default();
        let image = req.body_str("Image").unwrap_or_default();
        info!("Creating container {} ({}) from {}", id, name, image);
        self.store
            .write()
            .add_container(Container::new(id.clone(), name, image));
        res.status(201).send(json!({ "Id": id, "Warnings": [] }))
    }

    #[instrument(skip_all, fields(id = req.param("id")))]
    async fn inspect(self: Arc<Self>, req: Request, res: Response) -> Response {
        let id = req.param("id");
        match self.store.read().get_container(id) {
            Some(container) => res.status(200).send(payloads::container_inspect(container)),
            None => not_found(res, id),
        }
    }

    #[instrument(skip_all, fields(id = req.param("id")))]
    async fn start(self: Arc<Self>, req: Request, res: Response) -> Response {
        let id = req.param("id");
        let mut store = self.store.write();
        let Some(container) = store.get_container_mut(id) else {
            return not_found(res, id);
        };
        match container.start(Utc::now()) {
            Ok(()) => res.status(204).send(json!({})),
            Err(err) => transition_failed(res, err, id),
        }
    }

    #[instrument(skip_all, fields(id = req.param("id")))]
    async fn stop(self: Arc<Self>, req: Request, res: Response) -> Response {
        let id = req.param("id");
        let mut store = self.store.write();
        let Some(container) = store.get_container_mut(id) else {
            return not_found(res, id);
        };
        container.stop(Utc::now());
        res.status(200).send(json!({}))
    }

    #[instrument(skip_all, fields(id = req.param("id")))]
    async fn restart(self: Arc<Self>, req: Request, res: Response) -> Response {
        let id = req.param("id");
        if self.store.read().get_container(id).is_none() {
            return not_found(res, id);
        }
        res.status(204).send(json!({}))
    }

    #[instrument(skip_all, fields(id = req.param("id")))]
    async fn rename(self: Arc<Self>, req: Request, res: Response) -> Response {
        let id = req.param("id");
        let mut store = self.store.write();
        let Some(container) = store.get_container_mut(id) else {
            return not_found(res, id);
        };
        let name = req.body_str("name").unwrap_or_default();
        debug!("Renaming {} -> {}", container.name, name);
        container.rename(name);
        res.status(204).send(json!({}))
    }

    #[instrument(skip_all, fields(id = req.param("id")))]
    async fn resize(self: Arc<Self>, req: Request, res: Response) -> Response {
        let id = req.param("id");
        let mut store = self.store.write();
        let Some(container) = store.get_container_mut(id) else {
            return not_found(res, id);
        };
        let [rows, cols] = container.console_size;
        container.resize(
            req.body_u32("h").unwrap_or(rows),
            req.body_u32("w").unwrap_or(cols),
        );
        res.status(200).send(json!({}))
    }

    #[instrument(skip_all, fields(id = req.param("id")))]
    async fn kill(self: Arc<Self>, req: Request, res: Response) -> Response {
        let id = req.param("id");
        let mut store = self.store.write();
        let Some(container) = store.get_container_mut(id) else {
            return not_found(res, id);
        };
        match container.kill() {
            Ok(()) => res.status(204).send(json!({})),
            Err(err) => transition_failed(res, err, id),
        }
    }

    #[instrument(skip_all, fields(id = req.param("id")))]
    async fn pause(self: Arc<Self>, req: Request, res: Response) -> Response {
        let id = req.param("id");
        let mut store = self.store.write();
        let Some(container) = store.get_container_mut(id) else {
            return not_found(res, id);
        };
        container.pause();
        res.status(204).send(json!({}))
    }

    #[instrument(skip_all, fields(id = req.param("id")))]
    async fn unpause(self: Arc<Self>, req: Request, res: Response) -> Response {
        let id = req.param("id");
        let mut store = self.store.write();
        let Some(container) = store.get_container_mut(id) else {
            return not_found(res, id);
        };
        match container.unpause() {
            Ok(()) => res.status(204).send(json!({})),
            Err(err) => transition_failed(res, err, id),
        }
    }

    /// Removes the container with this id. Unknown ids still answer 200.
    #[instrument(skip_all, fields(id = req.param("id")))]
    async fn delete(self: Arc<Self>, req: Request, res: Response) -> Response {
        let id = req.param("id");
        match self.store.write().remove_container(id) {
            Some(container) => info!("Removed container {} ({})", container.id, container.name),
            None => debug!("Delete of unknown container {}", id),
        }
        res.status(200).send(json!({}))
    }
}

fn not_found(res: Response, id: &str) -> Response {
    res.status(404).message(format!("No such container: {}", id))
}

fn transition_failed(res: Response, err: TransitionError, id: &str) -> Response {
    debug!("Transition refused for {}: {}", id, err);
    match err {
        TransitionError::AlreadyStarted | TransitionError::StartWhilePaused => {
            res.status(304).message(err.to_string())
        }
        TransitionError::NotRunning => res.status(409).message(err.to_string()),
        TransitionError::NotPaused => {
            res.status(304).message(format!("Container {} is not paused", id))
        }
    }
}

/// `all` flag plus `filters.name` / `filters.status` of a list request.
#[derive(Debug, Default, PartialEq, Eq)]
struct ListFilter {
    all: bool,
    names: Vec<String>,
    statuses: Vec<String>,
}

impl ListFilter {
    fn from_body(body: &Value) -> Self {
        let all = match body.get("all") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "1" || s == "true",
            Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            _ => false,
        };
        let filters = body.get("filters");
        Self {
            all,
            names: filter_values(filters.and_then(|f| f.get("name"))),
            statuses: filter_values(filters.and_then(|f| f.get("status"))),
        }
    }

    /// Name and status filters narrow the set on their own; without either,
    /// only running containers are listed unless `all` is set.
    fn accepts(&self, container: &Container) -> bool {
        if !self.names.is_empty() && !self.names.iter().any(|n| container.has_name(n)) {
            return false;
        }
        if !self.statuses.is_empty() {
            return self
                .statuses
                .iter()
                .filter_map(|s| ContainerStatus::parse(s))
                .any(|s| s == container.status());
        }
        self.all || !self.names.is_empty() || container.is_running()
    }
}

/// Accepts `["a", "b"]`, `"a"` and the legacy `{"a": true}` filter forms.
fn filter_values(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Object(map)) => map
            .iter()
            .filter(|(_, v)| v.as_bool().unwrap_or(false))
            .map(|(k, _)| k.clone())
            .collect(),
        _ => Vec::new(),
    }
}
