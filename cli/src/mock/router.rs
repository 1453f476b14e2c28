//! # DockMock Request Router
//!
//! File: cli/src/mock/router.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Maps `(method, path, body)` to a registered handler. A route is one method
//! plus a set of path templates; each template is compiled once, at
//! registration, into a sequence of literal and placeholder segments
//! (`/containers/:id/start`). Placeholders match any single segment and are
//! captured by name into `Request::params`.
//!
//! ## Architecture
//!
//! - Routes are tried in registration order; the first route whose method
//!   matches and whose template matches segment by segment wins.
//! - `versioned` expands one path into the unversioned and `/:version/...`
//!   forms so every endpoint accepts an optional API-version prefix.
//! - A handler is any `Fn(Request, Response) -> impl Future<Output = Response>`;
//!   `bind` adapts `async fn(self: Arc<Self>, Request, Response)` controller
//!   methods.
//! - A path with no matching route is a wiring bug and is reported as
//!   `DockMockError::RouteNotFound`, never as a response.
//!
//! ## Examples
//!
//! ```rust
//! use dockmock::mock::http::{Method, Response};
//! use dockmock::mock::router::{versioned, Router};
//! use serde_json::json;
//!
//! # async fn run() -> dockmock::core::error::Result<()> {
//! let mut router = Router::new();
//! router.get(versioned("/containers/:id/json"), |req, res: Response| async move {
//!     let id = req.param("id").to_string();
//!     res.send(json!({ "Id": id }))
//! });
//!
//! let res = router.dispatch(Method::Get, "/v1.47/containers/abc/json", json!({})).await?;
//! assert_eq!(res.json(), Some(&json!({ "Id": "abc" })));
//! # Ok(())
//! # }
//! ```
//!
use super::http::{Method, Request, Response};
use crate::core::error::{DockMockError, Result};
use anyhow::anyhow;
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

type Handler = Box<dyn Fn(Request, Response) -> BoxFuture<'static, Response> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Compiles `/a/:b/c`. Empty segments (leading, trailing or doubled `/`)
    /// are ignored.
    pub fn parse(template: &str) -> Self {
        let segments = split_path(template)
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(segment.to_string()),
            })
            .collect();
        Self {
            source: template.to_string(),
            segments,
        }
    }

    /// Captured placeholders when `path` matches, `None` otherwise.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let parts: Vec<&str> = split_path(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(params)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    let path = path.split_once('?').map_or(path, |(p, _)| p);
    path.split('/').filter(|s| !s.is_empty())
}

/// Both the bare and the API-version-prefixed form of `path`.
pub fn versioned(path: &str) -> [String; 2] {
    [path.to_string(), format!("/:version{}", path)]
}

/// Adapts a controller method taking `Arc<Self>` into a route handler.
pub fn bind<C, F, Fut>(
    target: &Arc<C>,
    method: F,
) -> impl Fn(Request, Response) -> Fut + Send + Sync + 'static
where
    C: Send + Sync + 'static,
    F: Fn(Arc<C>, Request, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    let target = Arc::clone(target);
    move |req, res| method(Arc::clone(&target), req, res)
}

struct Route {
    method: Method,
    templates: Vec<PathTemplate>,
    handler: Handler,
}

#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `method` on every template in `templates`.
    pub fn route<T, S, F, Fut>(&mut self, method: Method, templates: T, handler: F) -> &mut Self
    where
        T: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(Request, Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let templates: Vec<PathTemplate> = templates
            .into_iter()
            .map(|t| PathTemplate::parse(t.as_ref()))
            .collect();
        debug!(
            "Registering {} {:?}",
            method,
            templates.iter().map(PathTemplate::as_str).collect::<Vec<_>>()
        );
        self.routes.push(Route {
            method,
            templates,
            handler: Box::new(move |req, res| Box::pin(handler(req, res))),
        });
        self
    }

    pub fn get<T, S, F, Fut>(&mut self, templates: T, handler: F) -> &mut Self
    where
        T: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(Request, Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Get, templates, handler)
    }

    pub fn post<T, S, F, Fut>(&mut self, templates: T, handler: F) -> &mut Self
    where
        T: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(Request, Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Post, templates, handler)
    }

    pub fn delete<T, S, F, Fut>(&mut self, templates: T, handler: F) -> &mut Self
    where
        T: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(Request, Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Delete, templates, handler)
    }

    /// Runs the first matching handler and returns its response.
    #[instrument(level = "debug", skip(self, body))]
    pub async fn dispatch(&self, method: Method, path: &str, body: Value) -> Result<Response> {
        for route in self.routes.iter().filter(|r| r.method == method) {
            let Some((template, params)) = route
                .templates
                .iter()
                .find_map(|t| t.matches(path).map(|params| (t, params)))
            else {
                continue;
            };
            debug!("Matched template {}", template.as_str());
            let mut req = Request::new(method, path, body);
            req.params = params;
            let res = (route.handler)(req, Response::new()).await;
            debug!("Handler answered {}", res.status);
            return Ok(res);
        }
        warn!("No route for {} {}", method, path);
        Err(anyhow!(DockMockError::RouteNotFound {
            method: method.to_string(),
            path: path.to_string(),
        }))
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for route in &self.routes {
            for template in &route.templates {
                list.entry(&format!("{} {}", route.method, template.as_str()));
            }
        }
        list.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo_router() -> Router {
        let mut router = Router::new();
        router
            .get(versioned("/containers/json"), |_req, res: Response| async move {
                res.send(json!("list"))
            })
            .post(versioned("/containers/:id/start"), |req, res: Response| async move {
                let id = req.param("id").to_string();
                res.status(204).send(json!({ "id": id }))
            })
            .get(versioned("/containers/:id/json"), |req, res: Response| async move {
                let version = req.param("version").to_string();
                res.send(json!({ "version": version }))
            });
        router
    }

    #[test]
    fn test_template_matching() {
        let template = PathTemplate::parse("/containers/:id/start");
        let params = template.matches("/containers/abc/start").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("abc"));
        assert!(template.matches("/containers/abc/stop").is_none());
        assert!(template.matches("/containers/abc").is_none());
        assert!(template.matches("/containers/abc/start/extra").is_none());
        assert!(template.matches("/containers//abc/start/").is_some());
    }

    #[test]
    fn test_versioned_expands_both_forms() {
        assert_eq!(
            versioned("/images/json"),
            ["/images/json".to_string(), "/:version/images/json".to_string()]
        );
    }

    #[tokio::test]
    async fn test_dispatch_with_and_without_version() {
        let router = echo_router();
        let bare = router
            .dispatch(Method::Post, "/containers/c1/start", json!({}))
            .await
            .unwrap();
        assert_eq!(bare.status, 204);
        assert_eq!(bare.json(), Some(&json!({"id": "c1"})));

        let prefixed = router
            .dispatch(Method::Get, "/v1.47/containers/c1/json", json!({}))
            .await
            .unwrap();
        assert_eq!(prefixed.json(), Some(&json!({"version": "v1.47"})));
    }

    #[tokio::test]
    async fn test_first_registered_route_wins() {
        let mut router = Router::new();
        router
            .get(["/containers/:id/json"], |_r, res: Response| async move {
                res.send(json!("param"))
            })
            .get(["/containers/json/json"], |_r, res: Response| async move {
                res.send(json!("literal"))
            });
        let res = router
            .dispatch(Method::Get, "/containers/json/json", json!({}))
            .await
            .unwrap();
        assert_eq!(res.json(), Some(&json!("param")));
    }

    #[tokio::test]
    async fn test_method_must_match() {
        let router = echo_router();
        let err = router
            .dispatch(Method::Delete, "/containers/json", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DockMockError>(),
            Some(DockMockError::RouteNotFound { method, .. }) if method == "DELETE"
        ));
    }

    #[tokio::test]
    async fn test_unknown_path_is_route_not_found() {
        let router = echo_router();
        let err = router
            .dispatch(Method::Get, "/networks", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No route for GET /networks");
    }

    #[tokio::test]
    async fn test_bind_passes_shared_target() {
        struct Greeter {
            greeting: String,
        }
        impl Greeter {
            async fn greet(self: Arc<Self>, req: Request, res: Response) -> Response {
                res.send(json!(format!("{} {}", self.greeting, req.param("name"))))
            }
        }
        let greeter = Arc::new(Greeter {
            greeting: "hello".into(),
        });
        let mut router = Router::new();
        router.get(["/greet/:name"], bind(&greeter, Greeter::greet));
        let res = router
            .dispatch(Method::Get, "/greet/bob", json!({}))
            .await
            .unwrap();
        assert_eq!(res.json(), Some(&json!("hello bob")));
    }
}
