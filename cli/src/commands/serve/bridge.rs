//! # DockMock HTTP Bridge
//!
//! File: cli/src/commands/serve/bridge.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Exposes a `DockerMock` over TCP so out-of-process clients (`bollard`, the
//! `docker` CLI with `DOCKER_HOST=tcp://...`) can drive it. Every request goes
//! through a single fallback handler that normalizes it into the engine's
//! `(method, path, body)` shape:
//!
//! - query parameters become body fields (`filters` is JSON-decoded),
//! - a JSON request body is merged on top,
//! - any other body (a build context tarball) is read to the end and dropped,
//! - unversioned paths get `/<api_version>` when one is configured.
//!
//! Responses map back one to one. Progress streams are forwarded chunk by
//! chunk, so a pull's image is committed as the bridge reads the stream's
//! final event; a stream error aborts the HTTP body. Session bodies become an
//! empty 200, and a path no route knows answers 404 `page not found`.
//!
//! ## Architecture
//!
//! - `bind_listener`: first free port from the configured one upwards.
//! - `create_app`: the axum `Router` with tracing middleware.
//! - `spawn`: runs the bridge in a background task (used by tests).
//! - `run_server`: the foreground server behind `dockmock serve`.
//!
use super::config::ServeConfig;
use crate::core::error::{DockMockError, Result};
use crate::mock::fixtures::DirFixtures;
use crate::mock::http::{Body as MockBody, Method as MockMethod, Response as MockResponse};
use crate::mock::DockerMock;
use anyhow::{anyhow, Context};
use axum::body::{to_bytes, Body};
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{debug, error, info, warn, Level};

/// Ports tried after the configured one before giving up.
const MAX_PORT_ATTEMPTS: u16 = 10;

#[derive(Clone)]
struct BridgeState {
    mock: DockerMock,
    api_version: Option<Arc<str>>,
}

/// Builds the axum application serving `mock`.
pub fn create_app(mock: DockerMock, api_version: Option<String>) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::default())
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .fallback(handle)
        .with_state(BridgeState {
            mock,
            api_version: api_version.map(Arc::from),
        })
        .layer(ServiceBuilder::new().layer(trace_layer))
}

async fn handle(
    State(state): State<BridgeState>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let Ok(method) = method.as_str().parse::<MockMethod>() else {
        warn!("Rejecting {} {}", method, uri.path());
        return message(StatusCode::METHOD_NOT_ALLOWED, "method not allowed");
    };

    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to read request body: {}", e);
            return message(StatusCode::BAD_REQUEST, "unreadable request body");
        }
    };

    let path = match &state.api_version {
        Some(version) if !is_versioned(uri.path()) => format!("/{}{}", version, uri.path()),
        _ => uri.path().to_string(),
    };
    let body = request_body(query, &headers, &bytes);
    debug!("Bridging {} {} {}", method, path, body);

    match state.mock.dispatch(method, &path, body).await {
        Ok(res) => into_http(res),
        Err(e) => match e.downcast_ref::<DockMockError>() {
            Some(DockMockError::RouteNotFound { .. }) => {
                message(StatusCode::NOT_FOUND, "page not found")
            }
            _ => {
                error!("Dispatch failed: {:#}", e);
                message(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
            }
        },
    }
}

/// Query parameters, overlaid with the JSON body when there is one.
fn request_body(query: HashMap<String, String>, headers: &HeaderMap, bytes: &[u8]) -> Value {
    let mut body: Map<String, Value> = query
        .into_iter()
        .map(|(key, value)| {
            let value = if key == "filters" {
                serde_json::from_str(&value).unwrap_or(Value::String(value))
            } else {
                Value::String(value)
            };
            (key, value)
        })
        .collect();

    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("json"));
    if is_json && !bytes.is_empty() {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(fields)) => body.extend(fields),
            Ok(other) => debug!("Ignoring non-object JSON body: {}", other),
            Err(e) => warn!("Ignoring malformed JSON body: {}", e),
        }
    } else if !bytes.is_empty() {
        debug!("Drained {} byte(s) of non-JSON body", bytes.len());
    }
    Value::Object(body)
}

/// True when the first path segment looks like `v1.47`.
fn is_versioned(path: &str) -> bool {
    path.trim_start_matches('/')
        .split('/')
        .next()
        .and_then(|segment| segment.strip_prefix('v'))
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_digit())
}

fn into_http(res: MockResponse) -> Response {
    let status = StatusCode::from_u16(res.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let no_content = status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED;
    match res.body {
        MockBody::Json(_) | MockBody::Empty if no_content => status.into_response(),
        MockBody::Json(value) => (status, axum::Json(value)).into_response(),
        MockBody::Empty => status.into_response(),
        MockBody::Stream(stream) => (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            Body::from_stream(stream),
        )
            .into_response(),
        MockBody::Session(_) => StatusCode::OK.into_response(),
    }
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, axum::Json(json!({ "message": text }))).into_response()
}

/// Binds the first free port in `port..port + MAX_PORT_ATTEMPTS`.
pub async fn bind_listener(host: IpAddr, port: u16) -> Result<TcpListener> {
    for offset in 0..MAX_PORT_ATTEMPTS {
        let Some(candidate) = port.checked_add(offset) else {
            break;
        };
        let addr = SocketAddr::new(host, candidate);
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                if offset > 0 {
                    info!("Port {} was unavailable, using {}", port, candidate);
                }
                return Ok(listener);
            }
            Err(e) => warn!(
                "Attempt {}: {} is unavailable ({}). Trying next port...",
                offset + 1,
                addr,
                e
            ),
        }
    }
    Err(anyhow!(DockMockError::Bridge(format!(
        "No free port on {} starting from {} after {} attempts",
        host, port, MAX_PORT_ATTEMPTS
    ))))
}

/// Serves `app` on `listener` until `shutdown` resolves.
pub async fn serve_until<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow!(DockMockError::Bridge(e.to_string())))
        .context("HTTP bridge failed")
}

/// A bridge running in a background task.
#[derive(Debug)]
pub struct BridgeHandle {
    pub addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<Result<()>>,
}

impl BridgeHandle {
    /// Stops accepting connections and waits for the server task.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown.send(());
        self.task.await.context("HTTP bridge task panicked")?
    }
}

/// Starts a bridge for `mock` on an ephemeral localhost port.
pub async fn spawn(mock: DockerMock, api_version: Option<String>) -> Result<BridgeHandle> {
    let listener = TcpListener::bind((IpAddr::from([127, 0, 0, 1]), 0))
        .await
        .context("Failed to bind an ephemeral port")?;
    let addr = listener
        .local_addr()
        .context("Failed to read the bridge address")?;
    let (tx, rx) = oneshot::channel::<()>();
    let app = create_app(mock, api_version);
    let task = tokio::spawn(serve_until(listener, app, async move {
        let _ = rx.await;
    }));
    debug!("Bridge spawned on {}", addr);
    Ok(BridgeHandle {
        addr,
        shutdown: tx,
        task,
    })
}

/// Runs `dockmock serve` in the foreground until Ctrl+C or SIGTERM.
pub async fn run_server(config: ServeConfig) -> Result<()> {
    let mock = DockerMock::new();
    if let Some(dir) = &config.fixtures {
        let fixtures = DirFixtures::load(dir)?;
        println!("📦 Loaded {} fixture(s) from {}", fixtures.entries().len(), dir.display());
        mock.register_fixtures(Arc::new(fixtures));
    }

    let listener = bind_listener(config.host, config.port).await?;
    let addr = listener
        .local_addr()
        .context("Failed to read the bridge address")?;

    println!("\n=================================================================");
    println!("🐳 DockMock listening on  tcp://{}", addr);
    println!("🔌 Point clients at it:   DOCKER_HOST=tcp://{}", addr);
    if let Some(version) = &config.api_version {
        println!("🏷️  Default API version:   {}", version);
    }
    println!("=================================================================\n");
    info!("Starting bridge on {}", addr);

    let app = create_app(mock, config.api_version.clone());
    serve_until(listener, app, shutdown_signal()).await?;

    println!("\nBridge shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown..."),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("Received SIGTERM, initiating graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
