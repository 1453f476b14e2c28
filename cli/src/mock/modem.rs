//! # DockMock Modem Adapter
//!
//! File: cli/src/mock/modem.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! The transport-facing side of the engine. Docker client libraries describe
//! every call as a method, a path, a body and an allow-list of status codes:
//! some codes are success, the rest carry a reason text. `Modem` replays that
//! contract against a `DockerMock`:
//!
//! 1. prefix the path with `/<version>` when an API version is configured,
//! 2. drain the upload stream (a build context) if one was given,
//! 3. dispatch,
//! 4. turn any status not marked as allowed into
//!    `DockMockError::UnexpectedStatus`, whose message reads
//!    `(HTTP code <n>) <reason|unexpected> - <detail> `.
//!
//! On top of `dial`, the `*_container` / `*_image` helpers carry the daemon's
//! usual allow-lists so tests can read like client code.
//!
//! ## Examples
//!
//! ```rust
//! use dockmock::mock::modem::Modem;
//! use dockmock::mock::DockerMock;
//! use serde_json::json;
//!
//! # async fn run() -> dockmock::core::error::Result<()> {
//! let modem = Modem::new(DockerMock::new()).with_version("v1.47");
//! let id = modem.create_container(json!({"name": "web", "Image": "node:23"})).await?;
//! modem.start_container(&id).await?;
//!
//! let err = modem.kill_container("missing").await.unwrap_err();
//! assert!(err.to_string().starts_with("(HTTP code 404) no such container"));
//! # Ok(())
//! # }
//! ```
//!
use super::http::{Body, Method, Response};
use super::images::split_reference;
use super::stream::ProgressStream;
use super::DockerMock;
use crate::core::error::{DockMockError, Result};
use anyhow::{anyhow, Context};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// How a status code is treated by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusRule {
    Allowed,
    Reason(String),
}

/// Allow-list mapping status codes to `StatusRule`s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusCodes(BTreeMap<u16, StatusRule>);

impl StatusCodes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(mut self, status: u16) -> Self {
        self.0.insert(status, StatusRule::Allowed);
        self
    }

    pub fn reason(mut self, status: u16, reason: impl Into<String>) -> Self {
        self.0.insert(status, StatusRule::Reason(reason.into()));
        self
    }

    pub fn is_allowed(&self, status: u16) -> bool {
        matches!(self.0.get(&status), Some(StatusRule::Allowed))
    }

    /// The reason text for `status`, if one was declared.
    pub fn reason_for(&self, status: u16) -> Option<&str> {
        match self.0.get(&status) {
            Some(StatusRule::Reason(reason)) => Some(reason),
            _ => None,
        }
    }

    /// Errors with `UnexpectedStatus` unless the response status is allowed.
    pub fn check(&self, res: &Response) -> Result<()> {
        if self.is_allowed(res.status) {
            return Ok(());
        }
        let reason = self.reason_for(res.status).map(str::to_string);
        let message = format!(
            "(HTTP code {}) {} - {} ",
            res.status,
            reason.as_deref().unwrap_or("unexpected"),
            res.body.detail()
        );
        Err(anyhow!(DockMockError::UnexpectedStatus {
            message,
            status: res.status,
            reason,
            body: res.json().cloned().unwrap_or(Value::Null),
        }))
    }
}

/// One call as a client library describes it.
#[derive(Debug)]
pub struct DialOptions {
    pub method: Method,
    pub path: String,
    pub body: Value,
    pub status_codes: StatusCodes,
    pub upload: Option<ProgressStream>,
}

impl DialOptions {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: json!({}),
            status_codes: StatusCodes::new(),
            upload: None,
        }
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn status_codes(mut self, status_codes: StatusCodes) -> Self {
        self.status_codes = status_codes;
        self
    }

    pub fn upload(mut self, upload: ProgressStream) -> Self {
        self.upload = Some(upload);
        self
    }
}

/// Client-shaped front end of a `DockerMock`.
#[derive(Debug, Clone)]
pub struct Modem {
    mock: DockerMock,
    version: Option<String>,
}

impl Modem {
    pub fn new(mock: DockerMock) -> Self {
        Self {
            mock,
            version: None,
        }
    }

    /// Prefix every path with `/<version>`. `v1` means unversioned.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        let version = version.into();
        self.version = (!version.is_empty() && version != "v1").then_some(version);
        self
    }

    pub fn mock(&self) -> &DockerMock {
        &self.mock
    }

    /// Runs one call and applies its allow-list.
    #[instrument(skip_all, fields(method = %options.method, path = %options.path))]
    pub async fn dial(&self, options: DialOptions) -> Result<Response> {
        let DialOptions {
            method,
            path,
            body,
            status_codes,
            upload,
        } = options;

        let path = match &self.version {
            Some(version) => format!("/{}{}", version, path),
            None => path,
        };

        if let Some(upload) = upload {
            match upload.drain().await {
                Ok(chunks) => debug!("Drained {} upload chunk(s)", chunks.len()),
                Err(e) => warn!("Upload stream failed, continuing: {}", e),
            }
        }

        let res = self.mock.dispatch(method, &path, body).await?;
        status_codes.check(&res)?;
        Ok(res)
    }

    async fn dial_json(&self, options: DialOptions) -> Result<Value> {
        let path = options.path.clone();
        let res = self.dial(options).await?;
        match res.body {
            Body::Json(value) => Ok(value),
            Body::Empty => Ok(Value::Null),
            other => Err(anyhow!(
                "Expected a JSON body from {}, got {}",
                path,
                other.detail()
            )),
        }
    }

    async fn dial_stream(&self, options: DialOptions) -> Result<ProgressStream> {
        let path = options.path.clone();
        self.dial(options)
            .await?
            .into_stream()
            .with_context(|| format!("Expected a progress stream from {}", path))
    }

    pub async fn list_containers(&self, options: Value) -> Result<Vec<Value>> {
        let value = self
            .dial_json(
                DialOptions::new(Method::Get, "/containers/json")
                    .body(options)
                    .status_codes(server_errors(StatusCodes::new().allow(200))),
            )
            .await?;
        into_array(value)
    }

    /// Creates a container and returns its id.
    pub async fn create_container(&self, options: Value) -> Result<String> {
        let value = self
            .dial_json(
                DialOptions::new(Method::Post, "/containers/create")
                    .body(options)
                    .status_codes(server_errors(
                        StatusCodes::new()
                            .allow(201)
                            .reason(404, "no such container")
                            .reason(406, "impossible to attach"),
                    )),
            )
            .await?;
        value
            .get("Id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .context("Create response carried no Id")
    }

    pub async fn inspect_container(&self, id: &str) -> Result<Value> {
        self.dial_json(
            DialOptions::new(Method::Get, format!("/containers/{}/json", id))
                .status_codes(container_codes(StatusCodes::new().allow(200))),
        )
        .await
    }

    pub async fn start_container(&self, id: &str) -> Result<()> {
        self.container_action(
            id,
            "start",
            json!({}),
            StatusCodes::new()
                .allow(204)
                .reason(304, "container already started"),
        )
        .await
    }

    pub async fn stop_container(&self, id: &str) -> Result<()> {
        self.container_action(
            id,
            "stop",
            json!({}),
            StatusCodes::new()
                .allow(200)
                .allow(204)
                .reason(304, "container already stopped"),
        )
        .await
    }

    pub async fn kill_container(&self, id: &str) -> Result<()> {
        self.container_action(
            id,
            "kill",
            json!({}),
            StatusCodes::new()
                .allow(204)
                .reason(409, "container is not running"),
        )
        .await
    }

    pub async fn pause_container(&self, id: &str) -> Result<()> {
        self.container_action(id, "pause", json!({}), StatusCodes::new().allow(204))
            .await
    }

    pub async fn unpause_container(&self, id: &str) -> Result<()> {
        self.container_action(
            id,
            "unpause",
            json!({}),
            StatusCodes::new()
                .allow(204)
                .reason(304, "container not paused"),
        )
        .await
    }

    pub async fn restart_container(&self, id: &str) -> Result<()> {
        self.container_action(id, "restart", json!({}), StatusCodes::new().allow(204))
            .await
    }

    pub async fn rename_container(&self, id: &str, name: &str) -> Result<()> {
        self.container_action(
            id,
            "rename",
            json!({ "name": name }),
            StatusCodes::new()
                .allow(200)
                .allow(204)
                .reason(409, "name already assigned"),
        )
        .await
    }

    pub async fn resize_container(&self, id: &str, rows: u32, cols: u32) -> Result<()> {
        self.container_action(
            id,
            "resize",
            json!({ "h": rows, "w": cols }),
            StatusCodes::new().allow(200).reason(400, "bad parameter"),
        )
        .await
    }

    pub async fn remove_container(&self, id: &str) -> Result<()> {
        self.dial(
            DialOptions::new(Method::Delete, format!("/containers/{}", id)).status_codes(
                container_codes(
                    StatusCodes::new()
                        .allow(200)
                        .allow(204)
                        .reason(400, "bad parameter"),
                ),
            ),
        )
        .await?;
        Ok(())
    }

    async fn container_action(
        &self,
        id: &str,
        action: &str,
        body: Value,
        codes: StatusCodes,
    ) -> Result<()> {
        self.dial(
            DialOptions::new(Method::Post, format!("/containers/{}/{}", id, action))
                .body(body)
                .status_codes(container_codes(codes)),
        )
        .await?;
        Ok(())
    }

    /// Starts a pull of `name[:tag]` and returns its progress stream.
    pub async fn pull(&self, reference: &str) -> Result<ProgressStream> {
        let (name, tag) = split_reference(reference);
        self.dial_stream(
            DialOptions::new(Method::Post, "/images/create")
                .body(json!({ "fromImage": name, "tag": tag }))
                .status_codes(server_errors(
                    StatusCodes::new()
                        .allow(200)
                        .reason(404, "repository does not exist or no read access"),
                )),
        )
        .await
    }

    /// Starts a build after draining `context`, returning its progress stream.
    pub async fn build(&self, context: Option<ProgressStream>, options: Value) -> Result<ProgressStream> {
        let mut dial = DialOptions::new(Method::Post, "/build")
            .body(options)
            .status_codes(server_errors(StatusCodes::new().allow(200)));
        if let Some(context) = context {
            dial = dial.upload(context);
        }
        self.dial_stream(dial).await
    }

    pub async fn list_images(&self, options: Value) -> Result<Vec<Value>> {
        let value = self
            .dial_json(
                DialOptions::new(Method::Get, "/images/json")
                    .body(options)
                    .status_codes(server_errors(
                        StatusCodes::new().allow(200).reason(400, "bad parameter"),
                    )),
            )
            .await?;
        into_array(value)
    }

    pub async fn inspect_image(&self, tag: &str) -> Result<Value> {
        self.dial_json(
            DialOptions::new(Method::Get, format!("/images/{}/json", tag)).status_codes(
                server_errors(StatusCodes::new().allow(200).reason(404, "no such image")),
            ),
        )
        .await
    }

    pub async fn remove_image(&self, tag: &str) -> Result<Value> {
        self.dial_json(
            DialOptions::new(Method::Delete, format!("/images/{}", tag)).status_codes(
                server_errors(
                    StatusCodes::new()
                        .allow(200)
                        .reason(404, "no such image")
                        .reason(409, "conflict"),
                ),
            ),
        )
        .await
    }
}

fn server_errors(codes: StatusCodes) -> StatusCodes {
    codes.reason(500, "server error")
}

fn container_codes(codes: StatusCodes) -> StatusCodes {
    server_errors(codes.reason(404, "no such container"))
}

fn into_array(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(anyhow!("Expected a JSON array, got {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ids::SequentialIds;
    use std::sync::Arc;

    fn modem() -> Modem {
        Modem::new(DockerMock::with_ids(Arc::new(SequentialIds::default())))
    }

    #[test]
    fn test_unexpected_status_message() {
        let codes = StatusCodes::new().allow(204).reason(404, "no such container");
        let res = Response::new()
            .status(404)
            .message("No such container: abc");
        let err = codes.check(&res).unwrap_err();
        assert_eq!(
            err.to_string(),
            "(HTTP code 404) no such container - No such container: abc "
        );
        match err.downcast_ref::<DockMockError>() {
            Some(DockMockError::UnexpectedStatus {
                status,
                reason,
                body,
                ..
            }) => {
                assert_eq!(*status, 404);
                assert_eq!(reason.as_deref(), Some("no such container"));
                assert_eq!(body["message"], "No such container: abc");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_undeclared_status_is_unexpected() {
        let res = Response::new().status(418).send(json!({"error": "teapot"}));
        let err = StatusCodes::new().allow(200).check(&res).unwrap_err();
        assert_eq!(err.to_string(), "(HTTP code 418) unexpected - teapot ");
    }

    #[tokio::test]
    async fn test_version_prefix_is_applied() {
        let modem = modem().with_version("v1.47");
        let res = modem
            .dial(
                DialOptions::new(Method::Get, "/containers/json")
                    .status_codes(StatusCodes::new().allow(200)),
            )
            .await
            .unwrap();
        assert_eq!(res.json(), Some(&json!([])));

        // "v1" is the unversioned API.
        assert!(modem.clone().with_version("v1").version.is_none());
    }

    #[tokio::test]
    async fn test_unknown_route_propagates() {
        let err = modem()
            .dial(DialOptions::new(Method::Get, "/volumes"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DockMockError>(),
            Some(DockMockError::RouteNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_upload_is_drained_even_when_failing() {
        let modem = modem();
        let res = modem
            .dial(
                DialOptions::new(Method::Post, "/build")
                    .body(json!({"t": "app"}))
                    .upload(ProgressStream::failing(["ctx"], "broken pipe"))
                    .status_codes(StatusCodes::new().reason(500, "server error")),
            )
            .await
            .unwrap_err();
        assert_eq!(
            res.to_string(),
            "(HTTP code 500) server error - Fixture not found "
        );
    }

    #[tokio::test]
    async fn test_lifecycle_helpers() {
        let modem = modem();
        let id = modem
            .create_container(json!({"name": "web", "Image": "node:23"}))
            .await
            .unwrap();
        modem.start_container(&id).await.unwrap();
        let err = modem.start_container(&id).await.unwrap_err();
        assert!(err.to_string().contains("container already started"));
        modem.stop_container(&id).await.unwrap();
        let inspect = modem.inspect_container(&id).await.unwrap();
        assert_eq!(inspect["State"]["Status"], "exited");
        modem.remove_container(&id).await.unwrap();
        assert!(modem.inspect_container(&id).await.is_err());
    }
}
