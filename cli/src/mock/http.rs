//! # DockMock Request & Response Types
//!
//! File: cli/src/mock/http.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! The value types passed between the router, the controllers and the modem
//! adapter. A `Request` carries the path captures and the caller's JSON body
//! (query-like options such as `all` or `filters` travel in the body). A
//! `Response` is a by-value builder: each `status`/`send` call replaces the
//! previous value, and whatever the handler returns is what the caller sees.
//!
//! A response body is either JSON, nothing, a live `ProgressStream` (pull and
//! build), or a duplex channel (session).
//!
use super::stream::ProgressStream;
use crate::core::error::{DockMockError, Result};
use anyhow::anyhow;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tokio::io::DuplexStream;

/// HTTP methods the emulated API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "DELETE" => Ok(Method::Delete),
            other => Err(anyhow!(DockMockError::Bridge(format!(
                "Unsupported HTTP method '{}'",
                other
            )))),
        }
    }
}

/// A normalized inbound request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    /// Captured path placeholders, keyed by name without the `:` marker.
    pub params: HashMap<String, String>,
    pub body: Value,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>, body: Value) -> Self {
        Self {
            method,
            path: path.into(),
            params: HashMap::new(),
            body,
        }
    }

    /// A captured path parameter, or `""` when the template had none.
    pub fn param(&self, name: &str) -> &str {
        self.params.get(name).map(String::as_str).unwrap_or("")
    }

    /// A string field of the body object.
    pub fn body_str(&self, key: &str) -> Option<&str> {
        self.body.get(key).and_then(Value::as_str)
    }

    /// A boolean body flag. Accepts JSON booleans and the query-string forms
    /// `"1"`, `"true"`, `"0"`, `"false"`.
    pub fn body_bool(&self, key: &str) -> Option<bool> {
        match self.body.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.as_str() {
                "1" | "true" => Some(true),
                "0" | "false" => Some(false),
                _ => None,
            },
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            _ => None,
        }
    }

    /// An unsigned integer body field, accepting numbers and numeric strings.
    pub fn body_u32(&self, key: &str) -> Option<u32> {
        match self.body.get(key)? {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// The body as an object, empty when it is anything else.
    pub fn body_object(&self) -> Map<String, Value> {
        match &self.body {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        }
    }
}

/// Payload of a response.
#[derive(Debug, Default)]
pub enum Body {
    #[default]
    Empty,
    Json(Value),
    Stream(ProgressStream),
    Session(DuplexStream),
}

impl Body {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }

    /// `body.message`, else `body.error`, else the body rendered as text.
    pub fn detail(&self) -> String {
        match self {
            Body::Json(value) => value
                .get("message")
                .or_else(|| value.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                }),
            Body::Empty => String::new(),
            Body::Stream(_) => "[stream]".to_string(),
            Body::Session(_) => "[session]".to_string(),
        }
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

impl From<ProgressStream> for Body {
    fn from(stream: ProgressStream) -> Self {
        Body::Stream(stream)
    }
}

impl From<DuplexStream> for Body {
    fn from(duplex: DuplexStream) -> Self {
        Body::Session(duplex)
    }
}

/// Response builder handed to every handler.
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub body: Body,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            body: Body::Empty,
        }
    }
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn send(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Shorthand for the daemon's `{"message": ...}` error body.
    pub fn message(self, message: impl Into<String>) -> Self {
        self.send(serde_json::json!({ "message": message.into() }))
    }

    pub fn json(&self) -> Option<&Value> {
        self.body.as_json()
    }

    pub fn into_stream(self) -> Option<ProgressStream> {
        match self.body {
            Body::Stream(stream) => Some(stream),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_last_status_and_send_win() {
        let res = Response::new()
            .status(404)
            .send(json!({"a": 1}))
            .status(204)
            .send(json!({"b": 2}));
        assert_eq!(res.status, 204);
        assert_eq!(res.json(), Some(&json!({"b": 2})));
    }

    #[test]
    fn test_body_detail_precedence() {
        assert_eq!(Body::from(json!({"message": "m", "error": "e"})).detail(), "m");
        assert_eq!(Body::from(json!({"error": "e"})).detail(), "e");
        assert_eq!(Body::from(json!("plain")).detail(), "plain");
        assert_eq!(Body::from(json!({"x": 1})).detail(), r#"{"x":1}"#);
        assert_eq!(Body::Empty.detail(), "");
    }

    #[test]
    fn test_request_body_accessors() {
        let req = Request::new(
            Method::Get,
            "/containers/json",
            json!({"all": "1", "h": 40, "w": "80", "name": "web"}),
        );
        assert_eq!(req.body_bool("all"), Some(true));
        assert_eq!(req.body_u32("h"), Some(40));
        assert_eq!(req.body_u32("w"), Some(80));
        assert_eq!(req.body_str("name"), Some("web"));
        assert_eq!(req.body_bool("missing"), None);
        assert_eq!(req.param("id"), "");
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("DELETE".parse::<Method>().unwrap(), Method::Delete);
        assert!("PATCH".parse::<Method>().is_err());
        assert_eq!(Method::Post.to_string(), "POST");
    }
}
