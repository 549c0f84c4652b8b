//! The immutable per-request value handed to handlers.

use crate::method::Method;
use std::collections::HashMap;

/// Path-variable bindings, e.g. `/product/:id` -> `{ "id": "1" }`.
pub type Params = HashMap<String, String>;

/// Query-string bindings, e.g. `x=1&y=2` -> `{ "x": "1", "y": "2" }`.
pub type Query = HashMap<String, String>;

/// Request/response header mapping.
pub type Headers = HashMap<String, String>;

/// Request and response bodies are JSON values; scalar and structured
/// shapes are distinguished only at send time.
pub type Body = serde_json::Value;

/// Shape classification driving the adapter's send policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// `null`/absent: the adapter's bodyless send.
    Empty,
    /// Object or array: the adapter's structured (e.g. JSON) send.
    Structured,
    /// String, number or bool: the adapter's raw send.
    Scalar,
}

/// Pure function of the body's shape; not configurable per call.
pub fn body_kind(body: &Body) -> BodyKind {
    match body {
        Body::Null => BodyKind::Empty,
        Body::Object(_) | Body::Array(_) => BodyKind::Structured,
        _ => BodyKind::Scalar,
    }
}

/// An inbound request, created fresh per dispatch from adapter-supplied
/// primitives. Read-only to handlers.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    headers: Headers,
    params: Params,
    query: Query,
    body: Body,
}

impl Request {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        headers: Headers,
        params: Params,
        query: Query,
        body: Body,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            headers,
            params,
            query,
            body,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Convenience accessor for one path variable.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn body(&self) -> &Body {
        &self.body
    }
}
