//! The per-request "raw args" value threaded through the adapter
//! primitives: a snapshot of the inbound hyper request plus the staged
//! reply, turned into a real `http::Response` once dispatch settles.

use bytes::Bytes;
use crossbar_core::request::{Body, BodyKind, Headers, Params, Query, body_kind};
use crossbar_core::Method;
use http::{Response, StatusCode};
use http_body_util::Full;

#[derive(Debug)]
pub struct HttpExchange {
    pub(crate) method: Option<Method>,
    pub(crate) path: String,
    pub(crate) params: Params,
    pub(crate) query: Query,
    pub(crate) headers: Headers,
    pub(crate) body: Body,
    pub(crate) reply: Reply,
}

/// Staged outbound state; `payload: Some` means the response was sent.
#[derive(Debug, Default)]
pub(crate) struct Reply {
    pub(crate) status: Option<u16>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) payload: Option<Payload>,
}

/// Wire form of a sent body, decided purely by the body's shape.
#[derive(Debug, PartialEq)]
pub(crate) enum Payload {
    Empty,
    Raw(String),
    Json(Body),
}

pub(crate) fn classify(body: Body) -> Payload {
    match body_kind(&body) {
        BodyKind::Empty => Payload::Empty,
        BodyKind::Structured => Payload::Json(body),
        BodyKind::Scalar => Payload::Raw(scalar_text(&body)),
    }
}

fn scalar_text(body: &Body) -> String {
    match body {
        Body::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl HttpExchange {
    pub(crate) fn into_response(self) -> Response<Full<Bytes>> {
        let Reply {
            status,
            headers,
            payload,
        } = self.reply;

        let status = StatusCode::from_u16(status.unwrap_or(200))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let has_content_type = headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("content-type"));

        let (bytes, default_type) = match payload {
            None | Some(Payload::Empty) => (Bytes::new(), None),
            Some(Payload::Raw(text)) => (Bytes::from(text), Some("text/plain; charset=utf-8")),
            Some(Payload::Json(value)) => match serde_json::to_vec(&value) {
                Ok(buf) => (Bytes::from(buf), Some("application/json")),
                Err(err) => {
                    tracing::error!(error = %err, "failed to serialize response body");
                    return internal_error();
                }
            },
        };

        let mut builder = Response::builder().status(status);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(content_type) = default_type {
            if !has_content_type {
                builder = builder.header("content-type", content_type);
            }
        }

        match builder.body(Full::new(bytes)) {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(error = %err, "failed to assemble response");
                internal_error()
            }
        }
    }
}

/// 404 for requests the transport has no registered route for.
pub(crate) fn not_found() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from("Not Found")));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

fn internal_error() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from("Internal Server Error")));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}
