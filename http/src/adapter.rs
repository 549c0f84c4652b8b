//! Hyper 1.0 transport adapter.
//!
//! Plays the role a framework like Express plays for the core: it owns the
//! TCP accept loop, keeps its own ordered route registry, extracts path
//! params, and invokes the dispatch entry point the core handed it at
//! registration time. Unmatched requests never reach the core and get a
//! plain 404.

use crate::exchange::{HttpExchange, Reply, classify, not_found};
use async_trait::async_trait;
use bytes::Bytes;
use crossbar_core::adapter::{Adapter, DispatchEntry, ServerConfig};
use crossbar_core::error::AdapterError;
use crossbar_core::{Body, Headers, Method, Params, Pattern, Query};
use http::Request;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use parking_lot::{Mutex, RwLock};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;

struct Registered {
    method: Method,
    pattern: Pattern,
    entry: DispatchEntry<HttpExchange>,
}

struct ServerTask {
    shutdown: watch::Sender<bool>,
    accept_loop: JoinHandle<()>,
}

struct Inner {
    registry: RwLock<Vec<Registered>>,
    fold_put: bool,
    server: Mutex<Option<ServerTask>>,
}

impl Inner {
    fn map_method(&self, method: &http::Method) -> Option<Method> {
        if *method == http::Method::PUT {
            return self.fold_put.then_some(Method::Patch);
        }
        Method::from_name(method.as_str())
    }
}

/// HTTP/1 transport over tokio + hyper.
pub struct HyperAdapter {
    inner: Arc<Inner>,
}

impl HyperAdapter {
    /// Default configuration: PUT requests fold into PATCH, matching the
    /// core's four-method surface.
    pub fn new() -> Self {
        Self::with_put_folding(true)
    }

    pub fn with_put_folding(fold_put: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: RwLock::new(Vec::new()),
                fold_put,
                server: Mutex::new(None),
            }),
        }
    }
}

impl Default for HyperAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_query(query: &str) -> Query {
    serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .map(|pairs| pairs.into_iter().collect())
        .unwrap_or_default()
}

fn parse_body(headers: &Headers, bytes: &[u8]) -> Body {
    if bytes.is_empty() {
        return Body::Null;
    }
    let declared_json = headers
        .get("content-type")
        .is_some_and(|value| value.starts_with("application/json"));
    if declared_json {
        match serde_json::from_slice(bytes) {
            Ok(value) => return value,
            Err(err) => {
                tracing::warn!(error = %err, "request declared JSON but did not parse; keeping raw text");
            }
        }
    }
    Body::String(String::from_utf8_lossy(bytes).into_owned())
}

async fn read_exchange(req: Request<Incoming>, method: Option<Method>) -> HttpExchange {
    let (parts, body) = req.into_parts();
    let path = parts.uri.path().to_string();
    let query = parts.uri.query().map(parse_query).unwrap_or_default();

    let mut headers = Headers::new();
    for (name, value) in &parts.headers {
        if let Ok(text) = value.to_str() {
            headers.insert(name.as_str().to_string(), text.to_string());
        }
    }

    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            tracing::warn!(error = %err, "failed to read request body");
            Bytes::new()
        }
    };
    let body = parse_body(&headers, &bytes);

    HttpExchange {
        method,
        path,
        params: Params::new(),
        query,
        headers,
        body,
        reply: Reply::default(),
    }
}

async fn handle_request(
    inner: Arc<Inner>,
    req: Request<Incoming>,
) -> http::Response<Full<Bytes>> {
    let method = inner.map_method(req.method());
    let mut exchange = read_exchange(req, method).await;

    // First registered route wins; registration order came from the core.
    let matched = {
        let registry = inner.registry.read();
        exchange.method.and_then(|method| {
            registry.iter().find_map(|route| {
                if route.method != method {
                    return None;
                }
                route
                    .pattern
                    .matches(&exchange.path)
                    .map(|params| (Arc::clone(&route.entry), params))
            })
        })
    };

    let Some((entry, params)) = matched else {
        return not_found();
    };
    exchange.params = params;

    let request_id = uuid::Uuid::new_v4();
    let method_name = exchange.method.map(|m| m.as_str()).unwrap_or("-");
    let span = tracing::info_span!(
        "http_request",
        http.method = %method_name,
        http.path = %exchange.path,
        http.request_id = %request_id,
    );
    async {
        entry(&mut exchange).await;
    }
    .instrument(span)
    .await;

    exchange.into_response()
}

#[async_trait]
impl Adapter for HyperAdapter {
    type Raw = HttpExchange;

    fn method(&self, raw: &HttpExchange) -> Option<Method> {
        raw.method
    }

    fn path(&self, raw: &HttpExchange) -> String {
        raw.path.clone()
    }

    fn params(&self, raw: &HttpExchange) -> Params {
        raw.params.clone()
    }

    fn query(&self, raw: &HttpExchange) -> Query {
        raw.query.clone()
    }

    fn body(&self, raw: &HttpExchange) -> Body {
        raw.body.clone()
    }

    fn headers(&self, raw: &HttpExchange) -> Headers {
        raw.headers.clone()
    }

    fn set_status(&self, status: u16, raw: &mut HttpExchange) -> bool {
        raw.reply.status = Some(status);
        true
    }

    fn set_header(&self, name: &str, value: &str, raw: &mut HttpExchange) -> bool {
        raw.reply
            .headers
            .push((name.to_string(), value.to_string()));
        true
    }

    async fn send(&self, body: Body, raw: &mut HttpExchange) -> Result<(), AdapterError> {
        if raw.reply.payload.is_some() {
            return Err(AdapterError::Transport("response already sent".to_string()));
        }
        raw.reply.payload = Some(classify(body));
        Ok(())
    }

    /// Identity: the registry matches with the core's own `:name` syntax.
    fn transform_path(&self, path: &str) -> String {
        path.to_string()
    }

    async fn register_route(
        &self,
        method: Method,
        path: String,
        entry: DispatchEntry<HttpExchange>,
    ) -> Result<bool, AdapterError> {
        match Pattern::parse(&path) {
            Ok(pattern) => {
                tracing::debug!(%method, %path, "route bound to http transport");
                self.inner.registry.write().push(Registered {
                    method,
                    pattern,
                    entry,
                });
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(%method, %path, error = %err, "route not representable on this transport");
                Ok(false)
            }
        }
    }

    async fn start(&self, config: &ServerConfig) -> Result<(), AdapterError> {
        if self.inner.server.lock().is_some() {
            return Err(AdapterError::Transport("adapter already started".to_string()));
        }
        if config.https {
            tracing::warn!("https requested but TLS is not supported by this adapter; serving plain HTTP");
        }

        let host = config.host.clone().unwrap_or_else(|| "127.0.0.1".to_string());
        let port = config.port.unwrap_or(3000);
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|err| AdapterError::Transport(format!("invalid bind address {host}:{port}: {err}")))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| AdapterError::Transport(format!("failed to bind {addr}: {err}")))?;
        tracing::info!(%addr, "crossbar http transport listening");

        let (tx, mut rx) = watch::channel(false);

        let inner = Arc::clone(&self.inner);
        let accept_loop = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = rx.changed() => {
                        tracing::info!("http transport shutting down");
                        break;
                    }
                    accepted = listener.accept() => {
                        let (stream, _) = match accepted {
                            Ok(pair) => pair,
                            Err(err) => {
                                tracing::error!(error = %err, "accept failed");
                                continue;
                            }
                        };
                        let io = TokioIo::new(stream);
                        let inner = Arc::clone(&inner);
                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                let inner = Arc::clone(&inner);
                                async move { Ok::<_, Infallible>(handle_request(inner, req).await) }
                            });
                            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                                tracing::error!(error = ?err, "error serving connection");
                            }
                        });
                    }
                }
            }
        });
        *self.inner.server.lock() = Some(ServerTask {
            shutdown: tx,
            accept_loop,
        });
        Ok(())
    }

    /// Signals the accept loop and waits for it to exit, so the listening
    /// socket is released before this returns and an immediate restart can
    /// rebind the same address.
    async fn stop(&self) -> Result<(), AdapterError> {
        let task = self.inner.server.lock().take();
        match task {
            Some(task) => {
                let _ = task.shutdown.send(true);
                if let Err(err) = task.accept_loop.await {
                    tracing::error!(error = %err, "accept loop terminated abnormally");
                }
                Ok(())
            }
            None => Err(AdapterError::NotRunning),
        }
    }
}
