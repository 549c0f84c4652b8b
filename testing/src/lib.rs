//! # Crossbar Test Kit
//!
//! A scriptable in-memory transport for exercising the dispatch core
//! without sockets. [`MockAdapter`] records every primitive call the core
//! makes; [`MockExchange`] is the per-request "raw args" value a test
//! builds, fires, and then asserts against.

use async_trait::async_trait;
use crossbar_core::adapter::{Adapter, DispatchEntry, ServerConfig};
use crossbar_core::error::AdapterError;
use crossbar_core::{Body, Headers, Method, Params, Pattern, Query};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// One simulated request/response exchange. The request side is built by
/// the test; the response side records every primitive call so assertions
/// can check e.g. that `send` ran exactly once.
#[derive(Debug, Default)]
pub struct MockExchange {
    pub method: Option<Method>,
    pub path: String,
    pub params: Params,
    pub query: Query,
    pub headers: Headers,
    pub body: Body,

    /// Every `set_status` call, in order.
    pub status_calls: Vec<u16>,
    /// Every `set_header` call, in order.
    pub header_calls: Vec<(String, String)>,
    /// Every `send` call, in order.
    pub sent: Vec<Body>,
}

impl MockExchange {
    pub fn new(method: Option<Method>, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Some(Method::Get), path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Some(Method::Post), path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Some(Method::Patch), path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Some(Method::Delete), path)
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// The effective response status (last `set_status` call).
    pub fn status(&self) -> Option<u16> {
        self.status_calls.last().copied()
    }

    pub fn send_count(&self) -> usize {
        self.sent.len()
    }

    /// The single sent body. Panics when `send` did not run exactly once,
    /// since that is precisely the invariant under test.
    pub fn sent_once(&self) -> &Body {
        assert_eq!(
            self.sent.len(),
            1,
            "expected exactly one send, got {}: {:?}",
            self.sent.len(),
            self.sent
        );
        &self.sent[0]
    }
}

struct Registered {
    method: Method,
    path: String,
    entry: DispatchEntry<MockExchange>,
}

#[derive(Default)]
struct MockState {
    starts: usize,
    stops: usize,
    running: bool,
    refuse_routes: bool,
    refuse_once_at: Option<usize>,
    fail_start: bool,
    brace_params: bool,
}

/// In-memory transport. Routes registered by the core are kept in
/// registration order; [`MockAdapter::fire`] plays the transport's role of
/// matching a request and invoking the bound dispatch entry point.
#[derive(Default)]
pub struct MockAdapter {
    registry: RwLock<Vec<Registered>>,
    state: Mutex<MockState>,
}

impl MockAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `register_route` answer `Ok(false)` for every route.
    pub fn refuse_routes(self) -> Self {
        self.state.lock().refuse_routes = true;
        self
    }

    /// Refuse the registration that would land at `index` (0-based), once.
    /// Later registrations succeed, simulating a transient transport
    /// refusal partway through a batch.
    pub fn refuse_route_once_at(self, index: usize) -> Self {
        self.state.lock().refuse_once_at = Some(index);
        self
    }

    /// Make `start` fail.
    pub fn fail_start(self) -> Self {
        self.state.lock().fail_start = true;
        self
    }

    /// Transform `:name` placeholders into `{name}` (hapi-style), to test
    /// the `transform_path` plumbing.
    pub fn brace_params(self) -> Self {
        self.state.lock().brace_params = true;
        self
    }

    pub fn start_count(&self) -> usize {
        self.state.lock().starts
    }

    pub fn stop_count(&self) -> usize {
        self.state.lock().stops
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// The `(method, adapter path)` pairs registered so far, in order.
    pub fn registered(&self) -> Vec<(Method, String)> {
        self.registry
            .read()
            .iter()
            .map(|r| (r.method, r.path.clone()))
            .collect()
    }

    /// Match the exchange against the registered routes (first hit wins,
    /// registration order) and invoke the bound entry point, filling in the
    /// path params the way a real transport router would. Returns false
    /// when no registered route matched; the entry is then never invoked.
    pub async fn fire(&self, exchange: &mut MockExchange) -> bool {
        let hit = {
            let registry = self.registry.read();
            exchange.method.and_then(|method| {
                registry.iter().find_map(|r| {
                    if r.method != method {
                        return None;
                    }
                    let pattern = Pattern::parse(&r.path).ok()?;
                    pattern
                        .matches(&exchange.path)
                        .map(|params| (Arc::clone(&r.entry), params))
                })
            })
        };

        match hit {
            Some((entry, params)) => {
                if exchange.params.is_empty() {
                    exchange.params = params;
                }
                entry(exchange).await;
                true
            }
            None => false,
        }
    }

    /// Invoke the first registered entry point regardless of matching:
    /// simulates a transport whose own router delivered a request the core
    /// cannot place (unclassifiable method, unknown path).
    pub async fn fire_first(&self, exchange: &mut MockExchange) -> bool {
        let entry = self.registry.read().first().map(|r| Arc::clone(&r.entry));
        match entry {
            Some(entry) => {
                entry(exchange).await;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl Adapter for MockAdapter {
    type Raw = MockExchange;

    fn method(&self, raw: &MockExchange) -> Option<Method> {
        raw.method
    }

    fn path(&self, raw: &MockExchange) -> String {
        raw.path.clone()
    }

    fn params(&self, raw: &MockExchange) -> Params {
        raw.params.clone()
    }

    fn query(&self, raw: &MockExchange) -> Query {
        raw.query.clone()
    }

    fn body(&self, raw: &MockExchange) -> Body {
        raw.body.clone()
    }

    fn headers(&self, raw: &MockExchange) -> Headers {
        raw.headers.clone()
    }

    fn set_status(&self, status: u16, raw: &mut MockExchange) -> bool {
        raw.status_calls.push(status);
        true
    }

    fn set_header(&self, name: &str, value: &str, raw: &mut MockExchange) -> bool {
        raw.header_calls.push((name.to_string(), value.to_string()));
        true
    }

    async fn send(&self, body: Body, raw: &mut MockExchange) -> Result<(), AdapterError> {
        raw.sent.push(body);
        Ok(())
    }

    fn transform_path(&self, path: &str) -> String {
        if !self.state.lock().brace_params {
            return path.to_string();
        }
        let mut out = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            out.push('/');
            match segment.strip_prefix(':') {
                Some(name) => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
                None => out.push_str(segment),
            }
        }
        if out.is_empty() {
            out.push('/');
        }
        out
    }

    async fn register_route(
        &self,
        method: Method,
        path: String,
        entry: DispatchEntry<MockExchange>,
    ) -> Result<bool, AdapterError> {
        {
            let mut state = self.state.lock();
            if state.refuse_routes {
                return Ok(false);
            }
            if state.refuse_once_at == Some(self.registry.read().len()) {
                state.refuse_once_at = None;
                return Ok(false);
            }
        }
        self.registry.write().push(Registered {
            method,
            path,
            entry,
        });
        Ok(true)
    }

    async fn start(&self, _config: &ServerConfig) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        if state.fail_start {
            return Err(AdapterError::Transport("scripted start failure".to_string()));
        }
        state.starts += 1;
        state.running = true;
        Ok(())
    }

    async fn stop(&self) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        if !state.running {
            return Err(AdapterError::NotRunning);
        }
        state.stops += 1;
        state.running = false;
        Ok(())
    }
}
