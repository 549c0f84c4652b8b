//! The transport adapter contract.
//!
//! The core never inspects a transport's own request/response objects; it
//! talks to the outside world exclusively through these primitives, with the
//! transport's per-request state threaded through as the opaque `Raw` type.
//! An adapter is implemented once per concrete transport (hyper, a test
//! mock, ...).

use crate::error::AdapterError;
use crate::method::Method;
use crate::request::{Body, Headers, Params, Query};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The dispatch entry point handed to the adapter at route registration:
/// the transport invokes it once per inbound request on its `Raw` state.
pub type DispatchEntry<Raw> = Arc<dyn for<'a> Fn(&'a mut Raw) -> BoxFuture<'a, ()> + Send + Sync>;

/// Connect-time configuration, passed through to the adapter's start
/// primitive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub https: bool,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

impl ServerConfig {
    pub fn from_toml_str(raw: &str) -> Result<ServerConfig, toml::de::Error> {
        toml::from_str(raw)
    }
}

/// Capability interface a concrete transport must provide.
///
/// Extraction primitives read from `Raw`; `set_status`/`set_header`/`send`
/// stage or transmit the outbound response on it. `send` owns the body
/// transmission policy (bodyless vs structured vs raw); see
/// [`crate::request::body_kind`].
#[async_trait]
pub trait Adapter: Send + Sync + 'static {
    /// Transport-specific per-request state ("rest args" of the transport's
    /// own handler signature).
    type Raw: Send;

    /// `None` when the transport cannot classify the request method.
    fn method(&self, raw: &Self::Raw) -> Option<Method>;
    fn path(&self, raw: &Self::Raw) -> String;
    fn params(&self, raw: &Self::Raw) -> Params;
    fn query(&self, raw: &Self::Raw) -> Query;
    fn body(&self, raw: &Self::Raw) -> Body;
    fn headers(&self, raw: &Self::Raw) -> Headers;

    /// Returns false when the transport refused the value.
    fn set_status(&self, status: u16, raw: &mut Self::Raw) -> bool;
    fn set_header(&self, name: &str, value: &str, raw: &mut Self::Raw) -> bool;
    async fn send(&self, body: Body, raw: &mut Self::Raw) -> Result<(), AdapterError>;

    /// Rewrite the core's `:name` placeholder syntax into the transport's
    /// own (identity when the transport shares the syntax).
    fn transform_path(&self, path: &str) -> String;

    /// Bind the dispatch entry point for one `(method, path)` route.
    /// `Ok(false)` means the transport rejected the route; connect treats
    /// that as fatal.
    async fn register_route(
        &self,
        method: Method,
        path: String,
        entry: DispatchEntry<Self::Raw>,
    ) -> Result<bool, AdapterError>;

    async fn start(&self, config: &ServerConfig) -> Result<(), AdapterError>;
    async fn stop(&self) -> Result<(), AdapterError>;
}
