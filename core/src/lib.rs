//! # Crossbar Core
//!
//! Transport-agnostic HTTP routing and request-dispatch core: declare a
//! tree of routes once, compile it into a per-method callout table, and
//! dispatch inbound requests through ordered handler chains with
//! exactly-once response semantics. Actual network I/O lives behind the
//! [`Adapter`] contract, implemented once per concrete transport.

pub mod adapter;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod method;
pub mod path;
pub mod request;
pub mod response;
pub mod route;
pub mod server;
pub mod table;
pub mod telemetry;

pub use adapter::{Adapter, BoxFuture, DispatchEntry, ServerConfig};
pub use dispatch::Dispatcher;
pub use error::{AdapterError, CompileError, DispatchError, LifecycleError, PatternError};
pub use handler::{Flow, Handler, HandlerResult, handler_fn};
pub use method::Method;
pub use path::Pattern;
pub use request::{Body, BodyKind, Headers, Params, Query, Request, body_kind};
pub use response::{Misc, Response};
pub use route::Route;
pub use server::Server;
pub use table::{CalloutTable, CompiledRoute};

pub mod prelude {
    pub use crate::adapter::{Adapter, DispatchEntry, ServerConfig};
    pub use crate::error::{AdapterError, CompileError, DispatchError, LifecycleError};
    pub use crate::handler::{Flow, Handler, HandlerResult, handler_fn};
    pub use crate::method::Method;
    pub use crate::request::{Body, Params, Query, Request};
    pub use crate::response::Response;
    pub use crate::route::Route;
    pub use crate::server::Server;
}
