//! Crossbar facade crate.
//!
//! Re-exports the dispatch core and the hyper transport behind a single
//! entry point: declare routes, hand them to a [`Server`] with an
//! adapter, and `connect`.
//!
//! ```no_run
//! use crossbar::prelude::*;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), crossbar::core::LifecycleError> {
//! let routes = vec![Route::new(Method::Get, "/hello").handler_fn(
//!     |_req, mut res| async move {
//!         res.set_body(json!(["Hello"]));
//!         Ok(Flow::Continue(res))
//!     },
//! )];
//!
//! let mut server = Server::new(HyperAdapter::new(), routes);
//! server.connect(&ServerConfig::default()).await?;
//! # Ok(())
//! # }
//! ```

pub use crossbar_core as core;
#[cfg(feature = "http")]
pub use crossbar_http as http;

pub use crossbar_core::{
    Adapter, Flow, Handler, Method, Request, Response, Route, Server, ServerConfig,
};
#[cfg(feature = "http")]
pub use crossbar_http::HyperAdapter;

pub mod prelude {
    pub use crossbar_core::prelude::*;
    #[cfg(feature = "http")]
    pub use crossbar_http::prelude::*;
}
