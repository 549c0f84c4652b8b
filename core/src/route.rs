//! Route declaration tree: the caller-authored input contract.
//!
//! A declaration is pure data: method (required only at the root, inherited
//! by all descendants), a path segment, an ordered handler chain and nested
//! children. The core never mutates a declaration after construction; the
//! compiler only reads it.

use crate::handler::{FnHandler, Handler, HandlerResult};
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// One node of a route declaration tree.
///
/// A node with no handlers and no children is legal (pure path grouping)
/// but contributes nothing to the compiled table.
pub struct Route {
    method: Option<Method>,
    path: String,
    handlers: Vec<Arc<dyn Handler>>,
    children: Vec<Route>,
}

impl Route {
    /// A root route. Descendants inherit the method unless they carry
    /// their own.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method: Some(method),
            path: path.into(),
            handlers: Vec::new(),
            children: Vec::new(),
        }
    }

    /// A child route that inherits its method from the nearest ancestor.
    pub fn nested(path: impl Into<String>) -> Self {
        Self {
            method: None,
            path: path.into(),
            handlers: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Append a handler to this node's chain.
    pub fn handler<H: Handler>(mut self, handler: H) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Append an already-shared handler to this node's chain.
    pub fn handler_arc(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Append an async closure to this node's chain.
    pub fn handler_fn<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Arc<Request>, Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handler(FnHandler::new(f))
    }

    /// Nest a sub-route under this node.
    pub fn child(mut self, route: Route) -> Self {
        self.children.push(route);
        self
    }

    pub fn method(&self) -> Option<Method> {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn handlers(&self) -> &[Arc<dyn Handler>] {
        &self.handlers
    }

    pub fn children(&self) -> &[Route] {
        &self.children
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("handlers", &self.handlers.len())
            .field("children", &self.children)
            .finish()
    }
}
