//! Handler contract for one link of a route's chain.
//!
//! There is no `next` callback: the dispatcher owns the chain loop and each
//! handler reports how to proceed through `Flow`. The response moves through
//! the chain by value, so a handler either returns it (possibly mutated) or
//! fails and forfeits it.

use crate::request::Request;
use crate::response::Response;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// What the chain should do after one handler settles.
#[derive(Debug)]
pub enum Flow {
    /// Run the next handler (or commit, when this was the last one).
    Continue(Response),
    /// Stop the chain early and commit immediately.
    Halt(Response),
}

/// Result of a single handler. A failure stops the chain and produces a
/// single internal-error response carrying the error's message.
pub type HandlerResult = anyhow::Result<Flow>;

/// One link in a route's handler chain.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn call(&self, req: Arc<Request>, res: Response) -> HandlerResult;
}

/// Adapter turning an async closure into a [`Handler`].
pub struct FnHandler<F>(F);

impl<F> FnHandler<F> {
    pub fn new(f: F) -> Self {
        FnHandler(f)
    }
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Arc<Request>, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn call(&self, req: Arc<Request>, res: Response) -> HandlerResult {
        (self.0)(req, res).await
    }
}

/// Wrap an async closure as a shared handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn Handler>
where
    F: Fn(Arc<Request>, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(FnHandler(f))
}
