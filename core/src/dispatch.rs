//! Per-request dispatch.
//!
//! One request moves through `Matching -> Running(i) -> {Completed | Failed}
//! -> Sent`; `Sent` is terminal. Whatever path a request takes (success,
//! routing miss, handler fault) exactly one response leaves through the
//! adapter, and one failing request never affects the callout table or any
//! concurrently in-flight request.

use crate::adapter::{Adapter, DispatchEntry};
use crate::error::DispatchError;
use crate::handler::Flow;
use crate::request::{Body, Request};
use crate::response::Response;
use crate::table::CalloutTable;
use std::sync::Arc;

/// Matches inbound requests against the compiled table and runs the matched
/// handler chain. Shared by all in-flight requests; holds no per-request
/// state.
pub struct Dispatcher<A: Adapter> {
    table: Arc<CalloutTable>,
    adapter: Arc<A>,
}

impl<A: Adapter> Dispatcher<A> {
    pub fn new(table: Arc<CalloutTable>, adapter: Arc<A>) -> Self {
        Self { table, adapter }
    }

    /// Handle one inbound request. The returned error reports what went
    /// wrong for observability; the failure response has already been sent
    /// by the time it is returned.
    pub async fn dispatch(&self, raw: &mut A::Raw) -> Result<(), DispatchError> {
        let Some(method) = self.adapter.method(raw) else {
            return self.reject(raw, DispatchError::NoMethod).await;
        };
        let path = self.adapter.path(raw);

        let Some((callout, bound)) = self.table.find(method, &path) else {
            return self.reject(raw, DispatchError::NoCallout).await;
        };
        if callout.handlers.is_empty() {
            return self.reject(raw, DispatchError::NoCallout).await;
        }

        // The transport's own param extraction wins; the table's bindings
        // cover transports without a native router.
        let mut params = self.adapter.params(raw);
        if params.is_empty() {
            params = bound;
        }

        let req = Arc::new(Request::new(
            method,
            path.clone(),
            self.adapter.headers(raw),
            params,
            self.adapter.query(raw),
            self.adapter.body(raw),
        ));

        let mut res = Response::new();
        for (index, handler) in callout.handlers.iter().enumerate() {
            match handler.call(Arc::clone(&req), res).await {
                Ok(Flow::Continue(next)) => res = next,
                Ok(Flow::Halt(next)) => {
                    res = next;
                    break;
                }
                Err(err) => {
                    tracing::debug!(%method, %path, index, error = %err, "handler failed");
                    return self
                        .reject(raw, DispatchError::CalloutFailed(err.to_string()))
                        .await;
                }
            }
        }

        res.commit(self.adapter.as_ref(), raw).await?;
        tracing::debug!(%method, %path, "request completed");
        Ok(())
    }

    /// Send the single failure response for a request that never completed
    /// its chain, then surface the original error.
    async fn reject(&self, raw: &mut A::Raw, err: DispatchError) -> Result<(), DispatchError> {
        let mut res = Response::new();
        res.set_status(err.status());
        res.set_body(Body::String(err.to_string()));

        if let Err(send_err) = res.commit(self.adapter.as_ref(), raw).await {
            tracing::error!(error = %send_err, "failed to transmit failure response");
            return Err(DispatchError::Adapter(send_err));
        }
        Err(err)
    }

    /// The entry point handed to the adapter at route registration.
    pub fn entry(self: &Arc<Self>) -> DispatchEntry<A::Raw> {
        let dispatcher = Arc::clone(self);
        Arc::new(move |raw| {
            let dispatcher = Arc::clone(&dispatcher);
            Box::pin(async move {
                if let Err(err) = dispatcher.dispatch(raw).await {
                    tracing::debug!(error = %err, "request rejected");
                }
            })
        })
    }
}
