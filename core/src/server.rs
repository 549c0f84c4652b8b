//! Lifecycle controller: compile-once route setup and the
//! connect/disconnect state machine gating the adapter.

use crate::adapter::{Adapter, ServerConfig};
use crate::dispatch::Dispatcher;
use crate::error::LifecycleError;
use crate::route::Route;
use crate::table::CalloutTable;
use std::sync::Arc;

/// `Uncompiled -> Compiled -> Connected`, with `disconnect` returning to
/// `Compiled` (routes stay compiled; a reconnect does not recompile).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Uncompiled,
    Compiled,
    Connected,
}

/// One server instance: a route declaration, an adapter and the compiled
/// callout table the two share.
pub struct Server<A: Adapter> {
    adapter: Arc<A>,
    routes: Vec<Route>,
    table: Option<Arc<CalloutTable>>,
    /// How many compiled routes the adapter has accepted so far. A connect
    /// that fails mid-registration leaves this short of the table length;
    /// the next attempt resumes from the first unregistered route instead
    /// of re-registering the accepted ones.
    registered: usize,
    state: Lifecycle,
}

impl<A: Adapter> Server<A> {
    pub fn new(adapter: A, routes: Vec<Route>) -> Self {
        Self {
            adapter: Arc::new(adapter),
            routes,
            table: None,
            registered: 0,
            state: Lifecycle::Uncompiled,
        }
    }

    pub fn adapter(&self) -> &Arc<A> {
        &self.adapter
    }

    pub fn is_connected(&self) -> bool {
        self.state == Lifecycle::Connected
    }

    /// Compile the routes (first connect only), register every callout with
    /// the adapter, then start the transport. Fails when already connected;
    /// an explicit `disconnect` is required before reconnecting. A connect
    /// that failed partway through registration may be retried; only the
    /// routes the adapter has not yet accepted are offered again.
    pub async fn connect(&mut self, config: &ServerConfig) -> Result<(), LifecycleError> {
        if self.state == Lifecycle::Connected {
            return Err(LifecycleError::AlreadyConnected);
        }

        let table = match &self.table {
            Some(table) => Arc::clone(table),
            None => {
                let table = Arc::new(CalloutTable::compile(&self.routes)?);
                self.table = Some(Arc::clone(&table));
                self.registered = 0;
                self.state = Lifecycle::Compiled;
                table
            }
        };

        if self.registered < table.len() {
            let dispatcher =
                Arc::new(Dispatcher::new(Arc::clone(&table), Arc::clone(&self.adapter)));
            for callout in table.routes().skip(self.registered) {
                let adapter_path = self.adapter.transform_path(&callout.path);
                let accepted = self
                    .adapter
                    .register_route(callout.method, adapter_path, dispatcher.entry())
                    .await?;
                if !accepted {
                    return Err(LifecycleError::RouteRejected {
                        path: callout.path.clone(),
                    });
                }
                self.registered += 1;
            }
            tracing::info!(routes = table.len(), "routes compiled and registered");
        }

        self.adapter.start(config).await?;
        self.state = Lifecycle::Connected;
        Ok(())
    }

    /// Stop the transport. Fails when not connected. The compiled table is
    /// kept for a later reconnect.
    pub async fn disconnect(&mut self) -> Result<(), LifecycleError> {
        if self.state != Lifecycle::Connected {
            return Err(LifecycleError::NotConnected);
        }
        self.adapter.stop().await?;
        self.state = Lifecycle::Compiled;
        Ok(())
    }
}
