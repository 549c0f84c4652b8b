//! HTTP transport for the Crossbar dispatch core, built directly on
//! hyper 1.0. `HyperAdapter` implements the core's `Adapter` contract:
//! the core compiles and dispatches, this crate accepts connections and
//! speaks the wire.

pub mod adapter;
pub mod exchange;

pub use adapter::HyperAdapter;
pub use exchange::HttpExchange;

pub mod prelude {
    pub use crate::adapter::HyperAdapter;
}
