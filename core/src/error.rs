//! Error taxonomy for compilation, dispatch and lifecycle.
//!
//! Request-scoped failures (`DispatchError`) are reported once per request
//! and never tear down the server. `CompileError` is startup-scoped and
//! fatal to `connect`.

use thiserror::Error;

/// A malformed route declaration. Aborts the whole compilation batch;
/// partial registration is never reported as success.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("route `{path}` has no method and no ancestor to inherit one from")]
    MissingMethod { path: String },

    #[error("route `{path}` is not a matchable pattern")]
    Pattern {
        path: String,
        #[source]
        source: PatternError,
    },
}

/// A path pattern that cannot be compiled into a matcher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("parameter segment `:` has no name")]
    EmptyParamName,

    #[error("parameter `:{0}` appears more than once")]
    DuplicateParam(String),
}

/// Per-request dispatch failure. The display strings double as the failure
/// response bodies.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The adapter could not classify the request method.
    #[error("No request method")]
    NoMethod,

    /// No compiled route matches method+path, or the matched chain is empty.
    #[error("No callout")]
    NoCallout,

    /// A handler in the matched chain failed; carries the handler's message.
    #[error("{0}")]
    CalloutFailed(String),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

impl DispatchError {
    /// HTTP status for the failure response: routing misses are
    /// precondition-failed class, handler faults are internal-error class.
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::NoMethod | DispatchError::NoCallout => 412,
            DispatchError::CalloutFailed(_) | DispatchError::Adapter(_) => 500,
        }
    }
}

/// Failure reported by an adapter primitive.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("adapter transport error: {0}")]
    Transport(String),

    #[error("adapter is not running")]
    NotRunning,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure of `connect`/`disconnect`.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("server is already connected")]
    AlreadyConnected,

    #[error("server is not connected")]
    NotConnected,

    #[error("route compilation failed")]
    Compile(#[from] CompileError),

    #[error("adapter rejected route `{path}`")]
    RouteRejected { path: String },

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}
