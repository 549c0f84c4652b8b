//! The mutable per-request response value.
//!
//! Handlers only stage status, headers and body; nothing touches the wire
//! until `commit` flushes the staged state through the adapter primitives
//! exactly once. The `misc` typemap is a handler-chain-scoped side channel
//! for passing values between handlers of one chain.

use crate::adapter::Adapter;
use crate::error::AdapterError;
use crate::request::Body;
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Chain-scoped side channel: a typed value store keyed by type.
///
/// No string keys; a chain that wants to hand several values of the same
/// type downstream wraps them in newtypes.
#[derive(Default)]
pub struct Misc {
    entries: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Misc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing any previous value of the same type.
    pub fn put<T: Send + Sync + 'static>(&mut self, value: T) {
        self.entries.insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref())
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.entries
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_mut())
    }

    /// Remove and return a value.
    pub fn take<T: 'static>(&mut self) -> Option<T> {
        self.entries
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast().ok())
            .map(|boxed| *boxed)
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }
}

impl std::fmt::Debug for Misc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Misc")
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// Staged outbound response. Owned by the dispatcher for the duration of
/// one request; handlers move it through the chain.
#[derive(Debug, Default)]
pub struct Response {
    /// `None` until a handler sets a status; commit defaults it to 200.
    status: Option<u16>,
    /// Flushed in insertion order; setting an existing name replaces the
    /// value in place.
    headers: Vec<(String, String)>,
    body: Body,
    misc: Misc,
    committed: bool,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    /// The staged status; `None` means no handler ever set one.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name, value)),
        }
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn set_body(&mut self, body: Body) {
        self.body = body;
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    pub fn misc(&self) -> &Misc {
        &self.misc
    }

    pub fn misc_mut(&mut self) -> &mut Misc {
        &mut self.misc
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Flush the staged status, then headers (insertion order), then body
    /// through the adapter. A second call is a warned no-op; the staged
    /// state is never re-transmitted.
    pub async fn commit<A: Adapter>(
        &mut self,
        adapter: &A,
        raw: &mut A::Raw,
    ) -> Result<(), AdapterError> {
        if self.committed {
            tracing::warn!("response already committed; ignoring repeated commit");
            return Ok(());
        }
        self.committed = true;

        if !adapter.set_status(self.status.unwrap_or(200), raw) {
            tracing::debug!(status = self.status, "adapter refused response status");
        }
        for (name, value) in &self.headers {
            if !adapter.set_header(name, value, raw) {
                tracing::debug!(header = %name, "adapter refused response header");
            }
        }
        adapter.send(std::mem::take(&mut self.body), raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_headers_keep_insertion_order_and_replace_in_place() {
        let mut res = Response::new();
        res.set_header("x-first", "1");
        res.set_header("x-second", "2");
        res.set_header("X-FIRST", "replaced");

        assert_eq!(
            res.headers(),
            &[
                ("x-first".to_string(), "replaced".to_string()),
                ("x-second".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_status_starts_unset() {
        let mut res = Response::new();
        assert_eq!(res.status(), None);
        res.set_status(204);
        assert_eq!(res.status(), Some(204));
    }

    #[test]
    fn test_misc_typemap() {
        struct Marker(u32);

        let mut res = Response::new();
        res.misc_mut().put(Marker(7));
        res.misc_mut().put("note".to_string());

        assert_eq!(res.misc().get::<Marker>().map(|m| m.0), Some(7));
        assert!(res.misc().contains::<String>());
        assert_eq!(res.misc_mut().take::<String>().as_deref(), Some("note"));
        assert!(!res.misc().contains::<String>());
    }

    #[test]
    fn test_body_staging() {
        let mut res = Response::new();
        assert_eq!(res.body(), &Body::Null);
        res.set_body(json!(["Hello"]));
        if let Body::Array(items) = res.body_mut() {
            items.push(json!("World"));
        }
        assert_eq!(res.body(), &json!(["Hello", "World"]));
    }
}
