//! Route compiler and callout table.
//!
//! Flattens a declaration tree into a per-method list of compiled routes,
//! built once at first connect and read-only afterwards. Within one method,
//! registration order (node before children, children in declared order) is
//! preserved and decides precedence: the first matching pattern wins, with
//! no most-specific-match heuristic.

use crate::error::CompileError;
use crate::handler::Handler;
use crate::method::Method;
use crate::path::{Pattern, join};
use crate::request::Params;
use crate::route::Route;
use std::collections::HashMap;
use std::sync::Arc;

/// One flattened `(method, pattern, handler chain)` entry.
pub struct CompiledRoute {
    pub method: Method,
    pub pattern: Pattern,
    /// The canonical declared path, kept for adapter registration and logs.
    pub path: String,
    pub handlers: Vec<Arc<dyn Handler>>,
}

impl std::fmt::Debug for CompiledRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledRoute")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// Method -> ordered compiled routes. Immutable after compilation.
#[derive(Debug, Default)]
pub struct CalloutTable {
    entries: HashMap<Method, Vec<CompiledRoute>>,
}

impl CalloutTable {
    /// Compile a batch of route declarations. Any malformed node aborts the
    /// whole batch; a partially filled table is never returned.
    pub fn compile(routes: &[Route]) -> Result<CalloutTable, CompileError> {
        let mut table = CalloutTable::default();
        for route in routes {
            table.add(route, "", None)?;
        }
        Ok(table)
    }

    fn add(
        &mut self,
        node: &Route,
        prefix: &str,
        inherited: Option<Method>,
    ) -> Result<(), CompileError> {
        let canonical = join(prefix, node.path());
        let method = node
            .method()
            .or(inherited)
            .ok_or_else(|| CompileError::MissingMethod {
                path: canonical.clone(),
            })?;

        // Only nodes carrying handlers become callouts; bare nodes are
        // path grouping for their children.
        if !node.handlers().is_empty() {
            let pattern = Pattern::parse(&canonical).map_err(|source| CompileError::Pattern {
                path: canonical.clone(),
                source,
            })?;
            tracing::debug!(%method, path = %canonical, handlers = node.handlers().len(), "compiled route");
            self.entries.entry(method).or_default().push(CompiledRoute {
                method,
                pattern,
                path: canonical.clone(),
                handlers: node.handlers().to_vec(),
            });
        }

        for child in node.children() {
            self.add(child, &canonical, Some(method))?;
        }
        Ok(())
    }

    /// First compiled route (in registration order) whose pattern matches,
    /// together with its parameter bindings. `None` covers both "method not
    /// registered at all" and "no pattern matched".
    pub fn find(&self, method: Method, path: &str) -> Option<(&CompiledRoute, Params)> {
        self.entries
            .get(&method)?
            .iter()
            .find_map(|route| route.pattern.matches(path).map(|params| (route, params)))
    }

    /// All compiled routes, ordered within each method.
    pub fn routes(&self) -> impl Iterator<Item = &CompiledRoute> {
        self.entries.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Flow, handler_fn};
    use std::sync::Arc;

    fn noop() -> Arc<dyn Handler> {
        handler_fn(|_req, res| async move { Ok(Flow::Continue(res)) })
    }

    #[test]
    fn test_nested_paths_join_canonically() {
        let routes = vec![
            Route::new(Method::Get, "/hello/")
                .handler_arc(noop())
                .child(Route::nested("world//").handler_arc(noop())),
        ];
        let table = CalloutTable::compile(&routes).unwrap();

        assert_eq!(table.len(), 2);
        assert!(table.find(Method::Get, "/hello").is_some());
        let (route, _) = table.find(Method::Get, "/hello/world").unwrap();
        assert_eq!(route.path, "/hello/world");
    }

    #[test]
    fn test_children_inherit_method() {
        let routes =
            vec![Route::new(Method::Post, "a").child(Route::nested("b").handler_arc(noop()))];
        let table = CalloutTable::compile(&routes).unwrap();

        assert!(table.find(Method::Post, "/a/b").is_some());
        assert!(table.find(Method::Get, "/a/b").is_none());
    }

    #[test]
    fn test_bare_grouping_node_contributes_no_callout() {
        let routes = vec![Route::new(Method::Get, "/group")];
        let table = CalloutTable::compile(&routes).unwrap();
        assert!(table.is_empty());
        assert!(table.find(Method::Get, "/group").is_none());
    }

    #[test]
    fn test_registration_order_decides_precedence() {
        let routes = vec![
            Route::new(Method::Get, "/:value").handler_arc(noop()),
            Route::new(Method::Get, "/literal").handler_arc(noop()),
        ];
        let table = CalloutTable::compile(&routes).unwrap();

        // Both match "/literal"; the first declared wins, no specificity
        // ranking.
        let (route, params) = table.find(Method::Get, "/literal").unwrap();
        assert_eq!(route.path, "/:value");
        assert_eq!(params.get("value").map(String::as_str), Some("literal"));
    }

    #[test]
    fn test_self_before_children_order() {
        let routes = vec![
            Route::new(Method::Get, "/x")
                .handler_arc(noop())
                .child(Route::nested("/:rest").handler_arc(noop())),
        ];
        let table = CalloutTable::compile(&routes).unwrap();
        let paths: Vec<&str> = table.routes().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/x", "/x/:rest"]);
    }

    #[test]
    fn test_root_without_method_aborts_batch() {
        let routes = vec![
            Route::new(Method::Get, "/ok").handler_arc(noop()),
            Route::nested("/orphan").handler_arc(noop()),
        ];
        let err = CalloutTable::compile(&routes).unwrap_err();
        assert_eq!(
            err,
            CompileError::MissingMethod {
                path: "/orphan".to_string()
            }
        );
    }

    #[test]
    fn test_bad_pattern_aborts_batch() {
        let routes = vec![Route::new(Method::Get, "/a/:").handler_arc(noop())];
        assert!(matches!(
            CalloutTable::compile(&routes),
            Err(CompileError::Pattern { .. })
        ));
    }
}
