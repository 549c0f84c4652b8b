//! Path canonicalization and pattern matching.
//!
//! Patterns are plain segment lists, no regex: a segment is either a literal
//! or a `:name` parameter that binds the incoming segment into the request
//! params. Matching is O(segments) and carries no specificity ranking;
//! precedence between overlapping patterns is decided purely by registration
//! order in the callout table.

use crate::error::PatternError;
use crate::request::Params;

/// Collapses any slash punctuation into the canonical `/`-rooted form:
/// no leading/trailing slash noise, no empty segments. `/hello/`, `hello`
/// and `//hello` all canonicalize to `/hello`; the empty path becomes `/`.
///
/// Idempotent: `canonicalize(canonicalize(p)) == canonicalize(p)`.
pub fn canonicalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Joins a parent prefix and a declared segment into one canonical path.
pub fn join(prefix: &str, segment: &str) -> String {
    canonicalize(&format!("{prefix}/{segment}"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled path matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compile a (possibly un-canonical) path into a matcher.
    pub fn parse(path: &str) -> Result<Pattern, PatternError> {
        let canonical = canonicalize(path);
        let mut segments = Vec::new();
        let mut names: Vec<&str> = Vec::new();

        for segment in canonical.split('/').filter(|s| !s.is_empty()) {
            match segment.strip_prefix(':') {
                Some("") => return Err(PatternError::EmptyParamName),
                Some(name) => {
                    if names.contains(&name) {
                        return Err(PatternError::DuplicateParam(name.to_string()));
                    }
                    names.push(name);
                    segments.push(Segment::Param(name.to_string()));
                }
                None => segments.push(Segment::Literal(segment.to_string())),
            }
        }
        Ok(Pattern { segments })
    }

    /// Match a request path, returning the parameter bindings on success.
    /// The incoming path is compared segment-wise after slash cleanup, so
    /// trailing-slash variants of the same path match identically.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let incoming: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if incoming.len() != self.segments.len() {
            return None;
        }

        let mut params = Params::new();
        for (segment, actual) in self.segments.iter().zip(incoming) {
            match segment {
                Segment::Literal(expected) if expected == actual => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), actual.to_string());
                }
            }
        }
        Some(params)
    }

    /// The canonical text form of this pattern.
    pub fn as_path(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            out.push('/');
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Param(name) => {
                    out.push(':');
                    out.push_str(name);
                }
            }
        }
        if out.is_empty() {
            out.push('/');
        }
        out
    }
}
