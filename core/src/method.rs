use serde::{Deserialize, Serialize};
use std::fmt;

/// The request methods the dispatch core routes on.
///
/// PUT is intentionally absent: whether PUT folds into PATCH is an adapter
/// configuration choice, not a core invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub const ALL: [Method; 4] = [Method::Get, Method::Post, Method::Patch, Method::Delete];

    /// Case-insensitive lookup by wire name. Unknown names yield `None`;
    /// adapters decide what (if anything) to map them to.
    pub fn from_name(name: &str) -> Option<Method> {
        match name.to_ascii_uppercase().as_str() {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PATCH" => Some(Method::Patch),
            "DELETE" => Some(Method::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(Method::from_name("get"), Some(Method::Get));
        assert_eq!(Method::from_name("DELETE"), Some(Method::Delete));
        assert_eq!(Method::from_name("PUT"), None);
        assert_eq!(Method::from_name(""), None);
    }
}
