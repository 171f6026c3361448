//! # Field Paths
//!
//! Dotted/indexed paths identifying where in a manifest document a
//! violation occurred, composed as `parent[.index].child` — e.g.
//! `authors[1].name` or `export.include[2]`.
//!
//! Paths are built incrementally during the recursive walk, so the
//! index is attached at the point of failure rather than reconstructed
//! from error messages afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A path to a field within a manifest document.
///
/// The root path is empty; [`FieldPath::field`] and
/// [`FieldPath::index`] derive child paths without mutating the
/// parent, so a path can be shared across sibling validations.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldPath(String);

impl FieldPath {
    /// The root of a document (empty path).
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Returns true if this is the document root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Derive the path of a named child field.
    pub fn field(&self, name: &str) -> Self {
        if self.0.is_empty() {
            Self(name.to_string())
        } else {
            Self(format!("{}.{name}", self.0))
        }
    }

    /// Derive the path of a sequence item.
    pub fn index(&self, idx: usize) -> Self {
        Self(format!("{}[{idx}]", self.0))
    }

    /// The path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "(root)")
        } else {
            f.write_str(&self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_empty() {
        let root = FieldPath::root();
        assert!(root.is_root());
        assert_eq!(root.as_str(), "");
        assert_eq!(root.to_string(), "(root)");
    }

    #[test]
    fn test_field_composition() {
        let path = FieldPath::root().field("repository").field("url");
        assert_eq!(path.as_str(), "repository.url");
    }

    #[test]
    fn test_index_composition() {
        let path = FieldPath::root().field("authors").index(1).field("name");
        assert_eq!(path.as_str(), "authors[1].name");
    }

    #[test]
    fn test_parent_unchanged_by_child_derivation() {
        let parent = FieldPath::root().field("export");
        let _child = parent.field("include");
        assert_eq!(parent.as_str(), "export");
    }
}
