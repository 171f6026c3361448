//! # Manifest Data Model
//!
//! Typed representation of a validated manifest. These structs are
//! decoded *after* validation — the engine walks the raw document,
//! drops or rejects offending entries, and only then deserializes into
//! `Manifest`. A best-effort repair that removed a required field
//! stays a raw document; only documents with `name` and `version`
//! intact become a `Manifest`.
//!
//! Downstream consumers (build-system integration) read these structs
//! and never mutate them.

use serde::{Deserialize, Serialize};

/// A validated package or platform manifest.
///
/// `title` is only meaningful for platform manifests; packages carry
/// the same schema and simply never set it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Package name, 1–100 characters.
    pub name: String,
    /// Semantic version, possibly coerced from a two-component form.
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    /// SPDX license identifier, verified against the license registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    /// Platform-manifest display title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<Repository>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<Export>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Author>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Example>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frameworks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub system: Vec<String>,
}

/// A package author. Validated as a unit: an author entry with any
/// invalid field is dropped whole under best-effort repair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    /// Author name, 1–50 characters.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Whether this author maintains the package. Defaults to false.
    #[serde(default)]
    pub maintainer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Version-control system kinds accepted for `repository.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryKind {
    Git,
    Hg,
    Svn,
}

/// Source repository location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    /// VCS kind (`git`, `hg`, or `svn` on the wire).
    #[serde(rename = "type")]
    pub kind: RepositoryKind,
    /// Repository URL, 1–255 characters.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// File-set selection for packaging.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Export {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

/// A bundled example. Validated as a unit, like [`Author`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    /// Example name, `[a-zA-Z0-9-_/]` characters only.
    pub name: String,
    /// Base directory the example files are relative to.
    pub base: String,
    /// Files making up the example.
    pub files: Vec<String>,
}
