//! # depot-manifest — Manifest Validation Engine
//!
//! Validates redistributable package manifests (and their platform
//! variant) against a declarative field schema. The engine runs in one
//! of two modes:
//!
//! - **Strict** — fail-fast: the first violation, in field-declaration
//!   order, aborts the pass and is returned as a single structured
//!   error. No partial document is produced.
//! - **Best-effort** — never aborts: every detectable violation is
//!   collected, and a *repaired* document is built by dropping only
//!   the offending entries. List fields keep their surviving items in
//!   original order; nested entities (authors, examples) are dropped
//!   whole when any of their fields is invalid.
//!
//! ## Trust Boundary
//!
//! Input documents come from untrusted manifest files. Validation is
//! the boundary: downstream consumers (build-system integration) only
//! ever see a validated or repaired document, never raw input. Unknown
//! keys are ignored so that forward-compatible manifests keep loading.
//!
//! ## License Registry Seam
//!
//! The `license` field is checked against an external SPDX identifier
//! registry through the [`LicenseSource`] trait. A failed registry
//! fetch is surfaced as [`ValidationError::ReferenceDataUnavailable`],
//! deliberately distinct from an invalid identifier, so callers can
//! retry infrastructure failures instead of rejecting the manifest.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `depot-*` crates (leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod engine;
pub mod error;
pub mod license;
pub mod model;
pub mod path;
pub mod rules;
pub mod schema;

// Re-export primary types for ergonomic imports.
pub use engine::{ManifestValidator, Mode, Validated, ViolationSet};
pub use error::{ManifestError, RuleKind, ValidationError};
pub use license::{LicenseSource, ReferenceUnavailable, StaticLicenseSource};
pub use model::{Author, Example, Export, Manifest, Repository, RepositoryKind};
pub use path::FieldPath;
pub use schema::{SchemaBuildError, SchemaId, SchemaRegistry};
