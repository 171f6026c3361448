//! # Error Types — Validation Taxonomy
//!
//! Structured errors for manifest validation. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! Four violation kinds, and the distinction matters to callers:
//!
//! - `RequiredFieldMissing` / `ConstraintViolation` /
//!   `NestedValidationFailure` are permanent manifest defects.
//! - `ReferenceDataUnavailable` means the external license registry
//!   could not be reached — an infrastructure failure that a caller
//!   may retry. It is never folded into `ConstraintViolation`.

use std::fmt;

use thiserror::Error;

use crate::path::FieldPath;

/// Names the atomic rule that produced a [`ValidationError::ConstraintViolation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// String length bounds.
    Length,
    /// Anchored regular-expression match.
    Regexp,
    /// Membership in an explicit literal set.
    OneOf,
    /// Structural URL well-formedness.
    Url,
    /// Structural email well-formedness.
    Email,
    /// Semantic-version coercion.
    SemVer,
    /// SPDX license identifier membership.
    SpdxLicense,
    /// Value had the wrong JSON type for the field.
    Type,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuleKind::Length => "length",
            RuleKind::Regexp => "regexp",
            RuleKind::OneOf => "one-of",
            RuleKind::Url => "url",
            RuleKind::Email => "email",
            RuleKind::SemVer => "semver",
            RuleKind::SpdxLicense => "spdx-license",
            RuleKind::Type => "type",
        };
        f.write_str(name)
    }
}

/// A single validation violation, located by field path.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required field is absent, null, or an empty string.
    #[error("required field '{field}' is missing or empty")]
    RequiredFieldMissing {
        /// Path of the missing field.
        field: FieldPath,
    },

    /// A field value failed an atomic rule.
    #[error("field '{field}' failed {rule} check: {reason}")]
    ConstraintViolation {
        /// Path of the violating field.
        field: FieldPath,
        /// The rule that rejected the value.
        rule: RuleKind,
        /// Human-readable rejection reason.
        reason: String,
    },

    /// A nested document (author, repository, example) was itself invalid.
    #[error("invalid nested document at '{field}': {cause}")]
    NestedValidationFailure {
        /// Path of the nested document (including its index for list items).
        field: FieldPath,
        /// The underlying violation inside the nested document.
        cause: Box<ValidationError>,
    },

    /// The external reference registry could not be consulted.
    ///
    /// Distinct from an invalid value: the manifest may be perfectly
    /// fine, the lookup infrastructure was not.
    #[error("reference data unavailable while validating '{field}': {cause}")]
    ReferenceDataUnavailable {
        /// Path of the field whose validation needed external data.
        field: FieldPath,
        /// Description of the fetch failure.
        cause: String,
    },
}

impl ValidationError {
    /// The path of the field this violation is attached to.
    pub fn field(&self) -> &FieldPath {
        match self {
            ValidationError::RequiredFieldMissing { field }
            | ValidationError::ConstraintViolation { field, .. }
            | ValidationError::NestedValidationFailure { field, .. }
            | ValidationError::ReferenceDataUnavailable { field, .. } => field,
        }
    }

    /// Returns true for the retryable infrastructure-failure kind.
    pub fn is_reference_unavailable(&self) -> bool {
        matches!(self, ValidationError::ReferenceDataUnavailable { .. })
    }
}

/// Top-level error type for manifest validation entry points.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Strict-mode validation rejected the document.
    #[error("manifest validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A validated document could not be decoded into its typed form.
    ///
    /// The engine only decodes documents it has just validated, so
    /// this indicates a schema/model mismatch, not bad input.
    #[error("validated document could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}
