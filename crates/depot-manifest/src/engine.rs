//! # Validator Engine
//!
//! Walks a raw document against the schema registry, applying field
//! rules, recursing into nested schemas, and consulting the license
//! source for SPDX checks.
//!
//! ## Modes
//!
//! The mode is an explicit parameter threaded through every recursive
//! call — never ambient state:
//!
//! - [`Mode::Strict`] — the first violation, in field-declaration
//!   order, aborts the whole pass. Nothing partial is returned.
//! - [`Mode::BestEffort`] — the pass always completes, producing a
//!   repaired document (a strict subset of the input) alongside every
//!   violation found. Invalid list items are dropped individually;
//!   atomic nested documents (authors, repository, examples) are
//!   dropped whole on any violation.
//!
//! ## Ordering
//!
//! Fields validate in declaration order and sequence items in original
//! order, with the item index attached to the error path at the point
//! of failure. Surviving items keep their relative order.

use serde_json::{Map, Value};

use crate::error::{ManifestError, RuleKind, ValidationError};
use crate::license::LicenseSource;
use crate::model::Manifest;
use crate::path::FieldPath;
use crate::rules::Rule;
use crate::schema::{FieldDescriptor, FieldType, SchemaBuildError, SchemaId, SchemaRegistry};

/// Validation semantics for a single pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Fail fast on the first violation.
    Strict,
    /// Repair the document, collecting every violation.
    BestEffort,
}

/// Ordered collection of violations from one validation pass.
///
/// Each entry carries its own field path, so the set doubles as the
/// per-field violations mapping: [`ViolationSet::for_field`] filters
/// by path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViolationSet {
    entries: Vec<ValidationError>,
}

impl ViolationSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation.
    pub fn push(&mut self, err: ValidationError) {
        self.entries.push(err);
    }

    /// Absorb another set, preserving order.
    pub fn extend(&mut self, other: ViolationSet) {
        self.entries.extend(other.entries);
    }

    /// Number of recorded violations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no violation was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all violations in detection order.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.entries.iter()
    }

    /// Violations attached to exactly the given field path.
    pub fn for_field<'a>(
        &'a self,
        field: &'a FieldPath,
    ) -> impl Iterator<Item = &'a ValidationError> {
        self.entries.iter().filter(move |e| e.field() == field)
    }

    /// Returns true if any violation is the retryable
    /// reference-data-unavailable kind.
    pub fn has_reference_unavailable(&self) -> bool {
        self.entries.iter().any(|e| e.is_reference_unavailable())
    }

    /// Consume the set, yielding the violations in detection order.
    pub fn into_vec(self) -> Vec<ValidationError> {
        self.entries
    }
}

impl std::fmt::Display for ViolationSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, err) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {err}")?;
        }
        Ok(())
    }
}

/// Outcome of a completed validation pass.
#[derive(Debug, Clone)]
pub struct Validated {
    /// The validated (strict) or repaired (best-effort) document.
    /// Always a strict subset of the input: entries are dropped, never
    /// added, and unknown keys never survive.
    pub document: Map<String, Value>,
    /// Every violation detected. Empty after a successful strict pass.
    pub violations: ViolationSet,
}

/// The manifest validation engine.
///
/// Holds the compiled schema registry and the license source used for
/// SPDX identifier checks. One validator can serve any number of
/// documents; each call operates on its own input and output copies,
/// so sharing a validator across threads is safe whenever `L` is.
pub struct ManifestValidator<L: LicenseSource> {
    registry: SchemaRegistry,
    licenses: L,
}

impl<L: LicenseSource> ManifestValidator<L> {
    /// Build a validator with the given license source.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaBuildError`] if the schema declarations fail to
    /// compile.
    pub fn new(licenses: L) -> Result<Self, SchemaBuildError> {
        Ok(Self {
            registry: SchemaRegistry::new()?,
            licenses,
        })
    }

    /// The schema registry backing this validator.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Validate a raw document in the given mode.
    ///
    /// Strict mode returns `Err` carrying the first violation in
    /// declaration order; best-effort always returns `Ok` with the
    /// repaired document and the full violation set.
    pub fn validate(&self, doc: &Value, mode: Mode) -> Result<Validated, ManifestError> {
        tracing::debug!(?mode, "validating manifest document");
        let mut violations = ViolationSet::new();
        let Some(input) = doc.as_object() else {
            let err = ValidationError::ConstraintViolation {
                field: FieldPath::root(),
                rule: RuleKind::Type,
                reason: "manifest document must be an object".to_string(),
            };
            return match mode {
                Mode::Strict => Err(err.into()),
                Mode::BestEffort => {
                    violations.push(err);
                    Ok(Validated {
                        document: Map::new(),
                        violations,
                    })
                }
            };
        };
        let document =
            self.validate_object(SchemaId::Manifest, input, &FieldPath::root(), mode, &mut violations)?;
        Ok(Validated {
            document,
            violations,
        })
    }

    /// Validate a package manifest (`title` carries no meaning).
    pub fn validate_package(&self, doc: &Value, mode: Mode) -> Result<Validated, ManifestError> {
        self.validate(doc, mode)
    }

    /// Validate a platform manifest (`title` is meaningful).
    ///
    /// Packages and platforms share one field catalogue, so this is
    /// the same pass as [`validate_package`](Self::validate_package);
    /// the split keeps the two call sites independent.
    pub fn validate_platform(&self, doc: &Value, mode: Mode) -> Result<Validated, ManifestError> {
        self.validate(doc, mode)
    }

    /// Strict-validate and decode into a typed [`Manifest`].
    pub fn load(&self, doc: &Value) -> Result<Manifest, ManifestError> {
        let validated = self.validate(doc, Mode::Strict)?;
        let manifest = serde_json::from_value(Value::Object(validated.document))?;
        Ok(manifest)
    }

    /// Validate one object against a schema, returning its repaired
    /// form.
    ///
    /// In strict mode the first violation is returned as `Err` and
    /// nothing is pushed to `out`; in best-effort mode this never
    /// returns `Err`.
    fn validate_object(
        &self,
        id: SchemaId,
        input: &Map<String, Value>,
        path: &FieldPath,
        mode: Mode,
        out: &mut ViolationSet,
    ) -> Result<Map<String, Value>, ValidationError> {
        let schema = self.registry.get(id);
        let mut repaired = Map::new();

        // Unknown input keys are not consulted at all: iterating the
        // schema, not the input, both ignores them and pins the
        // field-declaration order for strict fail-fast.
        for field in &schema.fields {
            let fpath = path.field(field.name);
            let value = match input.get(field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        emit(
                            mode,
                            out,
                            ValidationError::RequiredFieldMissing { field: fpath },
                        )?;
                    }
                    continue;
                }
                Some(value) => value,
            };

            match field.ty {
                FieldType::Str => {
                    let Some(s) = scalar_str(value, field.coerce_numeric) else {
                        emit(mode, out, type_violation(&fpath, "expected a string"))?;
                        continue;
                    };
                    if field.required && s.is_empty() {
                        emit(
                            mode,
                            out,
                            ValidationError::RequiredFieldMissing { field: fpath },
                        )?;
                        continue;
                    }
                    if let Some(err) = self.check_rules(field, &s, &fpath) {
                        emit(mode, out, err)?;
                        continue;
                    }
                    repaired.insert(field.name.to_string(), Value::String(s));
                }
                FieldType::Bool => {
                    let Value::Bool(b) = value else {
                        emit(mode, out, type_violation(&fpath, "expected a boolean"))?;
                        continue;
                    };
                    repaired.insert(field.name.to_string(), Value::Bool(*b));
                }
                FieldType::Object(sub) => {
                    let Some(obj) = value.as_object() else {
                        emit(mode, out, type_violation(&fpath, "expected an object"))?;
                        continue;
                    };
                    if let Some(nested) = self.validate_nested(sub, obj, &fpath, mode, out)? {
                        repaired.insert(field.name.to_string(), Value::Object(nested));
                    }
                }
                FieldType::StrList => {
                    let Some(items) = value.as_array() else {
                        emit(mode, out, type_violation(&fpath, "expected a list"))?;
                        continue;
                    };
                    let mut kept = Vec::with_capacity(items.len());
                    for (idx, item) in items.iter().enumerate() {
                        let ipath = fpath.index(idx);
                        let Some(s) = scalar_str(item, field.coerce_numeric) else {
                            emit(mode, out, type_violation(&ipath, "expected a string"))?;
                            continue;
                        };
                        if let Some(err) = self.check_rules(field, &s, &ipath) {
                            emit(mode, out, err)?;
                            continue;
                        }
                        kept.push(Value::String(s));
                    }
                    repaired.insert(field.name.to_string(), Value::Array(kept));
                }
                FieldType::ObjectList(sub) => {
                    let Some(items) = value.as_array() else {
                        emit(mode, out, type_violation(&fpath, "expected a list"))?;
                        continue;
                    };
                    let mut kept = Vec::with_capacity(items.len());
                    for (idx, item) in items.iter().enumerate() {
                        let ipath = fpath.index(idx);
                        let Some(obj) = item.as_object() else {
                            emit(mode, out, type_violation(&ipath, "expected an object"))?;
                            continue;
                        };
                        if let Some(nested) = self.validate_nested(sub, obj, &ipath, mode, out)? {
                            kept.push(Value::Object(nested));
                        }
                    }
                    repaired.insert(field.name.to_string(), Value::Array(kept));
                }
            }
        }

        Ok(repaired)
    }

    /// Validate a nested document at `path`, applying unit semantics.
    ///
    /// Returns `Ok(None)` when the nested document was dropped under
    /// best-effort repair (atomic schema with violations); its
    /// violations are wrapped as [`ValidationError::NestedValidationFailure`]
    /// so the caller's set pinpoints the offending element.
    fn validate_nested(
        &self,
        id: SchemaId,
        input: &Map<String, Value>,
        path: &FieldPath,
        mode: Mode,
        out: &mut ViolationSet,
    ) -> Result<Option<Map<String, Value>>, ValidationError> {
        match mode {
            Mode::Strict => {
                let nested = self
                    .validate_object(id, input, path, Mode::Strict, out)
                    .map_err(|cause| ValidationError::NestedValidationFailure {
                        field: path.clone(),
                        cause: Box::new(cause),
                    })?;
                Ok(Some(nested))
            }
            Mode::BestEffort => {
                let mut nested_out = ViolationSet::new();
                let nested =
                    self.validate_object(id, input, path, Mode::BestEffort, &mut nested_out)?;
                if self.registry.get(id).atomic && !nested_out.is_empty() {
                    // Validated as a unit: drop the whole document,
                    // surfacing each inner violation as a nested
                    // failure at this element.
                    for cause in nested_out.into_vec() {
                        out.push(ValidationError::NestedValidationFailure {
                            field: path.clone(),
                            cause: Box::new(cause),
                        });
                    }
                    Ok(None)
                } else {
                    out.extend(nested_out);
                    Ok(Some(nested))
                }
            }
        }
    }

    /// Run a field's rules against a scalar value, returning the first
    /// violation. The SPDX rule is routed through the license source;
    /// a fetch failure becomes the distinct reference-unavailable
    /// outcome rather than an invalid-value one.
    fn check_rules(
        &self,
        field: &FieldDescriptor,
        value: &str,
        fpath: &FieldPath,
    ) -> Option<ValidationError> {
        for rule in &field.rules {
            let err = match rule {
                Rule::SpdxLicense => match self.licenses.is_known(value) {
                    Ok(true) => None,
                    Ok(false) => Some(ValidationError::ConstraintViolation {
                        field: fpath.clone(),
                        rule: RuleKind::SpdxLicense,
                        reason: "unknown SPDX license identifier, see https://spdx.org/licenses/"
                            .to_string(),
                    }),
                    Err(cause) => Some(ValidationError::ReferenceDataUnavailable {
                        field: fpath.clone(),
                        cause: cause.to_string(),
                    }),
                },
                rule => rule
                    .check(value)
                    .err()
                    .map(|reason| ValidationError::ConstraintViolation {
                        field: fpath.clone(),
                        rule: rule.kind(),
                        reason,
                    }),
            };
            if err.is_some() {
                return err;
            }
        }
        None
    }
}

/// Strict mode aborts with the violation; best-effort records it and
/// lets the caller continue with the next field or item.
fn emit(mode: Mode, out: &mut ViolationSet, err: ValidationError) -> Result<(), ValidationError> {
    match mode {
        Mode::Strict => Err(err),
        Mode::BestEffort => {
            out.push(err);
            Ok(())
        }
    }
}

fn type_violation(field: &FieldPath, reason: &str) -> ValidationError {
    ValidationError::ConstraintViolation {
        field: field.clone(),
        rule: RuleKind::Type,
        reason: reason.to_string(),
    }
}

/// Extract a scalar string. Numbers are accepted only where the field
/// declares `coerce_numeric` (the `version` field); everywhere else a
/// non-string value is rejected so a repaired list stays a strict
/// subset of its input.
fn scalar_str(value: &Value, coerce_numeric: bool) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if coerce_numeric => Some(n.to_string()),
        _ => None,
    }
}
