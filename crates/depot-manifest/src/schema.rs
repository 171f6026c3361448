//! # Schema Registry — Declarative Field Catalogue
//!
//! Fully declared, data-only descriptions of every manifest flavor:
//! the top-level manifest plus its nested author, repository, export,
//! and example documents. The engine does nothing but look schemas up
//! here, so error messages are reproducible byte-for-byte for a given
//! schema version.
//!
//! One schema serves both package and platform manifests — they share
//! the field catalogue, with `title` only meaningful for platforms.
//! Unknown input keys are not part of any schema and are ignored by
//! the engine, keeping forward-compatible manifests loadable.
//!
//! All regular expressions are compiled when the registry is built;
//! a pattern that fails to compile is a startup error, never a
//! per-document one.

use regex::Regex;
use thiserror::Error;

use crate::rules::Rule;

/// Stable identifier of a (sub-)schema. Nested schemas are referenced
/// by id, not by live object graphs, so there is no cyclic ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaId {
    /// Top-level package/platform manifest.
    Manifest,
    /// `authors` list items.
    Author,
    /// `repository` object.
    Repository,
    /// `export` object.
    Export,
    /// `examples` list items.
    Example,
}

/// The shape a field's value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// A string scalar.
    Str,
    /// A boolean scalar.
    Bool,
    /// A nested object validated against the referenced sub-schema.
    Object(SchemaId),
    /// An ordered sequence of strings; field rules apply per item.
    StrList,
    /// An ordered sequence of objects, each validated against the
    /// referenced sub-schema.
    ObjectList(SchemaId),
}

/// Declaration of a single schema field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Wire name of the field.
    pub name: &'static str,
    /// Whether the field must be present and non-empty.
    pub required: bool,
    /// Accept numeric input for a string field, coercing it to its
    /// decimal rendering. Declared only for `version` (YAML manifests
    /// routinely carry `version: 1.2` as a number); everywhere else a
    /// non-string value is a type violation.
    pub coerce_numeric: bool,
    /// Expected value shape.
    pub ty: FieldType,
    /// Ordered rules applied to the value (or to each list item).
    pub rules: Vec<Rule>,
}

/// A complete schema: ordered fields plus unit semantics.
#[derive(Debug, Clone)]
pub struct SchemaDef {
    /// Identifier of this schema.
    pub id: SchemaId,
    /// When true, a document of this schema is valid only as a whole:
    /// under best-effort repair any violation drops the entire
    /// document (authors, repositories, examples). Non-atomic schemas
    /// (manifest, export) are salvaged field by field.
    pub atomic: bool,
    /// Fields in declaration order — strict mode fails on the first
    /// violation in this order.
    pub fields: Vec<FieldDescriptor>,
}

impl SchemaDef {
    /// Look up a field descriptor by wire name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A schema declaration failed to build (bad regular expression).
#[derive(Error, Debug)]
#[error("schema '{schema}' field '{field}': invalid pattern: {source}")]
pub struct SchemaBuildError {
    /// Schema being declared.
    pub schema: &'static str,
    /// Field whose pattern failed to compile.
    pub field: &'static str,
    /// Underlying regex error.
    #[source]
    pub source: regex::Error,
}

/// The registry of all manifest schemas, built once at startup.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    manifest: SchemaDef,
    author: SchemaDef,
    repository: SchemaDef,
    export: SchemaDef,
    example: SchemaDef,
}

impl SchemaRegistry {
    /// Declare and compile all schemas.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaBuildError`] if any declared regular expression
    /// fails to compile.
    pub fn new() -> Result<Self, SchemaBuildError> {
        Ok(Self {
            manifest: manifest_schema()?,
            author: author_schema()?,
            repository: repository_schema()?,
            export: export_schema()?,
            example: example_schema()?,
        })
    }

    /// Infallible lookup by schema id.
    pub fn get(&self, id: SchemaId) -> &SchemaDef {
        match id {
            SchemaId::Manifest => &self.manifest,
            SchemaId::Author => &self.author,
            SchemaId::Repository => &self.repository,
            SchemaId::Export => &self.export,
            SchemaId::Example => &self.example,
        }
    }
}

fn pattern(
    schema: &'static str,
    field: &'static str,
    pattern: &str,
    allowed: &'static str,
) -> Result<Rule, SchemaBuildError> {
    let regex = Regex::new(pattern).map_err(|source| SchemaBuildError {
        schema,
        field,
        source,
    })?;
    Ok(Rule::Regexp { regex, allowed })
}

fn manifest_schema() -> Result<SchemaDef, SchemaBuildError> {
    let fields = vec![
        FieldDescriptor {
            name: "name",
            required: true,
            coerce_numeric: false,
            ty: FieldType::Str,
            rules: vec![Rule::Length { min: 1, max: 100 }],
        },
        FieldDescriptor {
            name: "version",
            required: true,
            coerce_numeric: true,
            ty: FieldType::Str,
            rules: vec![Rule::Length { min: 1, max: 50 }, Rule::SemVer],
        },
        FieldDescriptor {
            name: "authors",
            required: false,
            coerce_numeric: false,
            ty: FieldType::ObjectList(SchemaId::Author),
            rules: vec![],
        },
        FieldDescriptor {
            name: "description",
            required: false,
            coerce_numeric: false,
            ty: FieldType::Str,
            rules: vec![Rule::Length { min: 1, max: 1000 }],
        },
        FieldDescriptor {
            name: "homepage",
            required: false,
            coerce_numeric: false,
            ty: FieldType::Str,
            rules: vec![Rule::Url, Rule::Length { min: 1, max: 255 }],
        },
        FieldDescriptor {
            name: "license",
            required: false,
            coerce_numeric: false,
            ty: FieldType::Str,
            rules: vec![Rule::Length { min: 1, max: 255 }, Rule::SpdxLicense],
        },
        FieldDescriptor {
            name: "repository",
            required: false,
            coerce_numeric: false,
            ty: FieldType::Object(SchemaId::Repository),
            rules: vec![],
        },
        FieldDescriptor {
            name: "export",
            required: false,
            coerce_numeric: false,
            ty: FieldType::Object(SchemaId::Export),
            rules: vec![],
        },
        FieldDescriptor {
            name: "examples",
            required: false,
            coerce_numeric: false,
            ty: FieldType::ObjectList(SchemaId::Example),
            rules: vec![],
        },
        FieldDescriptor {
            name: "keywords",
            required: false,
            coerce_numeric: false,
            ty: FieldType::StrList,
            rules: vec![
                Rule::Length { min: 1, max: 50 },
                pattern("manifest", "keywords", r"^[a-z\d\-\+\. ]+$", "[a-z0-9-+. ]")?,
            ],
        },
        FieldDescriptor {
            name: "platforms",
            required: false,
            coerce_numeric: false,
            ty: FieldType::StrList,
            rules: vec![
                Rule::Length { min: 1, max: 50 },
                pattern("manifest", "platforms", r"^([a-z\d\-_]+|\*)$", "[a-z0-9-_*]")?,
            ],
        },
        FieldDescriptor {
            name: "frameworks",
            required: false,
            coerce_numeric: false,
            ty: FieldType::StrList,
            rules: vec![
                Rule::Length { min: 1, max: 50 },
                pattern("manifest", "frameworks", r"^([a-z\d\-_]+|\*)$", "[a-z0-9-_*]")?,
            ],
        },
        FieldDescriptor {
            name: "title",
            required: false,
            coerce_numeric: false,
            ty: FieldType::Str,
            rules: vec![Rule::Length { min: 1, max: 100 }],
        },
        FieldDescriptor {
            name: "system",
            required: false,
            coerce_numeric: false,
            ty: FieldType::StrList,
            rules: vec![
                Rule::Length { min: 1, max: 50 },
                pattern("manifest", "system", r"^[a-z\d\-_]+$", "[a-z0-9-_]")?,
            ],
        },
    ];
    Ok(SchemaDef {
        id: SchemaId::Manifest,
        atomic: false,
        fields,
    })
}

fn author_schema() -> Result<SchemaDef, SchemaBuildError> {
    Ok(SchemaDef {
        id: SchemaId::Author,
        atomic: true,
        fields: vec![
            FieldDescriptor {
                name: "name",
                required: true,
                coerce_numeric: false,
                ty: FieldType::Str,
                rules: vec![Rule::Length { min: 1, max: 50 }],
            },
            FieldDescriptor {
                name: "email",
                required: false,
                coerce_numeric: false,
                ty: FieldType::Str,
                rules: vec![Rule::Email, Rule::Length { min: 1, max: 50 }],
            },
            FieldDescriptor {
                name: "maintainer",
                required: false,
                coerce_numeric: false,
                ty: FieldType::Bool,
                rules: vec![],
            },
            FieldDescriptor {
                name: "url",
                required: false,
                coerce_numeric: false,
                ty: FieldType::Str,
                rules: vec![Rule::Url, Rule::Length { min: 1, max: 255 }],
            },
        ],
    })
}

fn repository_schema() -> Result<SchemaDef, SchemaBuildError> {
    Ok(SchemaDef {
        id: SchemaId::Repository,
        atomic: true,
        fields: vec![
            FieldDescriptor {
                name: "type",
                required: true,
                coerce_numeric: false,
                ty: FieldType::Str,
                rules: vec![Rule::OneOf {
                    choices: &["git", "hg", "svn"],
                }],
            },
            FieldDescriptor {
                name: "url",
                required: true,
                coerce_numeric: false,
                ty: FieldType::Str,
                rules: vec![Rule::Length { min: 1, max: 255 }],
            },
            FieldDescriptor {
                name: "branch",
                required: false,
                coerce_numeric: false,
                ty: FieldType::Str,
                rules: vec![Rule::Length { min: 1, max: 50 }],
            },
        ],
    })
}

fn export_schema() -> Result<SchemaDef, SchemaBuildError> {
    Ok(SchemaDef {
        id: SchemaId::Export,
        atomic: false,
        fields: vec![
            FieldDescriptor {
                name: "include",
                required: false,
                coerce_numeric: false,
                ty: FieldType::StrList,
                rules: vec![],
            },
            FieldDescriptor {
                name: "exclude",
                required: false,
                coerce_numeric: false,
                ty: FieldType::StrList,
                rules: vec![],
            },
        ],
    })
}

fn example_schema() -> Result<SchemaDef, SchemaBuildError> {
    Ok(SchemaDef {
        id: SchemaId::Example,
        atomic: true,
        fields: vec![
            FieldDescriptor {
                name: "name",
                required: true,
                coerce_numeric: false,
                ty: FieldType::Str,
                rules: vec![
                    Rule::Length { min: 1, max: 100 },
                    pattern("example", "name", r"^[a-zA-Z\d\-\_/]+$", "[a-zA-Z0-9-_/]")?,
                ],
            },
            FieldDescriptor {
                name: "base",
                required: true,
                coerce_numeric: false,
                ty: FieldType::Str,
                rules: vec![],
            },
            FieldDescriptor {
                name: "files",
                required: true,
                coerce_numeric: false,
                ty: FieldType::StrList,
                rules: vec![],
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_builds() {
        let registry = SchemaRegistry::new().unwrap();
        assert_eq!(registry.get(SchemaId::Manifest).fields.len(), 14);
        assert_eq!(registry.get(SchemaId::Author).fields.len(), 4);
        assert_eq!(registry.get(SchemaId::Repository).fields.len(), 3);
        assert_eq!(registry.get(SchemaId::Export).fields.len(), 2);
        assert_eq!(registry.get(SchemaId::Example).fields.len(), 3);
    }

    #[test]
    fn test_manifest_declaration_order() {
        let registry = SchemaRegistry::new().unwrap();
        let names: Vec<&str> = registry
            .get(SchemaId::Manifest)
            .fields
            .iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(
            names,
            [
                "name",
                "version",
                "authors",
                "description",
                "homepage",
                "license",
                "repository",
                "export",
                "examples",
                "keywords",
                "platforms",
                "frameworks",
                "title",
                "system",
            ]
        );
    }

    #[test]
    fn test_required_fields() {
        let registry = SchemaRegistry::new().unwrap();
        let manifest = registry.get(SchemaId::Manifest);
        let required: Vec<&str> = manifest
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();
        assert_eq!(required, ["name", "version"]);
    }

    #[test]
    fn test_numeric_coercion_declared_only_for_version() {
        let registry = SchemaRegistry::new().unwrap();
        for id in [
            SchemaId::Manifest,
            SchemaId::Author,
            SchemaId::Repository,
            SchemaId::Export,
            SchemaId::Example,
        ] {
            let coercing: Vec<&str> = registry
                .get(id)
                .fields
                .iter()
                .filter(|f| f.coerce_numeric)
                .map(|f| f.name)
                .collect();
            let expected: &[&str] = if id == SchemaId::Manifest {
                &["version"]
            } else {
                &[]
            };
            assert_eq!(coercing, expected, "schema {id:?}");
        }
    }

    #[test]
    fn test_atomicity_flags() {
        let registry = SchemaRegistry::new().unwrap();
        assert!(!registry.get(SchemaId::Manifest).atomic);
        assert!(!registry.get(SchemaId::Export).atomic);
        assert!(registry.get(SchemaId::Author).atomic);
        assert!(registry.get(SchemaId::Repository).atomic);
        assert!(registry.get(SchemaId::Example).atomic);
    }

    #[test]
    fn test_field_lookup_ignores_unknown() {
        let registry = SchemaRegistry::new().unwrap();
        let manifest = registry.get(SchemaId::Manifest);
        assert!(manifest.field("name").is_some());
        assert!(manifest.field("not-a-field").is_none());
    }
}
