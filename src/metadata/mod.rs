//! Metadata validation: from a raw document to a typed [`Document`].
//!
//! [`parse_document`] splits a [`RawDocument`] into its metadata block and body,
//! then validates the common envelope (`name`, `description`, `targets`,
//! `when`, platform extension blocks) and the kind-specific fields. The result is
//! either a document plus any warnings, or a single error diagnostic.
//!
//! Name inference: a document without `name` takes the stem of its file name,
//! with a warning. Setting [`ParseOptions::infer_names`] to `false` turns this
//! into a validation error.

use thiserror::Error;

use crate::core::{
    Diagnostic, Document, DocumentKind, DocumentSpec, ErrorCategory, Metadata, Platform,
    PlatformOverrides, PlatformSet, Provenance,
};
use crate::markdown::FrontmatterParser;
use crate::source::RawDocument;

/// Options controlling metadata validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Infer a missing `name` from the file stem instead of rejecting the document.
    pub infer_names: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            infer_names: true,
        }
    }
}

/// A successfully validated document and the warnings raised along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub document: Document,
    pub warnings: Vec<Diagnostic>,
}

/// Why a metadata record could not become a [`Document`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("missing required field 'name'")]
    MissingName,

    #[error("invalid name '{name}': {reason}")]
    InvalidName {
        name: String,
        reason: &'static str,
    },

    #[error("field '{field}' {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    #[error("invalid {kind} metadata: {message}")]
    Spec {
        kind: DocumentKind,
        message: String,
    },
}

/// Parse and validate one raw document.
pub fn parse_document(raw: &RawDocument, options: &ParseOptions) -> Result<ParsedDocument, Diagnostic> {
    let parser = FrontmatterParser::new();
    let parsed = parser.parse(&raw.text).map_err(|e| {
        let diagnostic =
            Diagnostic::error(ErrorCategory::Parse, e.to_string()).with_provenance(&raw.provenance);
        match e.position() {
            Some((line, column)) => diagnostic.at(line, column),
            None => diagnostic,
        }
    })?;

    let mut metadata = parsed.metadata;
    let mut warnings = Vec::new();

    let has_name = match metadata.get("name") {
        None | Some(serde_yaml::Value::Null) => false,
        Some(serde_yaml::Value::String(name)) => !name.trim().is_empty(),
        Some(_) => true,
    };
    if !has_name {
        let inferred = if options.infer_names {
            infer_name(&raw.provenance)
        } else {
            None
        };
        match inferred {
            Some(name) => {
                warnings.push(
                    Diagnostic::warning(
                        ErrorCategory::Validation,
                        format!("missing 'name'; inferred '{name}' from the file name"),
                    )
                    .with_provenance(&raw.provenance),
                );
                metadata.insert("name".to_string(), serde_yaml::Value::String(name));
            }
            None => {
                return Err(validation_error(&MetadataError::MissingName, &raw.provenance));
            }
        }
    }

    let document =
        build_document(raw.kind, metadata, parsed.body.to_string(), raw.provenance.clone())
            .map_err(|e| validation_error(&e, &raw.provenance))?;

    if document.targets.is_empty() {
        warnings.push(
            Diagnostic::warning(
                ErrorCategory::Validation,
                format!("{} targets no platform and will never be generated", document.label()),
            )
            .with_provenance(&raw.provenance),
        );
    }

    Ok(ParsedDocument {
        document,
        warnings,
    })
}

/// Derive a typed [`Document`] from a raw metadata record.
///
/// The record must already contain `name`. Used both for freshly parsed
/// documents and for re-deriving a persona after its inheritance chain has been
/// merged.
pub fn build_document(
    kind: DocumentKind,
    metadata: Metadata,
    body: String,
    provenance: Provenance,
) -> Result<Document, MetadataError> {
    let name = match metadata.get("name") {
        Some(serde_yaml::Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
        None | Some(serde_yaml::Value::Null) => return Err(MetadataError::MissingName),
        Some(serde_yaml::Value::String(_)) => return Err(MetadataError::MissingName),
        Some(_) => {
            return Err(MetadataError::InvalidField {
                field: "name",
                reason: "must be a string".to_string(),
            });
        }
    };
    validate_name(&name)?;

    let description = optional_string(&metadata, "description")?;
    let condition = optional_string(&metadata, "when")?.filter(|c| !c.trim().is_empty());
    let targets = parse_targets(&metadata)?;
    let overrides = parse_overrides(&metadata)?;
    let spec = DocumentSpec::from_metadata(kind, &metadata).map_err(|e| MetadataError::Spec {
        kind,
        message: e.to_string(),
    })?;

    Ok(Document {
        name,
        description,
        spec,
        condition,
        targets,
        overrides,
        metadata,
        body,
        provenance,
    })
}

/// Check that a name is usable as a join key and as an output file name.
pub fn validate_name(name: &str) -> Result<(), MetadataError> {
    let invalid = |reason| {
        Err(MetadataError::InvalidName {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return invalid("must not be empty");
    }
    if name.contains('/') || name.contains('\\') {
        return invalid("must not contain path separators");
    }
    if name == "." || name.contains("..") {
        return invalid("must not contain '..'");
    }
    if name.chars().any(char::is_control) {
        return invalid("must not contain control characters");
    }
    Ok(())
}

/// The file stem of the provenance path, e.g. `rules/rust-style.mdc` -> `rust-style`.
fn infer_name(provenance: &Provenance) -> Option<String> {
    provenance
        .path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::trim)
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}

fn optional_string(metadata: &Metadata, field: &'static str) -> Result<Option<String>, MetadataError> {
    match metadata.get(field) {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(serde_yaml::Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(MetadataError::InvalidField {
            field,
            reason: format!("must be a string, found {}", type_name(other)),
        }),
    }
}

/// `targets` accepts a list of platform ids or a single comma-separated string.
fn parse_targets(metadata: &Metadata) -> Result<PlatformSet, MetadataError> {
    let ids: Vec<String> = match metadata.get("targets") {
        None | Some(serde_yaml::Value::Null) => return Ok(PlatformSet::all()),
        Some(serde_yaml::Value::String(value)) => {
            value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
        }
        Some(serde_yaml::Value::Sequence(items)) => items
            .iter()
            .map(|item| match item {
                serde_yaml::Value::String(id) => Ok(id.clone()),
                other => Err(MetadataError::InvalidField {
                    field: "targets",
                    reason: format!("must list platform names, found {}", type_name(other)),
                }),
            })
            .collect::<Result<_, _>>()?,
        Some(other) => {
            return Err(MetadataError::InvalidField {
                field: "targets",
                reason: format!("must be a list of platform names, found {}", type_name(other)),
            });
        }
    };

    PlatformSet::parse_ids(ids.iter().map(String::as_str)).map_err(|e| MetadataError::InvalidField {
        field: "targets",
        reason: format!("contains an unknown platform: {e}"),
    })
}

/// Collect the `claude:` / `cursor:` / `opencode:` extension blocks.
fn parse_overrides(metadata: &Metadata) -> Result<PlatformOverrides, MetadataError> {
    let mut overrides = PlatformOverrides::default();
    for platform in Platform::ALL {
        let Some(block) = metadata.get(platform.id()) else {
            continue;
        };
        match serde_json::to_value(block) {
            Ok(serde_json::Value::Object(map)) => overrides.insert(platform, map),
            Ok(serde_json::Value::Null) => {}
            Ok(_) => {
                return Err(MetadataError::InvalidField {
                    field: platform.id(),
                    reason: format!("must be a mapping, found {}", type_name(block)),
                });
            }
            Err(e) => {
                return Err(MetadataError::InvalidField {
                    field: platform.id(),
                    reason: format!("cannot be represented as JSON: {e}"),
                });
            }
        }
    }
    Ok(overrides)
}

fn type_name(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a list",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

fn validation_error(error: &MetadataError, provenance: &Provenance) -> Diagnostic {
    Diagnostic::error(ErrorCategory::Validation, error.to_string()).with_provenance(provenance)
}
