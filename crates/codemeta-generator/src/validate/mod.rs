/*!
 * Field-by-field checker for CodeMeta documents.
 *
 * The checker does not use a schema: it walks the compacted document,
 * dispatching on each node's declared type, and stops at the first problem
 * with a message meant for people who know nothing about JSON-LD.
 */

use codemeta_jsonld::node::{document_type, is_compact_type_equal};
use serde_json::Value;

use crate::errors::{CodemetaError, Result, ValidationError};

mod primitives;
pub mod things;

pub use things::{Checker, ThingType, field_checker};

/// Properties a document compacted against one version may carry as
/// compact IRIs because only the other version has a term for them.
pub const IGNORED_FIELDS: [&str; 10] = [
    "codemeta:contIntegration",
    "codemeta:continuousIntegration",
    "codemeta:isSourceCodeOf",
    "schema:roleName",
    "schema:startDate",
    "schema:endDate",
    "schema:review",
    "schema:reviewAspect",
    "schema:reviewBody",
    "schema:releaseNotes",
];

pub(crate) fn is_ignored_field(field: &str) -> bool {
    IGNORED_FIELDS.contains(&field)
}

/// Parses codemeta text, turning syntax errors into the user-facing message.
pub fn parse_document(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|err| CodemetaError::Parse(err.to_string()))
}

/// Checks a parsed document, returning the first problem found.
pub fn validate_document(doc: &Value) -> std::result::Result<(), ValidationError> {
    let map = match doc {
        Value::Object(map) => map,
        Value::Array(_) => return Err(missing_type()),
        other => {
            return Err(ValidationError::Type(format!(
                "Document must be an object (starting and ending with {{ and }}), not {}.",
                js_type_name(other)
            )));
        }
    };

    let Some(doc_type) = document_type(doc) else {
        return Err(missing_type());
    };
    let thing_type = if is_compact_type_equal(doc_type, "SoftwareSourceCode") {
        ThingType::SoftwareSourceCode
    } else if is_compact_type_equal(doc_type, "SoftwareApplication") {
        ThingType::SoftwareApplication
    } else {
        return Err(ValidationError::Type(format!(
            "Wrong document type: must be \"SoftwareSourceCode\"/\"SoftwareApplication\", not {doc_type}"
        )));
    };

    map.iter()
        .filter(|(field, _)| !matches!(field.as_str(), "@context" | "type" | "@type"))
        .filter(|(field, _)| !is_ignored_field(field))
        .try_for_each(|(field, value)| match field_checker(thing_type, field) {
            Some(checker) => checker.check(field, value),
            None => Err(ValidationError::Field(format!("Unknown field \"{field}\"."))),
        })
}

/// Parses and checks codemeta text in one go.
pub fn validate_text(text: &str) -> Result<Value> {
    let doc = parse_document(text)?;
    validate_document(&doc)?;
    Ok(doc)
}

fn missing_type() -> ValidationError {
    ValidationError::Type(
        "Missing type (must be SoftwareSourceCode or SoftwareApplication).".to_string(),
    )
}

fn js_type_name(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Null => "null",
        Value::Array(_) | Value::Object(_) => "object",
    }
}
