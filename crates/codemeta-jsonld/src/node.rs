//! Helpers for reading CodeMeta nodes regardless of whether they were written
//! with keyword aliases (`id`, `type`) or the keywords themselves.

use serde_json::Value;

/// Vocabulary prefixes a compact type name may carry.
const TYPE_PREFIXES: [&str; 4] = ["", "schema:", "codemeta:", "http://schema.org/"];

/// The declared type of a node: `type`, then `@type`, then `codemeta:type`.
pub fn document_type(node: &Value) -> Option<&Value> {
    ["type", "@type", "codemeta:type"]
        .iter()
        .filter_map(|key| node.get(*key))
        .find(|value| is_truthy(value))
}

/// The node identifier: `id`, then `@id`.
pub fn document_id(node: &Value) -> Option<&str> {
    ["id", "@id"]
        .iter()
        .filter_map(|key| node.get(*key).and_then(Value::as_str))
        .find(|id| !id.is_empty())
}

/// True if `type_value` names `name`, bare or behind a vocabulary prefix.
///
/// A single-element array is treated like its element.
pub fn is_compact_type_equal(type_value: &Value, name: &str) -> bool {
    let type_str = match type_value {
        Value::String(s) => s.as_str(),
        Value::Array(arr) if arr.len() == 1 => match arr[0].as_str() {
            Some(s) => s,
            None => return false,
        },
        _ => return false,
    };
    TYPE_PREFIXES
        .iter()
        .any(|prefix| type_str.strip_prefix(prefix) == Some(name))
}

/// True when `node` declares type `name`.
pub fn has_type(node: &Value, name: &str) -> bool {
    document_type(node).is_some_and(|t| is_compact_type_equal(t, name))
}

/// True for strings parsing as absolute URLs.
pub fn is_url(value: &str) -> bool {
    url::Url::parse(value).is_ok()
}

pub fn is_blank_node_id(value: &str) -> bool {
    value.starts_with("_:")
}

pub fn is_url_or_blank_node_id(value: &str) -> bool {
    is_url(value) || is_blank_node_id(value)
}

/// A property read by its plain name or, failing that, as a `schema:` or
/// `codemeta:` compact IRI. Null values count as absent.
pub fn get_property<'a>(node: &'a Value, name: &str) -> Option<&'a Value> {
    node.get(name)
        .or_else(|| node.get(format!("schema:{name}")))
        .or_else(|| node.get(format!("codemeta:{name}")))
        .filter(|value| !value.is_null())
}

/// One value or an array of values, as a slice.
pub fn one_or_many(value: &Value) -> &[Value] {
    match value {
        Value::Array(arr) => arr,
        Value::Null => &[],
        other => std::slice::from_ref(other),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
