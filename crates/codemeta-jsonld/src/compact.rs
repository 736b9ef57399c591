use std::sync::Arc;

use serde_json::{Map, Value, json};

use crate::context::{ContainerType, Context, ContextDocuments, TermDefinition, is_blank_node};
use crate::error::{JsonLdError, Result};

/// Compact an expanded JSON-LD document against `context_value`.
///
/// A single top-level node becomes the result object; several nodes end up
/// under `@graph`. The given context value is written to `@context` as is.
pub fn compact_document(
    expanded: &Value,
    context_value: &Value,
    documents: Arc<ContextDocuments>,
) -> Result<Value> {
    let mut context = Context::new(documents);
    context.process(context_value)?;

    let nodes: &[Value] = match expanded {
        Value::Array(arr) => arr,
        Value::Object(_) => std::slice::from_ref(expanded),
        _ => {
            return Err(JsonLdError::compaction(format!(
                "expected expanded document, got {expanded}"
            )));
        }
    };

    let mut compacted = nodes
        .iter()
        .map(|node| compact_node(node, &context))
        .collect::<Result<Vec<Value>>>()?;

    let mut result = Map::new();
    result.insert("@context".to_string(), context_value.clone());
    if compacted.len() == 1 {
        if let Value::Object(node) = compacted.remove(0) {
            result.extend(node);
        }
    } else if !compacted.is_empty() {
        result.insert(context.keyword_alias("@graph"), Value::Array(compacted));
    }

    Ok(Value::Object(result))
}

/// How an expanded value has to be represented, which drives term selection.
enum Shape<'a> {
    List(&'a [Value]),
    Reference(&'a str),
    Node,
    Typed { value: &'a Value, datatype: &'a str },
    Plain(&'a Value),
    Tagged,
}

fn shape_of(item: &Value) -> Shape<'_> {
    let Some(obj) = item.as_object() else {
        return Shape::Plain(item);
    };
    if let Some(list) = obj.get("@list") {
        return Shape::List(list.as_array().map(Vec::as_slice).unwrap_or_default());
    }
    if let Some(value) = obj.get("@value") {
        return match obj.get("@type").and_then(Value::as_str) {
            Some(datatype) => Shape::Typed { value, datatype },
            None if obj.contains_key("@language") => Shape::Tagged,
            None => Shape::Plain(value),
        };
    }
    match obj.get("@id").and_then(Value::as_str) {
        Some(id) if obj.len() == 1 => Shape::Reference(id),
        _ => Shape::Node,
    }
}

fn compact_node(node: &Value, context: &Context) -> Result<Value> {
    let map = node
        .as_object()
        .ok_or_else(|| JsonLdError::compaction(format!("expected node object, got {node}")))?;

    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    let mut result = Map::new();
    // (key, values, keep as array)
    let mut properties: Vec<(String, Vec<Value>, bool)> = Vec::new();

    for key in keys {
        let value = &map[key.as_str()];
        match key.as_str() {
            "@id" => {
                if let Some(id) = value.as_str() {
                    result.insert(context.keyword_alias("@id"), json!(compact_id(id, context)));
                }
            }
            "@type" => {
                let mut types: Vec<Value> = value
                    .as_array()
                    .map(Vec::as_slice)
                    .unwrap_or(std::slice::from_ref(value))
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|t| json!(compact_vocab(t, context)))
                    .collect();
                let compacted = if types.len() == 1 {
                    types.remove(0)
                } else {
                    Value::Array(types)
                };
                result.insert(context.keyword_alias("@type"), compacted);
            }
            keyword if keyword.starts_with('@') => {
                result.insert(keyword.to_string(), value.clone());
            }
            iri => {
                let items = value
                    .as_array()
                    .map(Vec::as_slice)
                    .unwrap_or(std::slice::from_ref(value));
                for item in items {
                    let (term, values, keep_array) = compact_property_item(iri, item, context)?;
                    match properties.iter_mut().find(|(k, _, _)| *k == term) {
                        Some((_, existing, keep)) => {
                            existing.extend(values);
                            *keep |= keep_array;
                        }
                        None => properties.push((term, values, keep_array)),
                    }
                }
            }
        }
    }

    for (key, mut values, keep_array) in properties {
        let value = if values.len() == 1 && !keep_array {
            values.remove(0)
        } else {
            Value::Array(values)
        };
        result.insert(key, value);
    }

    Ok(Value::Object(result))
}

/// Picks the key for one value of property `iri` and compacts the value.
fn compact_property_item(
    iri: &str,
    item: &Value,
    context: &Context,
) -> Result<(String, Vec<Value>, bool)> {
    let shape = shape_of(item);

    if let Shape::List(items) = shape {
        return match select_term(context, iri, &shape) {
            Some((term, def)) => {
                let compacted = items
                    .iter()
                    .map(|inner| compact_value(inner, &shape_of(inner), Some(def), context))
                    .collect::<Result<Vec<Value>>>()?;
                Ok((term.to_string(), compacted, true))
            }
            None => {
                let compacted = items
                    .iter()
                    .map(|inner| compact_value(inner, &shape_of(inner), None, context))
                    .collect::<Result<Vec<Value>>>()?;
                Ok((
                    compact_property_iri(iri, context),
                    vec![json!({ "@list": compacted })],
                    false,
                ))
            }
        };
    }

    let (key, def, keep_array) = match select_term(context, iri, &shape) {
        Some((term, def)) => (
            term.to_string(),
            Some(def),
            def.container == Some(ContainerType::Set),
        ),
        None => (compact_property_iri(iri, context), None, false),
    };
    let compacted = compact_value(item, &shape, def, context)?;
    Ok((key, vec![compacted], keep_array))
}

/// Chooses the term able to hold a value of the given shape without losing
/// its type, preferring the shortest term.
fn select_term<'a>(
    context: &'a Context,
    iri: &str,
    shape: &Shape,
) -> Option<(&'a str, &'a TermDefinition)> {
    let candidates = context.terms_for_iri(iri);
    let pick = |accept: &dyn Fn(&TermDefinition) -> bool| {
        candidates.iter().find(|(_, def)| accept(def)).copied()
    };
    let plain_container =
        |def: &TermDefinition| matches!(def.container, None | Some(ContainerType::Set));
    let untyped = |def: &TermDefinition| plain_container(def) && def.type_mapping.is_none();

    match shape {
        Shape::List(_) => pick(&|def| def.container == Some(ContainerType::List)),
        Shape::Reference(_) => pick(&|def| {
            plain_container(def) && matches!(def.type_mapping.as_deref(), Some("@id" | "@vocab"))
        })
        .or_else(|| pick(&untyped)),
        Shape::Node => pick(&|def| {
            plain_container(def)
                && matches!(def.type_mapping.as_deref(), None | Some("@id" | "@vocab"))
        }),
        Shape::Typed { datatype, .. } => pick(&|def| {
            plain_container(def) && def.type_mapping.as_deref() == Some(*datatype)
        })
        .or_else(|| pick(&untyped)),
        Shape::Plain(_) | Shape::Tagged => pick(&untyped),
    }
}

fn compact_value(
    item: &Value,
    shape: &Shape,
    term: Option<&TermDefinition>,
    context: &Context,
) -> Result<Value> {
    let type_mapping = term.and_then(|def| def.type_mapping.as_deref());
    match shape {
        Shape::Reference(id) => Ok(match type_mapping {
            Some("@id") => json!(compact_id(id, context)),
            Some("@vocab") => json!(compact_vocab(id, context)),
            _ => json!({ context.keyword_alias("@id"): compact_id(id, context) }),
        }),
        Shape::Node => compact_node(item, context),
        Shape::Typed { value, datatype } => {
            if type_mapping == Some(*datatype) {
                Ok((*value).clone())
            } else {
                Ok(json!({
                    "@value": value,
                    context.keyword_alias("@type"): compact_vocab(datatype, context),
                }))
            }
        }
        Shape::Plain(value) => Ok((*value).clone()),
        Shape::Tagged => Ok(item.clone()),
        Shape::List(items) => {
            let compacted = items
                .iter()
                .map(|inner| compact_value(inner, &shape_of(inner), term, context))
                .collect::<Result<Vec<Value>>>()?;
            Ok(json!({ "@list": compacted }))
        }
    }
}

/// Node identifiers: blank nodes stay, other IRIs become compact IRIs when a prefix matches.
fn compact_id(id: &str, context: &Context) -> String {
    if is_blank_node(id) {
        return id.to_string();
    }
    context
        .compact_iri_with_prefix(id)
        .unwrap_or_else(|| id.to_string())
}

/// Vocabulary IRIs (types): a plain term if one maps to the IRI, else a compact IRI.
fn compact_vocab(iri: &str, context: &Context) -> String {
    context
        .terms_for_iri(iri)
        .into_iter()
        .find(|(_, def)| def.container.is_none() && def.type_mapping.is_none())
        .map(|(term, _)| term.to_string())
        .or_else(|| context.compact_iri_with_prefix(iri))
        .unwrap_or_else(|| iri.to_string())
}

/// Property keys without a usable term.
fn compact_property_iri(iri: &str, context: &Context) -> String {
    context
        .compact_iri_with_prefix(iri)
        .unwrap_or_else(|| iri.to_string())
}
