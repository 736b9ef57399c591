use std::sync::Arc;

use serde_json::{Map, Value, json};

use crate::context::{ContainerType, Context, ContextDocuments, TermDefinition, is_absolute_iri};
use crate::error::{JsonLdError, Result};

/// Expands `document` into an array of node objects.
///
/// Properties become absolute IRIs, values become value objects, node
/// references or `@list` objects, and every property holds an array.
/// Every context URL the document references must already be in `documents`.
pub fn expand_document(document: &Value, documents: Arc<ContextDocuments>) -> Result<Value> {
    let mut context = Context::new(documents);
    if let Some(local) = document.get("@context") {
        context.process(local)?;
    }

    Ok(match expand_element(document, &context)? {
        Value::Null => json!([]),
        Value::Array(nodes) => Value::Array(nodes),
        node => json!([node]),
    })
}

/// Objects are expanded, arrays flattened, bare scalars dropped.
fn expand_element(element: &Value, context: &Context) -> Result<Value> {
    match element {
        Value::Object(map) => expand_object(map, context),
        Value::Array(items) => {
            let mut nodes = Vec::with_capacity(items.len());
            for item in items {
                match expand_element(item, context)? {
                    Value::Null => {}
                    Value::Array(inner) => nodes.extend(inner),
                    node => nodes.push(node),
                }
            }
            Ok(Value::Array(nodes))
        }
        _ => Ok(Value::Null),
    }
}

/// A node object, value object or list object. `Null` when nothing survives.
fn expand_object(map: &Map<String, Value>, parent: &Context) -> Result<Value> {
    let mut context = parent.clone();
    if let Some(local) = map.get("@context") {
        context.process(local)?;
    }

    if map.contains_key("@value") {
        return Ok(expand_value_object(map, &context));
    }
    if let Some(items) = map.get("@list") {
        return Ok(json!({ "@list": expand_items(items, None, &context)? }));
    }

    let context = with_type_scoped_contexts(map, context)?;
    let mut node = Map::new();

    for (key, value) in map.iter().filter(|(key, _)| *key != "@context") {
        // Unmapped terms are dropped.
        let Some(property) = context.expand_iri(key) else {
            continue;
        };

        match property.as_str() {
            "@id" => {
                if let Some(id) = value.as_str() {
                    node.insert("@id".into(), json!(context.expand_id(id)));
                }
            }
            "@type" => {
                node.insert("@type".into(), expand_types(value, &context)?);
            }
            keyword if keyword.starts_with('@') => {}
            iri if !is_absolute_iri(iri) => {}
            _ => {
                let term = context.get_term(key);
                let scoped;
                let value_context = match term.and_then(|term| term.context.as_ref()) {
                    Some(local) => {
                        scoped = context.with_scoped_context(local)?;
                        &scoped
                    }
                    None => &context,
                };
                let expanded = expand_property_value(value, term, value_context)?;
                append_values(&mut node, property, expanded);
            }
        }
    }

    Ok(if node.is_empty() {
        Value::Null
    } else {
        Value::Object(node)
    })
}

/// Adds `values` (one value or an array) under `property`, always as an array.
fn append_values(node: &mut Map<String, Value>, property: String, values: Value) {
    let values = match values {
        Value::Null => return,
        Value::Array(items) => items,
        single => vec![single],
    };
    match node.get_mut(&property).and_then(Value::as_array_mut) {
        Some(existing) => existing.extend(values),
        None if values.is_empty() => {}
        None => {
            node.insert(property, Value::Array(values));
        }
    }
}

/// `context` plus the scoped contexts of the node's type terms.
fn with_type_scoped_contexts(map: &Map<String, Value>, context: Context) -> Result<Context> {
    let declared = map.get("@type").or_else(|| {
        map.iter()
            .find(|(key, _)| context.get_term(key).is_some_and(|term| term.iri == "@type"))
            .map(|(_, value)| value)
    });
    let scoped: Vec<Value> = declared
        .map(type_names)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|name| context.get_term(name).and_then(|term| term.context.clone()))
        .collect();

    if scoped.is_empty() {
        return Ok(context);
    }
    let mut context = context;
    for local in &scoped {
        context.process(local)?;
    }
    Ok(context)
}

fn type_names(value: &Value) -> Vec<&str> {
    match value {
        Value::String(name) => vec![name.as_str()],
        Value::Array(names) => names.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// `@type` as an array of IRIs. Names with no mapping are kept as written.
fn expand_types(value: &Value, context: &Context) -> Result<Value> {
    if !value.is_string() && !value.is_array() {
        return Err(JsonLdError::expansion(format!("invalid @type value: {value}")));
    }
    Ok(type_names(value)
        .into_iter()
        .map(|name| json!(expand_type(name, context)))
        .collect())
}

fn expand_type(name: &str, context: &Context) -> String {
    context.expand_iri(name).unwrap_or_else(|| name.to_string())
}

/// `{"@value": .., "@type": .., "@language": ..}`; `Null` for a null value.
fn expand_value_object(map: &Map<String, Value>, context: &Context) -> Value {
    let value = match map.get("@value") {
        None | Some(Value::Null) => return Value::Null,
        Some(value) => value.clone(),
    };
    let mut expanded = Map::new();
    expanded.insert("@value".into(), value);

    let datatype = map.get("@type").or_else(|| {
        map.iter()
            .find(|(key, _)| context.get_term(key).is_some_and(|term| term.iri == "@type"))
            .map(|(_, value)| value)
    });
    if let Some(datatype) = datatype.and_then(Value::as_str) {
        expanded.insert("@type".into(), json!(expand_type(datatype, context)));
    }
    if let Some(language) = map.get("@language") {
        expanded.insert("@language".into(), language.clone());
    }
    Value::Object(expanded)
}

/// A property value with the term's coercion applied, wrapped in a list
/// object when the term is an `@list` container.
fn expand_property_value(
    value: &Value,
    term: Option<&TermDefinition>,
    context: &Context,
) -> Result<Value> {
    let coercion = term.and_then(|term| term.type_mapping.as_deref());
    let items = expand_items(value, coercion, context)?;

    if term.is_some_and(|term| term.container == Some(ContainerType::List))
        && !is_list_object(value, context)
    {
        return Ok(json!({ "@list": items }));
    }
    Ok(match items {
        Value::Array(mut items) if items.len() == 1 && !value.is_array() => items.remove(0),
        items => items,
    })
}

/// One value or an array of values, nested arrays flattened.
fn expand_items(value: &Value, coercion: Option<&str>, context: &Context) -> Result<Value> {
    let mut expanded = Vec::new();
    let items = match value {
        Value::Array(items) => items.as_slice(),
        single => std::slice::from_ref(single),
    };
    for item in items {
        match item {
            Value::Array(_) => {
                if let Value::Array(inner) = expand_items(item, coercion, context)? {
                    expanded.extend(inner);
                }
            }
            _ => match expand_item(item, coercion, context)? {
                Value::Null => {}
                item => expanded.push(item),
            },
        }
    }
    Ok(Value::Array(expanded))
}

fn expand_item(item: &Value, coercion: Option<&str>, context: &Context) -> Result<Value> {
    Ok(match item {
        Value::Object(map) => return expand_object(map, context),
        Value::String(text) => match coercion {
            Some("@id") => json!({ "@id": context.expand_id(text) }),
            Some("@vocab") => json!({ "@id": expand_type(text, context) }),
            Some(datatype) if datatype != "@json" => json!({ "@value": text, "@type": datatype }),
            _ => json!({ "@value": text }),
        },
        Value::Number(_) | Value::Bool(_) => json!({ "@value": item }),
        Value::Null | Value::Array(_) => Value::Null,
    })
}

fn is_list_object(value: &Value, context: &Context) -> bool {
    value.as_object().is_some_and(|map| {
        map.keys().any(|key| {
            key == "@list" || context.get_term(key).is_some_and(|term| term.iri == "@list")
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CODEMETA_V2_URL, CODEMETA_V3_URL, ContextRegistry};

    fn documents() -> Arc<ContextDocuments> {
        let registry = ContextRegistry::bundled().unwrap();
        let mut documents = ContextDocuments::new();
        for url in [CODEMETA_V2_URL, CODEMETA_V3_URL] {
            documents.insert(url.to_string(), registry.get(url).unwrap().clone());
        }
        Arc::new(documents)
    }

    fn expand_one(doc: &Value) -> Value {
        let expanded = expand_document(doc, documents()).unwrap();
        let arr = expanded.as_array().unwrap();
        assert_eq!(arr.len(), 1);
        arr[0].clone()
    }

    #[test]
    fn expand_software_source_code() {
        let node = expand_one(&json!({
            "@context": [CODEMETA_V2_URL, CODEMETA_V3_URL],
            "@type": "SoftwareSourceCode",
            "name": "My Test Software",
            "license": ["https://spdx.org/licenses/MIT"]
        }));

        assert_eq!(node["@type"], json!(["http://schema.org/SoftwareSourceCode"]));
        assert_eq!(
            node["http://schema.org/name"],
            json!([{"@value": "My Test Software"}])
        );
        assert_eq!(
            node["http://schema.org/license"],
            json!([{"@id": "https://spdx.org/licenses/MIT"}])
        );
    }

    #[test]
    fn expand_typed_literal() {
        let node = expand_one(&json!({
            "@context": CODEMETA_V3_URL,
            "type": "SoftwareSourceCode",
            "dateCreated": "2019-10-02"
        }));
        assert_eq!(
            node["http://schema.org/dateCreated"],
            json!([{"@value": "2019-10-02", "@type": "http://schema.org/Date"}])
        );
    }

    #[test]
    fn expand_list_container() {
        let node = expand_one(&json!({
            "@context": CODEMETA_V2_URL,
            "@type": "SoftwareSourceCode",
            "keywords": ["foo", {"@type": "URL", "@id": "https://example.org/kw"}],
            "author": {"@type": "Person", "id": "_:author_1", "givenName": "Jane"}
        }));

        assert_eq!(
            node["http://schema.org/keywords"],
            json!([{"@list": [
                {"@value": "foo"},
                {"@id": "https://example.org/kw", "@type": ["http://schema.org/URL"]}
            ]}])
        );
        assert_eq!(
            node["http://schema.org/author"],
            json!([{"@list": [{
                "@type": ["http://schema.org/Person"],
                "@id": "_:author_1",
                "http://schema.org/givenName": [{"@value": "Jane"}]
            }]}])
        );
    }

    #[test]
    fn compact_iri_properties_bypass_list_terms() {
        let node = expand_one(&json!({
            "@context": CODEMETA_V3_URL,
            "@type": "Role",
            "roleName": "Developer",
            "schema:author": {"@id": "_:author_1"}
        }));
        assert_eq!(
            node["http://schema.org/author"],
            json!([{"@id": "_:author_1"}])
        );
    }

    #[test]
    fn expand_id_coercion_keeps_relative_references() {
        let node = expand_one(&json!({
            "@context": CODEMETA_V3_URL,
            "@type": "SoftwareSourceCode",
            "isSourceCodeOf": "Bigger Application"
        }));
        assert_eq!(
            node["https://codemeta.github.io/terms/isSourceCodeOf"],
            json!([{"@id": "Bigger Application"}])
        );
    }

    #[test]
    fn unmapped_terms_are_dropped() {
        let node = expand_one(&json!({
            "@context": CODEMETA_V2_URL,
            "@type": "ScholarlyArticle",
            "issn": "1234-5678",
            "schema:issn": "1234-5678"
        }));
        assert_eq!(node["@type"], json!(["ScholarlyArticle"]));
        assert!(node.get("issn").is_none());
        assert_eq!(node["http://schema.org/issn"], json!([{"@value": "1234-5678"}]));
    }

    #[test]
    fn already_expanded_input() {
        let node = expand_one(&json!({
            "@context": [CODEMETA_V2_URL, CODEMETA_V3_URL],
            "http://schema.org/name": [{"@value": "My Test Software"}],
            "@type": ["http://schema.org/SoftwareSourceCode"]
        }));
        assert_eq!(
            node["http://schema.org/name"],
            json!([{"@value": "My Test Software"}])
        );
    }
}
