/*!
 * The JSON-LD processing capability and the two-phase normalisation built on it.
 *
 * Callers depend on [`JsonLdProcessor`] only. [`LocalProcessor`] is the
 * in-process implementation: it resolves every context URL a document
 * reaches through its [`DocumentLoader`] first, then runs the synchronous
 * algorithms.
 */

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{Level, event};

use crate::{
    compact::compact_document,
    context::ContextDocuments,
    error::Result,
    expand::expand_document,
    loader::{DocumentLoader, RegistryLoader},
    registry::ContextRegistry,
};

/// Expansion and compaction of JSON-LD documents.
#[async_trait]
pub trait JsonLdProcessor: Send + Sync {
    /// Expands `document` against its own `@context`.
    async fn expand(&self, document: &Value) -> Result<Value>;

    /// Compacts an expanded document against the given context URLs.
    async fn compact(&self, expanded: &Value, context_urls: &[String]) -> Result<Value>;
}

/// Runs expansion and compaction in-process.
#[derive(Clone)]
pub struct LocalProcessor {
    loader: Arc<dyn DocumentLoader>,
}

impl LocalProcessor {
    pub fn new(loader: Arc<dyn DocumentLoader>) -> Self {
        LocalProcessor { loader }
    }

    /// Processor that only knows the registered CodeMeta contexts.
    pub fn offline(registry: Arc<ContextRegistry>) -> Self {
        Self::new(Arc::new(RegistryLoader::new(registry)))
    }

    /// Loads every context document reachable from `document`.
    async fn load_referenced(&self, document: &Value) -> Result<Arc<ContextDocuments>> {
        let mut pending = Vec::new();
        collect_context_urls(document, &mut pending);

        let mut documents = ContextDocuments::new();
        while let Some(url) = pending.pop() {
            if documents.contains_key(&url) {
                continue;
            }
            let loaded = self.loader.load(&url).await?;
            if let Some(inner) = loaded.get("@context") {
                collect_urls_in_context(inner, &mut pending);
            }
            documents.insert(url, loaded);
        }
        Ok(Arc::new(documents))
    }
}

#[async_trait]
impl JsonLdProcessor for LocalProcessor {
    async fn expand(&self, document: &Value) -> Result<Value> {
        let documents = self.load_referenced(document).await?;
        expand_document(document, documents)
    }

    async fn compact(&self, expanded: &Value, context_urls: &[String]) -> Result<Value> {
        let context_value = context_reference(context_urls);
        let mut probe = Map::new();
        probe.insert("@context".to_string(), context_value.clone());
        let documents = self.load_referenced(&Value::Object(probe)).await?;
        compact_document(expanded, &context_value, documents)
    }
}

/// The `@context` value naming `urls`: a string for one URL, an array otherwise.
pub fn context_reference(urls: &[String]) -> Value {
    match urls {
        [single] => Value::String(single.clone()),
        many => Value::Array(many.iter().cloned().map(Value::String).collect()),
    }
}

/// Expands `draft` against its own contexts and compacts it against `target`.
pub async fn normalize(
    processor: &dyn JsonLdProcessor,
    draft: &Value,
    target: &[String],
) -> Result<Value> {
    let expanded = processor.expand(draft).await?;
    event!(Level::DEBUG, expanded = %expanded, "JSON-LD expanded form");
    let compacted = processor.compact(&expanded, target).await?;
    event!(Level::DEBUG, compacted = %compacted, "JSON-LD compacted form");
    Ok(compacted)
}

/// Replaces the document's own `@context` with `urls`, then expands and
/// compacts against those same URLs.
///
/// A document written against either version (or already expanded) comes
/// out with every property named the way the merged contexts name it.
pub async fn recompact_with_contexts(
    processor: &dyn JsonLdProcessor,
    document: &Value,
    urls: &[String],
) -> Result<Value> {
    let forced = with_context(document, &context_reference(urls));
    normalize(processor, &forced, urls).await
}

fn with_context(document: &Value, context: &Value) -> Value {
    match document {
        Value::Object(map) => {
            let mut map = map.clone();
            map.insert("@context".to_string(), context.clone());
            Value::Object(map)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| with_context(item, context))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Renames `id`/`type` keys back to `@id`/`@type` at every depth.
pub fn normalize_keyword_aliases(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, inner)| {
                    let key = match key.as_str() {
                        "id" => "@id".to_string(),
                        "type" => "@type".to_string(),
                        _ => key,
                    };
                    (key, normalize_keyword_aliases(inner))
                })
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.into_iter().map(normalize_keyword_aliases).collect())
        }
        other => other,
    }
}

fn collect_context_urls(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                if key == "@context" {
                    collect_urls_in_context(inner, out);
                } else {
                    collect_context_urls(inner, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_context_urls(item, out);
            }
        }
        _ => {}
    }
}

/// URLs referenced by a `@context` value, including term-scoped contexts.
fn collect_urls_in_context(context: &Value, out: &mut Vec<String>) {
    match context {
        Value::String(url) => out.push(url.clone()),
        Value::Array(items) => {
            for item in items {
                collect_urls_in_context(item, out);
            }
        }
        Value::Object(terms) => {
            for definition in terms.values() {
                if let Some(scoped) = definition.get("@context") {
                    collect_urls_in_context(scoped, out);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CODEMETA_V2_URL, CODEMETA_V3_URL, CodemetaVersion};
    use serde_json::json;

    fn processor() -> LocalProcessor {
        LocalProcessor::offline(Arc::new(ContextRegistry::bundled().unwrap()))
    }

    #[test]
    fn context_reference_shapes() {
        assert_eq!(context_reference(&[CODEMETA_V2_URL.to_string()]), json!(CODEMETA_V2_URL));
        assert_eq!(
            context_reference(&CodemetaVersion::all_context_urls()),
            json!([CODEMETA_V2_URL, CODEMETA_V3_URL])
        );
    }

    #[test]
    fn keyword_aliases_are_renamed_recursively() {
        let value = normalize_keyword_aliases(json!({
            "type": "SoftwareSourceCode",
            "author": [{"id": "_:author_1", "type": "Person", "name": "x"}]
        }));
        assert_eq!(
            value,
            json!({
                "@type": "SoftwareSourceCode",
                "author": [{"@id": "_:author_1", "@type": "Person", "name": "x"}]
            })
        );
    }

    #[tokio::test]
    async fn normalize_to_target_version() {
        let draft = json!({
            "@context": CodemetaVersion::all_context_urls(),
            "@type": "SoftwareSourceCode",
            "name": "My Test Software"
        });
        let compacted = normalize(&processor(), &draft, &[CODEMETA_V3_URL.to_string()])
            .await
            .unwrap();
        assert_eq!(
            compacted,
            json!({
                "@context": CODEMETA_V3_URL,
                "type": "SoftwareSourceCode",
                "name": "My Test Software"
            })
        );
    }

    #[tokio::test]
    async fn recompact_replaces_foreign_context() {
        let doc = json!({
            "@context": "https://example.org/unreachable",
            "@type": "SoftwareSourceCode",
            "codeRepository": "https://github.com/example/repo"
        });
        let urls = CodemetaVersion::all_context_urls();
        let compacted = recompact_with_contexts(&processor(), &doc, &urls)
            .await
            .unwrap();
        assert_eq!(compacted["codeRepository"], "https://github.com/example/repo");
        assert_eq!(compacted["@context"], json!(urls));
    }

    #[tokio::test]
    async fn unknown_embedded_context_fails_offline() {
        let doc = json!({
            "@context": CODEMETA_V2_URL,
            "@type": "SoftwareSourceCode",
            "funder": {"@context": "https://example.org/ctx", "name": "x"}
        });
        let err = processor().expand(&doc).await.unwrap_err();
        assert!(err.is_transport());
    }
}
