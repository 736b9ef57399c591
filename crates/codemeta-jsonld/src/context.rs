use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use serde_json::{Map, Value};

use crate::error::{JsonLdError, Result};

/// Context documents that have already been loaded, keyed by URL.
pub type ContextDocuments = HashMap<String, Value>;

/// Term definitions in effect at one point of a document.
#[derive(Clone, Debug, Default)]
pub struct Context {
    terms: HashMap<String, TermDefinition>,
    vocab: Option<String>,
    documents: Arc<ContextDocuments>,
}

#[derive(Clone, Debug)]
pub struct TermDefinition {
    /// Empty for a term explicitly mapped to `null`.
    pub iri: String,
    /// `@id`, `@vocab` or a datatype IRI.
    pub type_mapping: Option<String>,
    pub container: Option<ContainerType>,
    /// Scoped context applied to values of this term.
    pub context: Option<Value>,
    /// Usable as the prefix of a compact IRI.
    pub prefix: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContainerType {
    Set,
    List,
    Graph,
}

impl TermDefinition {
    fn unmapped() -> Self {
        TermDefinition {
            iri: String::new(),
            type_mapping: None,
            container: None,
            context: None,
            prefix: false,
        }
    }

    /// `"term": "iri"`. Simple terms ending in a gen-delim act as prefixes.
    fn simple(iri: String) -> Self {
        let prefix = !iri.starts_with('@') && iri.ends_with(['/', '#', ':']);
        TermDefinition {
            iri,
            prefix,
            ..Self::unmapped()
        }
    }

    /// `"term": {"@id": .., "@type": .., "@container": .., "@context": ..}`.
    fn expanded(term: &str, definition: &Map<String, Value>, ctx: &Context) -> Self {
        let text = |key: &str| definition.get(key).and_then(Value::as_str);

        TermDefinition {
            iri: ctx.resolve(text("@id").unwrap_or(term)),
            type_mapping: text("@type").map(|datatype| match datatype {
                keyword if keyword.starts_with('@') => keyword.to_string(),
                datatype => ctx.resolve(datatype),
            }),
            container: match text("@container") {
                Some("@set") => Some(ContainerType::Set),
                Some("@list") => Some(ContainerType::List),
                Some("@graph") => Some(ContainerType::Graph),
                _ => None,
            },
            context: definition.get("@context").cloned(),
            prefix: definition
                .get("@prefix")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }
}

impl Context {
    /// Empty context resolving remote references against `documents`.
    pub fn new(documents: Arc<ContextDocuments>) -> Self {
        Context {
            documents,
            ..Default::default()
        }
    }

    /// Merges a `@context` value: a URL, an object, an array of those, or
    /// `null` to start over.
    pub fn process(&mut self, context_value: &Value) -> Result<()> {
        match context_value {
            Value::Array(items) => items.iter().try_for_each(|item| self.process(item)),
            Value::String(url) => {
                let documents = Arc::clone(&self.documents);
                let inner = documents
                    .get(url.as_str())
                    .ok_or_else(|| JsonLdError::context(format!("context URL was not loaded: {url}")))?
                    .get("@context")
                    .ok_or_else(|| {
                        JsonLdError::context(format!("context document has no @context: {url}"))
                    })?;
                self.process(inner)
            }
            Value::Object(local) => self.process_local(local),
            Value::Null => {
                self.terms.clear();
                self.vocab = None;
                Ok(())
            }
            other => Err(JsonLdError::context(format!(
                "@context must be a URL, an object or an array, not {other}"
            ))),
        }
    }

    fn process_local(&mut self, local: &Map<String, Value>) -> Result<()> {
        if let Some(vocab) = local.get("@vocab") {
            self.vocab = vocab.as_str().map(str::to_string);
        }

        let mut defined = HashSet::new();
        local
            .keys()
            .filter(|key| !key.starts_with('@'))
            .try_for_each(|term| self.define_term(term, local, &mut defined))
    }

    /// Defines `term` from the local context, defining the prefixes its IRIs
    /// depend on first.
    fn define_term(
        &mut self,
        term: &str,
        local: &Map<String, Value>,
        defined: &mut HashSet<String>,
    ) -> Result<()> {
        if !defined.insert(term.to_string()) {
            return Ok(());
        }
        let Some(value) = local.get(term) else {
            return Ok(());
        };

        for prefix in referenced_prefixes(value) {
            if prefix != term && local.contains_key(&prefix) {
                self.define_term(&prefix, local, defined)?;
            }
        }

        let definition = match value {
            Value::String(iri) => TermDefinition::simple(self.resolve(iri)),
            Value::Object(definition) => TermDefinition::expanded(term, definition, self),
            Value::Null => TermDefinition::unmapped(),
            other => {
                return Err(JsonLdError::context(format!(
                    "term \"{term}\" has an invalid definition: {other}"
                )));
            }
        };
        self.terms.insert(term.to_string(), definition);
        Ok(())
    }

    /// IRI of a property or type name: keywords and absolute IRIs as they
    /// are, then terms, compact IRIs and finally `@vocab`.
    ///
    /// `None` when nothing applies, which drops the property on expansion.
    pub fn expand_iri(&self, value: &str) -> Option<String> {
        if is_absolute_iri(value) || value.starts_with('@') {
            return Some(value.to_string());
        }
        if let Some(definition) = self.terms.get(value) {
            return Some(definition.iri.clone());
        }
        if let Some((prefix, suffix)) = value.split_once(':') {
            if let Some(definition) = self.terms.get(prefix) {
                return Some(format!("{}{suffix}", definition.iri));
            }
            // Some other scheme.
            if is_scheme(prefix) {
                return Some(value.to_string());
            }
        }
        self.vocab.as_ref().map(|vocab| format!("{vocab}{value}"))
    }

    fn resolve(&self, value: &str) -> String {
        self.expand_iri(value).unwrap_or_else(|| value.to_string())
    }

    /// Expand a node identifier. Terms do not apply; compact IRIs do, and
    /// relative references and blank node ids are kept as written.
    pub fn expand_id(&self, value: &str) -> String {
        if is_blank_node(value) || is_absolute_iri(value) {
            return value.to_string();
        }
        if let Some((prefix, suffix)) = value.split_once(':')
            && let Some(def) = self.terms.get(prefix)
            && def.prefix
        {
            return format!("{}{suffix}", def.iri);
        }
        value.to_string()
    }

    pub fn get_term(&self, term: &str) -> Option<&TermDefinition> {
        self.terms.get(term)
    }

    /// The shortest term aliasing `keyword` (e.g. `id` for `@id`), or the keyword itself.
    pub fn keyword_alias(&self, keyword: &str) -> String {
        self.terms
            .iter()
            .filter(|(_, def)| def.iri == keyword)
            .map(|(term, _)| term.as_str())
            .min_by(|a, b| a.len().cmp(&b.len()).then(a.cmp(b)))
            .unwrap_or(keyword)
            .to_string()
    }

    /// Terms mapping to `iri`, shortest first then lexicographically.
    pub fn terms_for_iri(&self, iri: &str) -> Vec<(&str, &TermDefinition)> {
        let mut candidates: Vec<(&str, &TermDefinition)> = self
            .terms
            .iter()
            .filter(|(_, def)| def.iri == iri)
            .map(|(term, def)| (term.as_str(), def))
            .collect();
        candidates.sort_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then(a.cmp(b)));
        candidates
    }

    /// Shortest usable compact IRI (`prefix:suffix`) for `iri`.
    pub fn compact_iri_with_prefix(&self, iri: &str) -> Option<String> {
        self.terms
            .iter()
            .filter(|(_, def)| def.prefix && iri.len() > def.iri.len() && iri.starts_with(&def.iri))
            .map(|(term, def)| format!("{term}:{}", &iri[def.iri.len()..]))
            .filter(|curie| !self.terms.contains_key(curie))
            .min_by(|a, b| a.len().cmp(&b.len()).then(a.cmp(b)))
    }

    /// This context with a term's scoped context layered on top.
    pub fn with_scoped_context(&self, scoped_context: &Value) -> Result<Context> {
        let mut child = self.clone();
        child.process(scoped_context)?;
        Ok(child)
    }
}

/// Prefixes of the compact IRIs a term definition refers to.
fn referenced_prefixes(value: &Value) -> Vec<String> {
    let iris: Vec<&str> = match value {
        Value::String(s) => vec![s.as_str()],
        Value::Object(obj) => ["@id", "@type"]
            .iter()
            .filter_map(|key| obj.get(*key).and_then(Value::as_str))
            .collect(),
        _ => Vec::new(),
    };
    iris.into_iter()
        .filter(|iri| !is_absolute_iri(iri))
        .filter_map(|iri| iri.split_once(':').map(|(prefix, _)| prefix.to_string()))
        .collect()
}

fn is_scheme(prefix: &str) -> bool {
    !prefix.is_empty()
        && prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

pub(crate) fn is_blank_node(value: &str) -> bool {
    value.starts_with("_:")
}

/// `scheme://...`, or one of the schemes used without an authority.
pub(crate) fn is_absolute_iri(value: &str) -> bool {
    let Some((scheme, rest)) = value.split_once(':') else {
        return false;
    };
    if !scheme.starts_with(|c: char| c.is_ascii_alphabetic()) || !is_scheme(scheme) {
        return false;
    }
    rest.starts_with("//")
        || matches!(
            scheme,
            "urn" | "did" | "tel" | "mailto" | "data" | "blob" | "cid" | "mid" | "tag" | "doi"
        )
}
