/*!
 * Registry of the CodeMeta vocabulary contexts.
 *
 * Both context documents are loaded once when the process starts, augmented in
 * memory and then only ever read. Lookups by canonical URL never touch the
 * network.
 */

use std::{collections::HashMap, fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{Level, event};

use crate::error::{JsonLdError, Result};

pub const CODEMETA_V2_URL: &str = "https://doi.org/10.5063/schema/codemeta-2.0";
pub const CODEMETA_V3_URL: &str = "https://w3id.org/codemeta/3.0";

const BUNDLED_CODEMETA_V2: &str = include_str!("contexts/codemeta-2.0.jsonld");
const BUNDLED_CODEMETA_V3: &str = include_str!("contexts/codemeta-3.0.jsonld");

/// A version of the CodeMeta vocabulary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodemetaVersion {
    #[default]
    #[serde(rename = "2.0")]
    V2,
    #[serde(rename = "3.0")]
    V3,
}

impl CodemetaVersion {
    pub const ALL: [CodemetaVersion; 2] = [CodemetaVersion::V2, CodemetaVersion::V3];

    /// Canonical URL identifying this version's context.
    pub fn context_url(self) -> &'static str {
        match self {
            CodemetaVersion::V2 => CODEMETA_V2_URL,
            CodemetaVersion::V3 => CODEMETA_V3_URL,
        }
    }

    pub fn from_context_url(url: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.context_url() == url)
    }

    /// URLs of every known version, oldest first.
    pub fn all_context_urls() -> Vec<String> {
        Self::ALL
            .iter()
            .map(|v| v.context_url().to_string())
            .collect()
    }
}

impl fmt::Display for CodemetaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodemetaVersion::V2 => write!(f, "2.0"),
            CodemetaVersion::V3 => write!(f, "3.0"),
        }
    }
}

impl FromStr for CodemetaVersion {
    type Err = JsonLdError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "2" | "2.0" | "v2" | "v2.0" => Ok(CodemetaVersion::V2),
            "3" | "3.0" | "v3" | "v3.0" => Ok(CodemetaVersion::V3),
            other => Self::from_context_url(other).ok_or_else(|| {
                JsonLdError::registry(format!("unknown CodeMeta version ({other})"))
            }),
        }
    }
}

/// Holds the augmented context document of every known CodeMeta version.
#[derive(Clone, Debug)]
pub struct ContextRegistry {
    contexts: HashMap<String, Value>,
}

impl ContextRegistry {
    /// Registry backed by the context documents shipped with this crate.
    pub fn bundled() -> Result<Self> {
        let v2 = parse_context(CodemetaVersion::V2, BUNDLED_CODEMETA_V2)?;
        let v3 = parse_context(CodemetaVersion::V3, BUNDLED_CODEMETA_V3)?;
        Self::from_documents(v2, v3)
    }

    /// Registry backed by context documents on disk.
    pub async fn from_paths(v2_path: impl AsRef<Path>, v3_path: impl AsRef<Path>) -> Result<Self> {
        let v2 = read_context(CodemetaVersion::V2, v2_path.as_ref()).await?;
        let v3 = read_context(CodemetaVersion::V3, v3_path.as_ref()).await?;
        Self::from_documents(v2, v3)
    }

    /// Builds the registry from already parsed context documents, augmenting both.
    pub fn from_documents(mut v2: Value, mut v3: Value) -> Result<Self> {
        augment(CodemetaVersion::V2, &mut v2)?;
        augment(CodemetaVersion::V3, &mut v3)?;

        let mut contexts = HashMap::new();
        contexts.insert(CODEMETA_V2_URL.to_string(), v2);
        contexts.insert(CODEMETA_V3_URL.to_string(), v3);
        event!(Level::DEBUG, "context registry ready ({} contexts)", contexts.len());
        Ok(ContextRegistry { contexts })
    }

    /// Returns the context document (including the wrapping `@context` key) for `url`.
    pub fn get(&self, url: &str) -> Option<&Value> {
        self.contexts.get(url)
    }

    pub fn version_context(&self, version: CodemetaVersion) -> Option<&Value> {
        self.get(version.context_url())
    }
}

fn parse_context(version: CodemetaVersion, text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| {
        JsonLdError::registry(format!("CodeMeta {version} context is not valid JSON: {e}"))
    })
}

async fn read_context(version: CodemetaVersion, path: &Path) -> Result<Value> {
    event!(Level::INFO, "Loading CodeMeta {} context from ({})", version, path.display());
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        JsonLdError::registry(format!(
            "Could not read CodeMeta {version} context ({}): {e}",
            path.display()
        ))
    })?;
    parse_context(version, &text)
}

/// Adds the definitions the published documents lack: keyword aliases for
/// `id`/`type` and ordered-list containers for `author` and `keywords`.
/// `softwareRequirements` is made ordered in 2.0 only, 3.0 already declares it.
fn augment(version: CodemetaVersion, document: &mut Value) -> Result<()> {
    let terms = document
        .get_mut("@context")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| {
            JsonLdError::registry(format!("CodeMeta {version} context has no @context object"))
        })?;

    terms.insert("id".to_string(), json!("@id"));
    terms.insert("type".to_string(), json!("@type"));

    let mut list_terms = vec!["author", "keywords"];
    if version == CodemetaVersion::V2 {
        list_terms.push("softwareRequirements");
    }

    for term in list_terms {
        match terms.get_mut(term) {
            Some(Value::Object(definition)) => {
                definition.insert("@container".to_string(), json!("@list"));
            }
            _ => {
                terms.insert(
                    term.to_string(),
                    json!({ "@id": format!("schema:{term}"), "@container": "@list" }),
                );
            }
        }
    }

    Ok(())
}
