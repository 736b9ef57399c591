/*!
 * Context document loading.
 *
 * [`DocumentLoader`] is the seam every context URL goes through. The
 * [`RegistryLoader`] answers the two CodeMeta URLs from memory and hands
 * anything else to an optional fallback, usually an [`HttpLoader`].
 */

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::{Level, event};

use crate::{
    error::{JsonLdError, Result},
    registry::ContextRegistry,
};

/// Resolves a context URL to its JSON document.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Returns the full context document, including its `@context` key.
    async fn load(&self, url: &str) -> Result<Value>;
}

/// Serves registered vocabulary contexts from memory.
#[derive(Clone)]
pub struct RegistryLoader {
    registry: Arc<ContextRegistry>,
    fallback: Option<Arc<dyn DocumentLoader>>,
}

impl RegistryLoader {
    pub fn new(registry: Arc<ContextRegistry>) -> Self {
        RegistryLoader {
            registry,
            fallback: None,
        }
    }

    /// Loader used for context URLs the registry does not know about.
    pub fn with_fallback(mut self, fallback: Arc<dyn DocumentLoader>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn registry(&self) -> &ContextRegistry {
        &self.registry
    }
}

#[async_trait]
impl DocumentLoader for RegistryLoader {
    async fn load(&self, url: &str) -> Result<Value> {
        if let Some(document) = self.registry.get(url) {
            return Ok(document.clone());
        }

        match &self.fallback {
            Some(fallback) => {
                event!(Level::DEBUG, "context ({}) not registered, using fallback loader", url);
                fallback.load(url).await
            }
            None => Err(JsonLdError::loader(
                url,
                "not a CodeMeta context and no network loader is configured",
            )),
        }
    }
}

/// Fetches context documents over HTTP(S).
#[derive(Clone, Debug)]
pub struct HttpLoader {
    client: reqwest::Client,
}

impl HttpLoader {
    pub fn new() -> Result<Self> {
        let client = reqwest::ClientBuilder::new()
            .use_rustls_tls()
            .user_agent(format!("CodeMeta Generator {}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| JsonLdError::loader("-", format!("could not build HTTP client: {e}")))?;
        Ok(HttpLoader { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        HttpLoader { client }
    }
}

#[async_trait]
impl DocumentLoader for HttpLoader {
    async fn load(&self, url: &str) -> Result<Value> {
        event!(Level::INFO, "Fetching remote context ({})", url);
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/ld+json, application/json")
            .send()
            .await
            .map_err(|e| JsonLdError::loader(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(JsonLdError::loader(url, format!("HTTP status {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| JsonLdError::loader(url, e))?;
        serde_json::from_str(&body)
            .map_err(|e| JsonLdError::loader(url, format!("response is not valid JSON: {e}")))
    }
}
