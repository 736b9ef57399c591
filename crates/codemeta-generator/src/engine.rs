use std::sync::Arc;

use codemeta_jsonld::{CodemetaVersion, ContextRegistry, JsonLdProcessor, LocalProcessor};
use serde_json::Value;
use tracing::{Level, event};

use crate::errors::Result;
use crate::generate::{GeneratedDocument, generate};
use crate::import::{ImportReport, import};
use crate::sink::FieldSink;
use crate::storage::StateStore;
use crate::validate::validate_text;

/// Entry point tying generation, import and validation to one JSON-LD
/// processor and, optionally, a state store.
#[derive(Clone)]
pub struct CodemetaEngine {
    processor: Arc<dyn JsonLdProcessor>,
    store: Option<Arc<dyn StateStore>>,
}

impl CodemetaEngine {
    pub fn new(processor: Arc<dyn JsonLdProcessor>) -> Self {
        CodemetaEngine {
            processor,
            store: None,
        }
    }

    /// An engine resolving only the bundled vocabulary contexts.
    pub fn offline() -> Result<Self> {
        let registry = Arc::new(ContextRegistry::bundled()?);
        Ok(Self::new(Arc::new(LocalProcessor::offline(registry))))
    }

    pub fn with_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Generates the document and saves its text in the state store.
    pub async fn generate(
        &self,
        sink: &dyn FieldSink,
        version: CodemetaVersion,
    ) -> Result<GeneratedDocument> {
        let generated = generate(self.processor.as_ref(), sink, version).await?;
        if let Some(store) = &self.store {
            store.save(&generated.text).await?;
        }
        Ok(generated)
    }

    pub async fn import(&self, text: &str, sink: &mut dyn FieldSink) -> Result<ImportReport> {
        import(self.processor.as_ref(), text, sink).await
    }

    /// Parses and validates `text`, returning the parsed document.
    pub fn validate(&self, text: &str) -> Result<Value> {
        validate_text(text)
    }

    /// Re-imports the stored document, if there is one.
    pub async fn restore(&self, sink: &mut dyn FieldSink) -> Result<Option<ImportReport>> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        match store.load().await? {
            Some(text) => {
                event!(Level::INFO, "restoring form from saved state");
                self.import(&text, sink).await.map(Some)
            }
            None => Ok(None),
        }
    }
}
