/*!
 * Keeps the last generated document so the form can be restored later.
 *
 * Only one slot exists, keyed [`STATE_KEY`].
 */

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{Level, event};

use crate::errors::{CodemetaError, Result};

pub const STATE_KEY: &str = "codemetaText";

#[async_trait]
pub trait StateStore: Send + Sync {
    /// The stored document text, if any.
    async fn load(&self) -> Result<Option<String>>;

    async fn save(&self, text: &str) -> Result<()>;
}

/// Stores the slot in a JSON object on disk: `{"codemetaText": "..."}`.
///
/// Other keys already present in the file are kept.
#[derive(Clone, Debug)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStateStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_state(&self) -> Result<Map<String, Value>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => {
                return Err(CodemetaError::Storage(format!(
                    "couldn't read {}: {err}",
                    self.path.display()
                )));
            }
        };
        match serde_json::from_str(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(CodemetaError::Storage(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
            Err(err) => Err(CodemetaError::Storage(format!(
                "couldn't parse {}: {err}",
                self.path.display()
            ))),
        }
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self) -> Result<Option<String>> {
        let state = self.read_state().await?;
        Ok(state
            .get(STATE_KEY)
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .map(str::to_string))
    }

    async fn save(&self, text: &str) -> Result<()> {
        let mut state = self.read_state().await?;
        state.insert(STATE_KEY.to_string(), Value::String(text.to_string()));
        let content = serde_json::to_string_pretty(&Value::Object(state))
            .map_err(|err| CodemetaError::Storage(err.to_string()))?;
        tokio::fs::write(&self.path, content).await.map_err(|err| {
            CodemetaError::Storage(format!("couldn't write {}: {err}", self.path.display()))
        })?;
        event!(Level::DEBUG, path = %self.path.display(), "form state saved");
        Ok(())
    }
}

/// Keeps the slot in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    text: Mutex<Option<String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<Option<String>> {
        Ok(self.text.lock().await.clone())
    }

    async fn save(&self, text: &str) -> Result<()> {
        *self.text.lock().await = Some(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("codemeta-state-{}-{name}.json", std::process::id()))
    }

    #[tokio::test]
    async fn missing_file_loads_nothing() {
        let store = FileStateStore::new(temp_path("missing"));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_then_load_keeps_other_keys() {
        let path = temp_path("save");
        tokio::fs::write(&path, r#"{"other": 1}"#).await.unwrap();
        let store = FileStateStore::new(&path);

        store.save("{\"name\": \"x\"}").await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some("{\"name\": \"x\"}"));

        let raw: Value = serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(raw["other"], 1);
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_file_is_a_storage_error() {
        let path = temp_path("corrupt");
        tokio::fs::write(&path, "not json").await.unwrap();
        let store = FileStateStore::new(&path);
        assert!(matches!(store.load().await, Err(CodemetaError::Storage(_))));
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn memory_store() {
        let store = MemoryStateStore::new();
        assert_eq!(store.load().await.unwrap(), None);
        store.save("text").await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some("text"));
    }
}
