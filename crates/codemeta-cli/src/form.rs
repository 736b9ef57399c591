//! Form state kept on disk as a JSON-serialised [`MemorySink`].

use std::path::Path;

use codemeta_generator::MemorySink;
use tracing::{Level, event};

use crate::errors::CliError;

/// Reads the form at `path`; a missing file is an empty form.
pub async fn load_form(path: &Path) -> Result<MemorySink, CliError> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            event!(Level::DEBUG, "form file ({}) not found, starting empty", path.display());
            return Ok(MemorySink::new());
        }
        Err(err) => return Err(CliError::io(path.display(), err)),
    };
    serde_json::from_str(&text)
        .map_err(|err| CliError::Form(path.display().to_string(), err.to_string()))
}

pub async fn save_form(path: &Path, sink: &MemorySink) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(sink)
        .map_err(|err| CliError::Form(path.display().to_string(), err.to_string()))?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|err| CliError::io(parent.display(), err))?;
    }
    tokio::fs::write(path, text)
        .await
        .map_err(|err| CliError::io(path.display(), err))
}
