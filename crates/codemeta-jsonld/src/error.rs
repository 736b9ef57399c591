use std::fmt;

/// Errors that can occur while loading contexts or running JSON-LD algorithms.
#[derive(Debug, thiserror::Error)]
pub enum JsonLdError {
    #[error("Context error: {0}")]
    ContextError(String),

    #[error("JSON-LD expansion error: {0}")]
    JsonLdExpansionError(String),

    #[error("JSON-LD compaction error: {0}")]
    JsonLdCompactionError(String),

    #[error("Could not load context ({url}): {message}")]
    LoaderError { url: String, message: String },

    #[error("Context registry error: {0}")]
    RegistryError(String),
}

/// Result type alias for JSON-LD operations.
pub type Result<T> = std::result::Result<T, JsonLdError>;

impl JsonLdError {
    pub fn context(msg: impl fmt::Display) -> Self {
        Self::ContextError(msg.to_string())
    }

    pub fn expansion(msg: impl fmt::Display) -> Self {
        Self::JsonLdExpansionError(msg.to_string())
    }

    pub fn compaction(msg: impl fmt::Display) -> Self {
        Self::JsonLdCompactionError(msg.to_string())
    }

    pub fn loader(url: impl fmt::Display, msg: impl fmt::Display) -> Self {
        Self::LoaderError {
            url: url.to_string(),
            message: msg.to_string(),
        }
    }

    pub fn registry(msg: impl fmt::Display) -> Self {
        Self::RegistryError(msg.to_string())
    }

    /// True when the failure came from fetching a context document.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::LoaderError { .. })
    }
}
