/*!
 * Errors for CodeMeta generation, import and validation.
 *
 * Validation problems carry the exact message shown to the user. Import keeps
 * going after a [`ValidationError`]; a [`CodemetaError::Parse`] stops it
 * before anything is written.
 */

use codemeta_jsonld::JsonLdError;
use thiserror::Error;

/// The single user-facing message a failed validation produces.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The document or a nested node has a missing or unexpected type.
    #[error("{0}")]
    Type(String),
    /// A field is unknown or holds a value of the wrong shape.
    #[error("{0}")]
    Field(String),
}

#[derive(Error, Debug)]
pub enum CodemetaError {
    #[error("invalid input in field(s): {0}")]
    InputInvalid(String),

    #[error(
        "Could not read codemeta document because it is not valid JSON ({0}). Check for missing or extra quote, colon, or bracket characters."
    )]
    Parse(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(
        "Bug detected! The data you wrote is correct; but for some reason, it seems we generated an invalid codemeta.json. Please report this bug and copy-paste the generated codemeta.json file. Validation error: {0}"
    )]
    InternalInconsistency(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON-LD error: {0}")]
    JsonLd(JsonLdError),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<JsonLdError> for CodemetaError {
    fn from(err: JsonLdError) -> Self {
        if err.is_transport() {
            CodemetaError::Transport(err.to_string())
        } else {
            CodemetaError::JsonLd(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, CodemetaError>;
