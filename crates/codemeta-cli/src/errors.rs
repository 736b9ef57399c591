use codemeta_generator::CodemetaError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration Error: {0}")]
    Config(String),
    #[error("Could not access file ({0}). Reason: {1}")]
    Io(String, std::io::Error),
    #[error("Form file ({0}) is not a valid form: {1}")]
    Form(String, String),
    #[error(transparent)]
    Codemeta(#[from] CodemetaError),
}

impl CliError {
    pub fn io(path: impl std::fmt::Display, err: std::io::Error) -> Self {
        CliError::Io(path.to_string(), err)
    }
}
