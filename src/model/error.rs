use thiserror::Error;

use crate::tokenizer::TokenizerError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Non-finite value in parameter: {0}")]
    NonFiniteParameter(String),

    #[error("Initialization error: {0}")]
    InitializationError(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),
}

impl ModelError {
    pub fn mismatch(what: &str, expected: &[usize], actual: &[usize]) -> Self {
        ModelError::DimensionMismatch(format!("{what}: expected {expected:?}, got {actual:?}"))
    }
}
