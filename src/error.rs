// error.rs
use thiserror::Error;

use crate::checkpoint::CheckpointError;
use crate::inference::InferenceError;
use crate::tokenizer::TokenizerError;
use crate::utils::io::IoError;

#[derive(Error, Debug)]
pub enum TinyRnnError {
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    #[error("Corrupt model: {0}")]
    CorruptModel(#[source] CheckpointError),

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] TokenizerError),

    #[error("Inference error: {0}")]
    Inference(#[source] InferenceError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<CheckpointError> for TinyRnnError {
    fn from(e: CheckpointError) -> Self {
        match e {
            CheckpointError::Io(io) => TinyRnnError::Io(io),
            other => TinyRnnError::CorruptModel(other),
        }
    }
}

impl From<InferenceError> for TinyRnnError {
    fn from(e: InferenceError) -> Self {
        match e {
            InferenceError::InvalidToken { step, source } => {
                tracing::debug!(step, "predicted token has no character");
                TinyRnnError::InvalidToken(source)
            }
            other => TinyRnnError::Inference(other),
        }
    }
}
