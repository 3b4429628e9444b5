use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::model::{CharRnn, ModelConfig, ModelError};
use crate::tokenizer::VocabularySpec;
use crate::utils::io::{self, IoError};

pub const CHECKPOINT_MAGIC: &str = "TRNN";
pub const CHECKPOINT_VERSION: u32 = 1;

/// On-disk form of a trained model: architecture, vocabulary and named tensors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub magic: String,
    pub version: u32,
    pub config: ModelConfig,
    pub vocabulary: VocabularySpec,
    pub tensors: BTreeMap<String, ArrayD<f32>>,
}

impl Checkpoint {
    pub fn new(config: ModelConfig, vocabulary: VocabularySpec, tensors: BTreeMap<String, ArrayD<f32>>) -> Self {
        Self {
            magic: CHECKPOINT_MAGIC.to_string(),
            version: CHECKPOINT_VERSION,
            config,
            vocabulary,
            tensors,
        }
    }

    fn check_header(&self) -> Result<(), CheckpointError> {
        if self.magic != CHECKPOINT_MAGIC {
            return Err(CheckpointError::BadMagic(self.magic.clone()));
        }
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

/// Serialization used for a checkpoint path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointFormat {
    Bincode,
    Json,
}

impl CheckpointFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => CheckpointFormat::Json,
            _ => CheckpointFormat::Bincode,
        }
    }
}

/// Error type for checkpoint operations
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(IoError),
    #[error("Undecodable checkpoint: {0}")]
    Decode(IoError),
    #[error("Not a model checkpoint (magic {0:?})")]
    BadMagic(String),
    #[error("Unsupported checkpoint version {0}")]
    UnsupportedVersion(u32),
    #[error("Invalid model: {0}")]
    Model(#[from] ModelError),
}

impl From<IoError> for CheckpointError {
    fn from(e: IoError) -> Self {
        if e.is_filesystem() {
            CheckpointError::Io(e)
        } else {
            CheckpointError::Decode(e)
        }
    }
}

/// Saves a checkpoint atomically, format chosen by extension
pub fn save_checkpoint(path: impl AsRef<Path>, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
    let path = path.as_ref();
    match CheckpointFormat::from_path(path) {
        CheckpointFormat::Json => io::serialize_to_json(path, checkpoint)?,
        CheckpointFormat::Bincode => io::serialize_to_file(path, checkpoint)?,
    }
    Ok(())
}

/// Loads a checkpoint and checks its header
pub fn load_checkpoint(path: impl AsRef<Path>) -> Result<Checkpoint, CheckpointError> {
    let path = path.as_ref();
    let checkpoint: Checkpoint = match CheckpointFormat::from_path(path) {
        CheckpointFormat::Json => io::deserialize_from_json(path)?,
        CheckpointFormat::Bincode => io::deserialize_from_file(path)?,
    };
    checkpoint.check_header()?;
    Ok(checkpoint)
}

/// Loads and validates a model
pub fn load_model(path: impl AsRef<Path>) -> Result<CharRnn, CheckpointError> {
    let path = path.as_ref();
    let checkpoint = load_checkpoint(path)?;
    let model = CharRnn::from_checkpoint(checkpoint)?;

    let config = model.config();
    tracing::info!(
        path = %path.display(),
        cell = ?config.cell,
        vocab = config.vocab_size,
        hidden = config.hidden_size,
        layers = config.num_layers,
        "loaded model"
    );
    Ok(model)
}

pub fn save_model(path: impl AsRef<Path>, model: &CharRnn) -> Result<(), CheckpointError> {
    save_checkpoint(path, &model.to_checkpoint())
}
