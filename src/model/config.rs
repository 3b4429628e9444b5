use serde::{Deserialize, Serialize};

use super::error::ModelError;

/// Recurrent cell family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    #[default]
    Lstm,
    Gru,
    Rnn,
}

impl CellKind {
    /// Number of hidden-sized blocks in the fused gate projection.
    pub fn gate_count(self) -> usize {
        match self {
            CellKind::Lstm => 4,
            CellKind::Gru => 3,
            CellKind::Rnn => 1,
        }
    }

    /// Whether the cell carries a separate cell vector next to the hidden one
    pub fn has_cell_state(self) -> bool {
        matches!(self, CellKind::Lstm)
    }
}

/// Architecture of a character-level recurrent model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub cell: CellKind,
    pub vocab_size: usize,              // Includes the reserved unknown id
    #[serde(default)]
    pub embed_dim: Option<usize>,       // None: one-hot input over the vocabulary
    pub hidden_size: usize,
    #[serde(default = "default_num_layers")]
    pub num_layers: usize,
}

fn default_num_layers() -> usize { 1 }

impl ModelConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.vocab_size < 2 {
            return Err(ModelError::ConfigError(format!(
                "vocab_size must cover the unknown id and at least one symbol, got {}",
                self.vocab_size
            )));
        }
        if self.hidden_size == 0 {
            return Err(ModelError::ConfigError("hidden_size must be positive".into()));
        }
        if self.num_layers == 0 {
            return Err(ModelError::ConfigError("num_layers must be positive".into()));
        }
        if self.embed_dim == Some(0) {
            return Err(ModelError::ConfigError("embed_dim must be positive when set".into()));
        }
        Ok(())
    }

    /// Width of the vector fed into the first recurrent layer
    pub fn input_dim(&self) -> usize {
        self.embed_dim.unwrap_or(self.vocab_size)
    }

    pub fn layer_input_dim(&self, layer: usize) -> usize {
        if layer == 0 { self.input_dim() } else { self.hidden_size }
    }
}
