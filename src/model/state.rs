use ndarray::Array1;

use super::config::{CellKind, ModelConfig};

/// Hidden (and, for LSTM, cell) vector of one layer
#[derive(Debug, Clone, PartialEq)]
pub struct LayerState {
    pub hidden: Array1<f32>,
    pub cell: Array1<f32>, // empty for cells without a separate memory
}

impl LayerState {
    pub fn zeros(kind: CellKind, hidden_size: usize) -> Self {
        let cell_size = if kind.has_cell_state() { hidden_size } else { 0 };
        Self {
            hidden: Array1::zeros(hidden_size),
            cell: Array1::zeros(cell_size),
        }
    }
}

/// Recurrent memory of the whole stack for a single run.
///
/// Owned by one inference loop, replaced wholesale on every step.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrentState {
    pub layers: Vec<LayerState>,
}

impl RecurrentState {
    pub fn zeros(config: &ModelConfig) -> Self {
        Self {
            layers: (0..config.num_layers)
                .map(|_| LayerState::zeros(config.cell, config.hidden_size))
                .collect(),
        }
    }

    /// Hidden vector of the top layer, the input of the output projection
    pub fn top_hidden(&self) -> Option<&Array1<f32>> {
        self.layers.last().map(|l| &l.hidden)
    }
}
