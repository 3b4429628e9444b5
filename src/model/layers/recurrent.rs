use ndarray::{Array1, ArrayView1, Axis};
use rand::Rng;

use super::super::config::CellKind;
use super::super::error::ModelError;
use super::super::state::LayerState;
use super::Linear;
use crate::utils::{sigmoid_inplace, tanh_inplace};

/// One recurrent layer with a fused gate projection over `[x; h]`.
///
/// Gate blocks inside `gates` (each `hidden_size` wide), in column order:
/// - LSTM: input, forget, output, candidate
/// - GRU: reset, update, candidate
/// - RNN: candidate
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrentLayer {
    kind: CellKind,
    input_size: usize,
    hidden_size: usize,
    gates: Linear,
}

impl RecurrentLayer {
    pub fn new(kind: CellKind, input_size: usize, hidden_size: usize, gates: Linear) -> Result<Self, ModelError> {
        let expected = [input_size + hidden_size, kind.gate_count() * hidden_size];
        if gates.weight.shape() != &expected[..] {
            return Err(ModelError::mismatch("recurrent weight", &expected, gates.weight.shape()));
        }
        Ok(Self { kind, input_size, hidden_size, gates })
    }

    pub fn random<R: Rng>(
        kind: CellKind,
        input_size: usize,
        hidden_size: usize,
        std_dev: f32,
        rng: &mut R,
    ) -> Result<Self, ModelError> {
        let gates = Linear::new(input_size + hidden_size, kind.gate_count() * hidden_size, std_dev, rng)?;
        Self::new(kind, input_size, hidden_size, gates)
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn gates(&self) -> &Linear {
        &self.gates
    }

    /// Advances the layer by one token. Pure: `prev` is left untouched.
    pub fn step(&self, x: ArrayView1<f32>, prev: &LayerState) -> Result<LayerState, ModelError> {
        if x.len() != self.input_size {
            return Err(ModelError::mismatch("layer input", &[self.input_size], &[x.len()]));
        }
        if prev.hidden.len() != self.hidden_size {
            return Err(ModelError::mismatch("hidden state", &[self.hidden_size], prev.hidden.shape()));
        }

        match self.kind {
            CellKind::Lstm => self.lstm_step(x, prev),
            CellKind::Gru => self.gru_step(x, prev),
            CellKind::Rnn => self.rnn_step(x, prev),
        }
    }

    fn lstm_step(&self, x: ArrayView1<f32>, prev: &LayerState) -> Result<LayerState, ModelError> {
        let h = self.hidden_size;
        if prev.cell.len() != h {
            return Err(ModelError::mismatch("cell state", &[h], prev.cell.shape()));
        }

        let mut z = self.gates.forward_concat(&[x.view(), prev.hidden.view()])?;
        let (mut ifo, mut candidate) = z.view_mut().split_at(Axis(0), 3 * h);
        sigmoid_inplace(&mut ifo);
        tanh_inplace(&mut candidate);

        let mut hidden = Array1::zeros(h);
        let mut cell = Array1::zeros(h);
        for k in 0..h {
            let (input_gate, forget_gate, output_gate) = (z[k], z[h + k], z[2 * h + k]);
            let c = forget_gate * prev.cell[k] + input_gate * z[3 * h + k];
            cell[k] = c;
            hidden[k] = output_gate * c.tanh();
        }

        Ok(LayerState { hidden, cell })
    }

    fn gru_step(&self, x: ArrayView1<f32>, prev: &LayerState) -> Result<LayerState, ModelError> {
        let h = self.hidden_size;

        let mut reset_update = self.gates.forward_columns(&[x.view(), prev.hidden.view()], 0..2 * h)?;
        sigmoid_inplace(&mut reset_update.view_mut());
        let (reset, update) = reset_update.view().split_at(Axis(0), h);

        let gated = &reset * &prev.hidden;
        let mut candidate = self.gates.forward_columns(&[x.view(), gated.view()], 2 * h..3 * h)?;
        tanh_inplace(&mut candidate.view_mut());

        let mut hidden = Array1::zeros(h);
        for k in 0..h {
            hidden[k] = (1.0 - update[k]) * candidate[k] + update[k] * prev.hidden[k];
        }

        Ok(LayerState { hidden, cell: Array1::zeros(0) })
    }

    fn rnn_step(&self, x: ArrayView1<f32>, prev: &LayerState) -> Result<LayerState, ModelError> {
        let mut hidden = self.gates.forward_concat(&[x.view(), prev.hidden.view()])?;
        tanh_inplace(&mut hidden.view_mut());
        Ok(LayerState { hidden, cell: Array1::zeros(0) })
    }
}
