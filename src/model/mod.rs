//! Character-level recurrent network

mod config;
mod error;
mod layers;
mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{CellKind, ModelConfig};
pub use error::ModelError;
pub use layers::{Embedding, Linear, RecurrentLayer};
pub use state::{LayerState, RecurrentState};

use ndarray::{Array1, ArrayD, Ix1, Ix2};
use rand::{rngs::StdRng, SeedableRng};
use std::collections::BTreeMap;

use crate::checkpoint::Checkpoint;
use crate::tokenizer::{CharTokenizer, Tokenizer, VocabularySpec};

const INIT_STD_DEV: f32 = 0.08;

/// Trained parameters plus the vocabulary they were trained on.
///
/// Immutable once built; share it across runs behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct CharRnn {
    config: ModelConfig,
    tokenizer: CharTokenizer,
    embedding: Option<Embedding>,
    layers: Vec<RecurrentLayer>,
    projection: Linear,
}

impl CharRnn {
    /// Assembles a model, checking that every piece agrees with `config`.
    pub fn new(
        config: ModelConfig,
        tokenizer: CharTokenizer,
        embedding: Option<Embedding>,
        layers: Vec<RecurrentLayer>,
        projection: Linear,
    ) -> Result<Self, ModelError> {
        config.validate()?;

        if tokenizer.vocab_size() != config.vocab_size {
            return Err(ModelError::mismatch(
                "vocabulary size",
                &[config.vocab_size],
                &[tokenizer.vocab_size()],
            ));
        }

        match (&embedding, config.embed_dim) {
            (None, None) => {}
            (Some(table), Some(dim)) => {
                let expected = [config.vocab_size, dim];
                if table.weight.shape() != &expected[..] {
                    return Err(ModelError::mismatch("embedding.weight", &expected, table.weight.shape()));
                }
                if table.weight.iter().any(|v| !v.is_finite()) {
                    return Err(ModelError::NonFiniteParameter("embedding.weight".into()));
                }
            }
            (None, Some(_)) => return Err(ModelError::MissingParameter("embedding.weight".into())),
            (Some(_), None) => {
                return Err(ModelError::ConfigError(
                    "embedding table given but config declares one-hot input".into(),
                ))
            }
        }

        if layers.len() != config.num_layers {
            return Err(ModelError::mismatch("layer count", &[config.num_layers], &[layers.len()]));
        }
        for (l, layer) in layers.iter().enumerate() {
            if layer.kind() != config.cell
                || layer.input_size() != config.layer_input_dim(l)
                || layer.hidden_size() != config.hidden_size
            {
                return Err(ModelError::DimensionMismatch(format!(
                    "layer {l}: expected {:?} {}→{}, got {:?} {}→{}",
                    config.cell,
                    config.layer_input_dim(l),
                    config.hidden_size,
                    layer.kind(),
                    layer.input_size(),
                    layer.hidden_size()
                )));
            }
            if !layer.gates().is_finite() {
                return Err(ModelError::NonFiniteParameter(format!("layers.{l}")));
            }
        }

        let expected = [config.hidden_size, config.vocab_size];
        if projection.weight.shape() != &expected[..] {
            return Err(ModelError::mismatch("projection.weight", &expected, projection.weight.shape()));
        }
        if !projection.is_finite() {
            return Err(ModelError::NonFiniteParameter("projection".into()));
        }

        Ok(Self { config, tokenizer, embedding, layers, projection })
    }

    /// Model with seeded normal-initialised weights, for fixtures and soak tests.
    pub fn random(config: ModelConfig, vocabulary: &VocabularySpec, seed: u64) -> Result<Self, ModelError> {
        config.validate()?;
        let tokenizer = CharTokenizer::from_spec(vocabulary)?;
        let mut rng = StdRng::seed_from_u64(seed);

        let embedding = match config.embed_dim {
            Some(dim) => Some(Embedding::new(config.vocab_size, dim, INIT_STD_DEV, &mut rng)?),
            None => None,
        };
        let layers = (0..config.num_layers)
            .map(|l| {
                RecurrentLayer::random(
                    config.cell,
                    config.layer_input_dim(l),
                    config.hidden_size,
                    INIT_STD_DEV,
                    &mut rng,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        let projection = Linear::new(config.hidden_size, config.vocab_size, INIT_STD_DEV, &mut rng)?;

        Self::new(config, tokenizer, embedding, layers, projection)
    }

    /// Rebuilds a model from its named tensors, validating every shape.
    pub fn from_checkpoint(checkpoint: Checkpoint) -> Result<Self, ModelError> {
        let Checkpoint { config, vocabulary, mut tensors, .. } = checkpoint;
        config.validate()?;
        let tokenizer = CharTokenizer::from_spec(&vocabulary)?;

        let embedding = match config.embed_dim {
            Some(_) => Some(Embedding {
                weight: take_matrix(&mut tensors, "embedding.weight")?,
            }),
            None => None,
        };

        let mut layers = Vec::with_capacity(config.num_layers);
        for l in 0..config.num_layers {
            let weight = take_matrix(&mut tensors, &format!("layers.{l}.weight"))?;
            let bias = take_vector(&mut tensors, &format!("layers.{l}.bias"))?;
            let gates = Linear::from_parts(weight, bias)?;
            layers.push(RecurrentLayer::new(
                config.cell,
                config.layer_input_dim(l),
                config.hidden_size,
                gates,
            )?);
        }

        let projection = Linear::from_parts(
            take_matrix(&mut tensors, "projection.weight")?,
            take_vector(&mut tensors, "projection.bias")?,
        )?;

        if !tensors.is_empty() {
            tracing::warn!(
                unused = ?tensors.keys().collect::<Vec<_>>(),
                "checkpoint carries tensors the model does not use"
            );
        }

        Self::new(config, tokenizer, embedding, layers, projection)
    }

    pub fn to_checkpoint(&self) -> Checkpoint {
        let mut tensors = BTreeMap::new();
        if let Some(table) = &self.embedding {
            tensors.insert("embedding.weight".to_string(), table.weight.clone().into_dyn());
        }
        for (l, layer) in self.layers.iter().enumerate() {
            tensors.insert(format!("layers.{l}.weight"), layer.gates().weight.clone().into_dyn());
            tensors.insert(format!("layers.{l}.bias"), layer.gates().bias.clone().into_dyn());
        }
        tensors.insert("projection.weight".to_string(), self.projection.weight.clone().into_dyn());
        tensors.insert("projection.bias".to_string(), self.projection.bias.clone().into_dyn());

        Checkpoint::new(self.config.clone(), self.tokenizer.to_spec(), tensors)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn tokenizer(&self) -> &CharTokenizer {
        &self.tokenizer
    }

    /// Fresh all-zero memory for a new run
    pub fn initial_state(&self) -> RecurrentState {
        RecurrentState::zeros(&self.config)
    }

    /// One network step: consumes `token` and the prior state, returns the
    /// next state and the vocabulary logits. Does not mutate anything.
    pub fn step(&self, token: usize, state: &RecurrentState) -> Result<(RecurrentState, Array1<f32>), ModelError> {
        if state.layers.len() != self.layers.len() {
            return Err(ModelError::mismatch("state layers", &[self.layers.len()], &[state.layers.len()]));
        }

        let mut input = self.input_vector(token)?;
        let mut next = Vec::with_capacity(self.layers.len());
        for (layer, prev) in self.layers.iter().zip(&state.layers) {
            let layer_state = layer.step(input.view(), prev)?;
            input = layer_state.hidden.clone();
            next.push(layer_state);
        }

        let logits = self.projection.forward(input.view())?;
        Ok((RecurrentState { layers: next }, logits))
    }

    fn input_vector(&self, token: usize) -> Result<Array1<f32>, ModelError> {
        match &self.embedding {
            Some(table) => Ok(table.lookup(token)?.to_owned()),
            None => {
                if token >= self.config.vocab_size {
                    return Err(ModelError::DimensionMismatch(format!(
                        "token {} outside vocabulary of {}",
                        token, self.config.vocab_size
                    )));
                }
                let mut one_hot = Array1::zeros(self.config.vocab_size);
                one_hot[token] = 1.0;
                Ok(one_hot)
            }
        }
    }
}

fn take_tensor(tensors: &mut BTreeMap<String, ArrayD<f32>>, name: &str) -> Result<ArrayD<f32>, ModelError> {
    tensors
        .remove(name)
        .ok_or_else(|| ModelError::MissingParameter(name.to_string()))
}

fn take_matrix(tensors: &mut BTreeMap<String, ArrayD<f32>>, name: &str) -> Result<ndarray::Array2<f32>, ModelError> {
    let tensor = take_tensor(tensors, name)?;
    let shape = tensor.shape().to_vec();
    tensor
        .into_dimensionality::<Ix2>()
        .map_err(|_| ModelError::DimensionMismatch(format!("{name}: expected rank 2, got shape {shape:?}")))
}

fn take_vector(tensors: &mut BTreeMap<String, ArrayD<f32>>, name: &str) -> Result<Array1<f32>, ModelError> {
    let tensor = take_tensor(tensors, name)?;
    let shape = tensor.shape().to_vec();
    tensor
        .into_dimensionality::<Ix1>()
        .map_err(|_| ModelError::DimensionMismatch(format!("{name}: expected rank 1, got shape {shape:?}")))
}
