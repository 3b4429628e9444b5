use super::super::error::ModelError;
use ndarray::{Array2, ArrayView1};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Token embedding table
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub weight: Array2<f32>, // Shape: [vocab_size, embed_dim]
}

impl Embedding {
    pub fn new<R: Rng>(vocab_size: usize, embed_dim: usize, std_dev: f32, rng: &mut R) -> Result<Self, ModelError> {
        let normal = Normal::new(0.0, std_dev).map_err(|e| {
            ModelError::InitializationError(e.to_string())
        })?;

        Ok(Self {
            weight: Array2::from_shape_fn((vocab_size, embed_dim), |_| normal.sample(&mut *rng)),
        })
    }

    pub fn vocab_size(&self) -> usize {
        self.weight.nrows()
    }

    pub fn embed_dim(&self) -> usize {
        self.weight.ncols()
    }

    /// Row of the table for `token_id`
    pub fn lookup(&self, token_id: usize) -> Result<ArrayView1<'_, f32>, ModelError> {
        if token_id >= self.vocab_size() {
            return Err(ModelError::DimensionMismatch(format!(
                "token {} outside embedding table of {} rows",
                token_id,
                self.vocab_size()
            )));
        }
        Ok(self.weight.row(token_id))
    }
}
