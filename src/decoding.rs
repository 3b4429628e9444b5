use ndarray::{Array1, ArrayView1};
use rand::distributions::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::{argmax, max_ignoring_nan, softmax_1d};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Invalid temperature: {0}")]
    InvalidTemperature(f32),
    #[error("Empty distribution")]
    EmptyDistribution,
}

/// How a token is picked from the logits of each step
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum DecodePolicy {
    /// Highest logit, lowest id on ties
    #[default]
    Greedy,
    /// Temperature sampling from a generator seeded once per run
    Sampled { temperature: f32, seed: u64 },
}

impl DecodePolicy {
    pub fn validate(&self) -> Result<(), DecodeError> {
        match *self {
            DecodePolicy::Greedy => Ok(()),
            DecodePolicy::Sampled { temperature, .. } => {
                if temperature.is_finite() && temperature > 0.0 {
                    Ok(())
                } else {
                    Err(DecodeError::InvalidTemperature(temperature))
                }
            }
        }
    }
}

/// Greedy choice over one step's logits
pub fn greedy(logits: ArrayView1<f32>) -> Result<usize, DecodeError> {
    argmax(logits).ok_or(DecodeError::EmptyDistribution)
}

/// Shifts logits so the largest is zero, then divides by `temperature`.
/// Shifting first keeps tiny temperatures from overflowing every entry.
fn scale_logits(logits: ArrayView1<f32>, temperature: f32) -> Array1<f32> {
    let max = max_ignoring_nan(logits);
    if !max.is_finite() {
        return logits.to_owned();
    }
    logits.mapv(|x| (x - max) / temperature)
}

/// Per-run decoder. Sampling state lives here, so each run starts from the
/// same seed and runs never influence each other.
#[derive(Debug)]
pub struct Decoder {
    policy: DecodePolicy,
    rng: Option<StdRng>,
}

impl Decoder {
    pub fn new(policy: DecodePolicy) -> Result<Self, DecodeError> {
        policy.validate()?;
        let rng = match policy {
            DecodePolicy::Greedy => None,
            DecodePolicy::Sampled { seed, .. } => Some(StdRng::seed_from_u64(seed)),
        };
        Ok(Self { policy, rng })
    }

    pub fn policy(&self) -> DecodePolicy {
        self.policy
    }

    pub fn decode_step(&mut self, logits: ArrayView1<f32>) -> Result<usize, DecodeError> {
        match (self.policy, self.rng.as_mut()) {
            (DecodePolicy::Sampled { temperature, .. }, Some(rng)) => {
                if logits.is_empty() || logits.iter().all(|v| v.is_nan()) {
                    return Err(DecodeError::EmptyDistribution);
                }
                let scaled = scale_logits(logits, temperature);
                let probs = softmax_1d(scaled.view());
                let dist = WeightedIndex::new(probs.iter().copied())
                    .map_err(|_| DecodeError::EmptyDistribution)?;
                Ok(rng.sample(dist))
            }
            _ => greedy(logits),
        }
    }
}
