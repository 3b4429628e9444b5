//! The per-character inference loop.

use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use crate::decoding::{DecodeError, DecodePolicy, Decoder};
use crate::model::{CharRnn, ModelError};
use crate::tokenizer::TokenizerError;
use crate::writer::OutputBuffer;

const PROGRESS_INTERVAL: usize = 4096;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("invalid decoding policy: {0}")]
    InvalidPolicy(#[source] DecodeError),

    #[error("network step {step} failed: {source}")]
    Layer { step: usize, source: ModelError },

    #[error("decoding step {step} failed: {source}")]
    Decode { step: usize, source: DecodeError },

    #[error("token at step {step} has no character: {source}")]
    InvalidToken { step: usize, source: TokenizerError },
}

/// Runs a shared model over input text, one output char per input char.
#[derive(Debug, Clone)]
pub struct Transformer {
    model: Arc<CharRnn>,
    policy: DecodePolicy,
}

impl Transformer {
    pub fn new(model: Arc<CharRnn>, policy: DecodePolicy) -> Self {
        Self { model, policy }
    }

    pub fn greedy(model: Arc<CharRnn>) -> Self {
        Self::new(model, DecodePolicy::Greedy)
    }

    pub fn model(&self) -> &Arc<CharRnn> {
        &self.model
    }

    pub fn policy(&self) -> DecodePolicy {
        self.policy
    }

    /// Transforms `input`. Either the complete output or an error; never a prefix.
    pub fn run(&self, input: &str) -> Result<String, InferenceError> {
        self.run_to_buffer(input).map(OutputBuffer::into_string)
    }

    pub fn run_to_buffer(&self, input: &str) -> Result<OutputBuffer, InferenceError> {
        let started = Instant::now();
        let tokenizer = self.model.tokenizer();
        let mut decoder = Decoder::new(self.policy).map_err(InferenceError::InvalidPolicy)?;
        let mut output = OutputBuffer::with_capacity(input.len());

        // state is threaded by value: nothing outlives this call
        let mut state = self.model.initial_state();
        for (step, c) in input.chars().enumerate() {
            let token = tokenizer.encode_char(c);
            let (next, logits) = self
                .model
                .step(token, &state)
                .map_err(|source| InferenceError::Layer { step, source })?;
            let predicted = decoder
                .decode_step(logits.view())
                .map_err(|source| InferenceError::Decode { step, source })?;
            let decoded = tokenizer
                .decode_id(predicted)
                .map_err(|source| InferenceError::InvalidToken { step, source })?;

            output.push(decoded);
            state = next;

            if (step + 1) % PROGRESS_INTERVAL == 0 {
                tracing::debug!(step = step + 1, "inference progress");
            }
        }

        tracing::info!(
            chars = output.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "transform finished"
        );
        Ok(output)
    }

    /// Runs independent inputs in parallel on the current rayon pool.
    ///
    /// Every run starts from a zero state, so the result for each input is
    /// identical to calling [`Transformer::run`] on it alone.
    pub fn run_batch<S: AsRef<str> + Sync>(&self, inputs: &[S]) -> Vec<Result<String, InferenceError>> {
        inputs.par_iter().map(|input| self.run(input.as_ref())).collect()
    }
}
