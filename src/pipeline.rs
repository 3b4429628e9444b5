//! File-to-file transform: read input, run the model, commit the output.

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RunConfig;
use crate::error::TinyRnnError;
use crate::inference::Transformer;
use crate::model::CharRnn;
use crate::utils::io;

/// What one committed run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub output: PathBuf,
    pub chars: usize,
    pub bytes: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Transforms one file. The output file appears only after a complete,
/// successful run; on any error no file is left at `output`, including one
/// from an earlier run.
pub fn transform_file(
    model: &Arc<CharRnn>,
    input: &Path,
    output: &Path,
    config: &RunConfig,
) -> Result<RunSummary, TinyRnnError> {
    let started = Instant::now();
    io::remove_if_exists(output)?;
    let text = io::read_to_string(input)?;
    tracing::debug!(input = %input.display(), bytes = text.len(), "read input");

    let transformer = Transformer::new(Arc::clone(model), config.decoding);
    let buffer = transformer.run_to_buffer(&text)?;
    buffer.commit(output)?;

    let summary = RunSummary {
        output: output.to_path_buf(),
        chars: buffer.len(),
        bytes: buffer.as_str().len(),
        elapsed: started.elapsed(),
    };
    tracing::info!(
        output = %output.display(),
        chars = summary.chars,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "wrote output"
    );
    Ok(summary)
}

/// Transforms independent files concurrently against one shared model.
///
/// Results come back in job order; a failed job leaves its own output absent
/// and does not affect the others.
pub fn transform_files(
    model: &Arc<CharRnn>,
    jobs: &[TransformJob],
    config: &RunConfig,
) -> Result<Vec<Result<RunSummary, TinyRnnError>>, TinyRnnError> {
    config.validate()?;
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = config.threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder
        .build()
        .map_err(|e| TinyRnnError::Config(format!("cannot start worker pool: {e}")))?;

    Ok(pool.install(|| {
        jobs.par_iter()
            .map(|job| transform_file(model, &job.input, &job.output, config))
            .collect()
    }))
}
