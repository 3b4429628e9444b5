pub mod checkpoint;
pub use checkpoint::{load_model, save_model, Checkpoint};

pub mod config;
pub use config::RunConfig;

pub mod decoding;
pub use decoding::{DecodePolicy, Decoder};

pub mod error;
pub use error::TinyRnnError;

pub mod inference;
pub use inference::{InferenceError, Transformer};

pub mod model;
pub use model::{CellKind, CharRnn, ModelConfig};

pub mod pipeline;
pub use pipeline::{transform_file, transform_files, RunSummary, TransformJob};

pub mod tokenizer;
pub use tokenizer::{CharTokenizer, Tokenizer};

pub mod utils;

pub mod writer;
pub use writer::OutputBuffer;
