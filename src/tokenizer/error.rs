use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenizerError {
    #[error("Invalid token ID: {id} (vocabulary size {vocab_size})")]
    InvalidTokenId { id: usize, vocab_size: usize },

    #[error("Duplicate symbol in vocabulary: {0:?}")]
    DuplicateSymbol(char),

    #[error("Vocabulary is empty")]
    EmptyVocabulary,
}
