use crate::tokenizer::TokenizerError;

/// Bidirectional mapping between text and the integer ids a model consumes.
pub trait Tokenizer {
    /// Encodes text into tokens. Never fails: unknown input maps to the unknown id.
    fn encode(&self, text: &str) -> Vec<usize>;

    /// Decodes tokens back into text
    fn decode(&self, tokens: &[usize]) -> Result<String, TokenizerError>;

    /// Gets the vocabulary size, reserved ids included
    fn vocab_size(&self) -> usize;

    /// Id every out-of-vocabulary character encodes to
    fn unk_token_id(&self) -> usize;
}
