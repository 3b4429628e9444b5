mod charset;
mod error;
mod tokenizer;

pub use charset::{CharTokenizer, VocabularySpec, UNK_ID};
pub use error::TokenizerError;
pub use tokenizer::Tokenizer;
