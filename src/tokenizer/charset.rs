use super::{Tokenizer, TokenizerError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Id reserved for characters outside the trained vocabulary.
pub const UNK_ID: usize = 0;

fn default_unknown() -> char {
    char::REPLACEMENT_CHARACTER
}

/// Serialized form of a vocabulary, stored inside a checkpoint.
///
/// `symbols[k]` gets token id `k + 1`; id 0 is always the unknown token and
/// decodes to `unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularySpec {
    pub symbols: Vec<char>,
    #[serde(default = "default_unknown")]
    pub unknown: char,
}

/// Character-level tokenizer with a reserved unknown id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharTokenizer {
    stoi: BTreeMap<char, usize>,
    // itos[0] is the replacement char emitted for UNK_ID
    itos: Vec<char>,
}

impl CharTokenizer {
    /// Builds the tokenizer from an ordered symbol list.
    pub fn from_spec(spec: &VocabularySpec) -> Result<Self, TokenizerError> {
        if spec.symbols.is_empty() {
            return Err(TokenizerError::EmptyVocabulary);
        }

        let mut stoi = BTreeMap::new();
        let mut itos = Vec::with_capacity(spec.symbols.len() + 1);
        itos.push(spec.unknown);

        for (offset, &symbol) in spec.symbols.iter().enumerate() {
            if stoi.insert(symbol, offset + 1).is_some() {
                return Err(TokenizerError::DuplicateSymbol(symbol));
            }
            itos.push(symbol);
        }

        Ok(Self { stoi, itos })
    }

    /// Creates a tokenizer over the sorted set of characters in `text`
    pub fn from_text(text: &str) -> Result<Self, TokenizerError> {
        let mut chars: Vec<char> = text.chars().collect();
        chars.sort_unstable();
        chars.dedup();

        Self::from_spec(&VocabularySpec {
            symbols: chars,
            unknown: default_unknown(),
        })
    }

    pub fn encode_char(&self, c: char) -> usize {
        self.stoi.get(&c).copied().unwrap_or(UNK_ID)
    }

    pub fn decode_id(&self, id: usize) -> Result<char, TokenizerError> {
        self.itos
            .get(id)
            .copied()
            .ok_or(TokenizerError::InvalidTokenId {
                id,
                vocab_size: self.itos.len(),
            })
    }

    /// Known symbols in id order (id 1 first).
    pub fn symbols(&self) -> &[char] {
        &self.itos[1..]
    }

    pub fn unknown_char(&self) -> char {
        self.itos[UNK_ID]
    }

    pub fn to_spec(&self) -> VocabularySpec {
        VocabularySpec {
            symbols: self.symbols().to_vec(),
            unknown: self.unknown_char(),
        }
    }
}

impl Tokenizer for CharTokenizer {
    fn encode(&self, text: &str) -> Vec<usize> {
        text.chars().map(|c| self.encode_char(c)).collect()
    }

    fn decode(&self, tokens: &[usize]) -> Result<String, TokenizerError> {
        tokens.iter().map(|&id| self.decode_id(id)).collect()
    }

    fn vocab_size(&self) -> usize {
        self.itos.len()
    }

    fn unk_token_id(&self) -> usize {
        UNK_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn css_tokenizer() -> CharTokenizer {
        CharTokenizer::from_text("a{color:red;}\n ").unwrap()
    }

    #[test]
    fn test_encode_decode() {
        let tokenizer = css_tokenizer();
        let text = "a{color:red;}";

        let encoded = tokenizer.encode(text);
        let decoded = tokenizer.decode(&encoded).unwrap();

        assert_eq!(decoded, text);
    }

    #[test]
    fn test_every_symbol_round_trips() {
        let tokenizer = css_tokenizer();
        for &symbol in tokenizer.symbols() {
            let id = tokenizer.encode_char(symbol);
            assert_ne!(id, UNK_ID);
            assert_eq!(tokenizer.decode_id(id).unwrap(), symbol);
        }
    }

    #[test]
    fn test_unknown_token() {
        let tokenizer = css_tokenizer();
        let encoded = tokenizer.encode("a#");

        assert_eq!(encoded.last(), Some(&UNK_ID));
        assert_eq!(tokenizer.decode_id(UNK_ID).unwrap(), char::REPLACEMENT_CHARACTER);
    }

    #[test]
    fn test_ids_follow_spec_order() {
        let spec = VocabularySpec {
            symbols: vec!['z', 'a', '{'],
            unknown: '?',
        };
        let tokenizer = CharTokenizer::from_spec(&spec).unwrap();

        assert_eq!(tokenizer.encode("za{"), vec![1, 2, 3]);
        assert_eq!(tokenizer.vocab_size(), 4);
        assert_eq!(tokenizer.to_spec(), spec);
    }

    #[test]
    fn test_out_of_range_id_fails() {
        let tokenizer = css_tokenizer();
        let size = tokenizer.vocab_size();

        let err = tokenizer.decode(&[1, size]).unwrap_err();
        assert_eq!(err, TokenizerError::InvalidTokenId { id: size, vocab_size: size });
    }

    #[test]
    fn test_duplicate_and_empty_rejected() {
        let duplicate = VocabularySpec { symbols: vec!['a', 'b', 'a'], unknown: '?' };
        assert_eq!(
            CharTokenizer::from_spec(&duplicate).unwrap_err(),
            TokenizerError::DuplicateSymbol('a')
        );
        assert_eq!(
            CharTokenizer::from_text("").unwrap_err(),
            TokenizerError::EmptyVocabulary
        );
    }
}
