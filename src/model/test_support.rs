//! Hand-built models shared by unit tests.

use ndarray::{array, Array2};

use super::{CellKind, CharRnn, Linear, ModelConfig, RecurrentLayer};
use crate::tokenizer::{CharTokenizer, VocabularySpec};

pub fn css_vocabulary() -> VocabularySpec {
    VocabularySpec {
        symbols: "\n !#%(),-.0123456789:;@abcdefghijklmnopqrstuvwxyz{}".chars().collect(),
        unknown: char::REPLACEMENT_CHARACTER,
    }
}

pub fn small_config(cell: CellKind) -> ModelConfig {
    ModelConfig {
        cell,
        vocab_size: css_vocabulary().symbols.len() + 1,
        embed_dim: None,
        hidden_size: 6,
        num_layers: 2,
    }
}

/// One-cell LSTM over {unknown, 'a', 'b'} that echoes 'a' until it has seen
/// a 'b', then emits 'b' for the rest of the run.
///
/// Input gate opens only on 'b' (pre-activation ±10), forget and output gates
/// stay open (+10) and the candidate saturates to tanh(10) ≈ 1, so the cell
/// holds ≈ 0 before the first 'b' and ≈ 1 after it. The projection
/// `[-10, 2 - 4h, -2 + 4h]` flips from 'a' to 'b' once h = o·tanh(c) > 0.5.
pub fn latch_model() -> CharRnn {
    let config = ModelConfig {
        cell: CellKind::Lstm,
        vocab_size: 3,
        embed_dim: None,
        hidden_size: 1,
        num_layers: 1,
    };
    let tokenizer = CharTokenizer::from_spec(&VocabularySpec {
        symbols: vec!['a', 'b'],
        unknown: '?',
    })
    .unwrap();

    // rows: one-hot [unk, a, b] then h; columns: [i, f, o, g]
    let weight: Array2<f32> = array![
        [-10.0, 0.0, 0.0, 0.0],
        [-10.0, 0.0, 0.0, 0.0],
        [10.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0],
    ];
    let gates = Linear::from_parts(weight, array![0.0, 10.0, 10.0, 10.0]).unwrap();
    let layer = RecurrentLayer::new(CellKind::Lstm, 3, 1, gates).unwrap();
    let projection = Linear::from_parts(array![[0.0, -4.0, 4.0]], array![-10.0, 2.0, -2.0]).unwrap();

    CharRnn::new(config, tokenizer, None, vec![layer], projection).unwrap()
}
