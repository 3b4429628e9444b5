//! Neural network layers

mod embedding;
mod linear;
mod recurrent;

pub use embedding::Embedding;
pub use linear::Linear;
pub use recurrent::RecurrentLayer;
