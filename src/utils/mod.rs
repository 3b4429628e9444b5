//! Utility functions for the TinyRNN project
pub mod io;
pub mod math;

// Re-export commonly used utilities
pub use io::*;
pub use math::*;
