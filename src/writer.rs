use std::path::Path;

use crate::utils::io::{self, IoError};

/// Decoded characters of one run, committed to disk all at once.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OutputBuffer {
    text: String,
    chars: usize,
}

impl OutputBuffer {
    pub fn with_capacity(bytes: usize) -> Self {
        Self { text: String::with_capacity(bytes), chars: 0 }
    }

    pub fn push(&mut self, c: char) {
        self.text.push(c);
        self.chars += 1;
    }

    /// Number of characters pushed so far
    pub fn len(&self) -> usize {
        self.chars
    }

    pub fn is_empty(&self) -> bool {
        self.chars == 0
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Writes the whole buffer to `dest` in one atomic replace.
    ///
    /// A process killed before the rename leaves no file at `dest` (or the
    /// previous one, untouched), never a prefix of this buffer.
    pub fn commit(&self, dest: impl AsRef<Path>) -> Result<(), IoError> {
        let dest = dest.as_ref();
        io::write_atomic(dest, |w| w.write_all(self.text.as_bytes()))?;
        tracing::debug!(path = %dest.display(), bytes = self.text.len(), "committed output");
        Ok(())
    }
}

impl From<String> for OutputBuffer {
    fn from(text: String) -> Self {
        let chars = text.chars().count();
        Self { text, chars }
    }
}

impl Extend<char> for OutputBuffer {
    fn extend<I: IntoIterator<Item = char>>(&mut self, iter: I) {
        for c in iter {
            self.push(c);
        }
    }
}
