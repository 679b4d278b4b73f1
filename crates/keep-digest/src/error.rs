//! Error types for digest parsing

use thiserror::Error;

/// Errors that can occur while decoding a textual digest
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DigestError {
    /// The text is not exactly the expected number of hex characters
    #[error("invalid digest length: expected {expected} hex characters, got {actual}")]
    InvalidLength {
        /// Expected length in hex characters
        expected: usize,
        /// Actual length in bytes of the input text
        actual: usize,
    },

    /// The text contains a character outside `[0-9a-fA-F]`
    #[error("invalid hex character {character:?} at index {index}")]
    InvalidCharacter {
        /// Offending character
        character: char,
        /// Byte index of the offending character
        index: usize,
    },
}
