//! Error types for the CVM program reader.

use thiserror::Error;

/// Errors produced while reading program text.
///
/// All of these mean the input is not a valid program; nothing is
/// translated when one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// The text contains no literal at all, so there is no word count.
    #[error("missing word count")]
    MissingWordCount,

    /// A literal does not fit in a 32-bit signed word.
    #[error("line {line}: invalid number '{token}'")]
    InvalidNumber { line: usize, token: String },

    /// The text ends before the declared number of words.
    #[error("expected {expected} words, found {found}")]
    MissingWords { expected: usize, found: usize },
}
