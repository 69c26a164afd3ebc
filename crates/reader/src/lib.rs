//! CVM program reader: line-oriented text to word stream.
//!
//! The text format is one decimal literal per line. The first literal is the
//! word count `W`; the next `W` literals are the instruction stream.
//!
//! # Usage
//!
//! ```
//! use cvm_reader::read_program;
//!
//! let text = "6\n12\n0\n5 ; MOV r0, 5\n1\n0\n0\n";
//! let program = read_program(text).unwrap();
//! assert_eq!(program.words(), &[12, 0, 5, 1, 0, 0]);
//! ```

pub mod error;

mod lexer;

pub use error::ReadError;

use cvm_common::Program;
use lexer::scan_line;
use log::{debug, warn};

/// Read program text into a word stream.
///
/// Returns the first error encountered. Literals after the declared word
/// count are ignored.
pub fn read_program(text: &str) -> Result<Program, ReadError> {
    let mut literals = text
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| scan_line(line, idx + 1).transpose());

    let declared = literals.next().ok_or(ReadError::MissingWordCount)??;
    // No sign is recognized, so a literal is never negative.
    let expected = declared as usize;

    // Each word needs at least one byte of text.
    let mut words = Vec::with_capacity(expected.min(text.len()));
    while words.len() < expected {
        match literals.next() {
            Some(word) => words.push(word?),
            None => {
                return Err(ReadError::MissingWords {
                    expected,
                    found: words.len(),
                })
            }
        }
    }

    let trailing = literals.count();
    if trailing > 0 {
        warn!("ignoring {trailing} literal(s) after the declared {expected} words");
    }

    debug!("read {expected} words");
    Ok(Program::new(words))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_minimal() {
        let program = read_program("1\n0\n").unwrap();
        assert_eq!(program.words(), &[0]);
    }

    #[test]
    fn read_without_trailing_newline() {
        let program = read_program("1\n0").unwrap();
        assert_eq!(program.words(), &[0]);
    }

    #[test]
    fn read_with_comments_and_blanks() {
        let text = "\
; program: MOV r0,5; DISPLAY r0; HALT
6

12 ; MOV
0
5
; a comment between words
1 ; DISPLAY
0
0 ; HALT
";
        let program = read_program(text).unwrap();
        assert_eq!(program.words(), &[12, 0, 5, 1, 0, 0]);
    }

    #[test]
    fn zero_word_program() {
        let program = read_program("0\n").unwrap();
        assert!(program.is_empty());
    }

    #[test]
    fn empty_text_is_missing_count() {
        assert_eq!(read_program(""), Err(ReadError::MissingWordCount));
        assert_eq!(
            read_program("; nothing here\n\n"),
            Err(ReadError::MissingWordCount)
        );
    }

    #[test]
    fn too_few_words() {
        assert_eq!(
            read_program("3\n12\n0\n"),
            Err(ReadError::MissingWords {
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn trailing_literals_ignored() {
        let program = read_program("1\n0\n5\n6\n").unwrap();
        assert_eq!(program.words(), &[0]);
    }

    #[test]
    fn invalid_word_reports_line() {
        assert_eq!(
            read_program("2\n12\n99999999999\n"),
            Err(ReadError::InvalidNumber {
                line: 3,
                token: "99999999999".to_string()
            })
        );
    }

    #[test]
    fn illegal_opcodes_are_not_the_readers_concern() {
        let program = read_program("1\n99\n").unwrap();
        assert_eq!(program.words(), &[99]);
    }
}
