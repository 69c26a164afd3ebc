//! Line scanner for CVM program text.

use log::warn;

use crate::error::ReadError;

/// Scan a single line for its literal.
///
/// Returns `Ok(None)` for blank lines and comment-only lines. Comments start
/// with `;` and extend to end of line. Every decimal digit before the comment
/// belongs to the line's one literal, so `1 2` reads as `12`; any other
/// character is skipped.
pub(crate) fn scan_line(line: &str, line_num: usize) -> Result<Option<i32>, ReadError> {
    let line = match line.find(';') {
        Some(pos) => &line[..pos],
        None => line,
    };

    let digits: String = line.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Ok(None);
    }

    if line
        .chars()
        .any(|c| !c.is_ascii_digit() && !c.is_whitespace())
    {
        warn!("line {line_num}: ignoring non-digit characters in '{}'", line.trim());
    }

    digits
        .parse::<i32>()
        .map(Some)
        .map_err(|_| ReadError::InvalidNumber {
            line: line_num,
            token: digits,
        })
}
