//! Unescaping of string constants.
//!
//! Accepts the escapes the printer produces (`\"`, `\\`, `\n`, `\t`, `\r`
//! and `\u{X}` with 1 to 6 hex digits) plus `\0`, `\'` and the fixed-width
//! `\uNNNN` form.

use std::borrow::Cow;

use thiserror::Error;

/// Errors that can occur when unescaping string literals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnescapeError {
    #[error("invalid escape sequence '{seq}' at position {pos}")]
    InvalidEscape { pos: usize, seq: String },

    #[error("invalid hex digit in '{seq}' at position {pos}")]
    InvalidHexDigit { pos: usize, seq: String },

    #[error("incomplete Unicode escape at position {pos}")]
    IncompleteUnicodeEscape { pos: usize },

    #[error("invalid Unicode scalar value U+{value:X} at position {pos}")]
    InvalidUnicodeScalar { pos: usize, value: u32 },
}

/// Unescape the text between the quotes of a string constant.
///
/// Returns the input unchanged when it has no backslashes.
pub fn unescape_string(input: &str) -> Result<Cow<'_, str>, UnescapeError> {
    if !input.contains('\\') {
        return Ok(Cow::Borrowed(input));
    }

    let mut output = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        if ch != '\\' {
            output.push(ch);
            continue;
        }

        match chars.next() {
            Some((_, 'n')) => output.push('\n'),
            Some((_, 'r')) => output.push('\r'),
            Some((_, 't')) => output.push('\t'),
            Some((_, '0')) => output.push('\0'),
            Some((_, '\\')) => output.push('\\'),
            Some((_, '"')) => output.push('"'),
            Some((_, '\'')) => output.push('\''),
            Some((_, 'u')) => {
                let braced = chars.peek().map(|(_, c)| *c) == Some('{');
                if braced {
                    chars.next();
                }

                let mut value = 0u32;
                let mut digits = 0;
                loop {
                    match chars.next() {
                        Some((_, '}')) if braced && digits > 0 => break,
                        Some((_, c)) => {
                            let digit = c.to_digit(16).ok_or_else(|| {
                                UnescapeError::InvalidHexDigit {
                                    pos,
                                    seq: format!("\\u{}", c),
                                }
                            })?;
                            value = (value << 4) | digit;
                            digits += 1;
                            if !braced && digits == 4 {
                                break;
                            }
                            if braced && digits > 6 {
                                return Err(UnescapeError::InvalidEscape {
                                    pos,
                                    seq: "\\u{...}".to_string(),
                                });
                            }
                        }
                        None => return Err(UnescapeError::IncompleteUnicodeEscape { pos }),
                    }
                }

                let decoded = char::from_u32(value)
                    .ok_or(UnescapeError::InvalidUnicodeScalar { pos, value })?;
                output.push(decoded);
            }
            Some((_, other)) => {
                return Err(UnescapeError::InvalidEscape {
                    pos,
                    seq: format!("\\{}", other),
                });
            }
            None => {
                return Err(UnescapeError::InvalidEscape {
                    pos,
                    seq: "\\".to_string(),
                });
            }
        }
    }

    Ok(Cow::Owned(output))
}
