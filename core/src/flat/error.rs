use thiserror::Error;

use crate::ast::DataDecodeError;

/// Failures decoding a flat-encoded program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("unexpected end of input at byte {0}")]
    EndOfInput(usize),
    #[error("unknown term tag {0}")]
    UnknownTermTag(u8),
    #[error("unknown builtin tag {0}")]
    UnknownBuiltin(u8),
    #[error("malformed constant type {0:?}")]
    MalformedType(Vec<u8>),
    #[error("constant type nests deeper than {0}")]
    TypeTooDeep(usize),
    #[error("natural number does not fit in {0} bits")]
    NaturalOverflow(u32),
    #[error("filler does not end on a byte boundary at byte {0}")]
    MisalignedFiller(usize),
    #[error("string constant is not valid UTF-8")]
    InvalidUtf8,
    #[error("group element has {found} bytes, expected {expected}")]
    GroupElementLength { expected: usize, found: usize },
    #[error("malformed data constant: {0}")]
    Data(#[from] DataDecodeError),
    #[error("{0} trailing bytes after program")]
    TrailingBytes(usize),
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}
