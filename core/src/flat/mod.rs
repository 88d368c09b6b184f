//! The flat binary encoding of programs.
//!
//! A program is three version naturals, the term, and a filler that pads
//! to a byte boundary. Terms start with a 4-bit tag:
//!
//! | tag | term     | payload                                  |
//! |-----|----------|------------------------------------------|
//! | 0   | var      | de Bruijn index (natural)                |
//! | 1   | delay    | body                                     |
//! | 2   | lam      | body                                     |
//! | 3   | apply    | function, argument                       |
//! | 4   | con      | type tag list, value                     |
//! | 5   | force    | body                                     |
//! | 6   | error    |                                          |
//! | 7   | builtin  | 7-bit builtin tag                        |
//! | 8   | constr   | tag (natural), term list                 |
//! | 9   | case     | scrutinee, term list                     |
//!
//! Lists are a one bit before each element and a zero bit at the end.
//! Decoding does not recurse on term depth.

mod bits;
mod decoder;
mod encoder;
mod error;

pub use decoder::MAX_TYPE_DEPTH;
pub use error::DecodeError;

use crate::ast::Program;

pub(crate) mod tags {
    pub const TERM_BITS: u8 = 4;
    pub const BUILTIN_BITS: u8 = 7;
    pub const TYPE_BITS: u8 = 4;

    pub const VAR: u8 = 0;
    pub const DELAY: u8 = 1;
    pub const LAMBDA: u8 = 2;
    pub const APPLY: u8 = 3;
    pub const CONSTANT: u8 = 4;
    pub const FORCE: u8 = 5;
    pub const ERROR: u8 = 6;
    pub const BUILTIN: u8 = 7;
    pub const CONSTR: u8 = 8;
    pub const CASE: u8 = 9;

    pub const INTEGER: u8 = 0;
    pub const BYTE_STRING: u8 = 1;
    pub const STRING: u8 = 2;
    pub const UNIT: u8 = 3;
    pub const BOOL: u8 = 4;
    pub const LIST: u8 = 5;
    pub const PAIR: u8 = 6;
    /// Type application: `[7, 5, a]` is `(list a)`, `[7, 7, 6, a, b]` is
    /// `(pair a b)`.
    pub const APPLY_TYPE: u8 = 7;
    pub const DATA: u8 = 8;
    pub const G1: u8 = 9;
    pub const G2: u8 = 10;
}

impl Program {
    pub fn to_flat(&self) -> Vec<u8> {
        encoder::encode_program(self)
    }

    pub fn from_flat(bytes: &[u8]) -> Result<Program, DecodeError> {
        decoder::decode_program(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_flat())
    }

    /// Decodes hex-encoded flat bytes. Surrounding whitespace is ignored.
    pub fn from_hex(text: &str) -> Result<Program, DecodeError> {
        Program::from_flat(&hex::decode(text.trim())?)
    }
}

#[cfg(test)]
mod flat_test;
