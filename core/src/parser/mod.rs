//! Textual form of Untyped Plutus Core.
//!
//! ```text
//! (program 1.1.0
//!   [(lam x [(builtin addInteger) x (con integer 1)]) (con integer 41)])
//! ```
//!
//! Named binders are resolved to de Bruijn indices while parsing, so the
//! resulting terms are closed. [`Display`](std::fmt::Display) on terms and
//! programs prints this syntax back.

pub mod error;
mod literal;
pub mod parser;
mod syntax;

// Re-export the parser and rule enum for external use
pub use parser::{
    DEFAULT_MAX_CONSTANT_DEPTH, Rule, UplcParser, parse_program, parse_term, parse_with_max_depth,
};

pub use error::{ParseError, ParseErrorKind};
pub use literal::UnescapeError;
pub use syntax::Span;
