//! Public error types for the evaluator API.
//!
//! Evaluation failures are not errors here: they are ordinary
//! [`EvalResult::Failure`](super::EvalResult::Failure) outcomes. This module
//! covers the boundary, where a program or a cost model could not be read.

use std::fmt;

use thiserror::Error;

use crate::cost::CostModelError;
use crate::flat::DecodeError;
use crate::parser::{ParseError, Span};

/// Public error type for everything that happens before evaluation starts.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid API usage, such as an unknown backend name.
    #[error("API error: {0}")]
    Api(String),

    /// The textual program could not be parsed.
    #[error("{}", parse_summary(.diagnostics))]
    Parse { diagnostics: Vec<Diagnostic> },

    /// The flat-encoded program could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The cost model could not be loaded.
    #[error("cost model error: {0}")]
    CostModel(#[from] CostModelError),
}

fn parse_summary(diagnostics: &[Diagnostic]) -> String {
    match diagnostics {
        [only] => format!("parse error: {}", only.message),
        _ => format!("parsing failed with {} error(s)", diagnostics.len()),
    }
}

impl Error {
    /// Diagnostics for rendering. Errors without a source location get a
    /// single diagnostic with an empty span.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            Error::Parse { diagnostics } => diagnostics.clone(),
            other => vec![Diagnostic {
                severity: Severity::Error,
                message: other.to_string(),
                span: Span(0..0),
                related: Vec::new(),
                help: None,
                code: None,
            }],
        }
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Parse {
            diagnostics: vec![err.to_diagnostic()],
        }
    }
}

/// A diagnostic message (error, warning, or info) with source location.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level (error, warning, info).
    pub severity: Severity,

    /// Primary diagnostic message.
    pub message: String,

    /// Source location of the primary issue.
    pub span: Span,

    /// Related locations that provide additional context.
    pub related: Vec<RelatedInfo>,

    /// Optional help text suggesting how to fix the issue.
    pub help: Option<String>,

    /// Optional error code (e.g., "P001") for documentation lookup.
    pub code: Option<String>,
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Related information for a diagnostic (e.g., "opened here").
#[derive(Debug, Clone)]
pub struct RelatedInfo {
    /// Source location of the related information.
    pub span: Span,

    /// Message explaining the relevance.
    pub message: String,
}
