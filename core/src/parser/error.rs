use thiserror::Error;

use crate::api::{Diagnostic, Severity};
use crate::parser::{Rule, Span};

/// A textual program that could not be read, with the offending location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

/// Specific kinds of parse errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("unclosed '{delimiter}'")]
    UnclosedDelimiter { delimiter: char },

    #[error("variable '{name}' is not bound by any enclosing lambda")]
    UnboundVariable { name: String },

    #[error("unknown builtin '{name}'")]
    UnknownBuiltin { name: String },

    #[error("invalid constant: {message}")]
    InvalidConstant { message: String },

    #[error("invalid version '{text}'")]
    InvalidVersion { text: String },

    #[error("constant nesting depth exceeds maximum of {max_depth} levels")]
    MaxDepthExceeded { max_depth: usize },

    #[error("{message}")]
    Other { message: String },
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub(crate) fn unexpected(expected: impl Into<String>, found: impl Into<String>, span: Span) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedToken {
                expected: expected.into(),
                found: found.into(),
            },
            span,
        )
    }

    pub(crate) fn invalid_constant(message: impl Into<String>, span: Span) -> Self {
        Self::new(
            ParseErrorKind::InvalidConstant {
                message: message.into(),
            },
            span,
        )
    }

    /// Convert to a Diagnostic for API boundary
    pub fn to_diagnostic(&self) -> Diagnostic {
        let (code, help) = match &self.kind {
            ParseErrorKind::UnexpectedToken { .. } => ("P001", None),
            ParseErrorKind::UnclosedDelimiter { .. } => {
                ("P002", Some("Add the missing closing delimiter"))
            }
            ParseErrorKind::UnboundVariable { .. } => (
                "P003",
                Some("Programs must be closed; bind the name with a lambda"),
            ),
            ParseErrorKind::UnknownBuiltin { .. } => ("P004", None),
            ParseErrorKind::InvalidConstant { .. } => ("P005", None),
            ParseErrorKind::InvalidVersion { .. } => {
                ("P006", Some("Versions are written MAJOR.MINOR.PATCH"))
            }
            ParseErrorKind::MaxDepthExceeded { .. } => {
                ("P007", Some("Reduce the nesting of the constant"))
            }
            ParseErrorKind::Other { .. } => ("P999", None),
        };

        Diagnostic {
            severity: Severity::Error,
            message: self.kind.to_string(),
            span: self.span.clone(),
            related: Vec::new(),
            help: help.map(str::to_string),
            code: Some(code.to_string()),
        }
    }
}

/// Convert Pest error to human-readable ParseError
pub fn convert_pest_error(err: pest::error::Error<Rule>) -> ParseError {
    use pest::error::ErrorVariant;

    let span = match err.location {
        pest::error::InputLocation::Pos(pos) => Span(pos..pos),
        pest::error::InputLocation::Span((start, end)) => Span(start..end),
    };

    let kind = match err.variant {
        ErrorVariant::ParsingError {
            positives,
            negatives,
        } => ParseErrorKind::UnexpectedToken {
            expected: format_expected_rules(&positives),
            found: format_found_rules(&negatives),
        },
        ErrorVariant::CustomError { message } => ParseErrorKind::Other { message },
    };

    ParseError::new(kind, span)
}

/// Format expected rules in a human-readable way
fn format_expected_rules(rules: &[Rule]) -> String {
    let mut concepts: Vec<&str> = Vec::new();

    for rule in rules {
        let concept = match rule {
            Rule::program_open => "program header",
            Rule::version | Rule::natural => "number",
            Rule::name | Rule::var => "name",
            Rule::ty_atom | Rule::ty_list | Rule::ty_pair => "type",
            Rule::point_value
            | Rule::integer_value
            | Rule::bytes_value
            | Rule::string_value
            | Rule::unit_value
            | Rule::bool_value
            | Rule::list_value
            | Rule::pair_value
            | Rule::data_value => "constant value",
            Rule::data_constr
            | Rule::data_map
            | Rule::data_list
            | Rule::data_integer
            | Rule::data_bytes => "data",
            Rule::close_paren => "')'",
            Rule::close_bracket => "']'",
            Rule::EOI => "end of input",
            _ => "term",
        };
        if !concepts.contains(&concept) {
            concepts.push(concept);
        }
    }

    match concepts.split_last() {
        None => "something else".to_string(),
        Some((only, [])) => only.to_string(),
        Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
    }
}

/// Format found rules in a human-readable way
fn format_found_rules(rules: &[Rule]) -> String {
    match rules.first() {
        None => "unexpected token".to_string(),
        Some(Rule::name | Rule::var) => "name".to_string(),
        Some(Rule::EOI) => "end of input".to_string(),
        Some(rule) => format!("{:?}", rule),
    }
}
