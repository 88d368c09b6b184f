use std::str::FromStr;

use num_bigint::BigInt;
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use tracing::trace;

use super::error::{ParseError, ParseErrorKind, convert_pest_error};
use super::literal::unescape_string;
use super::syntax::Span;
use crate::ast::{Constant, PlutusData, Program, Term, Type, Version};
use crate::builtins::DefaultFunction;
use crate::scope_stack::ScopeStack;

#[derive(Parser)]
#[grammar = "parser/uplc.pest"]
pub struct UplcParser;

/// Maximum bracket nesting inside a single `(con ...)` form.
///
/// Terms themselves may nest arbitrarily deep; only constant values are
/// matched recursively.
pub const DEFAULT_MAX_CONSTANT_DEPTH: usize = 128;

pub fn parse_program(source: &str) -> Result<Program, ParseError> {
    parse_with_max_depth(source, DEFAULT_MAX_CONSTANT_DEPTH)
}

pub fn parse_with_max_depth(source: &str, max_depth: usize) -> Result<Program, ParseError> {
    check_constant_depth(source, max_depth)?;
    let root = UplcParser::parse(Rule::program, source)
        .map_err(convert_pest_error)?
        .next()
        .ok_or_else(|| missing("program", Span(0..source.len())))?;

    let mut tokens = root.into_inner();
    let header = tokens
        .next()
        .ok_or_else(|| missing("program header", Span(0..source.len())))?;
    let open = Span::from(header.as_span());
    let version = parse_version(header)?;

    let mut builder = Builder::new(Frame::Program {
        open,
        version,
        term: None,
    });
    for token in tokens {
        builder.token(token)?;
    }
    let program = builder.finish_program(source.len())?;
    trace!(version = %program.version, "Parsed program");
    Ok(program)
}

/// Parses a bare term, without the `(program ...)` wrapper.
pub fn parse_term(source: &str) -> Result<Term, ParseError> {
    check_constant_depth(source, DEFAULT_MAX_CONSTANT_DEPTH)?;
    let root = UplcParser::parse(Rule::term, source)
        .map_err(convert_pest_error)?
        .next()
        .ok_or_else(|| missing("term", Span(0..source.len())))?;

    let mut builder = Builder::new(Frame::Root { term: None });
    for token in root.into_inner() {
        builder.token(token)?;
    }
    builder.finish_term(source.len())
}

impl FromStr for Program {
    type Err = ParseError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        parse_program(source)
    }
}

fn missing(what: &str, span: Span) -> ParseError {
    ParseError::new(
        ParseErrorKind::Other {
            message: format!("missing {what}"),
        },
        span,
    )
}

/// A construct whose closing delimiter has not been read yet.
enum Frame {
    Root {
        term: Option<Term>,
    },
    Program {
        open: Span,
        version: Version,
        term: Option<Term>,
    },
    Lambda {
        open: Span,
        body: Option<Term>,
    },
    Delay {
        open: Span,
        body: Option<Term>,
    },
    Force {
        open: Span,
        body: Option<Term>,
    },
    Apply {
        open: Span,
        terms: Vec<Term>,
    },
    Constr {
        open: Span,
        tag: u64,
        fields: Vec<Term>,
    },
    Case {
        open: Span,
        terms: Vec<Term>,
    },
}

impl Frame {
    fn open_span(&self) -> Option<&Span> {
        match self {
            Frame::Root { .. } => None,
            Frame::Program { open, .. }
            | Frame::Lambda { open, .. }
            | Frame::Delay { open, .. }
            | Frame::Force { open, .. }
            | Frame::Apply { open, .. }
            | Frame::Constr { open, .. }
            | Frame::Case { open, .. } => Some(open),
        }
    }

    fn delimiter(&self) -> char {
        match self {
            Frame::Apply { .. } => '[',
            _ => '(',
        }
    }
}

/// Assembles terms from the token stream with an explicit stack of open
/// constructs, resolving names to de Bruijn indices on the way.
struct Builder<'s> {
    frames: Vec<Frame>,
    scopes: ScopeStack<'s>,
    finished: Option<Program>,
}

impl<'s> Builder<'s> {
    fn new(base: Frame) -> Self {
        Self {
            frames: vec![base],
            scopes: ScopeStack::new(),
            finished: None,
        }
    }

    fn token(&mut self, token: Pair<'s, Rule>) -> Result<(), ParseError> {
        let span = Span::from(token.as_span());
        if token.as_rule() == Rule::EOI {
            return Ok(());
        }
        if self.finished.is_some() {
            return Err(ParseError::unexpected("end of input", token.as_str(), span));
        }

        match token.as_rule() {
            Rule::lam_open => {
                let name = token
                    .into_inner()
                    .find(|pair| pair.as_rule() == Rule::name)
                    .ok_or_else(|| missing("binder name", span.clone()))?;
                self.scopes.push(name.as_str());
                self.frames.push(Frame::Lambda {
                    open: span,
                    body: None,
                });
            }
            Rule::delay_open => self.frames.push(Frame::Delay {
                open: span,
                body: None,
            }),
            Rule::force_open => self.frames.push(Frame::Force {
                open: span,
                body: None,
            }),
            Rule::apply_open => self.frames.push(Frame::Apply {
                open: span,
                terms: Vec::new(),
            }),
            Rule::case_open => self.frames.push(Frame::Case {
                open: span,
                terms: Vec::new(),
            }),
            Rule::constr_open => {
                let tag = token
                    .into_inner()
                    .find(|pair| pair.as_rule() == Rule::natural)
                    .ok_or_else(|| missing("constructor tag", span.clone()))?;
                let tag = tag.as_str().parse::<u64>().map_err(|_| {
                    ParseError::invalid_constant(
                        format!("constructor tag {} does not fit in 64 bits", tag.as_str()),
                        span.clone(),
                    )
                })?;
                self.frames.push(Frame::Constr {
                    open: span,
                    tag,
                    fields: Vec::new(),
                });
            }
            Rule::var => {
                let name = token.as_str();
                let index = self.scopes.lookup(name).ok_or_else(|| {
                    ParseError::new(
                        ParseErrorKind::UnboundVariable {
                            name: name.to_string(),
                        },
                        span.clone(),
                    )
                })?;
                self.accept(Term::var(index), span)?;
            }
            Rule::builtin => {
                let name = token
                    .into_inner()
                    .find(|pair| pair.as_rule() == Rule::name)
                    .ok_or_else(|| missing("builtin name", span.clone()))?;
                let fun = name.as_str().parse::<DefaultFunction>().map_err(|_| {
                    ParseError::new(
                        ParseErrorKind::UnknownBuiltin {
                            name: name.as_str().to_string(),
                        },
                        Span::from(name.as_span()),
                    )
                })?;
                self.accept(Term::builtin(fun), span)?;
            }
            Rule::error => self.accept(Term::Error, span)?,
            Rule::constant => {
                let constant = parse_constant(token)?;
                self.accept(Term::constant(constant), span)?;
            }
            Rule::close_paren => self.close(')', span)?,
            Rule::close_bracket => self.close(']', span)?,
            rule => {
                return Err(ParseError::unexpected(
                    "term",
                    format!("{rule:?}"),
                    span,
                ));
            }
        }
        Ok(())
    }

    /// Hands a completed term to the innermost open construct.
    fn accept(&mut self, term: Term, span: Span) -> Result<(), ParseError> {
        let Some(frame) = self.frames.last_mut() else {
            return Err(ParseError::unexpected("end of input", "term", span));
        };
        let expected = match frame {
            Frame::Root { .. } => "end of input",
            _ => "')'",
        };
        let slot = match frame {
            Frame::Apply { terms, .. } | Frame::Case { terms, .. } => {
                terms.push(term);
                return Ok(());
            }
            Frame::Constr { fields, .. } => {
                fields.push(term);
                return Ok(());
            }
            Frame::Root { term: slot } | Frame::Program { term: slot, .. } => slot,
            Frame::Lambda { body, .. } | Frame::Delay { body, .. } | Frame::Force { body, .. } => {
                body
            }
        };
        if slot.is_some() {
            return Err(ParseError::unexpected(expected, "another term", span));
        }
        *slot = Some(term);
        Ok(())
    }

    fn close(&mut self, delimiter: char, span: Span) -> Result<(), ParseError> {
        let found = delimiter.to_string();
        let Some(frame) = self.frames.pop() else {
            return Err(ParseError::unexpected("end of input", found, span));
        };

        let term = match (frame, delimiter) {
            (Frame::Root { .. }, _) => {
                return Err(ParseError::unexpected("term or end of input", found, span));
            }
            (Frame::Apply { terms, .. }, ']') => {
                if terms.len() < 2 {
                    return Err(ParseError::unexpected("function and argument", found, span));
                }
                let mut terms = terms.into_iter();
                let head = terms.next().ok_or_else(|| missing("function", span.clone()))?;
                terms.fold(head, Term::apply)
            }
            (frame @ Frame::Apply { .. }, _) => {
                let open = frame.open_span().cloned().unwrap_or_default();
                return Err(ParseError::unexpected(
                    format!("']' closing the application at {}", open.0.start),
                    found,
                    span,
                ));
            }
            (_, ']') => return Err(ParseError::unexpected("')'", found, span)),
            (Frame::Program { version, term, .. }, _) => {
                let term = term.ok_or_else(|| ParseError::unexpected("term", ")", span))?;
                self.finished = Some(Program::new(version, term));
                return Ok(());
            }
            (Frame::Lambda { body, .. }, _) => {
                let body = body.ok_or_else(|| ParseError::unexpected("lambda body", ")", span.clone()))?;
                self.scopes
                    .pop()
                    .map_err(|e| missing(&e.to_string(), span.clone()))?;
                Term::lambda(body)
            }
            (Frame::Delay { body, .. }, _) => Term::delay(
                body.ok_or_else(|| ParseError::unexpected("term", ")", span.clone()))?,
            ),
            (Frame::Force { body, .. }, _) => Term::force(
                body.ok_or_else(|| ParseError::unexpected("term", ")", span.clone()))?,
            ),
            (Frame::Constr { tag, fields, .. }, _) => Term::constr(tag, fields),
            (Frame::Case { terms, .. }, _) => {
                let mut terms = terms.into_iter();
                let scrutinee = terms
                    .next()
                    .ok_or_else(|| ParseError::unexpected("scrutinee", ")", span.clone()))?;
                Term::case(scrutinee, terms.collect())
            }
        };
        self.accept(term, span)
    }

    fn unclosed(&self) -> Option<ParseError> {
        let frame = self.frames.last()?;
        let open = frame.open_span()?;
        Some(ParseError::new(
            ParseErrorKind::UnclosedDelimiter {
                delimiter: frame.delimiter(),
            },
            open.clone(),
        ))
    }

    fn finish_program(self, end: usize) -> Result<Program, ParseError> {
        if let Some(program) = self.finished {
            return Ok(program);
        }
        Err(self
            .unclosed()
            .unwrap_or_else(|| missing("program", Span(end..end))))
    }

    fn finish_term(mut self, end: usize) -> Result<Term, ParseError> {
        if self.frames.len() > 1 {
            if let Some(error) = self.unclosed() {
                return Err(error);
            }
        }
        match self.frames.pop() {
            Some(Frame::Root { term: Some(term) }) => Ok(term),
            _ => Err(ParseError::unexpected(
                "term",
                "end of input",
                Span(end..end),
            )),
        }
    }
}

fn parse_version(header: Pair<'_, Rule>) -> Result<Version, ParseError> {
    let span = Span::from(header.as_span());
    let version = header
        .into_inner()
        .find(|pair| pair.as_rule() == Rule::version)
        .ok_or_else(|| missing("version", span.clone()))?;
    let text = version.as_str();
    let invalid = || {
        ParseError::new(
            ParseErrorKind::InvalidVersion {
                text: text.to_string(),
            },
            Span::from(version.as_span()),
        )
    };

    let parts = version
        .clone()
        .into_inner()
        .map(|part| part.as_str().parse::<u64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;
    match parts.as_slice() {
        [major, minor, patch] => Ok(Version::new(*major, *minor, *patch)),
        _ => Err(invalid()),
    }
}

fn parse_constant(pair: Pair<'_, Rule>) -> Result<Constant, ParseError> {
    let span = Span::from(pair.as_span());
    let mut inner = pair
        .into_inner()
        .filter(|pair| pair.as_rule() != Rule::kw_con);
    let ty = inner.next().ok_or_else(|| missing("constant type", span.clone()))?;
    let value = inner
        .next()
        .ok_or_else(|| missing("constant value", span.clone()))?;
    let ty = parse_type(ty)?;
    parse_value(&ty, value)
}

fn parse_type(pair: Pair<'_, Rule>) -> Result<Type, ParseError> {
    let span = Span::from(pair.as_span());
    match pair.as_rule() {
        Rule::ty_atom => match pair.as_str() {
            "integer" => Ok(Type::Integer),
            "bytestring" => Ok(Type::ByteString),
            "string" => Ok(Type::String),
            "unit" => Ok(Type::Unit),
            "bool" => Ok(Type::Bool),
            "data" => Ok(Type::Data),
            "bls12_381_G1_element" => Ok(Type::Bls12_381G1Element),
            "bls12_381_G2_element" => Ok(Type::Bls12_381G2Element),
            other => Err(ParseError::unexpected("type", other, span)),
        },
        Rule::ty_list => {
            let element = pair
                .into_inner()
                .next()
                .ok_or_else(|| missing("list element type", span.clone()))?;
            Ok(Type::list(parse_type(element)?))
        }
        Rule::ty_pair => {
            let mut inner = pair.into_inner();
            let (Some(first), Some(second)) = (inner.next(), inner.next()) else {
                return Err(missing("pair component types", span));
            };
            Ok(Type::pair(parse_type(first)?, parse_type(second)?))
        }
        rule => Err(ParseError::unexpected("type", format!("{rule:?}"), span)),
    }
}

fn parse_value(ty: &Type, pair: Pair<'_, Rule>) -> Result<Constant, ParseError> {
    let span = Span::from(pair.as_span());
    let text = pair.as_str();

    match (ty, pair.as_rule()) {
        (Type::Integer, Rule::integer_value) => Ok(Constant::Integer(parse_integer(text, span)?)),
        (Type::ByteString, Rule::bytes_value) => {
            Ok(Constant::ByteString(parse_hex(&text[1..], span)?))
        }
        (Type::String, Rule::string_value) => {
            let body = pair
                .into_inner()
                .next()
                .map(|text| text.as_str())
                .unwrap_or_default();
            let unescaped = unescape_string(body)
                .map_err(|e| ParseError::invalid_constant(e.to_string(), span))?;
            Ok(Constant::String(unescaped.into_owned()))
        }
        (Type::Unit, Rule::unit_value) => Ok(Constant::Unit),
        (Type::Bool, Rule::bool_value) => Ok(Constant::Bool(text == "True")),
        (Type::List(element), Rule::list_value) => {
            let items = pair
                .into_inner()
                .map(|item| parse_value(element, item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Constant::ProtoList((**element).clone(), items))
        }
        (Type::Pair(first_type, second_type), Rule::pair_value) => {
            let mut inner = pair.into_inner();
            let (Some(first), Some(second)) = (inner.next(), inner.next()) else {
                return Err(missing("pair components", span));
            };
            Ok(Constant::ProtoPair(
                (**first_type).clone(),
                (**second_type).clone(),
                parse_value(first_type, first)?.into(),
                parse_value(second_type, second)?.into(),
            ))
        }
        (Type::Data, Rule::data_value) => {
            let data = pair
                .into_inner()
                .next()
                .ok_or_else(|| missing("data", span.clone()))?;
            Ok(Constant::Data(parse_data(data)?))
        }
        (Type::Bls12_381G1Element, Rule::point_value) => {
            let bytes = parse_hex(&text[2..], span.clone())?;
            let point = <[u8; 48]>::try_from(bytes.as_slice()).map_err(|_| {
                ParseError::invalid_constant(
                    format!("G1 element needs 48 bytes, found {}", bytes.len()),
                    span,
                )
            })?;
            Ok(Constant::Bls12_381G1Element(Box::new(point)))
        }
        (Type::Bls12_381G2Element, Rule::point_value) => {
            let bytes = parse_hex(&text[2..], span.clone())?;
            let point = <[u8; 96]>::try_from(bytes.as_slice()).map_err(|_| {
                ParseError::invalid_constant(
                    format!("G2 element needs 96 bytes, found {}", bytes.len()),
                    span,
                )
            })?;
            Ok(Constant::Bls12_381G2Element(Box::new(point)))
        }
        (ty, _) => Err(ParseError::invalid_constant(
            format!("'{text}' is not a value of type {ty}"),
            span,
        )),
    }
}

fn parse_data(pair: Pair<'_, Rule>) -> Result<PlutusData, ParseError> {
    let span = Span::from(pair.as_span());
    match pair.as_rule() {
        Rule::data_constr => {
            let mut inner = pair.into_inner();
            let tag = inner
                .next()
                .ok_or_else(|| missing("constructor tag", span.clone()))?;
            let tag = tag.as_str().parse::<u64>().map_err(|_| {
                ParseError::invalid_constant("constructor tag does not fit in 64 bits", span.clone())
            })?;
            let fields = inner.map(parse_data).collect::<Result<Vec<_>, _>>()?;
            Ok(PlutusData::Constr { tag, fields })
        }
        Rule::data_map => {
            let entries = pair
                .into_inner()
                .map(|entry| {
                    let entry_span = Span::from(entry.as_span());
                    let mut inner = entry.into_inner();
                    match (inner.next(), inner.next()) {
                        (Some(key), Some(value)) => Ok((parse_data(key)?, parse_data(value)?)),
                        _ => Err(missing("map entry", entry_span)),
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(PlutusData::Map(entries))
        }
        Rule::data_list => {
            let items = pair
                .into_inner()
                .map(parse_data)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(PlutusData::List(items))
        }
        Rule::data_integer => {
            let value = pair
                .into_inner()
                .next()
                .ok_or_else(|| missing("integer", span.clone()))?;
            Ok(PlutusData::Integer(parse_integer(value.as_str(), span)?))
        }
        Rule::data_bytes => {
            let value = pair
                .into_inner()
                .next()
                .ok_or_else(|| missing("byte string", span.clone()))?;
            Ok(PlutusData::ByteString(parse_hex(&value.as_str()[1..], span)?))
        }
        rule => Err(ParseError::unexpected("data", format!("{rule:?}"), span)),
    }
}

fn parse_integer(text: &str, span: Span) -> Result<BigInt, ParseError> {
    text.parse::<BigInt>()
        .map_err(|e| ParseError::invalid_constant(format!("integer '{text}': {e}"), span))
}

fn parse_hex(digits: &str, span: Span) -> Result<Vec<u8>, ParseError> {
    hex::decode(digits).map_err(|e| ParseError::invalid_constant(format!("hex '{digits}': {e}"), span))
}

/// Rejects constants nested deeper than `max_depth` before pest recurses
/// into them. Brackets outside `(con ...)` forms are not counted.
fn check_constant_depth(source: &str, max_depth: usize) -> Result<(), ParseError> {
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    let mut constant_base: Option<usize> = None;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            open @ (b'(' | b'[') => {
                depth += 1;
                if constant_base.is_none() && open == b'(' && opens_constant(&source[i + 1..]) {
                    constant_base = Some(depth);
                }
                if let Some(base) = constant_base {
                    if depth - base > max_depth {
                        return Err(ParseError::new(
                            ParseErrorKind::MaxDepthExceeded { max_depth },
                            Span(i..i + 1),
                        ));
                    }
                }
            }
            b')' | b']' => {
                if constant_base == Some(depth) {
                    constant_base = None;
                }
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
        i += 1;
    }
    Ok(())
}

fn opens_constant(rest: &str) -> bool {
    let rest = rest.trim_start();
    rest.strip_prefix("con").is_some_and(|after| {
        !after
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '\'')
    })
}
