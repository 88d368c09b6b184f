use std::rc::Rc;

use num_bigint::{BigInt, BigUint};

use crate::{
    ast::{Constant, PlutusData, Program, Term, Type, Version},
    builtins::DefaultFunction,
    flat::{DecodeError, bits::BitReader, tags},
};

/// Deepest constant type accepted, e.g. `(list (list ...))`.
pub const MAX_TYPE_DEPTH: usize = 64;

/// Terms waiting for subterms.
enum Frame {
    Delay,
    Lambda,
    Force,
    ApplyFunction,
    ApplyArgument(Rc<Term>),
    Constr { tag: u64, fields: Vec<Rc<Term>> },
    CaseScrutinee,
    CaseBranches { scrutinee: Rc<Term>, branches: Vec<Rc<Term>> },
}

pub(crate) fn decode_program(bytes: &[u8]) -> Result<Program, DecodeError> {
    let mut input = BitReader::new(bytes);
    let version = Version::new(
        input.natural(64)?,
        input.natural(64)?,
        input.natural(64)?,
    );
    let term = decode_term(&mut input)?;
    input.filler()?;
    match input.remaining() {
        0 => Ok(Program { version, term }),
        extra => Err(DecodeError::TrailingBytes(extra)),
    }
}

fn decode_term(input: &mut BitReader<'_>) -> Result<Rc<Term>, DecodeError> {
    let mut frames: Vec<Frame> = Vec::new();
    'decode: loop {
        // Read term heads until one is complete.
        let mut term = loop {
            let tag = input.bits(tags::TERM_BITS)?;
            let leaf = match tag {
                tags::VAR => Term::Var(natural_usize(input)?),
                tags::DELAY => {
                    frames.push(Frame::Delay);
                    continue;
                }
                tags::LAMBDA => {
                    frames.push(Frame::Lambda);
                    continue;
                }
                tags::APPLY => {
                    frames.push(Frame::ApplyFunction);
                    continue;
                }
                tags::CONSTANT => Term::Constant(Rc::new(decode_constant(input)?)),
                tags::FORCE => {
                    frames.push(Frame::Force);
                    continue;
                }
                tags::ERROR => Term::Error,
                tags::BUILTIN => {
                    let tag = input.bits(tags::BUILTIN_BITS)?;
                    Term::Builtin(
                        DefaultFunction::from_tag(tag).ok_or(DecodeError::UnknownBuiltin(tag))?,
                    )
                }
                tags::CONSTR => {
                    let tag = input.natural(64)?;
                    if input.bit()? {
                        frames.push(Frame::Constr {
                            tag,
                            fields: Vec::new(),
                        });
                        continue;
                    }
                    Term::Constr {
                        tag,
                        fields: Vec::new(),
                    }
                }
                tags::CASE => {
                    frames.push(Frame::CaseScrutinee);
                    continue;
                }
                other => return Err(DecodeError::UnknownTermTag(other)),
            };
            break Rc::new(leaf);
        };

        // Hand the finished term to waiting frames.
        loop {
            let Some(frame) = frames.pop() else {
                return Ok(term);
            };
            let built = match frame {
                Frame::Delay => Term::Delay(term),
                Frame::Lambda => Term::Lambda(term),
                Frame::Force => Term::Force(term),
                Frame::ApplyFunction => {
                    frames.push(Frame::ApplyArgument(term));
                    continue 'decode;
                }
                Frame::ApplyArgument(function) => Term::Apply {
                    function,
                    argument: term,
                },
                Frame::Constr { tag, mut fields } => {
                    fields.push(term);
                    if input.bit()? {
                        frames.push(Frame::Constr { tag, fields });
                        continue 'decode;
                    }
                    Term::Constr { tag, fields }
                }
                Frame::CaseScrutinee => {
                    if input.bit()? {
                        frames.push(Frame::CaseBranches {
                            scrutinee: term,
                            branches: Vec::new(),
                        });
                        continue 'decode;
                    }
                    Term::Case {
                        scrutinee: term,
                        branches: Vec::new(),
                    }
                }
                Frame::CaseBranches {
                    scrutinee,
                    mut branches,
                } => {
                    branches.push(term);
                    if input.bit()? {
                        frames.push(Frame::CaseBranches {
                            scrutinee,
                            branches,
                        });
                        continue 'decode;
                    }
                    Term::Case {
                        scrutinee,
                        branches,
                    }
                }
            };
            term = Rc::new(built);
        }
    }
}

fn natural_usize(input: &mut BitReader<'_>) -> Result<usize, DecodeError> {
    let n = input.natural(usize::BITS.min(64))?;
    usize::try_from(n).map_err(|_| DecodeError::NaturalOverflow(usize::BITS))
}

fn decode_constant(input: &mut BitReader<'_>) -> Result<Constant, DecodeError> {
    let mut list = Vec::new();
    while input.bit()? {
        list.push(input.bits(tags::TYPE_BITS)?);
    }
    let mut pos = 0;
    let ty = parse_type(&list, &mut pos, 0)?;
    if pos != list.len() {
        return Err(DecodeError::MalformedType(list));
    }
    decode_value(&ty, input)
}

fn parse_type(list: &[u8], pos: &mut usize, depth: usize) -> Result<Type, DecodeError> {
    if depth > MAX_TYPE_DEPTH {
        return Err(DecodeError::TypeTooDeep(MAX_TYPE_DEPTH));
    }
    let malformed = || DecodeError::MalformedType(list.to_vec());
    let tag = *list.get(*pos).ok_or_else(malformed)?;
    *pos += 1;
    let ty = match tag {
        tags::INTEGER => Type::Integer,
        tags::BYTE_STRING => Type::ByteString,
        tags::STRING => Type::String,
        tags::UNIT => Type::Unit,
        tags::BOOL => Type::Bool,
        tags::DATA => Type::Data,
        tags::G1 => Type::Bls12_381G1Element,
        tags::G2 => Type::Bls12_381G2Element,
        tags::APPLY_TYPE => match list.get(*pos..) {
            Some([tags::LIST, ..]) => {
                *pos += 1;
                Type::list(parse_type(list, pos, depth + 1)?)
            }
            Some([tags::APPLY_TYPE, tags::PAIR, ..]) => {
                *pos += 2;
                let first = parse_type(list, pos, depth + 1)?;
                let second = parse_type(list, pos, depth + 1)?;
                Type::pair(first, second)
            }
            _ => return Err(malformed()),
        },
        _ => return Err(malformed()),
    };
    Ok(ty)
}

fn decode_value(ty: &Type, input: &mut BitReader<'_>) -> Result<Constant, DecodeError> {
    let constant = match ty {
        Type::Integer => Constant::Integer(unzigzag(input.big_natural()?)),
        Type::ByteString => Constant::ByteString(input.byte_string()?),
        Type::String => Constant::String(
            String::from_utf8(input.byte_string()?).map_err(|_| DecodeError::InvalidUtf8)?,
        ),
        Type::Unit => Constant::Unit,
        Type::Bool => Constant::Bool(input.bit()?),
        Type::Data => Constant::Data(PlutusData::from_cbor(&input.byte_string()?)?),
        Type::Bls12_381G1Element => {
            Constant::Bls12_381G1Element(Box::new(group_element(input.byte_string()?)?))
        }
        Type::Bls12_381G2Element => {
            Constant::Bls12_381G2Element(Box::new(group_element(input.byte_string()?)?))
        }
        Type::List(element) => {
            let mut items = Vec::new();
            while input.bit()? {
                items.push(decode_value(element, input)?);
            }
            Constant::ProtoList((**element).clone(), items)
        }
        Type::Pair(first, second) => {
            let a = decode_value(first, input)?;
            let b = decode_value(second, input)?;
            Constant::ProtoPair(
                (**first).clone(),
                (**second).clone(),
                Rc::new(a),
                Rc::new(b),
            )
        }
    };
    Ok(constant)
}

fn group_element<const N: usize>(bytes: Vec<u8>) -> Result<[u8; N], DecodeError> {
    let found = bytes.len();
    bytes
        .try_into()
        .map_err(|_| DecodeError::GroupElementLength { expected: N, found })
}

fn unzigzag(n: BigUint) -> BigInt {
    if n.bit(0) {
        -BigInt::from((n + 1u32) >> 1u32)
    } else {
        BigInt::from(n >> 1u32)
    }
}
