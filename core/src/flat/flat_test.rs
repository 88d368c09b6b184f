//! Tests for the flat codec.

use pretty_assertions::assert_eq;

use crate::{
    ast::{Constant, PlutusData, Program, Term, Type, Version},
    builtins::DefaultFunction,
    flat::DecodeError,
};

fn program(term: Term) -> Program {
    Program::new(Version::V1_1_0, term)
}

#[test]
fn test_encode_integer_program() {
    let program = Program::new(Version::V1_0_0, Term::integer(11));
    assert_eq!(program.to_hex(), "010000480581");
    assert_eq!(Program::from_hex("010000480581"), Ok(program));
}

#[test]
fn test_round_trip_terms() {
    let term = Term::case(
        Term::constr(
            1,
            vec![
                Term::lambda(Term::var(1)).apply(Term::integer(-300)),
                Term::delay(Term::Error),
            ],
        ),
        vec![
            Term::lambda(Term::lambda(Term::var(2))),
            Term::builtin(DefaultFunction::IfThenElse).forced(),
            Term::constr(0, vec![]),
        ],
    );
    let program = program(term);
    assert_eq!(Program::from_flat(&program.to_flat()), Ok(program));
}

#[test]
fn test_round_trip_constants() {
    let constants = vec![
        Constant::Integer(0.into()),
        Constant::Integer((-1).into()),
        Constant::Integer("123456789012345678901234567890".parse().unwrap()),
        Constant::Integer("-98765432109876543210987654321".parse().unwrap()),
        Constant::ByteString(vec![]),
        Constant::ByteString((0..=255).cycle().take(600).collect()),
        Constant::String("héllo".into()),
        Constant::Unit,
        Constant::Bool(true),
        Constant::Bool(false),
        Constant::ProtoList(Type::Integer, vec![]),
        Constant::ProtoList(
            Type::list(Type::Bool),
            vec![
                Constant::ProtoList(Type::Bool, vec![Constant::Bool(true)]),
                Constant::ProtoList(Type::Bool, vec![]),
            ],
        ),
        Constant::pair(Constant::Integer(7.into()), Constant::String("x".into())),
        Constant::Data(PlutusData::Map(vec![(
            PlutusData::integer(1),
            PlutusData::constr(2, vec![PlutusData::bytes(vec![0xde, 0xad])]),
        )])),
        Constant::Bls12_381G1Element(Box::new([0xab; 48])),
        Constant::Bls12_381G2Element(Box::new([0xcd; 96])),
    ];
    for constant in constants {
        let program = program(Term::constant(constant));
        assert_eq!(Program::from_flat(&program.to_flat()), Ok(program));
    }
}

#[test]
fn test_round_trip_every_builtin() {
    for fun in DefaultFunction::ALL {
        let program = program(Term::builtin(*fun));
        assert_eq!(Program::from_flat(&program.to_flat()), Ok(program));
    }
}

#[test]
fn test_deep_terms_decode_iteratively() {
    let mut term = Term::integer(1);
    for _ in 0..200_000 {
        term = Term::lambda(Term::var(1)).apply(Term::delay(term));
    }
    let program = program(term);
    let decoded = Program::from_flat(&program.to_flat()).unwrap();
    assert_eq!(decoded.term.size(), program.term.size());
}

#[test]
fn test_trailing_bytes_are_rejected() {
    assert_eq!(
        Program::from_hex("01000048058100"),
        Err(DecodeError::TrailingBytes(1))
    );
}

#[test]
fn test_truncated_input() {
    assert!(matches!(
        Program::from_hex("0100004805"),
        Err(DecodeError::EndOfInput(_))
    ));
}

#[test]
fn test_unknown_tags() {
    assert_eq!(
        Program::from_hex("010000f1"),
        Err(DecodeError::UnknownTermTag(15))
    );
    assert_eq!(
        Program::from_hex("0100007fe1"),
        Err(DecodeError::UnknownBuiltin(127))
    );
}

#[test]
fn test_invalid_hex() {
    assert!(matches!(
        Program::from_hex("0g"),
        Err(DecodeError::Hex(_))
    ));
}
