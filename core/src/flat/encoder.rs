use num_bigint::{BigInt, BigUint, Sign};

use crate::{
    ast::{Constant, Program, Term, Type},
    flat::{bits::BitWriter, tags},
};

enum Task<'t> {
    Term(&'t Term),
    /// A list cell marker: one before each element, zero at the end.
    Bit(bool),
}

pub(crate) fn encode_program(program: &Program) -> Vec<u8> {
    let mut out = BitWriter::new();
    out.natural(program.version.major);
    out.natural(program.version.minor);
    out.natural(program.version.patch);
    encode_term(&program.term, &mut out);
    out.finish()
}

fn encode_term(root: &Term, out: &mut BitWriter) {
    let mut tasks = vec![Task::Term(root)];
    while let Some(task) = tasks.pop() {
        let term = match task {
            Task::Term(term) => term,
            Task::Bit(bit) => {
                out.bit(bit);
                continue;
            }
        };
        match term {
            Term::Var(index) => {
                out.bits(tags::TERM_BITS, tags::VAR);
                out.natural(*index as u64);
            }
            Term::Delay(body) => {
                out.bits(tags::TERM_BITS, tags::DELAY);
                tasks.push(Task::Term(body));
            }
            Term::Lambda(body) => {
                out.bits(tags::TERM_BITS, tags::LAMBDA);
                tasks.push(Task::Term(body));
            }
            Term::Apply { function, argument } => {
                out.bits(tags::TERM_BITS, tags::APPLY);
                tasks.push(Task::Term(argument));
                tasks.push(Task::Term(function));
            }
            Term::Constant(constant) => {
                out.bits(tags::TERM_BITS, tags::CONSTANT);
                encode_type_tags(&constant.type_of(), out);
                encode_constant(constant, out);
            }
            Term::Force(body) => {
                out.bits(tags::TERM_BITS, tags::FORCE);
                tasks.push(Task::Term(body));
            }
            Term::Error => out.bits(tags::TERM_BITS, tags::ERROR),
            Term::Builtin(fun) => {
                out.bits(tags::TERM_BITS, tags::BUILTIN);
                out.bits(tags::BUILTIN_BITS, fun.tag());
            }
            Term::Constr { tag, fields } => {
                out.bits(tags::TERM_BITS, tags::CONSTR);
                out.natural(*tag);
                push_list(&mut tasks, fields);
            }
            Term::Case {
                scrutinee,
                branches,
            } => {
                out.bits(tags::TERM_BITS, tags::CASE);
                push_list(&mut tasks, branches);
                tasks.push(Task::Term(scrutinee));
            }
        }
    }
}

fn push_list<'t>(tasks: &mut Vec<Task<'t>>, items: &'t [std::rc::Rc<Term>]) {
    tasks.push(Task::Bit(false));
    for item in items.iter().rev() {
        tasks.push(Task::Term(item));
        tasks.push(Task::Bit(true));
    }
}

/// The type as a flat list of 4-bit tags.
fn encode_type_tags(ty: &Type, out: &mut BitWriter) {
    let mut list = Vec::new();
    type_tags(ty, &mut list);
    for tag in list {
        out.bit(true);
        out.bits(tags::TYPE_BITS, tag);
    }
    out.bit(false);
}

fn type_tags(ty: &Type, out: &mut Vec<u8>) {
    match ty {
        Type::Integer => out.push(tags::INTEGER),
        Type::ByteString => out.push(tags::BYTE_STRING),
        Type::String => out.push(tags::STRING),
        Type::Unit => out.push(tags::UNIT),
        Type::Bool => out.push(tags::BOOL),
        Type::Data => out.push(tags::DATA),
        Type::Bls12_381G1Element => out.push(tags::G1),
        Type::Bls12_381G2Element => out.push(tags::G2),
        Type::List(element) => {
            out.extend([tags::APPLY_TYPE, tags::LIST]);
            type_tags(element, out);
        }
        Type::Pair(first, second) => {
            out.extend([tags::APPLY_TYPE, tags::APPLY_TYPE, tags::PAIR]);
            type_tags(first, out);
            type_tags(second, out);
        }
    }
}

fn encode_constant(constant: &Constant, out: &mut BitWriter) {
    match constant {
        Constant::Integer(n) => out.big_natural(&zigzag(n)),
        Constant::ByteString(bytes) => out.byte_string(bytes),
        Constant::String(text) => out.byte_string(text.as_bytes()),
        Constant::Unit => {}
        Constant::Bool(b) => out.bit(*b),
        Constant::ProtoList(_, items) => {
            for item in items {
                out.bit(true);
                encode_constant(item, out);
            }
            out.bit(false);
        }
        Constant::ProtoPair(_, _, first, second) => {
            encode_constant(first, out);
            encode_constant(second, out);
        }
        Constant::Data(data) => out.byte_string(&data.to_cbor()),
        Constant::Bls12_381G1Element(bytes) => out.byte_string(&bytes[..]),
        Constant::Bls12_381G2Element(bytes) => out.byte_string(&bytes[..]),
    }
}

/// 0, -1, 1, -2, ... as 0, 1, 2, 3, ...
fn zigzag(n: &BigInt) -> BigUint {
    let doubled = n.magnitude() << 1u32;
    match n.sign() {
        Sign::Minus => doubled - 1u32,
        _ => doubled,
    }
}
