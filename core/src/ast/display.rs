//! Textual rendering of terms, accepted back by [`crate::parser`].
//!
//! Binders are named after their lambda depth (`i0`, `i1`, ...), so printing
//! is deterministic and alpha-equivalent terms print identically.

use std::fmt::{self, Write};

use crate::ast::{Constant, PlutusData, Program, Term};

enum Piece<'a> {
    Term(&'a Term, usize),
    Text(&'static str),
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pending = vec![Piece::Term(self, 0)];
        while let Some(piece) = pending.pop() {
            let (term, depth) = match piece {
                Piece::Text(text) => {
                    f.write_str(text)?;
                    continue;
                }
                Piece::Term(term, depth) => (term, depth),
            };
            match term {
                Term::Var(index) if *index >= 1 && *index <= depth => {
                    write!(f, "i{}", depth - index)?
                }
                Term::Var(index) => write!(f, "free{index}")?,
                Term::Lambda(body) => {
                    write!(f, "(lam i{depth} ")?;
                    pending.push(Piece::Text(")"));
                    pending.push(Piece::Term(body, depth + 1));
                }
                Term::Apply { .. } => {
                    let mut arguments = Vec::new();
                    let mut head = term;
                    while let Term::Apply { function, argument } = head {
                        arguments.push(&**argument);
                        head = &**function;
                    }
                    f.write_str("[")?;
                    pending.push(Piece::Text("]"));
                    for argument in arguments {
                        pending.push(Piece::Term(argument, depth));
                        pending.push(Piece::Text(" "));
                    }
                    pending.push(Piece::Term(head, depth));
                }
                Term::Delay(body) => {
                    f.write_str("(delay ")?;
                    pending.push(Piece::Text(")"));
                    pending.push(Piece::Term(body, depth));
                }
                Term::Force(body) => {
                    f.write_str("(force ")?;
                    pending.push(Piece::Text(")"));
                    pending.push(Piece::Term(body, depth));
                }
                Term::Constant(constant) => write!(f, "(con {} {constant})", constant.type_of())?,
                Term::Builtin(fun) => write!(f, "(builtin {fun})")?,
                Term::Error => f.write_str("(error)")?,
                Term::Constr { tag, fields } => {
                    write!(f, "(constr {tag}")?;
                    pending.push(Piece::Text(")"));
                    for field in fields.iter().rev() {
                        pending.push(Piece::Term(field, depth));
                        pending.push(Piece::Text(" "));
                    }
                }
                Term::Case {
                    scrutinee,
                    branches,
                } => {
                    f.write_str("(case ")?;
                    pending.push(Piece::Text(")"));
                    for branch in branches.iter().rev() {
                        pending.push(Piece::Term(branch, depth));
                        pending.push(Piece::Text(" "));
                    }
                    pending.push(Piece::Term(scrutinee, depth));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(program {} {})", self.version, self.term)
    }
}

/// Prints the value part of a constant, without its type.
impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Integer(value) => write!(f, "{value}"),
            Constant::ByteString(bytes) => write!(f, "#{}", hex::encode(bytes)),
            Constant::String(text) => write_string(f, text),
            Constant::Unit => f.write_str("()"),
            Constant::Bool(true) => f.write_str("True"),
            Constant::Bool(false) => f.write_str("False"),
            Constant::ProtoList(_, items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Constant::ProtoPair(_, _, first, second) => write!(f, "({first}, {second})"),
            Constant::Data(data) => write!(f, "({data})"),
            Constant::Bls12_381G1Element(point) => write!(f, "0x{}", hex::encode(&point[..])),
            Constant::Bls12_381G2Element(point) => write!(f, "0x{}", hex::encode(&point[..])),
        }
    }
}

fn write_string(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in text.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c if c.is_control() => write!(f, "\\u{{{:x}}}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

impl fmt::Display for PlutusData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn items(f: &mut fmt::Formatter<'_>, items: &[PlutusData]) -> fmt::Result {
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{item}")?;
            }
            f.write_str("]")
        }

        match self {
            PlutusData::Constr { tag, fields } => {
                write!(f, "Constr {tag} ")?;
                items(f, fields)
            }
            PlutusData::Map(entries) => {
                f.write_str("Map [")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "({key}, {value})")?;
                }
                f.write_str("]")
            }
            PlutusData::List(elements) => {
                f.write_str("List ")?;
                items(f, elements)
            }
            PlutusData::Integer(value) => write!(f, "I {value}"),
            PlutusData::ByteString(bytes) => write!(f, "B #{}", hex::encode(bytes)),
        }
    }
}
