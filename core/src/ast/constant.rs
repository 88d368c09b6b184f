use std::{fmt, rc::Rc};

use num_bigint::BigInt;

use crate::ast::PlutusData;

/// The type of a constant, as written in `(con <type> <value>)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Integer,
    ByteString,
    String,
    Unit,
    Bool,
    Data,
    List(Rc<Type>),
    Pair(Rc<Type>, Rc<Type>),
    Bls12_381G1Element,
    Bls12_381G2Element,
}

impl Type {
    pub fn list(element: Type) -> Type {
        Type::List(Rc::new(element))
    }

    pub fn pair(first: Type, second: Type) -> Type {
        Type::Pair(Rc::new(first), Rc::new(second))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Integer => write!(f, "integer"),
            Type::ByteString => write!(f, "bytestring"),
            Type::String => write!(f, "string"),
            Type::Unit => write!(f, "unit"),
            Type::Bool => write!(f, "bool"),
            Type::Data => write!(f, "data"),
            Type::List(element) => write!(f, "(list {element})"),
            Type::Pair(first, second) => write!(f, "(pair {first} {second})"),
            Type::Bls12_381G1Element => write!(f, "bls12_381_G1_element"),
            Type::Bls12_381G2Element => write!(f, "bls12_381_G2_element"),
        }
    }
}

/// A typed constant value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    Integer(BigInt),
    ByteString(Vec<u8>),
    String(String),
    Unit,
    Bool(bool),
    /// A homogeneous list; the element type is kept so empty lists stay typed.
    ProtoList(Type, Vec<Constant>),
    ProtoPair(Type, Type, Rc<Constant>, Rc<Constant>),
    Data(PlutusData),
    /// Compressed G1 point, kept as its 48-byte encoding.
    Bls12_381G1Element(Box<[u8; 48]>),
    /// Compressed G2 point, kept as its 96-byte encoding.
    Bls12_381G2Element(Box<[u8; 96]>),
}

impl Constant {
    pub fn type_of(&self) -> Type {
        match self {
            Constant::Integer(_) => Type::Integer,
            Constant::ByteString(_) => Type::ByteString,
            Constant::String(_) => Type::String,
            Constant::Unit => Type::Unit,
            Constant::Bool(_) => Type::Bool,
            Constant::ProtoList(element, _) => Type::List(Rc::new(element.clone())),
            Constant::ProtoPair(first, second, _, _) => {
                Type::Pair(Rc::new(first.clone()), Rc::new(second.clone()))
            }
            Constant::Data(_) => Type::Data,
            Constant::Bls12_381G1Element(_) => Type::Bls12_381G1Element,
            Constant::Bls12_381G2Element(_) => Type::Bls12_381G2Element,
        }
    }

    pub fn pair(first: Constant, second: Constant) -> Constant {
        Constant::ProtoPair(
            first.type_of(),
            second.type_of(),
            Rc::new(first),
            Rc::new(second),
        )
    }

    /// Checks that the constant is well formed against its own type
    /// annotations: list elements and pair components must match.
    pub fn is_well_typed(&self) -> bool {
        let mut pending = vec![self];
        while let Some(constant) = pending.pop() {
            match constant {
                Constant::ProtoList(element, items) => {
                    for item in items {
                        if item.type_of() != *element {
                            return false;
                        }
                        pending.push(item);
                    }
                }
                Constant::ProtoPair(first_type, second_type, first, second) => {
                    if first.type_of() != *first_type || second.type_of() != *second_type {
                        return false;
                    }
                    pending.push(first);
                    pending.push(second);
                }
                _ => {}
            }
        }
        true
    }
}
