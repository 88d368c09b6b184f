use num_bigint::BigInt;
use num_traits::Zero;

use crate::{
    ast::{Constant, PlutusData},
    machine::Value,
};

/// Abstract memory size of a runtime value, the input to costing functions.
pub trait ExMem {
    fn ex_mem(&self) -> i64;
}

/// Size of an integer in 64-bit words; zero counts as one word.
pub fn integer_ex_mem(value: &BigInt) -> i64 {
    if value.is_zero() {
        return 1;
    }
    ((value.bits() - 1) / 64 + 1) as i64
}

/// Size of a byte string in 8-byte words, at least one.
pub fn byte_string_ex_mem(bytes: &[u8]) -> i64 {
    if bytes.is_empty() {
        return 1;
    }
    ((bytes.len() - 1) / 8 + 1) as i64
}

const DATA_NODE: i64 = 4;

impl ExMem for PlutusData {
    fn ex_mem(&self) -> i64 {
        let mut total = 0i64;
        let mut pending = vec![self];
        while let Some(data) = pending.pop() {
            total = total.saturating_add(DATA_NODE);
            match data {
                PlutusData::Constr { fields, .. } => pending.extend(fields),
                PlutusData::Map(entries) => {
                    for (key, value) in entries {
                        pending.push(key);
                        pending.push(value);
                    }
                }
                PlutusData::List(items) => pending.extend(items),
                PlutusData::Integer(value) => total = total.saturating_add(integer_ex_mem(value)),
                PlutusData::ByteString(bytes) => {
                    total = total.saturating_add(byte_string_ex_mem(bytes))
                }
            }
        }
        total
    }
}

impl ExMem for Constant {
    fn ex_mem(&self) -> i64 {
        match self {
            Constant::Integer(value) => integer_ex_mem(value),
            Constant::ByteString(bytes) => byte_string_ex_mem(bytes),
            Constant::String(text) => text.chars().count() as i64,
            Constant::Unit | Constant::Bool(_) => 1,
            Constant::ProtoList(_, items) => items
                .iter()
                .fold(0i64, |acc, item| acc.saturating_add(item.ex_mem())),
            Constant::ProtoPair(_, _, first, second) => 1i64
                .saturating_add(first.ex_mem())
                .saturating_add(second.ex_mem()),
            Constant::Data(data) => data.ex_mem(),
            Constant::Bls12_381G1Element(_) => 18,
            Constant::Bls12_381G2Element(_) => 36,
        }
    }
}

impl ExMem for Value {
    fn ex_mem(&self) -> i64 {
        match self {
            Value::Con(constant) => constant.ex_mem(),
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_sizes() {
        assert_eq!(integer_ex_mem(&BigInt::from(0)), 1);
        assert_eq!(integer_ex_mem(&BigInt::from(1)), 1);
        assert_eq!(integer_ex_mem(&BigInt::from(-1)), 1);
        assert_eq!(integer_ex_mem(&BigInt::from(u64::MAX)), 1);
        assert_eq!(integer_ex_mem(&(BigInt::from(u64::MAX) + 1)), 2);
    }

    #[test]
    fn test_byte_string_sizes() {
        assert_eq!(byte_string_ex_mem(&[]), 1);
        assert_eq!(byte_string_ex_mem(&[0; 8]), 1);
        assert_eq!(byte_string_ex_mem(&[0; 9]), 2);
    }

    #[test]
    fn test_constant_sizes() {
        assert_eq!(Constant::String("héllo".into()).ex_mem(), 5);
        assert_eq!(Constant::Unit.ex_mem(), 1);
        let pair = Constant::pair(Constant::Integer(5.into()), Constant::Bool(true));
        assert_eq!(pair.ex_mem(), 3);
        let data = PlutusData::constr(0, vec![PlutusData::integer(1), PlutusData::bytes(vec![])]);
        assert_eq!(data.ex_mem(), 4 + 5 + 5);
    }
}
