use std::rc::Rc;

use num_bigint::{BigInt, Sign};
use num_integer::Integer;
use num_traits::{ToPrimitive, Zero};

use crate::{
    ast::{Constant, PlutusData, Type},
    builtins::{DefaultFunction, crypto},
    machine::{MachineError, Value},
};

/// Typed access to the arguments of a saturated builtin.
struct Args<'a> {
    fun: DefaultFunction,
    args: &'a [Value],
}

impl<'a> Args<'a> {
    fn value(&self, i: usize) -> Result<&'a Value, MachineError> {
        self.args.get(i).ok_or_else(|| {
            MachineError::MalformedProgram(format!(
                "{} called with {} arguments",
                self.fun,
                self.args.len()
            ))
        })
    }

    fn expect<T>(
        &self,
        i: usize,
        expected: &str,
        pick: impl FnOnce(&'a Constant) -> Option<T>,
    ) -> Result<T, MachineError> {
        let value = self.value(i)?;
        value
            .as_constant()
            .and_then(pick)
            .ok_or_else(|| MachineError::type_mismatch(expected, value))
    }

    fn constant(&self, i: usize) -> Result<&'a Constant, MachineError> {
        self.expect(i, "constant", Some)
    }

    fn integer(&self, i: usize) -> Result<&'a BigInt, MachineError> {
        self.expect(i, "integer", |c| match c {
            Constant::Integer(n) => Some(n),
            _ => None,
        })
    }

    fn bytes(&self, i: usize) -> Result<&'a [u8], MachineError> {
        self.expect(i, "bytestring", |c| match c {
            Constant::ByteString(bytes) => Some(bytes.as_slice()),
            _ => None,
        })
    }

    fn string(&self, i: usize) -> Result<&'a str, MachineError> {
        self.expect(i, "string", |c| match c {
            Constant::String(text) => Some(text.as_str()),
            _ => None,
        })
    }

    fn boolean(&self, i: usize) -> Result<bool, MachineError> {
        self.expect(i, "bool", |c| match c {
            Constant::Bool(b) => Some(*b),
            _ => None,
        })
    }

    fn unit(&self, i: usize) -> Result<(), MachineError> {
        self.expect(i, "unit", |c| match c {
            Constant::Unit => Some(()),
            _ => None,
        })
    }

    fn data(&self, i: usize) -> Result<&'a PlutusData, MachineError> {
        self.expect(i, "data", |c| match c {
            Constant::Data(data) => Some(data),
            _ => None,
        })
    }

    fn list(&self, i: usize) -> Result<(&'a Type, &'a [Constant]), MachineError> {
        self.expect(i, "list", |c| match c {
            Constant::ProtoList(element, items) => Some((element, items.as_slice())),
            _ => None,
        })
    }

    fn pair(&self, i: usize) -> Result<(&'a Rc<Constant>, &'a Rc<Constant>), MachineError> {
        self.expect(i, "pair", |c| match c {
            Constant::ProtoPair(_, _, first, second) => Some((first, second)),
            _ => None,
        })
    }

    /// A list whose elements are all `data`.
    fn data_list(&self, i: usize) -> Result<Vec<PlutusData>, MachineError> {
        let value = self.value(i)?;
        let (element, items) = self.list(i)?;
        if *element != Type::Data {
            return Err(MachineError::type_mismatch("(list data)", value));
        }
        items
            .iter()
            .map(|item| match item {
                Constant::Data(data) => Ok(data.clone()),
                _ => Err(MachineError::type_mismatch("(list data)", value)),
            })
            .collect()
    }

    fn g1(&self, i: usize) -> Result<&'a [u8; 48], MachineError> {
        self.expect(i, "bls12_381_G1_element", |c| match c {
            Constant::Bls12_381G1Element(point) => Some(&**point),
            _ => None,
        })
    }

    fn g2(&self, i: usize) -> Result<&'a [u8; 96], MachineError> {
        self.expect(i, "bls12_381_G2_element", |c| match c {
            Constant::Bls12_381G2Element(point) => Some(&**point),
            _ => None,
        })
    }

    fn fail(&self, reason: impl Into<String>) -> MachineError {
        MachineError::builtin(self.fun, reason)
    }

    fn nonzero_divisor(&self, i: usize) -> Result<&'a BigInt, MachineError> {
        let divisor = self.integer(i)?;
        if divisor.is_zero() {
            return Err(self.fail("division by zero"));
        }
        Ok(divisor)
    }
}

/// Clamps an integer into `0..=usize::MAX`.
fn clamp_index(n: &BigInt) -> usize {
    if n.sign() == Sign::Minus {
        return 0;
    }
    n.to_usize().unwrap_or(usize::MAX)
}

fn data_pair_type() -> Type {
    Type::pair(Type::Data, Type::Data)
}

fn data_list(items: Vec<PlutusData>) -> Constant {
    Constant::ProtoList(Type::Data, items.into_iter().map(Constant::Data).collect())
}

fn data_pair(first: PlutusData, second: PlutusData) -> Constant {
    Constant::ProtoPair(
        Type::Data,
        Type::Data,
        Rc::new(Constant::Data(first)),
        Rc::new(Constant::Data(second)),
    )
}

/// Runs a saturated builtin. `logs` receives `trace` messages.
pub(crate) fn call(
    fun: DefaultFunction,
    args: &[Value],
    logs: &mut Vec<String>,
) -> Result<Value, MachineError> {
    use DefaultFunction::*;

    let a = Args { fun, args };
    let value = match fun {
        AddInteger => Value::integer(a.integer(0)? + a.integer(1)?),
        SubtractInteger => Value::integer(a.integer(0)? - a.integer(1)?),
        MultiplyInteger => Value::integer(a.integer(0)? * a.integer(1)?),
        DivideInteger => {
            let x = a.integer(0)?;
            Value::integer(x.div_floor(a.nonzero_divisor(1)?))
        }
        QuotientInteger => {
            let x = a.integer(0)?;
            Value::integer(x / a.nonzero_divisor(1)?)
        }
        RemainderInteger => {
            let x = a.integer(0)?;
            Value::integer(x % a.nonzero_divisor(1)?)
        }
        ModInteger => {
            let x = a.integer(0)?;
            Value::integer(x.mod_floor(a.nonzero_divisor(1)?))
        }
        EqualsInteger => Value::bool(a.integer(0)? == a.integer(1)?),
        LessThanInteger => Value::bool(a.integer(0)? < a.integer(1)?),
        LessThanEqualsInteger => Value::bool(a.integer(0)? <= a.integer(1)?),

        AppendByteString => Value::byte_string([a.bytes(0)?, a.bytes(1)?].concat()),
        ConsByteString => {
            let n = a.integer(0)?;
            let bytes = a.bytes(1)?;
            let byte = n
                .to_u8()
                .ok_or_else(|| a.fail(format!("{n} is not in the range 0..=255")))?;
            let mut out = Vec::with_capacity(bytes.len() + 1);
            out.push(byte);
            out.extend_from_slice(bytes);
            Value::byte_string(out)
        }
        SliceByteString => {
            let start = clamp_index(a.integer(0)?);
            let len = clamp_index(a.integer(1)?);
            let bytes = a.bytes(2)?;
            let begin = start.min(bytes.len());
            let end = start.saturating_add(len).min(bytes.len());
            Value::byte_string(bytes[begin..end.max(begin)].to_vec())
        }
        LengthOfByteString => Value::integer(a.bytes(0)?.len()),
        IndexByteString => {
            let bytes = a.bytes(0)?;
            let index = a.integer(1)?;
            let byte = index
                .to_usize()
                .and_then(|i| bytes.get(i))
                .ok_or_else(|| {
                    a.fail(format!(
                        "index {index} out of bounds for length {}",
                        bytes.len()
                    ))
                })?;
            Value::integer(*byte)
        }
        EqualsByteString => Value::bool(a.bytes(0)? == a.bytes(1)?),
        LessThanByteString => Value::bool(a.bytes(0)? < a.bytes(1)?),
        LessThanEqualsByteString => Value::bool(a.bytes(0)? <= a.bytes(1)?),

        Sha2_256 => Value::byte_string(crypto::sha2_256(a.bytes(0)?)),
        Blake2b_256 => Value::byte_string(crypto::blake2b_256(a.bytes(0)?)),
        Blake2b_224 => Value::byte_string(crypto::blake2b_224(a.bytes(0)?)),
        VerifyEd25519Signature => Value::bool(
            crypto::verify_ed25519(a.bytes(0)?, a.bytes(1)?, a.bytes(2)?)
                .map_err(|reason| a.fail(reason))?,
        ),
        VerifyEcdsaSecp256k1Signature => Value::bool(
            crypto::verify_ecdsa_secp256k1(a.bytes(0)?, a.bytes(1)?, a.bytes(2)?)
                .map_err(|reason| a.fail(reason))?,
        ),
        VerifySchnorrSecp256k1Signature => Value::bool(
            crypto::verify_schnorr_secp256k1(a.bytes(0)?, a.bytes(1)?, a.bytes(2)?)
                .map_err(|reason| a.fail(reason))?,
        ),

        AppendString => Value::string([a.string(0)?, a.string(1)?].concat()),
        EqualsString => Value::bool(a.string(0)? == a.string(1)?),
        EncodeUtf8 => Value::byte_string(a.string(0)?.as_bytes().to_vec()),
        DecodeUtf8 => Value::string(
            String::from_utf8(a.bytes(0)?.to_vec()).map_err(|e| a.fail(e.to_string()))?,
        ),

        IfThenElse => {
            let branch = if a.boolean(0)? { 1 } else { 2 };
            a.value(branch)?.clone()
        }
        ChooseUnit => {
            a.unit(0)?;
            a.value(1)?.clone()
        }
        Trace => {
            let message = a.string(0)?;
            let result = a.value(1)?.clone();
            logs.push(message.to_string());
            result
        }

        FstPair => Value::Con(a.pair(0)?.0.clone()),
        SndPair => Value::Con(a.pair(0)?.1.clone()),

        ChooseList => {
            let (_, items) = a.list(0)?;
            let branch = if items.is_empty() { 1 } else { 2 };
            a.value(branch)?.clone()
        }
        MkCons => {
            let head = a.constant(0)?;
            let (element, items) = a.list(1)?;
            if head.type_of() != *element {
                return Err(MachineError::type_mismatch(element.to_string(), a.value(0)?));
            }
            let mut out = Vec::with_capacity(items.len() + 1);
            out.push(head.clone());
            out.extend_from_slice(items);
            Value::con(Constant::ProtoList(element.clone(), out))
        }
        HeadList => {
            let (_, items) = a.list(0)?;
            let head = items.first().ok_or_else(|| a.fail("empty list"))?;
            Value::con(head.clone())
        }
        TailList => {
            let (element, items) = a.list(0)?;
            if items.is_empty() {
                return Err(a.fail("empty list"));
            }
            Value::con(Constant::ProtoList(element.clone(), items[1..].to_vec()))
        }
        NullList => Value::bool(a.list(0)?.1.is_empty()),

        ChooseData => {
            let branch = match a.data(0)? {
                PlutusData::Constr { .. } => 1,
                PlutusData::Map(_) => 2,
                PlutusData::List(_) => 3,
                PlutusData::Integer(_) => 4,
                PlutusData::ByteString(_) => 5,
            };
            a.value(branch)?.clone()
        }
        ConstrData => {
            let tag = a.integer(0)?;
            let fields = a.data_list(1)?;
            let tag = tag
                .to_u64()
                .ok_or_else(|| a.fail(format!("constructor tag {tag} out of range")))?;
            Value::con(Constant::Data(PlutusData::Constr { tag, fields }))
        }
        MapData => {
            let value = a.value(0)?;
            let (element, items) = a.list(0)?;
            if *element != data_pair_type() {
                return Err(MachineError::type_mismatch("(list (pair data data))", value));
            }
            let entries = items
                .iter()
                .map(|item| match item {
                    Constant::ProtoPair(_, _, key, value) => match (&**key, &**value) {
                        (Constant::Data(k), Constant::Data(v)) => Some((k.clone(), v.clone())),
                        _ => None,
                    },
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| MachineError::type_mismatch("(list (pair data data))", value))?;
            Value::con(Constant::Data(PlutusData::Map(entries)))
        }
        ListData => Value::con(Constant::Data(PlutusData::List(a.data_list(0)?))),
        IData => Value::con(Constant::Data(PlutusData::Integer(a.integer(0)?.clone()))),
        BData => Value::con(Constant::Data(PlutusData::ByteString(a.bytes(0)?.to_vec()))),
        UnConstrData => match a.data(0)? {
            PlutusData::Constr { tag, fields } => Value::con(Constant::ProtoPair(
                Type::Integer,
                Type::list(Type::Data),
                Rc::new(Constant::Integer((*tag).into())),
                Rc::new(data_list(fields.clone())),
            )),
            _ => return Err(a.fail("data is not a constructor")),
        },
        UnMapData => match a.data(0)? {
            PlutusData::Map(entries) => Value::con(Constant::ProtoList(
                data_pair_type(),
                entries
                    .iter()
                    .map(|(k, v)| data_pair(k.clone(), v.clone()))
                    .collect(),
            )),
            _ => return Err(a.fail("data is not a map")),
        },
        UnListData => match a.data(0)? {
            PlutusData::List(items) => Value::con(data_list(items.clone())),
            _ => return Err(a.fail("data is not a list")),
        },
        UnIData => match a.data(0)? {
            PlutusData::Integer(n) => Value::integer(n.clone()),
            _ => return Err(a.fail("data is not an integer")),
        },
        UnBData => match a.data(0)? {
            PlutusData::ByteString(bytes) => Value::byte_string(bytes.clone()),
            _ => return Err(a.fail("data is not a bytestring")),
        },
        EqualsData => Value::bool(a.data(0)? == a.data(1)?),
        MkPairData => Value::con(data_pair(a.data(0)?.clone(), a.data(1)?.clone())),
        MkNilData => {
            a.unit(0)?;
            Value::con(Constant::ProtoList(Type::Data, Vec::new()))
        }
        MkNilPairData => {
            a.unit(0)?;
            Value::con(Constant::ProtoList(data_pair_type(), Vec::new()))
        }
        SerialiseData => Value::byte_string(a.data(0)?.to_cbor()),

        Bls12_381_G1_Equal => Value::bool(a.g1(0)? == a.g1(1)?),
        Bls12_381_G1_Compress => Value::byte_string(a.g1(0)?.to_vec()),
        Bls12_381_G2_Equal => Value::bool(a.g2(0)? == a.g2(1)?),
        Bls12_381_G2_Compress => Value::byte_string(a.g2(0)?.to_vec()),
    };
    Ok(value)
}
