use std::{fmt, str::FromStr};

/// Declares the builtin catalogue: flat tag, textual name, number of
/// type forces, and value arity for each function.
macro_rules! default_functions {
    ($($variant:ident = $tag:literal, $name:literal, forces: $forces:literal, arity: $arity:literal;)*) => {
        /// A builtin function, identified on the wire by its flat tag.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[allow(non_camel_case_types)]
        #[repr(u8)]
        pub enum DefaultFunction {
            $($variant = $tag,)*
        }

        impl DefaultFunction {
            /// Every supported builtin, in tag order.
            pub const ALL: &'static [DefaultFunction] = &[$(DefaultFunction::$variant,)*];

            pub fn from_tag(tag: u8) -> Option<DefaultFunction> {
                match tag {
                    $($tag => Some(DefaultFunction::$variant),)*
                    _ => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(DefaultFunction::$variant => $name,)*
                }
            }

            /// Number of `force`s the builtin expects before its arguments.
            pub fn force_count(self) -> usize {
                match self {
                    $(DefaultFunction::$variant => $forces,)*
                }
            }

            /// Number of term arguments needed to saturate the builtin.
            pub fn arity(self) -> usize {
                match self {
                    $(DefaultFunction::$variant => $arity,)*
                }
            }
        }

        impl FromStr for DefaultFunction {
            type Err = UnknownBuiltin;

            fn from_str(name: &str) -> Result<Self, Self::Err> {
                match name {
                    $($name => Ok(DefaultFunction::$variant),)*
                    _ => Err(UnknownBuiltin(name.to_string())),
                }
            }
        }
    };
}

default_functions! {
    AddInteger = 0, "addInteger", forces: 0, arity: 2;
    SubtractInteger = 1, "subtractInteger", forces: 0, arity: 2;
    MultiplyInteger = 2, "multiplyInteger", forces: 0, arity: 2;
    DivideInteger = 3, "divideInteger", forces: 0, arity: 2;
    QuotientInteger = 4, "quotientInteger", forces: 0, arity: 2;
    RemainderInteger = 5, "remainderInteger", forces: 0, arity: 2;
    ModInteger = 6, "modInteger", forces: 0, arity: 2;
    EqualsInteger = 7, "equalsInteger", forces: 0, arity: 2;
    LessThanInteger = 8, "lessThanInteger", forces: 0, arity: 2;
    LessThanEqualsInteger = 9, "lessThanEqualsInteger", forces: 0, arity: 2;
    AppendByteString = 10, "appendByteString", forces: 0, arity: 2;
    ConsByteString = 11, "consByteString", forces: 0, arity: 2;
    SliceByteString = 12, "sliceByteString", forces: 0, arity: 3;
    LengthOfByteString = 13, "lengthOfByteString", forces: 0, arity: 1;
    IndexByteString = 14, "indexByteString", forces: 0, arity: 2;
    EqualsByteString = 15, "equalsByteString", forces: 0, arity: 2;
    LessThanByteString = 16, "lessThanByteString", forces: 0, arity: 2;
    LessThanEqualsByteString = 17, "lessThanEqualsByteString", forces: 0, arity: 2;
    Sha2_256 = 18, "sha2_256", forces: 0, arity: 1;
    Blake2b_256 = 20, "blake2b_256", forces: 0, arity: 1;
    VerifyEd25519Signature = 21, "verifyEd25519Signature", forces: 0, arity: 3;
    AppendString = 22, "appendString", forces: 0, arity: 2;
    EqualsString = 23, "equalsString", forces: 0, arity: 2;
    EncodeUtf8 = 24, "encodeUtf8", forces: 0, arity: 1;
    DecodeUtf8 = 25, "decodeUtf8", forces: 0, arity: 1;
    IfThenElse = 26, "ifThenElse", forces: 1, arity: 3;
    ChooseUnit = 27, "chooseUnit", forces: 1, arity: 2;
    Trace = 28, "trace", forces: 1, arity: 2;
    FstPair = 29, "fstPair", forces: 2, arity: 1;
    SndPair = 30, "sndPair", forces: 2, arity: 1;
    ChooseList = 31, "chooseList", forces: 2, arity: 3;
    MkCons = 32, "mkCons", forces: 1, arity: 2;
    HeadList = 33, "headList", forces: 1, arity: 1;
    TailList = 34, "tailList", forces: 1, arity: 1;
    NullList = 35, "nullList", forces: 1, arity: 1;
    ChooseData = 36, "chooseData", forces: 1, arity: 6;
    ConstrData = 37, "constrData", forces: 0, arity: 2;
    MapData = 38, "mapData", forces: 0, arity: 1;
    ListData = 39, "listData", forces: 0, arity: 1;
    IData = 40, "iData", forces: 0, arity: 1;
    BData = 41, "bData", forces: 0, arity: 1;
    UnConstrData = 42, "unConstrData", forces: 0, arity: 1;
    UnMapData = 43, "unMapData", forces: 0, arity: 1;
    UnListData = 44, "unListData", forces: 0, arity: 1;
    UnIData = 45, "unIData", forces: 0, arity: 1;
    UnBData = 46, "unBData", forces: 0, arity: 1;
    EqualsData = 47, "equalsData", forces: 0, arity: 2;
    MkPairData = 48, "mkPairData", forces: 0, arity: 2;
    MkNilData = 49, "mkNilData", forces: 0, arity: 1;
    MkNilPairData = 50, "mkNilPairData", forces: 0, arity: 1;
    SerialiseData = 51, "serialiseData", forces: 0, arity: 1;
    VerifyEcdsaSecp256k1Signature = 52, "verifyEcdsaSecp256k1Signature", forces: 0, arity: 3;
    VerifySchnorrSecp256k1Signature = 53, "verifySchnorrSecp256k1Signature", forces: 0, arity: 3;
    Bls12_381_G1_Equal = 57, "bls12_381_G1_equal", forces: 0, arity: 2;
    Bls12_381_G1_Compress = 58, "bls12_381_G1_compress", forces: 0, arity: 1;
    Bls12_381_G2_Equal = 64, "bls12_381_G2_equal", forces: 0, arity: 2;
    Bls12_381_G2_Compress = 65, "bls12_381_G2_compress", forces: 0, arity: 1;
    Blake2b_224 = 72, "blake2b_224", forces: 0, arity: 1;
}

impl DefaultFunction {
    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for DefaultFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown builtin function `{0}`")]
pub struct UnknownBuiltin(pub String);
