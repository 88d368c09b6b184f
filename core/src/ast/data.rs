use num_bigint::{BigInt, BigUint, Sign};
use num_traits::ToPrimitive;
use thiserror::Error;

/// The on-chain `Data` type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlutusData {
    Constr { tag: u64, fields: Vec<PlutusData> },
    Map(Vec<(PlutusData, PlutusData)>),
    List(Vec<PlutusData>),
    Integer(BigInt),
    ByteString(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataDecodeError {
    #[error("unexpected end of CBOR input")]
    EndOfInput,
    #[error("unsupported CBOR major type {0}")]
    UnsupportedMajorType(u8),
    #[error("unsupported CBOR tag {0}")]
    UnsupportedTag(u64),
    #[error("invalid CBOR additional information {0}")]
    InvalidLength(u8),
    #[error("constructor tag {0} out of range")]
    ConstructorTag(String),
    #[error("malformed constructor encoded with tag 102")]
    MalformedConstr,
    #[error("indefinite CBOR map ended between a key and its value")]
    DanglingKey,
    #[error("{0} trailing bytes after CBOR item")]
    TrailingBytes(usize),
    #[error("Data nested deeper than {0} levels")]
    TooDeep(usize),
}

const MAJOR_UNSIGNED: u8 = 0;
const MAJOR_NEGATIVE: u8 = 1;
const MAJOR_BYTES: u8 = 2;
const MAJOR_ARRAY: u8 = 4;
const MAJOR_MAP: u8 = 5;
const MAJOR_TAG: u8 = 6;
const BREAK: u8 = 0xff;

const TAG_POSITIVE_BIGNUM: u64 = 2;
const TAG_NEGATIVE_BIGNUM: u64 = 3;
const TAG_GENERAL_CONSTR: u64 = 102;
const BYTES_CHUNK: usize = 64;
const MAX_DEPTH: usize = 1024;

impl PlutusData {
    pub fn integer(value: impl Into<BigInt>) -> PlutusData {
        PlutusData::Integer(value.into())
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> PlutusData {
        PlutusData::ByteString(bytes.into())
    }

    pub fn constr(tag: u64, fields: Vec<PlutusData>) -> PlutusData {
        PlutusData::Constr { tag, fields }
    }

    /// Serialises to the canonical CBOR encoding used on chain.
    pub fn to_cbor(&self) -> Vec<u8> {
        let mut out = Vec::new();
        encode(self, &mut out);
        out
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<PlutusData, DataDecodeError> {
        let mut reader = Reader { bytes, pos: 0 };
        let data = reader.data()?;
        match bytes.len() - reader.pos {
            0 => Ok(data),
            trailing => Err(DataDecodeError::TrailingBytes(trailing)),
        }
    }
}

fn header(major: u8, value: u64, out: &mut Vec<u8>) {
    let major = major << 5;
    match value {
        0..=23 => out.push(major | value as u8),
        24..=0xff => out.extend([major | 24, value as u8]),
        0x100..=0xffff => {
            out.push(major | 25);
            out.extend((value as u16).to_be_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(major | 26);
            out.extend((value as u32).to_be_bytes());
        }
        _ => {
            out.push(major | 27);
            out.extend(value.to_be_bytes());
        }
    }
}

fn encode_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    if bytes.len() <= BYTES_CHUNK {
        header(MAJOR_BYTES, bytes.len() as u64, out);
        out.extend_from_slice(bytes);
        return;
    }
    out.push((MAJOR_BYTES << 5) | 31);
    for chunk in bytes.chunks(BYTES_CHUNK) {
        header(MAJOR_BYTES, chunk.len() as u64, out);
        out.extend_from_slice(chunk);
    }
    out.push(BREAK);
}

fn encode_integer(value: &BigInt, out: &mut Vec<u8>) {
    if let Some(small) = value.to_u64() {
        return header(MAJOR_UNSIGNED, small, out);
    }
    if value.sign() == Sign::Minus {
        // Negative integers are stored as -1 - n.
        let magnitude: BigInt = -value - 1;
        if let Some(small) = magnitude.to_u64() {
            return header(MAJOR_NEGATIVE, small, out);
        }
        header(MAJOR_TAG, TAG_NEGATIVE_BIGNUM, out);
        encode_bytes(&magnitude.to_bytes_be().1, out);
    } else {
        header(MAJOR_TAG, TAG_POSITIVE_BIGNUM, out);
        encode_bytes(&value.to_bytes_be().1, out);
    }
}

/// Pending output of the encoder.
enum Emit<'a> {
    Data(&'a PlutusData),
    Break,
}

/// Opens a list as an indefinite array, or writes `80` when it is empty,
/// and schedules its items ahead of the closing break.
fn open_list<'a>(items: &'a [PlutusData], out: &mut Vec<u8>, work: &mut Vec<Emit<'a>>) {
    if items.is_empty() {
        header(MAJOR_ARRAY, 0, out);
        return;
    }
    out.push((MAJOR_ARRAY << 5) | 31);
    work.push(Emit::Break);
    work.extend(items.iter().rev().map(Emit::Data));
}

fn encode(data: &PlutusData, out: &mut Vec<u8>) {
    let mut work = vec![Emit::Data(data)];
    while let Some(next) = work.pop() {
        let data = match next {
            Emit::Data(data) => data,
            Emit::Break => {
                out.push(BREAK);
                continue;
            }
        };
        match data {
            PlutusData::Constr { tag, fields } => {
                match *tag {
                    0..=6 => header(MAJOR_TAG, 121 + tag, out),
                    7..=127 => header(MAJOR_TAG, 1280 + tag - 7, out),
                    _ => {
                        header(MAJOR_TAG, TAG_GENERAL_CONSTR, out);
                        header(MAJOR_ARRAY, 2, out);
                        header(MAJOR_UNSIGNED, *tag, out);
                    }
                }
                open_list(fields, out, &mut work);
            }
            PlutusData::Map(entries) => {
                header(MAJOR_MAP, entries.len() as u64, out);
                for (key, value) in entries.iter().rev() {
                    work.push(Emit::Data(value));
                    work.push(Emit::Data(key));
                }
            }
            PlutusData::List(items) => open_list(items, out, &mut work),
            PlutusData::Integer(value) => encode_integer(value, out),
            PlutusData::ByteString(bytes) => encode_bytes(bytes, out),
        }
    }
}

struct Reader<'b> {
    bytes: &'b [u8],
    pos: usize,
}

/// Length of a CBOR item: definite, or terminated by a break byte.
#[derive(Clone, Copy)]
enum Length {
    Definite(u64),
    Indefinite,
}

enum Container {
    List,
    Map,
    Constr(u64),
}

/// A container whose header has been read but whose items are still arriving.
struct Open {
    container: Container,
    items: Vec<PlutusData>,
    /// Items still expected, or `None` when a break byte ends the container.
    remaining: Option<u64>,
}

impl Open {
    fn new(container: Container, length: Length) -> Open {
        let remaining = match length {
            Length::Definite(n) => Some(n),
            Length::Indefinite => None,
        };
        Open { container, items: Vec::new(), remaining }
    }

    fn is_complete(&self, reader: &mut Reader) -> Result<bool, DataDecodeError> {
        match self.remaining {
            Some(n) => Ok(n == 0),
            None => reader.at_break(),
        }
    }

    fn push(&mut self, item: PlutusData) {
        self.items.push(item);
        if let Some(n) = &mut self.remaining {
            *n -= 1;
        }
    }

    fn close(self) -> Result<PlutusData, DataDecodeError> {
        match self.container {
            Container::List => Ok(PlutusData::List(self.items)),
            Container::Constr(tag) => Ok(PlutusData::Constr { tag, fields: self.items }),
            Container::Map => {
                let mut entries = Vec::with_capacity(self.items.len() / 2);
                let mut items = self.items.into_iter();
                while let Some(key) = items.next() {
                    let value = items.next().ok_or(DataDecodeError::DanglingKey)?;
                    entries.push((key, value));
                }
                Ok(PlutusData::Map(entries))
            }
        }
    }
}

/// A decoded item: either finished, or a container to descend into.
enum Item {
    Done(PlutusData),
    Open(Open),
}

impl<'b> Reader<'b> {
    fn byte(&mut self) -> Result<u8, DataDecodeError> {
        let byte = *self.bytes.get(self.pos).ok_or(DataDecodeError::EndOfInput)?;
        self.pos += 1;
        Ok(byte)
    }

    fn peek(&self) -> Result<u8, DataDecodeError> {
        self.bytes.get(self.pos).copied().ok_or(DataDecodeError::EndOfInput)
    }

    fn take(&mut self, len: u64) -> Result<&'b [u8], DataDecodeError> {
        let len = usize::try_from(len).map_err(|_| DataDecodeError::EndOfInput)?;
        let end = self.pos.checked_add(len).ok_or(DataDecodeError::EndOfInput)?;
        let slice = self.bytes.get(self.pos..end).ok_or(DataDecodeError::EndOfInput)?;
        self.pos = end;
        Ok(slice)
    }

    fn header(&mut self) -> Result<(u8, Length), DataDecodeError> {
        let initial = self.byte()?;
        let major = initial >> 5;
        let info = initial & 0x1f;
        let length = match info {
            0..=23 => Length::Definite(u64::from(info)),
            24 => Length::Definite(u64::from(self.byte()?)),
            25 => Length::Definite(u64::from(u16::from_be_bytes(self.array()?))),
            26 => Length::Definite(u64::from(u32::from_be_bytes(self.array()?))),
            27 => Length::Definite(u64::from_be_bytes(self.array()?)),
            31 => Length::Indefinite,
            _ => return Err(DataDecodeError::InvalidLength(info)),
        };
        Ok((major, length))
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DataDecodeError> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(N as u64)?);
        Ok(out)
    }

    fn definite(&mut self, length: Length, info: u8) -> Result<u64, DataDecodeError> {
        match length {
            Length::Definite(n) => Ok(n),
            Length::Indefinite => Err(DataDecodeError::InvalidLength(info)),
        }
    }

    fn at_break(&mut self) -> Result<bool, DataDecodeError> {
        if self.peek()? == BREAK {
            self.pos += 1;
            return Ok(true);
        }
        Ok(false)
    }

    fn bytes_after(&mut self, length: Length) -> Result<Vec<u8>, DataDecodeError> {
        match length {
            Length::Definite(n) => Ok(self.take(n)?.to_vec()),
            Length::Indefinite => {
                let mut out = Vec::new();
                while !self.at_break()? {
                    let (major, chunk) = self.header()?;
                    if major != MAJOR_BYTES {
                        return Err(DataDecodeError::UnsupportedMajorType(major));
                    }
                    let len = self.definite(chunk, 31)?;
                    out.extend_from_slice(self.take(len)?);
                }
                Ok(out)
            }
        }
    }

    fn byte_string(&mut self) -> Result<Vec<u8>, DataDecodeError> {
        let (major, length) = self.header()?;
        if major != MAJOR_BYTES {
            return Err(DataDecodeError::UnsupportedMajorType(major));
        }
        self.bytes_after(length)
    }

    fn bignum(&mut self, tag: u64) -> Result<Option<BigInt>, DataDecodeError> {
        let magnitude = match tag {
            TAG_POSITIVE_BIGNUM | TAG_NEGATIVE_BIGNUM => {
                BigInt::from(BigUint::from_bytes_be(&self.byte_string()?))
            }
            _ => return Ok(None),
        };
        match tag {
            TAG_NEGATIVE_BIGNUM => Ok(Some(-magnitude - 1)),
            _ => Ok(Some(magnitude)),
        }
    }

    /// Reads an integer that may not be a container, as in the index of a
    /// tag-102 constructor.
    fn integer(&mut self) -> Result<BigInt, DataDecodeError> {
        let (major, length) = self.header()?;
        match major {
            MAJOR_UNSIGNED => Ok(self.definite(length, 31)?.into()),
            MAJOR_NEGATIVE => Ok(-BigInt::from(self.definite(length, 31)?) - 1),
            MAJOR_TAG => {
                let tag = self.definite(length, 31)?;
                self.bignum(tag)?.ok_or(DataDecodeError::MalformedConstr)
            }
            _ => Err(DataDecodeError::MalformedConstr),
        }
    }

    fn fields(&mut self, tag: u64) -> Result<Item, DataDecodeError> {
        let (major, length) = self.header()?;
        if major != MAJOR_ARRAY {
            return Err(DataDecodeError::UnsupportedMajorType(major));
        }
        Ok(Item::Open(Open::new(Container::Constr(tag), length)))
    }

    /// Reads one item at nesting `depth`. Containers come back open so that
    /// their items are read by the caller's loop rather than by recursion.
    fn item(&mut self, depth: usize) -> Result<Item, DataDecodeError> {
        if depth > MAX_DEPTH {
            return Err(DataDecodeError::TooDeep(MAX_DEPTH));
        }
        let (major, length) = self.header()?;
        let data = match major {
            MAJOR_UNSIGNED => PlutusData::Integer(self.definite(length, 31)?.into()),
            MAJOR_NEGATIVE => {
                let n = self.definite(length, 31)?;
                PlutusData::Integer(-BigInt::from(n) - 1)
            }
            MAJOR_BYTES => PlutusData::ByteString(self.bytes_after(length)?),
            MAJOR_ARRAY => return Ok(Item::Open(Open::new(Container::List, length))),
            MAJOR_MAP => {
                // Keys and values are collected flat and paired on close.
                let length = match length {
                    Length::Definite(n) => {
                        Length::Definite(n.checked_mul(2).ok_or(DataDecodeError::EndOfInput)?)
                    }
                    Length::Indefinite => Length::Indefinite,
                };
                return Ok(Item::Open(Open::new(Container::Map, length)));
            }
            MAJOR_TAG => {
                let tag = self.definite(length, 31)?;
                return self.tagged(tag);
            }
            other => return Err(DataDecodeError::UnsupportedMajorType(other)),
        };
        Ok(Item::Done(data))
    }

    fn tagged(&mut self, tag: u64) -> Result<Item, DataDecodeError> {
        if let Some(n) = self.bignum(tag)? {
            return Ok(Item::Done(PlutusData::Integer(n)));
        }
        match tag {
            121..=127 => self.fields(tag - 121),
            1280..=1400 => self.fields(tag - 1280 + 7),
            TAG_GENERAL_CONSTR => {
                let (major, length) = self.header()?;
                if major != MAJOR_ARRAY || !matches!(length, Length::Definite(2)) {
                    return Err(DataDecodeError::MalformedConstr);
                }
                let constructor = self.integer()?;
                let tag = constructor
                    .to_u64()
                    .ok_or_else(|| DataDecodeError::ConstructorTag(constructor.to_string()))?;
                self.fields(tag)
            }
            other => Err(DataDecodeError::UnsupportedTag(other)),
        }
    }

    fn data(&mut self) -> Result<PlutusData, DataDecodeError> {
        let mut open: Vec<Open> = Vec::new();
        loop {
            let complete = match open.last() {
                Some(top) => top.is_complete(self)?,
                None => false,
            };
            let finished = if complete { open.pop() } else { None };
            let data = match finished {
                Some(container) => container.close()?,
                None => match self.item(open.len())? {
                    Item::Done(data) => data,
                    Item::Open(container) => {
                        open.push(container);
                        continue;
                    }
                },
            };
            match open.last_mut() {
                Some(parent) => parent.push(data),
                None => return Ok(data),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hex(data: &PlutusData) -> String {
        hex::encode(data.to_cbor())
    }

    #[test]
    fn test_small_integers() {
        assert_eq!(hex(&PlutusData::integer(0)), "00");
        assert_eq!(hex(&PlutusData::integer(23)), "17");
        assert_eq!(hex(&PlutusData::integer(24)), "1818");
        assert_eq!(hex(&PlutusData::integer(-1)), "20");
        assert_eq!(hex(&PlutusData::integer(-500)), "3901f3");
    }

    #[test]
    fn test_big_integers_use_bignum_tags() {
        let big: BigInt = BigInt::from(u64::MAX) + 1;
        assert_eq!(hex(&PlutusData::Integer(big.clone())), "c249010000000000000000");
        let negative = -big - 1;
        assert_eq!(hex(&PlutusData::Integer(negative)), "c349010000000000000000");
    }

    #[test]
    fn test_constr_tags() {
        assert_eq!(hex(&PlutusData::constr(0, vec![])), "d87980");
        assert_eq!(
            hex(&PlutusData::constr(1, vec![PlutusData::integer(1)])),
            "d87a9f01ff"
        );
        assert_eq!(hex(&PlutusData::constr(7, vec![])), "d9050080");
        assert_eq!(hex(&PlutusData::constr(200, vec![])), "d8668218c880");
    }

    #[test]
    fn test_long_bytestrings_are_chunked() {
        let data = PlutusData::bytes(vec![0xab; 100]);
        let cbor = data.to_cbor();
        assert_eq!(cbor[0], 0x5f);
        assert_eq!(cbor[1], 0x58);
        assert_eq!(cbor[2], 64);
        assert_eq!(*cbor.last().unwrap(), 0xff);
        assert_eq!(PlutusData::from_cbor(&cbor).unwrap(), data);
    }

    #[test]
    fn test_decode_nested_structure() {
        let data = PlutusData::Map(vec![
            (
                PlutusData::bytes(b"key".to_vec()),
                PlutusData::List(vec![PlutusData::integer(-7), PlutusData::constr(300, vec![])]),
            ),
            (PlutusData::integer(1), PlutusData::constr(3, vec![PlutusData::integer(2)])),
        ]);
        assert_eq!(PlutusData::from_cbor(&data.to_cbor()).unwrap(), data);
    }

    #[test]
    fn test_decode_definite_lists() {
        // [1, 2] as a definite-length array.
        let data = PlutusData::from_cbor(&[0x82, 0x01, 0x02]).unwrap();
        assert_eq!(
            data,
            PlutusData::List(vec![PlutusData::integer(1), PlutusData::integer(2)])
        );
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(PlutusData::from_cbor(&[]), Err(DataDecodeError::EndOfInput));
        assert_eq!(
            PlutusData::from_cbor(&[0x01, 0x02]),
            Err(DataDecodeError::TrailingBytes(1))
        );
        assert_eq!(
            PlutusData::from_cbor(&[0x60]),
            Err(DataDecodeError::UnsupportedMajorType(3))
        );
        assert_eq!(
            PlutusData::from_cbor(&[0xc1, 0x00]),
            Err(DataDecodeError::UnsupportedTag(1))
        );
    }

    fn nested_lists(depth: usize) -> PlutusData {
        let mut data = PlutusData::integer(0);
        for _ in 0..depth {
            data = PlutusData::List(vec![data]);
        }
        data
    }

    // Takes a deep value apart one level at a time so that dropping it
    // never recurses.
    fn dismantle(mut data: PlutusData) {
        while let PlutusData::List(mut items) = data {
            match items.pop() {
                Some(inner) => data = inner,
                None => break,
            }
        }
    }

    #[test]
    fn test_decode_nesting_up_to_the_limit() {
        let data = nested_lists(MAX_DEPTH);
        let cbor = data.to_cbor();
        assert_eq!(PlutusData::from_cbor(&cbor).unwrap(), data);

        let mut definite = vec![0x81; MAX_DEPTH];
        definite.push(0x00);
        assert_eq!(PlutusData::from_cbor(&definite).unwrap(), data);
    }

    #[test]
    fn test_decode_deep_nesting_fails_cleanly() {
        // Twice the limit, on a thread with a small stack.
        let result = std::thread::Builder::new()
            .stack_size(64 * 1024)
            .spawn(|| {
                let mut cbor = vec![0x9f; 2 * MAX_DEPTH];
                cbor.push(0x00);
                cbor.extend(vec![BREAK; 2 * MAX_DEPTH]);
                PlutusData::from_cbor(&cbor)
            })
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(result, Err(DataDecodeError::TooDeep(MAX_DEPTH)));
    }

    #[test]
    fn test_encode_very_deep_data() {
        let depth = 100_000;
        let data = nested_lists(depth);
        let cbor = data.to_cbor();
        dismantle(data);
        assert_eq!(cbor.len(), 2 * depth + 1);
        assert!(cbor[..depth].iter().all(|&b| b == 0x9f));
        assert_eq!(cbor[depth], 0x00);
        assert!(cbor[depth + 1..].iter().all(|&b| b == BREAK));
        assert_eq!(
            PlutusData::from_cbor(&cbor),
            Err(DataDecodeError::TooDeep(MAX_DEPTH))
        );
    }

    #[test]
    fn test_decode_maps() {
        // {1: h'ab'} as an indefinite map.
        assert_eq!(
            PlutusData::from_cbor(&[0xbf, 0x01, 0x41, 0xab, 0xff]).unwrap(),
            PlutusData::Map(vec![(PlutusData::integer(1), PlutusData::bytes(vec![0xab]))])
        );
        assert_eq!(
            PlutusData::from_cbor(&[0xbf, 0x01, 0xff]),
            Err(DataDecodeError::DanglingKey)
        );
        assert_eq!(
            PlutusData::from_cbor(&[0xa1, 0x01]),
            Err(DataDecodeError::EndOfInput)
        );
    }

    #[test]
    fn test_decode_general_constr_tags() {
        // 102([2^64, []]) has an index that does not fit a u64.
        let cbor = [
            0xd8, 0x66, 0x82, 0xc2, 0x49, 0x01, 0, 0, 0, 0, 0, 0, 0, 0, 0x80,
        ];
        assert_eq!(
            PlutusData::from_cbor(&cbor),
            Err(DataDecodeError::ConstructorTag("18446744073709551616".into()))
        );
        // The index must be an integer.
        assert_eq!(
            PlutusData::from_cbor(&[0xd8, 0x66, 0x82, 0x80, 0x80]),
            Err(DataDecodeError::MalformedConstr)
        );
    }

    #[test]
    fn test_decode_rejects_excessive_nesting() {
        let mut cbor = vec![0x81; MAX_DEPTH + 10];
        cbor.push(0x00);
        assert_eq!(
            PlutusData::from_cbor(&cbor),
            Err(DataDecodeError::TooDeep(MAX_DEPTH))
        );
    }
}
