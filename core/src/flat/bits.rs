//! Bit-level reader and writer. Bits are packed most significant first.

use num_bigint::BigUint;

use crate::flat::DecodeError;

#[derive(Debug, Default)]
pub(crate) struct BitWriter {
    bytes: Vec<u8>,
    current: u8,
    used: u8,
}

impl BitWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bit(&mut self, bit: bool) {
        self.current = (self.current << 1) | u8::from(bit);
        self.used += 1;
        if self.used == 8 {
            self.bytes.push(self.current);
            self.current = 0;
            self.used = 0;
        }
    }

    /// Writes the low `count` bits of `value`.
    pub(crate) fn bits(&mut self, count: u8, value: u8) {
        debug_assert!(count <= 8);
        for i in (0..count).rev() {
            self.bit((value >> i) & 1 == 1);
        }
    }

    pub(crate) fn byte(&mut self, byte: u8) {
        if self.used == 0 {
            self.bytes.push(byte);
        } else {
            self.bits(8, byte);
        }
    }

    /// Zero bits up to the last bit of the current byte, which is one.
    pub(crate) fn filler(&mut self) {
        while self.used != 7 {
            self.bit(false);
        }
        self.bit(true);
    }

    /// Seven bits per group, least significant group first; the leading
    /// bit of each byte says whether another group follows.
    pub(crate) fn natural(&mut self, mut n: u64) {
        loop {
            let group = (n & 0x7f) as u8;
            n >>= 7;
            if n == 0 {
                self.byte(group);
                return;
            }
            self.byte(group | 0x80);
        }
    }

    pub(crate) fn big_natural(&mut self, n: &BigUint) {
        let groups = n.to_radix_le(128);
        match groups.split_last() {
            None => self.byte(0),
            Some((last, rest)) => {
                for group in rest {
                    self.byte(group | 0x80);
                }
                self.byte(*last);
            }
        }
    }

    /// Filler, then chunks of at most 255 bytes, then an empty chunk.
    pub(crate) fn byte_string(&mut self, bytes: &[u8]) {
        self.filler();
        for chunk in bytes.chunks(255) {
            self.bytes.push(chunk.len() as u8);
            self.bytes.extend_from_slice(chunk);
        }
        self.bytes.push(0);
    }

    pub(crate) fn finish(mut self) -> Vec<u8> {
        self.filler();
        self.bytes
    }
}

pub(crate) struct BitReader<'b> {
    bytes: &'b [u8],
    pos: usize,
    /// Bits already consumed from `bytes[pos]`.
    used: u8,
}

impl<'b> BitReader<'b> {
    pub(crate) fn new(bytes: &'b [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            used: 0,
        }
    }

    pub(crate) fn bit(&mut self) -> Result<bool, DecodeError> {
        let byte = *self
            .bytes
            .get(self.pos)
            .ok_or(DecodeError::EndOfInput(self.pos))?;
        let bit = (byte >> (7 - self.used)) & 1 == 1;
        self.used += 1;
        if self.used == 8 {
            self.pos += 1;
            self.used = 0;
        }
        Ok(bit)
    }

    pub(crate) fn bits(&mut self, count: u8) -> Result<u8, DecodeError> {
        debug_assert!(count <= 8);
        let mut value = 0u8;
        for _ in 0..count {
            value = (value << 1) | u8::from(self.bit()?);
        }
        Ok(value)
    }

    pub(crate) fn byte(&mut self) -> Result<u8, DecodeError> {
        if self.used != 0 {
            return self.bits(8);
        }
        let byte = *self
            .bytes
            .get(self.pos)
            .ok_or(DecodeError::EndOfInput(self.pos))?;
        self.pos += 1;
        Ok(byte)
    }

    pub(crate) fn filler(&mut self) -> Result<(), DecodeError> {
        while !self.bit()? {}
        if self.used != 0 {
            return Err(DecodeError::MisalignedFiller(self.pos));
        }
        Ok(())
    }

    /// Reads a natural that must fit in `bits` bits.
    pub(crate) fn natural(&mut self, bits: u32) -> Result<u64, DecodeError> {
        debug_assert!(bits <= 64);
        let mut value = 0u128;
        let mut shift = 0u32;
        loop {
            let byte = self.byte()?;
            let group = u128::from(byte & 0x7f);
            if group != 0 {
                if shift >= 64 {
                    return Err(DecodeError::NaturalOverflow(bits));
                }
                value |= group << shift;
                if value >> bits != 0 {
                    return Err(DecodeError::NaturalOverflow(bits));
                }
            }
            shift = shift.saturating_add(7);
            if byte & 0x80 == 0 {
                return Ok(value as u64);
            }
        }
    }

    pub(crate) fn big_natural(&mut self) -> Result<BigUint, DecodeError> {
        let mut groups = Vec::new();
        loop {
            let byte = self.byte()?;
            groups.push(byte & 0x7f);
            if byte & 0x80 == 0 {
                break;
            }
        }
        // Groups are below 128, so this cannot fail.
        Ok(BigUint::from_radix_le(&groups, 128).unwrap_or_default())
    }

    pub(crate) fn byte_string(&mut self) -> Result<Vec<u8>, DecodeError> {
        self.filler()?;
        let mut out = Vec::new();
        loop {
            let len = usize::from(self.byte()?);
            if len == 0 {
                return Ok(out);
            }
            let end = self.pos + len;
            let chunk = self
                .bytes
                .get(self.pos..end)
                .ok_or(DecodeError::EndOfInput(self.bytes.len()))?;
            out.extend_from_slice(chunk);
            self.pos = end;
        }
    }

    /// Bytes left after the current position, counting a partly read byte.
    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}
