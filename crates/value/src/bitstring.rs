//! Bit strings with bit-granular length
//!
//! Backs BINARY, VARBINARY, BIT and BIT VARYING values. The bit length is
//! tracked separately from the byte length so that a 5-bit string occupies a
//! single backing byte but compares, truncates and concatenates at bit
//! granularity. Bits are numbered from the most significant bit of byte 0.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitString {
    bytes: Vec<u8>,
    bit_length: usize,
}

impl BitString {
    /// Byte-aligned bit string; bit length is eight times the byte count.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let bit_length = bytes.len() * 8;
        BitString { bytes, bit_length }
    }

    /// Bit string of an explicit bit length. Unused trailing bits in the
    /// last byte are cleared so that equality and hashing stay canonical.
    pub fn from_bits(mut bytes: Vec<u8>, bit_length: usize) -> Self {
        bytes.truncate(bit_length.div_ceil(8));
        bytes.resize(bit_length.div_ceil(8), 0);
        let mut value = BitString { bytes, bit_length };
        value.clear_unused_bits();
        value
    }

    pub fn empty() -> Self {
        BitString {
            bytes: Vec::new(),
            bit_length: 0,
        }
    }

    pub fn bit_length(&self) -> usize {
        self.bit_length
    }

    pub fn byte_length(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_byte_aligned(&self) -> bool {
        self.bit_length == self.bytes.len() * 8
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Bit at position `i`, most significant bit of byte 0 first.
    pub fn bit(&self, i: usize) -> bool {
        debug_assert!(i < self.bit_length);
        self.bytes[i / 8] & (0x80 >> (i % 8)) != 0
    }

    pub fn set_bit(&mut self, i: usize, value: bool) {
        debug_assert!(i < self.bit_length);
        if value {
            self.bytes[i / 8] |= 0x80 >> (i % 8);
        } else {
            self.bytes[i / 8] &= !(0x80 >> (i % 8));
        }
    }

    /// True when every bit at position `from` or later is zero. Used by the
    /// binary kernel to decide whether truncation is silently permitted.
    pub fn all_zero_from(&self, from: usize) -> bool {
        (from..self.bit_length).all(|i| !self.bit(i))
    }

    /// First `n` bits as a new bit string; `n` past the end zero-extends.
    pub fn take_bits(&self, n: usize) -> BitString {
        let mut out = BitString::from_bits(vec![0; n.div_ceil(8)], n);
        for i in 0..n.min(self.bit_length) {
            out.set_bit(i, self.bit(i));
        }
        out
    }

    /// Zero-extend to `n` bits; no-op when already at least that long.
    pub fn zero_extend(&self, n: usize) -> BitString {
        if n <= self.bit_length {
            return self.clone();
        }
        let mut out = self.clone();
        out.bytes.resize(n.div_ceil(8), 0);
        out.bit_length = n;
        out
    }

    pub fn sub_bits(&self, offset: usize, len: usize) -> BitString {
        let end = (offset + len).min(self.bit_length);
        let len = end.saturating_sub(offset);
        let mut out = BitString::from_bits(vec![0; len.div_ceil(8)], len);
        for i in 0..len {
            out.set_bit(i, self.bit(offset + i));
        }
        out
    }

    /// Bit-by-bit concatenation; byte-aligned operands take the fast path.
    pub fn concat(&self, other: &BitString) -> BitString {
        if self.is_byte_aligned() {
            let mut bytes = self.bytes.clone();
            bytes.extend_from_slice(&other.bytes);
            return BitString::from_bits(bytes, self.bit_length + other.bit_length);
        }
        let total = self.bit_length + other.bit_length;
        let mut out = BitString::from_bits(vec![0; total.div_ceil(8)], total);
        for i in 0..self.bit_length {
            out.set_bit(i, self.bit(i));
        }
        for i in 0..other.bit_length {
            out.set_bit(self.bit_length + i, other.bit(i));
        }
        out
    }

    /// Overwrite bits starting at `offset` with `other`, growing the string
    /// when the overlay runs past the current end.
    pub fn overlay(&self, other: &BitString, offset: usize) -> BitString {
        let total = self.bit_length.max(offset + other.bit_length);
        let mut out = self.zero_extend(total);
        for i in 0..other.bit_length {
            out.set_bit(offset + i, other.bit(i));
        }
        out
    }

    fn clear_unused_bits(&mut self) {
        let unused = self.bytes.len() * 8 - self.bit_length;
        if unused > 0
            && let Some(last) = self.bytes.last_mut()
        {
            *last &= 0xffu8 << unused;
        }
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_byte_aligned() {
            write!(f, "X'{}'", hex::encode(&self.bytes))
        } else {
            write!(f, "B'")?;
            for i in 0..self.bit_length {
                write!(f, "{}", if self.bit(i) { '1' } else { '0' })?;
            }
            write!(f, "'")
        }
    }
}
