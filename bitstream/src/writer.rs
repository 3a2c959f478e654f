//! Bit-level writer for encoding packed binary data.

use crate::error::{BitError, BitResult};

/// A bit-level writer for encoding packed binary data.
///
/// Mirrors [`BitReader`](crate::BitReader): bits are written
/// most-significant first with no alignment between fields. Writes are
/// accumulated in an internal buffer. Call [`finish`](Self::finish) to get
/// the final byte buffer.
#[derive(Debug, Default)]
pub struct BitWriter {
    /// The accumulated bytes.
    bytes: Vec<u8>,
    /// Current byte being written (not yet pushed to bytes).
    current_byte: u8,
    /// Number of bits written to `current_byte` (0-7).
    bit_count: u8,
}

impl BitWriter {
    /// Creates a new empty `BitWriter`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `BitWriter` with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            current_byte: 0,
            bit_count: 0,
        }
    }

    /// Returns the number of bits written so far.
    #[must_use]
    pub fn bits_written(&self) -> usize {
        self.bytes.len() * 8 + self.bit_count as usize
    }

    /// Writes a single bit.
    pub fn write_bit(&mut self, value: bool) {
        self.current_byte = (self.current_byte << 1) | u8::from(value);
        self.bit_count += 1;
        if self.bit_count == 8 {
            self.bytes.push(self.current_byte);
            self.current_byte = 0;
            self.bit_count = 0;
        }
    }

    /// Writes up to 64 bits from an unsigned integer.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits > 64`.
    /// Returns [`BitError::ValueOutOfRange`] if `value` doesn't fit in `bits`.
    pub fn write_bits(&mut self, value: u64, bits: u8) -> BitResult<()> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount { bits, max_bits: 64 });
        }
        if bits == 0 {
            return Ok(());
        }
        if bits < 64 && value >= (1u64 << bits) {
            return Err(BitError::ValueOutOfRange { value, bits });
        }

        for i in (0..bits).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
        Ok(())
    }

    /// Writes a two's complement signed integer in `bits` bits.
    pub fn write_signed_bits(&mut self, value: i64, bits: u8) -> BitResult<()> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount { bits, max_bits: 64 });
        }
        if bits == 64 {
            return self.write_bits(value as u64, 64);
        }
        if bits == 0 {
            return Ok(());
        }
        let min = -(1i64 << (bits - 1));
        let max = (1i64 << (bits - 1)) - 1;
        if value < min || value > max {
            return Err(BitError::ValueOutOfRange {
                value: value as u64,
                bits,
            });
        }
        let mask = (1u64 << bits) - 1;
        self.write_bits(value as u64 & mask, bits)
    }

    /// Writes an 8-bit unsigned integer.
    pub fn write_u8(&mut self, value: u8) {
        self.write_raw(u64::from(value), 8);
    }

    /// Writes a 16-bit unsigned integer.
    pub fn write_u16(&mut self, value: u16) {
        self.write_raw(u64::from(value), 16);
    }

    /// Writes a 16-bit signed integer.
    pub fn write_i16(&mut self, value: i16) {
        self.write_raw(u64::from(value as u16), 16);
    }

    /// Writes a 32-bit signed integer.
    pub fn write_i32(&mut self, value: i32) {
        self.write_raw(u64::from(value as u32), 32);
    }

    /// Writes a 32-bit IEEE-754 float.
    pub fn write_f32(&mut self, value: f32) {
        self.write_raw(u64::from(value.to_bits()), 32);
    }

    /// Writes a string followed by a NUL terminator.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InteriorNul`] if the string contains a NUL byte.
    pub fn write_string(&mut self, value: &str) -> BitResult<()> {
        if let Some(position) = value.bytes().position(|b| b == 0) {
            return Err(BitError::InteriorNul { position });
        }
        for byte in value.bytes() {
            self.write_u8(byte);
        }
        self.write_u8(0);
        Ok(())
    }

    /// Writes raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.write_u8(byte);
        }
    }

    /// Finishes writing and returns the byte buffer.
    ///
    /// If the last byte is incomplete, it is padded with zeros on the right.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        if self.bit_count > 0 {
            self.current_byte <<= 8 - self.bit_count;
            self.bytes.push(self.current_byte);
        }
        self.bytes
    }

    fn write_raw(&mut self, value: u64, bits: u8) {
        for i in (0..bits).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
    }
}
