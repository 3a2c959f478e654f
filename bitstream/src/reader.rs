//! Bit-level reader with bounded operations.

use crate::error::{BitError, BitResult};

/// A bit-level reader for decoding packed binary data.
///
/// Bits are consumed most-significant first. Multi-bit integers are not
/// byte-aligned; a message is one continuous bit stream. All read operations
/// are bounds-checked and return errors on failure. The reader never panics
/// on malformed input.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a new `BitReader` from a byte slice.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Returns the number of bits remaining to read.
    #[must_use]
    pub const fn bits_remaining(&self) -> usize {
        self.data
            .len()
            .saturating_mul(8)
            .saturating_sub(self.bit_pos)
    }

    /// Returns `true` if there are no more bits to read.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bits_remaining() == 0
    }

    /// Returns the current bit position.
    #[must_use]
    pub const fn bit_position(&self) -> usize {
        self.bit_pos
    }

    /// Returns the number of bytes touched so far (a partial byte counts).
    #[must_use]
    pub const fn bytes_consumed(&self) -> usize {
        self.bit_pos.div_ceil(8)
    }

    /// Returns the length of the underlying buffer in bytes.
    #[must_use]
    pub const fn len_bytes(&self) -> usize {
        self.data.len()
    }

    /// Reads a single bit as a boolean.
    pub fn read_bit(&mut self) -> BitResult<bool> {
        self.ensure_bits(1)?;
        let byte_idx = self.bit_pos / 8;
        let bit_idx = self.bit_pos % 8;
        let bit = (self.data[byte_idx] >> (7 - bit_idx)) & 1;
        self.bit_pos += 1;
        Ok(bit == 1)
    }

    /// Reads up to 64 bits as an unsigned integer.
    pub fn read_bits(&mut self, bits: u8) -> BitResult<u64> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount { bits, max_bits: 64 });
        }
        if bits == 0 {
            return Ok(0);
        }
        self.ensure_bits(bits as usize)?;

        let mut value = 0u64;
        for _ in 0..bits {
            value = (value << 1) | u64::from(self.read_bit()?);
        }
        Ok(value)
    }

    /// Reads up to 64 bits as a two's complement signed integer.
    pub fn read_signed_bits(&mut self, bits: u8) -> BitResult<i64> {
        let raw = self.read_bits(bits)?;
        if bits == 0 || bits == 64 {
            return Ok(raw as i64);
        }
        let shift = 64 - u32::from(bits);
        Ok(((raw << shift) as i64) >> shift)
    }

    /// Reads an 8-bit unsigned integer.
    pub fn read_u8(&mut self) -> BitResult<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Reads a 16-bit unsigned integer.
    pub fn read_u16(&mut self) -> BitResult<u16> {
        Ok(self.read_bits(16)? as u16)
    }

    /// Reads a 16-bit signed integer.
    pub fn read_i16(&mut self) -> BitResult<i16> {
        Ok(self.read_bits(16)? as u16 as i16)
    }

    /// Reads a 32-bit signed integer.
    pub fn read_i32(&mut self) -> BitResult<i32> {
        Ok(self.read_bits(32)? as u32 as i32)
    }

    /// Reads a 32-bit IEEE-754 float.
    pub fn read_f32(&mut self) -> BitResult<f32> {
        Ok(f32::from_bits(self.read_bits(32)? as u32))
    }

    /// Reads a NUL-terminated string.
    ///
    /// The terminator is always consumed. Characters beyond `max_chars` are
    /// consumed and dropped. Invalid UTF-8 is replaced lossily.
    pub fn read_string(&mut self, max_chars: usize) -> BitResult<String> {
        let mut bytes = Vec::new();
        loop {
            let byte = self.read_u8()?;
            if byte == 0 {
                break;
            }
            if bytes.len() < max_chars {
                bytes.push(byte);
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Fills `out` with the next `out.len()` bytes.
    pub fn read_bytes_into(&mut self, out: &mut [u8]) -> BitResult<()> {
        self.ensure_bits(out.len().saturating_mul(8))?;
        for byte in out.iter_mut() {
            *byte = self.read_u8()?;
        }
        Ok(())
    }

    /// Reads `len` bytes into a new vector.
    pub fn read_bytes(&mut self, len: usize) -> BitResult<Vec<u8>> {
        let mut out = vec![0u8; len];
        self.read_bytes_into(&mut out)?;
        Ok(out)
    }

    /// Skips `len` bytes.
    pub fn skip_bytes(&mut self, len: usize) -> BitResult<()> {
        let bits = len.saturating_mul(8);
        self.ensure_bits(bits)?;
        self.bit_pos += bits;
        Ok(())
    }

    fn ensure_bits(&self, bits: usize) -> BitResult<()> {
        let available = self.bits_remaining();
        if bits > available {
            return Err(BitError::UnexpectedEof {
                requested: bits,
                available,
            });
        }
        Ok(())
    }
}
