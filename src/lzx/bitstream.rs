//! 16-bit little-endian word stream, read MSB-first within each word. This is
//! the bit-level view the LZX block decoder and canonical Huffman tables are
//! built on, distinct from the byte-aligned [`crate::bitio::BitReader`] used
//! everywhere else in the container.

use super::error::LzxError;

#[derive(Clone, Copy)]
pub(crate) struct LzxBitReader<'a> {
    buf: &'a [u8],
    /// The current 16-bit word, pre-rotated so the next unread bit sits at
    /// the MSB.
    word: u16,
    /// How many unread bits remain in `word`.
    remaining: u8,
}

impl<'a> LzxBitReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            word: 0,
            remaining: 0,
        }
    }

    fn advance_word(&mut self) -> Result<(), LzxError> {
        if self.buf.len() < 2 {
            return Err(LzxError::UnexpectedEof);
        }
        self.word = u16::from_le_bytes([self.buf[0], self.buf[1]]);
        self.buf = &self.buf[2..];
        self.remaining = 16;
        Ok(())
    }

    fn mask(bits: u8) -> u16 {
        if bits == 16 {
            0xFFFF
        } else {
            (1u16 << bits) - 1
        }
    }

    /// Reads `bits` bits (0..=17) MSB-first, advancing the stream.
    pub(crate) fn read_bits(&mut self, mut bits: u8) -> Result<u32, LzxError> {
        debug_assert!(bits <= 17);
        let mut result: u32 = 0;
        while bits > 0 {
            if self.remaining == 0 {
                self.advance_word()?;
            }
            let take = bits.min(self.remaining);
            let chunk = (self.word.rotate_left(take as u32) & Self::mask(take)) as u32;
            self.remaining -= take;
            self.word = self.word.rotate_left(take as u32);
            result = (result << take) | chunk;
            bits -= take;
        }
        Ok(result)
    }

    /// Reads `bits` bits without consuming them. Implemented by probing a
    /// cloned reader since the reader is cheaply `Copy`.
    pub(crate) fn peek_bits(&self, bits: u8) -> Result<u32, LzxError> {
        let mut probe = *self;
        probe.read_bits(bits)
    }

    /// Drops any unread bits in the current word, moving to the next 16-bit
    /// boundary.
    pub(crate) fn align(&mut self) {
        self.remaining = 0;
    }

    /// Reads one raw byte. Requires the stream to currently sit on an 8-bit
    /// boundary within the word (true whenever called right after `align()`
    /// or another byte-granular read).
    pub(crate) fn read_u8(&mut self) -> Result<u8, LzxError> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Reads a 16-bit field stored in on-disk little-endian byte order (as
    /// opposed to the MSB-first bit order `read_bits` reconstructs). Used for
    /// the repeated-offset fields in an uncompressed block header.
    pub(crate) fn read_u16_le(&mut self) -> Result<u16, LzxError> {
        Ok((self.read_bits(16)? as u16).swap_bytes())
    }

    /// Reads a 32-bit little-endian field as two `read_u16_le` halves.
    pub(crate) fn read_u32_le(&mut self) -> Result<u32, LzxError> {
        let lo = self.read_u16_le()? as u32;
        let hi = self.read_u16_le()? as u32;
        Ok((hi << 16) | lo)
    }

    /// Reads two bytes and returns `(first << 8) | second`, the convention
    /// used for the outer container's frame/block size fields.
    pub(crate) fn read_i16_swapped(&mut self) -> Result<u16, LzxError> {
        Ok(self.read_bits(16)? as u16)
    }

    /// Undoes a single prior `read_u8()` call made from a fresh word
    /// boundary (`remaining` was 16 before that read). Used by the outer
    /// framing loop to "un-peek" the flag byte when it isn't `0xFF`.
    pub(crate) fn unread_byte(&mut self) {
        debug_assert_eq!(self.remaining, 8);
        self.word = self.word.rotate_left(8);
        self.remaining = 16;
    }

    /// Reads `n` raw bytes one at a time, preserving correct word-buffer
    /// bookkeeping. Used for uncompressed-block bodies.
    pub(crate) fn read_raw_bytes(&mut self, n: usize) -> Result<Vec<u8>, LzxError> {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_u8()?);
        }
        Ok(out)
    }

    pub(crate) fn is_byte_aligned(&self) -> bool {
        self.remaining % 8 == 0
    }
}
