use std::fmt;

/// Errors surfaced by the LZX bitstream reader and decompressor.
#[derive(Debug, PartialEq, Eq)]
pub enum LzxError {
    /// `window_bits` was outside the supported `[15, 21]` range.
    WindowSizeOutOfRange(u8),
    /// The one-time Intel-E8 header bit was set; E8 call translation is not
    /// supported by this decoder.
    IntelE8NotSupported,
    /// A block's 3-bit type field held a reserved value.
    InvalidBlockType(u8),
    /// Canonical-Huffman table construction ran out of table space.
    TableOverrun,
    /// A match offset referenced data further back than the window holds.
    WindowRunOverflow,
    /// Decoding consumed more bytes than the current block declared.
    BlockOverrun,
    /// An outer frame/block size exceeded the 0x10000 cap, or was malformed.
    InvalidCompressedSize(u32),
    /// The bitstream ended with a block still expecting more data.
    EofWithDataRemaining,
    /// Ran out of input bytes while reading the bit-level stream.
    UnexpectedEof,
}

impl fmt::Display for LzxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use LzxError::*;
        match self {
            WindowSizeOutOfRange(b) => write!(f, "window_bits {b} is outside the supported [15, 21] range"),
            IntelE8NotSupported => write!(f, "Intel E8 call translation is not supported"),
            InvalidBlockType(t) => write!(f, "block type {t} is invalid"),
            TableOverrun => write!(f, "canonical Huffman table construction overran its table"),
            WindowRunOverflow => write!(f, "match offset reaches further back than the window holds"),
            BlockOverrun => write!(f, "decoded more bytes than the current block declared"),
            InvalidCompressedSize(n) => write!(f, "invalid compressed frame/block size {n}"),
            EofWithDataRemaining => write!(f, "reached end of stream with a block still pending"),
            UnexpectedEof => write!(f, "unexpected end of LZX bitstream"),
        }
    }
}

impl std::error::Error for LzxError {}
