//! Crate-wide error type. Every parser/decoder fault surfaces here with a
//! human-readable message; nothing is silently truncated or zero-filled.

use std::fmt;
use std::io;

use crate::lzx::LzxError;

#[derive(Debug)]
pub enum XnbError {
    BadMagic,
    Truncated,
    UnknownReader(String),
    UnsupportedSharedResources(u32),
    InvalidReaderIndex(u32, usize),
    ReaderTypeMismatch { expected: &'static str, found: &'static str },
    UnsupportedAudioFormat(u16),
    UnsupportedTextureFormat(i32),
    PaletteMiss { r: u8, g: u8, b: u8, a: u8 },
    InvalidSize(&'static str, u32),
    Lzx(LzxError),
    Io(io::Error),
    Image(image::ImageError),
}

impl fmt::Display for XnbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use XnbError::*;
        match self {
            BadMagic => write!(f, "missing 'XNB' magic at start of file"),
            Truncated => write!(f, "input ended before the expected field could be read"),
            UnknownReader(name) => write!(f, "no content reader registered for type '{name}'"),
            UnsupportedSharedResources(n) => {
                write!(f, "shared resources are not supported (found {n})")
            }
            InvalidReaderIndex(idx, len) => {
                write!(f, "reader index {idx} is out of bounds ({len} readers present)")
            }
            ReaderTypeMismatch { expected, found } => {
                write!(f, "expected reader of type {expected}, found {found}")
            }
            UnsupportedAudioFormat(tag) => write!(f, "unsupported audio format tag {tag}"),
            UnsupportedTextureFormat(fmt) => write!(f, "unsupported texture surface format {fmt}"),
            PaletteMiss { r, g, b, a } => write!(
                f,
                "pixel color rgba({r}, {g}, {b}, {a}) is not present in the built palette"
            ),
            InvalidSize(field, v) => write!(f, "invalid {field}: {v}"),
            Lzx(e) => write!(f, "LZX decompression error: {e}"),
            Io(e) => write!(f, "I/O error: {e}"),
            Image(e) => write!(f, "image codec error: {e}"),
        }
    }
}

impl std::error::Error for XnbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            XnbError::Lzx(e) => Some(e),
            XnbError::Io(e) => Some(e),
            XnbError::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for XnbError {
    fn from(e: io::Error) -> Self {
        XnbError::Io(e)
    }
}

impl From<LzxError> for XnbError {
    fn from(e: LzxError) -> Self {
        XnbError::Lzx(e)
    }
}

impl From<image::ImageError> for XnbError {
    fn from(e: image::ImageError) -> Self {
        XnbError::Image(e)
    }
}
