//! Thin wrapper around the opaque LZ4 block codec used for mobile-target
//! compression. XNB's LZ4 framing has no block-size prefix of its own; the
//! decompressed size is already known from the container header, so we use
//! the block (not frame) API with an explicit output bound.

use lz4_flex::block::{compress, decompress_into, get_maximum_output_size};

use crate::error::XnbError;

/// Decompresses `data` into exactly `decompressed_size` bytes.
pub fn decode_block(data: &[u8], decompressed_size: usize) -> Result<Vec<u8>, XnbError> {
    let mut out = vec![0u8; decompressed_size];
    let written = decompress_into(data, &mut out)
        .map_err(|e| XnbError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    out.truncate(written);
    Ok(out)
}

/// Compresses `data` into a standalone LZ4 block (no frame header).
pub fn encode_block(data: &[u8]) -> Vec<u8> {
    compress(data)
}

/// Upper bound on the compressed size of an input of length `len`.
pub fn encode_bound(len: usize) -> usize {
    get_maximum_output_size(len)
}
