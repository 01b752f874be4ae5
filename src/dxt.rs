//! Thin wrapper around the opaque DXT1/3/5 block codec. Treated as an
//! external primitive: the container never inspects compressed block
//! internals, only calls through this seam.

use texpresso::{Format, Params};

use crate::error::XnbError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DxtFormat {
    Dxt1,
    Dxt3,
    Dxt5,
}

impl DxtFormat {
    fn as_texpresso(self) -> Format {
        match self {
            DxtFormat::Dxt1 => Format::Bc1,
            DxtFormat::Dxt3 => Format::Bc2,
            DxtFormat::Dxt5 => Format::Bc3,
        }
    }
}

/// Decompresses a DXT1/3/5 block stream into tightly-packed RGBA8.
pub fn dxt_decompress(
    data: &[u8],
    width: u32,
    height: u32,
    format: DxtFormat,
) -> Result<Vec<u8>, XnbError> {
    let (w, h) = (width as usize, height as usize);
    let mut out = vec![0u8; w * h * 4];
    format.as_texpresso().decompress(data, w, h, &mut out);
    Ok(out)
}

/// Compresses tightly-packed RGBA8 into a DXT1/3/5 block stream.
pub fn dxt_compress(rgba: &[u8], width: u32, height: u32, format: DxtFormat) -> Vec<u8> {
    let (w, h) = (width as usize, height as usize);
    let fmt = format.as_texpresso();
    let mut out = vec![0u8; fmt.compressed_size(w, h)];
    fmt.compress(rgba, w, h, Params::default(), &mut out);
    out
}
