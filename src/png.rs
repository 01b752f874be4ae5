//! Thin wrapper around the opaque PNG codec used for Texture2D and SFDItem
//! layer sidecars. Always RGBA8.

use image::{ImageFormat, RgbaImage};

use crate::error::XnbError;

/// Encodes tightly-packed RGBA8 `pixels` (`width * height * 4` bytes) as a
/// PNG file.
pub fn png_encode(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, XnbError> {
    let image = RgbaImage::from_raw(width, height, pixels.to_vec())
        .ok_or(XnbError::InvalidSize("pixels", pixels.len() as u32))?;
    let mut out = Vec::new();
    image.write_to(&mut std::io::Cursor::new(&mut out), ImageFormat::Png)?;
    Ok(out)
}

/// Decodes a PNG file into tightly-packed RGBA8 pixels plus its dimensions.
pub fn png_decode(bytes: &[u8]) -> Result<(Vec<u8>, u32, u32), XnbError> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgba8();
    let (width, height) = image.dimensions();
    Ok((image.into_raw(), width, height))
}
