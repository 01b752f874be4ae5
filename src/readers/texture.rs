//! `Texture2DReader`: uncompressed or DXT1/3/5 2D textures, mip level 0 only.

use crate::bitio::{BitReader, BitWriter};
use crate::dxt::{dxt_compress, dxt_decompress, DxtFormat};
use crate::error::XnbError;

#[derive(Debug, Clone, PartialEq)]
pub struct Texture2D {
    pub surface_format: i32,
    pub width: u32,
    pub height: u32,
    /// RGBA8, un-premultiplied alpha (in memory; premultiplied on disk).
    pub pixels: Vec<u8>,
}

fn dxt_format_for(surface_format: i32) -> Result<Option<DxtFormat>, XnbError> {
    match surface_format {
        0 => Ok(None),
        4 => Ok(Some(DxtFormat::Dxt1)),
        5 => Ok(Some(DxtFormat::Dxt3)),
        6 => Ok(Some(DxtFormat::Dxt5)),
        other => Err(XnbError::UnsupportedTextureFormat(other)),
    }
}

/// `c' = min(255, ceil(c * 255 / a))`, applied only where `0 < a < 255`; `a`
/// at the extremes is already its own fixed point.
fn unpremultiply(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u32;
        if a > 0 && a < 255 {
            for c in &mut px[..3] {
                *c = (((*c as u32) * 255 + a - 1) / a).min(255) as u8;
            }
        }
    }
}

/// `c' = floor(c * a / 255)`, the inverse of [`unpremultiply`].
fn premultiply(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u32;
        if a > 0 && a < 255 {
            for c in &mut px[..3] {
                *c = ((*c as u32 * a) / 255) as u8;
            }
        }
    }
}

pub fn read(buf: &mut BitReader) -> Result<Texture2D, XnbError> {
    let surface_format = buf.read_i32le()?;
    let width = buf.read_u32le()?;
    let height = buf.read_u32le()?;
    let mip_count = buf.read_u32le()?;
    if mip_count == 0 {
        return Err(XnbError::InvalidSize("mip_count", mip_count));
    }
    if mip_count > 1 {
        log::warn!("Texture2D declares {mip_count} mip levels; only level 0 is retained");
    }

    let data_size = buf.read_u32le()? as usize;
    let data = buf.read_bytes(data_size)?;

    let mut pixels = match dxt_format_for(surface_format)? {
        None => data,
        Some(fmt) => dxt_decompress(&data, width, height, fmt)?,
    };
    unpremultiply(&mut pixels);

    Ok(Texture2D {
        surface_format,
        width,
        height,
        pixels,
    })
}

pub fn write(buf: &mut BitWriter, tex: &Texture2D) -> Result<(), XnbError> {
    buf.write_i32le(tex.surface_format);
    buf.write_u32le(tex.width);
    buf.write_u32le(tex.height);
    buf.write_u32le(1); // mip_count

    let mut pixels = tex.pixels.clone();
    premultiply(&mut pixels);

    let data = match dxt_format_for(tex.surface_format)? {
        None => pixels,
        Some(fmt) => dxt_compress(&pixels, tex.width, tex.height, fmt),
    };

    buf.write_u32le(data.len() as u32);
    buf.write_bytes(&data);
    Ok(())
}

pub fn export(tex: &Texture2D, emit_sidecar: &mut dyn FnMut(&[u8], &str) -> String) -> Result<String, XnbError> {
    let png = crate::png::png_encode(&tex.pixels, tex.width, tex.height)?;
    Ok(emit_sidecar(&png, "png"))
}

pub fn import(
    surface_format: i32,
    filename: &str,
    load_sidecar: &mut dyn FnMut(&str) -> std::io::Result<Vec<u8>>,
) -> Result<Texture2D, XnbError> {
    let bytes = load_sidecar(filename)?;
    let (pixels, width, height) = crate::png::png_decode(&bytes)?;
    Ok(Texture2D {
        surface_format,
        width,
        height,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpremultiply_matches_documented_example() {
        let mut px = [64u8, 0, 0, 128];
        unpremultiply(&mut px);
        assert_eq!(px, [128, 0, 0, 128]);
    }

    #[test]
    fn premultiply_is_unpremultiply_inverse_for_documented_example() {
        let mut px = [128u8, 0, 0, 128];
        premultiply(&mut px);
        assert_eq!(px, [64, 0, 0, 128]);
    }

    #[test]
    fn alpha_zero_and_full_are_untouched() {
        for mut px in [[10u8, 20, 30, 0], [10u8, 20, 30, 255]] {
            let before = px;
            unpremultiply(&mut px);
            assert_eq!(px, before);
            premultiply(&mut px);
            assert_eq!(px, before);
        }
    }

    #[test]
    fn round_trip_uncompressed_header() {
        let mut w = BitWriter::new();
        let tex = Texture2D {
            surface_format: 0,
            width: 1,
            height: 1,
            pixels: vec![10, 20, 30, 255],
        };
        write(&mut w, &tex).unwrap();
        let bytes = w.into_vec();
        let mut r = BitReader::new(&bytes);
        let back = read(&mut r).unwrap();
        assert_eq!(back, tex);
    }
}
