//! `SoundEffectReader`: raw WAVEFORMATEX-described PCM, exported as a
//! synthesized RIFF/WAVE sidecar.

use crate::bitio::{BitReader, BitWriter};
use crate::error::XnbError;

#[derive(Debug, Clone, PartialEq)]
pub struct SoundEffect {
    /// The 18-byte WAVEFORMATEX header, kept verbatim.
    pub format_header: Vec<u8>,
    pub data: Vec<u8>,
    pub loop_start: i32,
    pub loop_length: i32,
    pub duration: i32,
}

/// The fixed 18-byte WAVEFORMATEX prefix, parsed out for the structured
/// document and for synthesizing the RIFF/WAVE sidecar.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveFormat {
    pub format_tag: u16,
    pub channels: u16,
    pub samples_per_sec: u32,
    pub avg_bytes_per_sec: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl WaveFormat {
    pub fn parse(header: &[u8]) -> Result<Self, XnbError> {
        if header.len() < 16 {
            return Err(XnbError::Truncated);
        }
        Ok(Self {
            format_tag: u16::from_le_bytes([header[0], header[1]]),
            channels: u16::from_le_bytes([header[2], header[3]]),
            samples_per_sec: u32::from_le_bytes([header[4], header[5], header[6], header[7]]),
            avg_bytes_per_sec: u32::from_le_bytes([header[8], header[9], header[10], header[11]]),
            block_align: u16::from_le_bytes([header[12], header[13]]),
            bits_per_sample: u16::from_le_bytes([header[14], header[15]]),
        })
    }
}

pub fn read(buf: &mut BitReader) -> Result<SoundEffect, XnbError> {
    let format_size = buf.read_u32le()?;
    if format_size != 18 {
        return Err(XnbError::InvalidSize("format_size", format_size));
    }
    let format_header = buf.read_bytes(format_size as usize)?;
    let data_size = buf.read_u32le()? as usize;
    let data = buf.read_bytes(data_size)?;
    let loop_start = buf.read_i32le()?;
    let loop_length = buf.read_i32le()?;
    let duration = buf.read_i32le()?;
    Ok(SoundEffect {
        format_header,
        data,
        loop_start,
        loop_length,
        duration,
    })
}

pub fn write(buf: &mut BitWriter, s: &SoundEffect) -> Result<(), XnbError> {
    if s.format_header.len() != 18 {
        return Err(XnbError::InvalidSize(
            "format_header",
            s.format_header.len() as u32,
        ));
    }
    buf.write_u32le(18);
    buf.write_bytes(&s.format_header);
    buf.write_u32le(s.data.len() as u32);
    buf.write_bytes(&s.data);
    buf.write_i32le(s.loop_start);
    buf.write_i32le(s.loop_length);
    buf.write_i32le(s.duration);
    Ok(())
}

/// WAVEFORMATEX format tags this crate knows how to wrap in a plain 16-byte
/// `fmt ` chunk without an extension block.
const SUPPORTED_FORMAT_TAGS: &[u16] = &[1 /* PCM */, 3 /* IEEE float */];

fn to_riff_wave(s: &SoundEffect) -> Result<Vec<u8>, XnbError> {
    let fmt = WaveFormat::parse(&s.format_header)?;
    if !SUPPORTED_FORMAT_TAGS.contains(&fmt.format_tag) {
        return Err(XnbError::UnsupportedAudioFormat(fmt.format_tag));
    }
    let mut out = BitWriter::new();
    out.write_chars("RIFF");
    let riff_size_pos = out.position();
    out.write_u32le(0);
    out.write_chars("WAVE");
    out.write_chars("fmt ");
    out.write_u32le(16);
    out.write_u16le(fmt.format_tag);
    out.write_u16le(fmt.channels);
    out.write_u32le(fmt.samples_per_sec);
    out.write_u32le(fmt.avg_bytes_per_sec);
    out.write_u16le(fmt.block_align);
    out.write_u16le(fmt.bits_per_sample);
    out.write_chars("data");
    out.write_u32le(s.data.len() as u32);
    out.write_bytes(&s.data);

    let total = out.position();
    out.patch_u32_le(riff_size_pos, (total - 8) as u32);
    Ok(out.into_vec())
}

pub fn export(
    s: &SoundEffect,
    emit_sidecar: &mut dyn FnMut(&[u8], &str) -> String,
) -> Result<String, XnbError> {
    let wav = to_riff_wave(s)?;
    Ok(emit_sidecar(&wav, "wav"))
}

/// Reads the `data` chunk back out of a RIFF/WAVE sidecar. The other
/// `SoundEffect` fields are carried directly in the structured document.
pub fn import(
    filename: &str,
    load_sidecar: &mut dyn FnMut(&str) -> std::io::Result<Vec<u8>>,
) -> Result<Vec<u8>, XnbError> {
    let bytes = load_sidecar(filename)?;
    let mut r = BitReader::new(&bytes);
    if r.read_chars(4)? != "RIFF" {
        return Err(XnbError::Truncated);
    }
    r.read_u32le()?;
    if r.read_chars(4)? != "WAVE" {
        return Err(XnbError::Truncated);
    }
    loop {
        let id = r.read_chars(4)?;
        let size = r.read_u32le()? as usize;
        if id == "data" {
            return r.read_bytes(size);
        }
        let next = r.position() + size + (size % 2);
        r.seek(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_format() -> Vec<u8> {
        let mut w = BitWriter::new();
        w.write_u16le(1); // PCM
        w.write_u16le(1); // mono
        w.write_u32le(44100);
        w.write_u32le(88200);
        w.write_u16le(2);
        w.write_u16le(16);
        w.into_vec()
    }

    #[test]
    fn round_trip_header_fields() {
        let mut w = BitWriter::new();
        let s = SoundEffect {
            format_header: sample_format(),
            data: vec![1, 2, 3, 4],
            loop_start: 0,
            loop_length: 0,
            duration: 100,
        };
        write(&mut w, &s).unwrap();
        let bytes = w.into_vec();
        let mut r = BitReader::new(&bytes);
        assert_eq!(read(&mut r).unwrap(), s);
    }

    #[test]
    fn riff_synthesis_round_trips_data() {
        let s = SoundEffect {
            format_header: sample_format(),
            data: vec![5, 6, 7, 8, 9],
            loop_start: 0,
            loop_length: 0,
            duration: 1,
        };
        let mut captured = Vec::new();
        let mut emit = |bytes: &[u8], ext: &str| {
            captured = bytes.to_vec();
            format!("sound.{ext}")
        };
        let name = export(&s, &mut emit).unwrap();
        assert_eq!(name, "sound.wav");

        let mut load = |_: &str| -> std::io::Result<Vec<u8>> { Ok(captured.clone()) };
        let data_back = import("sound.wav", &mut load).unwrap();
        assert_eq!(data_back, s.data);
    }
}
