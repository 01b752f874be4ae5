//! Top-level XNB container: header, compression framing, reader table,
//! shared-resource count, and root-payload dispatch. Produces and consumes a
//! [`RawAsset`] — the undecorated in-memory tree with no sidecar awareness;
//! [`crate::document`] layers sidecar extraction on top.

use crate::bitio::{BitReader, BitWriter};
use crate::error::XnbError;
use crate::lzx::LzxDecoder;
use crate::registry::{read_value, write_value, ContentKind, ContentValue, ReaderEntry};
use crate::typename::TypeName;

const MAGIC: &[u8; 3] = b"XNB";
const FLAG_HIDEF: u8 = 0x01;
const FLAG_LZ4: u8 = 0x40;
const FLAG_LZX: u8 = 0x80;

/// LZX windows scale with target platform in the real XNA toolchain; the
/// container only ever needs to decode, so a single large window
/// comfortably covers every payload this crate encounters.
const LZX_WINDOW_BITS: u8 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Lzx,
    Lz4,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub target_platform: char,
    pub xnb_version: u8,
    pub hidef: bool,
    pub compression: Compression,
}

/// The undecorated contents of an XNB file: header, reader table, and the
/// root payload tree with no sidecar indirection.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAsset {
    pub header: Header,
    pub readers: Vec<ReaderEntry>,
    pub content: ContentValue,
}

const KNOWN_TARGETS: &[char] = &['w', 'm', 'x', 'a', 'i'];
const KNOWN_VERSIONS: &[u8] = &[3, 4, 5];

/// Desktop targets (`w`/`x`/`m`) write uncompressed; mobile targets (`a`
/// Android, `i` iOS) write LZ4. There is no LZX encoder in this crate (see
/// the Non-goals): `Compression::Lzx` never comes out of this function.
pub fn compression_for_target(target: char) -> Compression {
    match target {
        'a' | 'i' => Compression::Lz4,
        _ => Compression::None,
    }
}

fn flags_byte(header: &Header) -> u8 {
    let mask = match header.compression {
        Compression::Lzx => FLAG_LZX,
        Compression::Lz4 => FLAG_LZ4,
        Compression::None => 0,
    };
    // Resolved open question: the flags byte is `(hidef as u8) | mask`, not
    // an ambiguous `hidef as u8 | mask` parse — Rust's explicit `as u8` cast
    // already forces this reading, so the source's operator-precedence bug
    // cannot reproduce here.
    (header.hidef as u8) | mask
}

/// Parses the 14-byte prologue (or 10-byte prologue for an uncompressed
/// file) and returns the header plus the still-possibly-compressed payload
/// bytes that follow it.
fn read_header(r: &mut BitReader) -> Result<Header, XnbError> {
    let magic = r.read_bytes(3)?;
    if magic != MAGIC {
        return Err(XnbError::BadMagic);
    }

    let target_platform = r.read_u8()? as char;
    if !KNOWN_TARGETS.contains(&target_platform) {
        log::warn!("unknown XNB target platform byte {target_platform:?}");
    }

    let xnb_version = r.read_u8()?;
    if !KNOWN_VERSIONS.contains(&xnb_version) {
        log::warn!("unknown XNB format version {xnb_version}");
    }

    let flags = r.read_u8()?;
    let hidef = flags & FLAG_HIDEF != 0;
    let lz4 = flags & FLAG_LZ4 != 0;
    let lzx = flags & FLAG_LZX != 0;
    let compression = if lzx {
        Compression::Lzx
    } else if lz4 {
        Compression::Lz4
    } else {
        Compression::None
    };

    Ok(Header {
        target_platform,
        xnb_version,
        hidef,
        compression,
    })
}

/// Decompresses (or passes through) the bytes following the 14-byte
/// prologue into a fresh owned buffer ready for reader-table parsing.
fn decompress_body(r: &mut BitReader, compression: Compression, full_bytes: &[u8]) -> Result<Vec<u8>, XnbError> {
    match compression {
        Compression::None => Ok(full_bytes[r.position()..].to_vec()),
        Compression::Lzx => {
            let decompressed_size = r.read_u32le()? as usize;
            let compressed = &full_bytes[r.position()..];
            let mut decoder = LzxDecoder::new(LZX_WINDOW_BITS)?;
            Ok(decoder.decompress_stream(compressed, decompressed_size)?)
        }
        Compression::Lz4 => {
            let decompressed_size = r.read_u32le()? as usize;
            let compressed = &full_bytes[r.position()..];
            crate::lz4::decode_block(compressed, decompressed_size)
        }
    }
}

/// Unpacks a raw `.xnb` byte buffer into its header, reader table, and root
/// payload value.
pub fn unpack(bytes: &[u8]) -> Result<RawAsset, XnbError> {
    let mut r = BitReader::new(bytes);
    let header = read_header(&mut r)?;

    let file_size = {
        // file_size sits right after the flags byte, before any
        // compression-specific fields; read it positionally so both
        // branches below see the cursor just past it.
        r.read_u32le()?
    };
    if file_size as usize != bytes.len() {
        return Err(XnbError::Truncated);
    }

    let body = decompress_body(&mut r, header.compression, bytes)?;
    let mut pr = BitReader::new(&body);

    let reader_count = pr.read_varint()? as usize;
    let mut readers = Vec::with_capacity(reader_count);
    for _ in 0..reader_count {
        let name = pr.read_string()?;
        let version = pr.read_i32le()?;
        readers.push(ReaderEntry {
            type_name: TypeName::parse(&name),
            version,
        });
    }
    log::debug!("XNB reader table has {} entries", readers.len());

    let shared_count = pr.read_varint()?;
    if shared_count != 0 {
        return Err(XnbError::UnsupportedSharedResources(shared_count));
    }

    let kinds: Vec<ContentKind> = readers
        .iter()
        .map(|e| ContentKind::resolve(&e.type_name))
        .collect::<Result<_, _>>()?;

    let root_index = pr.read_varint()? as usize;
    if root_index == 0 || root_index > kinds.len() {
        return Err(XnbError::InvalidReaderIndex(root_index as u32, kinds.len()));
    }
    log::debug!("dispatching root payload to reader #{root_index}");
    let content = read_value(&kinds[root_index - 1], &mut pr)?;

    Ok(RawAsset {
        header,
        readers,
        content,
    })
}

/// Packs a [`RawAsset`] into `.xnb` bytes. Always writes reader index `1`
/// for the root payload, since this crate only ever has a single top-level
/// content value per file.
pub fn pack(asset: &RawAsset) -> Result<Vec<u8>, XnbError> {
    if asset.readers.is_empty() {
        return Err(XnbError::InvalidReaderIndex(1, 0));
    }

    let mut body = BitWriter::new();
    body.write_varint(asset.readers.len() as u32);
    for e in &asset.readers {
        body.write_string(&e.type_name.to_string());
        body.write_i32le(e.version);
    }
    body.write_varint(0); // shared resources, always zero (Non-goal)
    body.write_varint(1); // root reader index, always 1

    let root_kind = ContentKind::resolve(&asset.readers[0].type_name)?;
    write_value(&root_kind, &mut body, &asset.content)?;
    body.trim();
    let body_bytes = body.into_vec();

    let compression = compression_for_target(asset.header.target_platform);
    let header = Header {
        compression,
        ..asset.header.clone()
    };

    let mut out = BitWriter::new();
    out.write_bytes(MAGIC);
    out.write_u8(header.target_platform as u8);
    out.write_u8(header.xnb_version);
    out.write_u8(flags_byte(&header));
    out.write_u32le(0); // file_size placeholder, back-patched below

    match compression {
        Compression::None => {
            // Per the resolved open question, the uncompressed desktop path
            // omits the decompressed-size field entirely.
            out.write_bytes(&body_bytes);
        }
        Compression::Lz4 => {
            out.write_u32le(body_bytes.len() as u32);
            out.write_bytes(&crate::lz4::encode_block(&body_bytes));
        }
        Compression::Lzx => unreachable!("no LZX encoder; compression_for_target never returns Lzx"),
    }

    let total_len = out.position() as u32;
    out.patch_u32_le(6, total_len);
    out.trim();
    Ok(out.into_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::texture::Texture2D;

    fn texture_asset() -> RawAsset {
        RawAsset {
            header: Header {
                target_platform: 'w',
                xnb_version: 5,
                hidef: false,
                compression: Compression::None,
            },
            readers: vec![ReaderEntry {
                type_name: TypeName::parse(crate::registry::TEXTURE2D_READER),
                version: 0,
            }],
            content: ContentValue::Texture2D(Texture2D {
                surface_format: 0,
                width: 1,
                height: 1,
                pixels: vec![10, 20, 30, 255],
            }),
        }
    }

    #[test]
    fn unknown_reader_before_payload() {
        let mut bytes = Vec::new();
        bytes.extend(b"XNBw");
        bytes.push(0x05);
        bytes.push(0x00);
        bytes.extend(0x17u32.to_le_bytes());
        bytes.push(0x01); // one reader
        bytes.push(0x05); // 5-byte name
        bytes.extend(b"BLANK");
        bytes.extend([0u8, 0, 0, 0, 0, 0]); // version + shared resources + padding, per the fixed fixture
        assert_eq!(bytes.len(), 23);

        let err = unpack(&bytes).unwrap_err();
        assert!(matches!(err, XnbError::UnknownReader(ref s) if s == "BLANK"));
    }

    #[test]
    fn minimal_texture_round_trip() {
        let asset = texture_asset();
        let bytes = pack(&asset).unwrap();
        let back = unpack(&bytes).unwrap();
        assert_eq!(back, asset);
    }

    #[test]
    fn alpha_unpremultiply_round_trips() {
        let mut asset = texture_asset();
        // On-disk premultiplied (64, 0, 0, 128); in-memory un-premultiplied
        // form is (128, 0, 0, 128).
        asset.content = ContentValue::Texture2D(Texture2D {
            surface_format: 0,
            width: 1,
            height: 1,
            pixels: vec![128, 0, 0, 128],
        });
        let bytes = pack(&asset).unwrap();
        let back = unpack(&bytes).unwrap();
        assert_eq!(back.content, asset.content);
    }

    #[test]
    fn reader_index_out_of_bounds() {
        let mut bytes = Vec::new();
        bytes.extend(b"XNBw");
        bytes.push(0x05);
        bytes.push(0x00);
        let mut body = BitWriter::new();
        body.write_varint(4);
        for _ in 0..4 {
            body.write_string(crate::registry::TEXTURE2D_READER);
            body.write_i32le(0);
        }
        body.write_varint(0);
        body.write_varint(255);
        let body_bytes = body.into_vec();
        // Uncompressed (flags = 0x00) uses the 10-byte prologue, not the
        // 14-byte compressed one: magic(3) + target(1) + version(1) +
        // flags(1) + file_size(4).
        bytes.extend((10u32 + body_bytes.len() as u32).to_le_bytes());
        bytes.extend(body_bytes);

        let err = unpack(&bytes).unwrap_err();
        assert!(matches!(err, XnbError::InvalidReaderIndex(255, 4)));
    }
}
