//! Sidecar-aware serialization. [`Document`] is the structured, JSON-facing
//! counterpart of [`crate::container::RawAsset`]: binary media (texture
//! pixels, sound samples, item layer pixels) is never embedded directly —
//! it is routed through the `emit_sidecar`/`load_sidecar` callbacks (§5 of
//! the container spec) and the document carries only the resulting
//! filenames plus structural metadata.

use serde::{Deserialize, Serialize};
use std::io;

use crate::container::{self, Compression, Header, RawAsset};
use crate::error::XnbError;
use crate::readers::sound::WaveFormat;
use crate::readers::{animation, item, sound, texture};
use crate::registry::{ContentKind, ContentValue, ReaderEntry};
use crate::typename::TypeName;

pub type EmitSidecar<'a> = dyn FnMut(&[u8], &str) -> String + 'a;
pub type LoadSidecar<'a> = dyn FnMut(&str) -> io::Result<Vec<u8>> + 'a;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderDoc {
    pub target_platform: char,
    pub xnb_version: u8,
    pub hidef: bool,
}

impl From<&Header> for HeaderDoc {
    fn from(h: &Header) -> Self {
        HeaderDoc {
            target_platform: h.target_platform,
            xnb_version: h.xnb_version,
            hidef: h.hidef,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReaderEntryDoc {
    pub type_name: String,
    pub version: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SfdPartDoc {
    pub part_type: i32,
    /// One sidecar filename per layer; `None` for an absent or all-transparent layer.
    pub layers: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SfdItemDoc {
    pub file_name: String,
    pub game_name: String,
    pub equipment_layer: i32,
    pub id: i32,
    pub jacket_under_belt: bool,
    pub can_equip: bool,
    pub can_script: bool,
    pub color_palette: bool,
    pub width: i32,
    pub height: i32,
    pub parts: Vec<SfdPartDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveFormatDoc {
    pub format_tag: u16,
    pub channels: u16,
    pub samples_per_sec: u32,
    pub avg_bytes_per_sec: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl From<WaveFormat> for WaveFormatDoc {
    fn from(f: WaveFormat) -> Self {
        WaveFormatDoc {
            format_tag: f.format_tag,
            channels: f.channels,
            samples_per_sec: f.samples_per_sec,
            avg_bytes_per_sec: f.avg_bytes_per_sec,
            block_align: f.block_align,
            bits_per_sample: f.bits_per_sample,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DocContent {
    Texture2D {
        surface_format: i32,
        width: u32,
        height: u32,
        sidecar: String,
    },
    SoundEffect {
        format: WaveFormatDoc,
        loop_start: i32,
        loop_length: i32,
        duration: i32,
        sidecar: String,
    },
    SfdItem(Box<SfdItemDoc>),
    SfdAnimation(animation::SfdAnimationSet),
    StringValue(String),
    Array(Vec<DocContent>),
    List(Vec<DocContent>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub header: HeaderDoc,
    pub readers: Vec<ReaderEntryDoc>,
    pub content: DocContent,
}

/// Recursively exports a [`ContentValue`] into its sidecar-aware
/// [`DocContent`] form, naming sidecars from `basename` and a running
/// sequence counter shared across every layer this call emits (matching
/// the SFDItem `{basename}_{part_type}_{sequence}.png` naming rule).
fn export_value(
    kind: &ContentKind,
    value: &ContentValue,
    basename: &str,
    emit_sidecar: &mut EmitSidecar,
) -> Result<DocContent, XnbError> {
    match (kind, value) {
        (ContentKind::Texture2D, ContentValue::Texture2D(t)) => {
            let sidecar = texture::export(t, &mut |bytes, ext| emit_sidecar(bytes, &format!("{basename}.{ext}")))?;
            Ok(DocContent::Texture2D {
                surface_format: t.surface_format,
                width: t.width,
                height: t.height,
                sidecar,
            })
        }
        (ContentKind::SoundEffect, ContentValue::SoundEffect(s)) => {
            let format = WaveFormat::parse(&s.format_header)?;
            let sidecar = sound::export(s, &mut |bytes, ext| emit_sidecar(bytes, &format!("{basename}.{ext}")))?;
            Ok(DocContent::SoundEffect {
                format: format.into(),
                loop_start: s.loop_start,
                loop_length: s.loop_length,
                duration: s.duration,
                sidecar,
            })
        }
        (ContentKind::SfdItem, ContentValue::SfdItem(i)) => {
            let layer_files = item::export(i, basename, emit_sidecar)?;
            Ok(DocContent::SfdItem(Box::new(SfdItemDoc {
                file_name: i.file_name.clone(),
                game_name: i.game_name.clone(),
                equipment_layer: i.equipment_layer,
                id: i.id,
                jacket_under_belt: i.jacket_under_belt,
                can_equip: i.can_equip,
                can_script: i.can_script,
                color_palette: i.color_palette,
                width: i.width,
                height: i.height,
                parts: i
                    .parts
                    .iter()
                    .zip(layer_files)
                    .map(|(part, layers)| SfdPartDoc {
                        part_type: part.part_type,
                        layers,
                    })
                    .collect(),
            })))
        }
        (ContentKind::SfdAnimation, ContentValue::SfdAnimation(a)) => {
            Ok(DocContent::SfdAnimation(a.clone()))
        }
        (ContentKind::StringReader, ContentValue::StringValue(s)) => {
            Ok(DocContent::StringValue(s.clone()))
        }
        (ContentKind::ArrayReader(inner), ContentValue::Array(items)) => {
            let out = items
                .iter()
                .enumerate()
                .map(|(i, v)| export_value(inner, v, &format!("{basename}_{i}"), emit_sidecar))
                .collect::<Result<_, _>>()?;
            Ok(DocContent::Array(out))
        }
        (ContentKind::ListReader(inner), ContentValue::List(items)) => {
            let out = items
                .iter()
                .enumerate()
                .map(|(i, v)| export_value(inner, v, &format!("{basename}_{i}"), emit_sidecar))
                .collect::<Result<_, _>>()?;
            Ok(DocContent::List(out))
        }
        _ => Err(XnbError::ReaderTypeMismatch {
            expected: "content value matching its reader kind",
            found: "mismatched content value during export",
        }),
    }
}

fn import_value(
    kind: &ContentKind,
    doc: &DocContent,
    load_sidecar: &mut LoadSidecar,
) -> Result<ContentValue, XnbError> {
    match (kind, doc) {
        (
            ContentKind::Texture2D,
            DocContent::Texture2D {
                surface_format,
                sidecar,
                ..
            },
        ) => Ok(ContentValue::Texture2D(texture::import(
            *surface_format,
            sidecar,
            load_sidecar,
        )?)),
        (
            ContentKind::SoundEffect,
            DocContent::SoundEffect {
                format,
                loop_start,
                loop_length,
                duration,
                sidecar,
            },
        ) => {
            let data = sound::import(sidecar, load_sidecar)?;
            let format_header = encode_wave_format(format);
            Ok(ContentValue::SoundEffect(sound::SoundEffect {
                format_header,
                data,
                loop_start: *loop_start,
                loop_length: *loop_length,
                duration: *duration,
            }))
        }
        (ContentKind::SfdItem, DocContent::SfdItem(doc_item)) => {
            let layer_files: Vec<Vec<Option<String>>> = doc_item
                .parts
                .iter()
                .map(|p| p.layers.clone())
                .collect();
            let layer_pixels = item::import(&layer_files, load_sidecar)?;
            let parts = doc_item
                .parts
                .iter()
                .zip(layer_pixels)
                .map(|(p, layers)| item::SfdPart {
                    part_type: p.part_type,
                    layers,
                })
                .collect();
            Ok(ContentValue::SfdItem(item::SfdItem {
                file_name: doc_item.file_name.clone(),
                game_name: doc_item.game_name.clone(),
                equipment_layer: doc_item.equipment_layer,
                id: doc_item.id,
                jacket_under_belt: doc_item.jacket_under_belt,
                can_equip: doc_item.can_equip,
                can_script: doc_item.can_script,
                color_palette: doc_item.color_palette,
                width: doc_item.width,
                height: doc_item.height,
                palette: Vec::new(),
                parts,
            }))
        }
        (ContentKind::SfdAnimation, DocContent::SfdAnimation(a)) => {
            Ok(ContentValue::SfdAnimation(a.clone()))
        }
        (ContentKind::StringReader, DocContent::StringValue(s)) => {
            Ok(ContentValue::StringValue(s.clone()))
        }
        (ContentKind::ArrayReader(inner), DocContent::Array(items)) => {
            let out = items
                .iter()
                .map(|v| import_value(inner, v, load_sidecar))
                .collect::<Result<_, _>>()?;
            Ok(ContentValue::Array(out))
        }
        (ContentKind::ListReader(inner), DocContent::List(items)) => {
            let out = items
                .iter()
                .map(|v| import_value(inner, v, load_sidecar))
                .collect::<Result<_, _>>()?;
            Ok(ContentValue::List(out))
        }
        _ => Err(XnbError::ReaderTypeMismatch {
            expected: "document content matching its reader kind",
            found: "mismatched document content during import",
        }),
    }
}

fn encode_wave_format(f: &WaveFormatDoc) -> Vec<u8> {
    let mut out = Vec::with_capacity(18);
    out.extend(f.format_tag.to_le_bytes());
    out.extend(f.channels.to_le_bytes());
    out.extend(f.samples_per_sec.to_le_bytes());
    out.extend(f.avg_bytes_per_sec.to_le_bytes());
    out.extend(f.block_align.to_le_bytes());
    out.extend(f.bits_per_sample.to_le_bytes());
    out.extend([0u8, 0]); // cbSize, always absent/zero per the 18-byte fixed header
    out
}

/// Unpacks raw `.xnb` bytes straight into a sidecar-aware [`Document`],
/// extracting every embedded media payload through `emit_sidecar`.
/// `basename` seeds sidecar filenames (e.g. the `.xnb` file's stem).
pub fn unpack(bytes: &[u8], basename: &str, emit_sidecar: &mut EmitSidecar) -> Result<Document, XnbError> {
    let asset = container::unpack(bytes)?;
    let kind = ContentKind::resolve(&asset.readers[0].type_name)?;
    let content = export_value(&kind, &asset.content, basename, emit_sidecar)?;
    Ok(Document {
        header: (&asset.header).into(),
        readers: asset
            .readers
            .iter()
            .map(|e| ReaderEntryDoc {
                type_name: e.type_name.to_string(),
                version: e.version,
            })
            .collect(),
        content,
    })
}

/// Packs a [`Document`] back into `.xnb` bytes, reinjecting sidecar media
/// through `load_sidecar`.
pub fn pack(doc: &Document, load_sidecar: &mut LoadSidecar) -> Result<Vec<u8>, XnbError> {
    let readers: Vec<ReaderEntry> = doc
        .readers
        .iter()
        .map(|e| ReaderEntry {
            type_name: TypeName::parse(&e.type_name),
            version: e.version,
        })
        .collect();
    if readers.is_empty() {
        return Err(XnbError::InvalidReaderIndex(1, 0));
    }
    let kind = ContentKind::resolve(&readers[0].type_name)?;
    let content = import_value(&kind, &doc.content, load_sidecar)?;

    let header = Header {
        target_platform: doc.header.target_platform,
        xnb_version: doc.header.xnb_version,
        hidef: doc.header.hidef,
        compression: Compression::None, // recomputed from target in container::pack
    };

    container::pack(&RawAsset {
        header,
        readers,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{Compression, Header};
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
    fn json_round_trip_carries_no_embedded_pixels() {
        let asset = texture_asset();
        let bytes = container::pack(&asset).unwrap();

        let mut sidecars: Vec<(String, Vec<u8>)> = Vec::new();
        let mut emit = |data: &[u8], name: &str| {
            sidecars.push((name.to_string(), data.to_vec()));
            name.to_string()
        };
        let doc = unpack(&bytes, "asset", &mut emit).unwrap();

        let json = serde_json::to_string(&doc).unwrap();
        assert!(!json.contains("10,20,30,255"), "pixel bytes leaked into JSON");
        let reparsed: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(reparsed, doc);

        let mut load = |name: &str| -> io::Result<Vec<u8>> {
            sidecars
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, d)| d.clone())
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "sidecar missing"))
        };
        let repacked = pack(&doc, &mut load).unwrap();
        let reread = container::unpack(&repacked).unwrap();
        assert_eq!(reread.content, asset.content);
    }
}
