//! Ordered table of content readers present in an XNB file. Resolves a
//! reader's assembly-qualified type name to a closed [`ContentKind`] tag and
//! dispatches reads/writes to the matching reader module, generalizing the
//! source's runtime subtype dispatch into a single match (see the "enum of
//! readers" redesign flag).

use crate::bitio::{BitReader, BitWriter};
use crate::error::XnbError;
use crate::readers::{animation, item, sound, texture};
use crate::typename::TypeName;

pub const TEXTURE2D_READER: &str = "Microsoft.Xna.Framework.Content.Texture2DReader";
pub const SOUND_EFFECT_READER: &str = "Microsoft.Xna.Framework.Content.SoundEffectReader";
pub const SFD_ITEM_READER: &str = "SFD.Content.ItemsContentTypeReader";
pub const SFD_ANIMATION_READER: &str = "SFD.Content.AnimationsContentTypeReader";
pub const STRING_READER: &str = "Microsoft.Xna.Framework.Content.StringReader";
/// Type name as it appears after [`TypeName`] parsing strips the backtick
/// generic-arity marker; the on-disk name also carries `` `1[[...]] ``,
/// reconstructed by [`ContentKind::type_name`] and [`TypeName`]'s `Display`.
pub const ARRAY_READER: &str = "Microsoft.Xna.Framework.Content.ArrayReader";
pub const LIST_READER: &str = "Microsoft.Xna.Framework.Content.ListReader";

/// A single entry from the XNB reader table: the parsed type name plus the
/// reader's declared version. `readers[0]` always names the root payload's
/// reader.
#[derive(Debug, Clone)]
pub struct ReaderEntry {
    pub type_name: TypeName,
    pub version: i32,
}

/// Closed tagged variant standing in for the source's heterogeneous reader
/// list. Generic wrapper readers carry their resolved element kind rather
/// than a registry index, since XNA content readers resolve their generic
/// parameter once at table-parse time, not per element.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentKind {
    Texture2D,
    SoundEffect,
    SfdItem,
    SfdAnimation,
    StringReader,
    ArrayReader(Box<ContentKind>),
    ListReader(Box<ContentKind>),
}

impl ContentKind {
    /// Resolves a parsed [`TypeName`] to the reader it names. Fails with
    /// [`XnbError::UnknownReader`] for anything not in the fixed table below.
    pub fn resolve(type_name: &TypeName) -> Result<Self, XnbError> {
        match type_name.name.as_str() {
            TEXTURE2D_READER => Ok(ContentKind::Texture2D),
            SOUND_EFFECT_READER => Ok(ContentKind::SoundEffect),
            SFD_ITEM_READER => Ok(ContentKind::SfdItem),
            SFD_ANIMATION_READER => Ok(ContentKind::SfdAnimation),
            STRING_READER => Ok(ContentKind::StringReader),
            ARRAY_READER => {
                let inner = type_name
                    .subtypes
                    .first()
                    .ok_or_else(|| XnbError::UnknownReader(type_name.to_string()))?;
                Ok(ContentKind::ArrayReader(Box::new(Self::resolve(inner)?)))
            }
            LIST_READER => {
                let inner = type_name
                    .subtypes
                    .first()
                    .ok_or_else(|| XnbError::UnknownReader(type_name.to_string()))?;
                Ok(ContentKind::ListReader(Box::new(Self::resolve(inner)?)))
            }
            other => Err(XnbError::UnknownReader(other.to_string())),
        }
    }

    /// The canonical .NET type name this kind round-trips to on write.
    pub fn type_name(&self) -> TypeName {
        match self {
            ContentKind::Texture2D => TypeName::parse(TEXTURE2D_READER),
            ContentKind::SoundEffect => TypeName::parse(SOUND_EFFECT_READER),
            ContentKind::SfdItem => TypeName::parse(SFD_ITEM_READER),
            ContentKind::SfdAnimation => TypeName::parse(SFD_ANIMATION_READER),
            ContentKind::StringReader => TypeName::parse(STRING_READER),
            ContentKind::ArrayReader(inner) => TypeName {
                name: ARRAY_READER.to_string(),
                subtypes: vec![inner.type_name()],
                is_array: false,
            },
            ContentKind::ListReader(inner) => TypeName {
                name: LIST_READER.to_string(),
                subtypes: vec![inner.type_name()],
                is_array: false,
            },
        }
    }

    /// None of the four leaf readers, nor the generic wrappers over them,
    /// need a per-element reader-index prefix: every type in this crate's
    /// closed reader set is non-polymorphic (sealed) content.
    pub fn is_polymorphic(&self) -> bool {
        false
    }
}

/// The in-memory value produced by reading a payload of a given
/// [`ContentKind`]. Mirrors the kind's shape one-to-one.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentValue {
    Texture2D(texture::Texture2D),
    SoundEffect(sound::SoundEffect),
    SfdItem(item::SfdItem),
    SfdAnimation(animation::SfdAnimationSet),
    StringValue(String),
    Array(Vec<ContentValue>),
    List(Vec<ContentValue>),
}

/// Reads one payload of the given kind, recursing into `ArrayReader`'s and
/// `ListReader`'s element reader as needed.
pub fn read_value(kind: &ContentKind, buf: &mut BitReader) -> Result<ContentValue, XnbError> {
    log::trace!("reading content value of kind {kind:?}");
    match kind {
        ContentKind::Texture2D => Ok(ContentValue::Texture2D(texture::read(buf)?)),
        ContentKind::SoundEffect => Ok(ContentValue::SoundEffect(sound::read(buf)?)),
        ContentKind::SfdItem => Ok(ContentValue::SfdItem(item::read(buf)?)),
        ContentKind::SfdAnimation => Ok(ContentValue::SfdAnimation(animation::read(buf)?)),
        ContentKind::StringReader => Ok(ContentValue::StringValue(buf.read_string()?)),
        ContentKind::ArrayReader(inner) => {
            let count = buf.read_i32le()? as usize;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(read_value(inner, buf)?);
            }
            Ok(ContentValue::Array(items))
        }
        ContentKind::ListReader(inner) => {
            let count = buf.read_i32le()? as usize;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(read_value(inner, buf)?);
            }
            Ok(ContentValue::List(items))
        }
    }
}

/// Writes one payload of the given kind. The value's shape must already
/// match `kind` (callers construct both from the same source).
pub fn write_value(
    kind: &ContentKind,
    buf: &mut BitWriter,
    value: &ContentValue,
) -> Result<(), XnbError> {
    match (kind, value) {
        (ContentKind::Texture2D, ContentValue::Texture2D(t)) => texture::write(buf, t),
        (ContentKind::SoundEffect, ContentValue::SoundEffect(s)) => sound::write(buf, s),
        (ContentKind::SfdItem, ContentValue::SfdItem(i)) => item::write(buf, i),
        (ContentKind::SfdAnimation, ContentValue::SfdAnimation(a)) => animation::write(buf, a),
        (ContentKind::StringReader, ContentValue::StringValue(s)) => {
            buf.write_string(s);
            Ok(())
        }
        (ContentKind::ArrayReader(inner), ContentValue::Array(items))
        | (ContentKind::ListReader(inner), ContentValue::List(items)) => {
            buf.write_i32le(items.len() as i32);
            for item in items {
                write_value(inner, buf, item)?;
            }
            Ok(())
        }
        _ => Err(XnbError::ReaderTypeMismatch {
            expected: "content value matching its reader kind",
            found: "mismatched content value",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_all_four_leaf_readers() {
        for name in [
            TEXTURE2D_READER,
            SOUND_EFFECT_READER,
            SFD_ITEM_READER,
            SFD_ANIMATION_READER,
        ] {
            let tn = TypeName::parse(name);
            assert!(ContentKind::resolve(&tn).is_ok(), "failed to resolve {name}");
        }
    }

    #[test]
    fn unknown_reader_errors() {
        let tn = TypeName::parse("BLANK");
        assert!(matches!(
            ContentKind::resolve(&tn),
            Err(XnbError::UnknownReader(ref s)) if s == "BLANK"
        ));
    }

    #[test]
    fn resolves_generic_list_of_texture() {
        let tn = TypeName::parse(&format!("{LIST_READER}`1[[{TEXTURE2D_READER}]]"));
        let kind = ContentKind::resolve(&tn).unwrap();
        assert_eq!(kind, ContentKind::ListReader(Box::new(ContentKind::Texture2D)));
    }

    #[test]
    fn type_name_round_trips_through_display() {
        let kind = ContentKind::ListReader(Box::new(ContentKind::Texture2D));
        let tn = kind.type_name();
        assert_eq!(
            tn.to_string(),
            format!("{LIST_READER}`1[[{TEXTURE2D_READER}]]")
        );
    }
}
