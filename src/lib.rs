//! A reader/writer for the XNB binary container used by the XNA Framework
//! content pipeline.
//!
//! An `.xnb` file is a small header, an optional compressed body (LZX or
//! LZ4 depending on target platform), a table of content-reader type names,
//! and a tree of values dispatched through that table. This crate decodes
//! that tree into a closed set of typed content readers ([`Texture2D`],
//! [`SoundEffect`], [`SfdItem`], [`SfdAnimationSet`]) and can re-encode them,
//! uncompressed or LZ4-compressed. There is no LZX encoder: compressed
//! input can be read, but this crate never produces LZX output (see
//! [`container`]'s module docs).
//!
//! Two entry points cover the two things callers want to do with an XNB
//! file:
//!
//! - [`container::unpack`] / [`container::pack`] move between raw bytes and
//!   a [`container::RawAsset`], an in-memory tree with embedded pixel/audio
//!   data and no filesystem awareness.
//! - [`document::unpack`] / [`document::pack`] wrap those functions with a
//!   sidecar layer: large binary payloads (PNGs, WAVs) are extracted to
//!   caller-supplied sinks and the remaining metadata is carried as a
//!   [`document::Document`] that serializes cleanly to JSON.
//!
//! ```no_run
//! # fn read_file(_: &str) -> Vec<u8> { unimplemented!() }
//! let bytes = read_file("sprite.xnb");
//! let asset = xnb::container::unpack(&bytes).unwrap();
//! println!("{:?}", asset.header);
//! ```

pub mod bitio;
pub mod container;
pub mod document;
pub mod dxt;
pub mod error;
pub mod lz4;
pub mod lzx;
pub mod png;
pub mod readers;
pub mod registry;
pub mod typename;

pub use container::{pack, unpack, Compression, Header, RawAsset};
pub use error::XnbError;
pub use lzx::{LzxDecoder, LzxError};
pub use readers::{Animation, SfdAnimationSet, SfdItem, SfdPart, SoundEffect, Texture2D, WaveFormat};
pub use registry::{ContentKind, ContentValue, ReaderEntry};
pub use typename::TypeName;
