//! Typed content readers. Each submodule owns the wire encoding for one XNB
//! content type; [`crate::registry`] ties a reader's canonical .NET type
//! name to the [`ContentKind`] dispatch tag used when walking a reader table.

pub mod animation;
pub mod item;
pub mod sound;
pub mod texture;

pub use animation::{AnimPart, Animation, Collision, Frame, SfdAnimationSet};
pub use item::{Rgba, SfdItem, SfdPart};
pub use sound::{SoundEffect, WaveFormat};
pub use texture::Texture2D;
