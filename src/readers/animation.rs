//! `SFD.Content.AnimationsContentTypeReader`: named animations, each a list
//! of frames carrying hitboxes ("collisions") and positioned parts. Parts
//! only store a 32-bit global id on disk; `local_id` and `part_type` are
//! derived and kept alongside rather than recomputed ad hoc.

use serde::{Deserialize, Serialize};

use crate::bitio::{BitReader, BitWriter};
use crate::error::XnbError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SfdAnimationSet {
    pub animations: Vec<Animation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub name: String,
    pub frames: Vec<Frame>,
    /// Derived: `name` contains the substring `"RECOIL"`.
    pub is_recoil: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    pub time: i32,
    pub collisions: Vec<Collision>,
    pub parts: Vec<AnimPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collision {
    pub id: i32,
    pub width: f32,
    pub height: f32,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimPart {
    pub id: i32,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub flip: i32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub postfix: String,
    /// Derived: `id mod 50` (Euclidean, always in `0..50`).
    pub local_id: i32,
    /// Derived: `id >= 0 ? id / 50 : -(-id / 50 + 1)` (signed floor).
    pub part_type: i32,
}

fn local_id_of(id: i32) -> i32 {
    id.rem_euclid(50)
}

fn part_type_of(id: i32) -> i32 {
    if id >= 0 {
        id / 50
    } else {
        -((-id) / 50 + 1)
    }
}

fn expect_newline(buf: &mut BitReader) -> Result<(), XnbError> {
    let c = buf.read_u8()?;
    if c != b'\n' {
        return Err(XnbError::InvalidSize("sfd animation newline terminator", c as u32));
    }
    Ok(())
}

fn read_collision(buf: &mut BitReader) -> Result<Collision, XnbError> {
    Ok(Collision {
        id: buf.read_i32le()?,
        width: buf.read_f32le()?,
        height: buf.read_f32le()?,
        x: buf.read_f32le()?,
        y: buf.read_f32le()?,
    })
}

fn write_collision(buf: &mut BitWriter, c: &Collision) {
    buf.write_i32le(c.id);
    buf.write_f32le(c.width);
    buf.write_f32le(c.height);
    buf.write_f32le(c.x);
    buf.write_f32le(c.y);
}

fn read_part(buf: &mut BitReader) -> Result<AnimPart, XnbError> {
    let id = buf.read_i32le()?;
    let x = buf.read_f32le()?;
    let y = buf.read_f32le()?;
    let rotation = buf.read_f32le()?;
    let flip = buf.read_i32le()?;
    let scale_x = buf.read_f32le()?;
    let scale_y = buf.read_f32le()?;
    let postfix = buf.read_string()?;
    Ok(AnimPart {
        id,
        x,
        y,
        rotation,
        flip,
        scale_x,
        scale_y,
        postfix,
        local_id: local_id_of(id),
        part_type: part_type_of(id),
    })
}

fn write_part(buf: &mut BitWriter, p: &AnimPart) {
    buf.write_i32le(p.id);
    buf.write_f32le(p.x);
    buf.write_f32le(p.y);
    buf.write_f32le(p.rotation);
    buf.write_i32le(p.flip);
    buf.write_f32le(p.scale_x);
    buf.write_f32le(p.scale_y);
    buf.write_string(&p.postfix);
}

pub fn read(buf: &mut BitReader) -> Result<SfdAnimationSet, XnbError> {
    let anim_count = buf.read_i32le()? as usize;
    let mut animations = Vec::with_capacity(anim_count);
    for _ in 0..anim_count {
        let name = buf.read_string()?;
        let frame_count = buf.read_i32le()? as usize;
        let mut frames = Vec::with_capacity(frame_count);
        for _ in 0..frame_count {
            let event = buf.read_string()?;
            let time = buf.read_i32le()?;

            let collision_count = buf.read_i32le()? as usize;
            let mut collisions = Vec::with_capacity(collision_count);
            for _ in 0..collision_count {
                collisions.push(read_collision(buf)?);
            }

            let part_count = buf.read_i32le()? as usize;
            let mut parts = Vec::with_capacity(part_count);
            for _ in 0..part_count {
                parts.push(read_part(buf)?);
            }

            expect_newline(buf)?;
            frames.push(Frame {
                event,
                time,
                collisions,
                parts,
            });
        }
        expect_newline(buf)?;

        let is_recoil = name.contains("RECOIL");
        animations.push(Animation {
            name,
            frames,
            is_recoil,
        });
    }
    Ok(SfdAnimationSet { animations })
}

pub fn write(buf: &mut BitWriter, set: &SfdAnimationSet) -> Result<(), XnbError> {
    buf.write_i32le(set.animations.len() as i32);
    for anim in &set.animations {
        buf.write_string(&anim.name);
        buf.write_i32le(anim.frames.len() as i32);
        for frame in &anim.frames {
            buf.write_string(&frame.event);
            buf.write_i32le(frame.time);

            buf.write_i32le(frame.collisions.len() as i32);
            for c in &frame.collisions {
                write_collision(buf, c);
            }

            buf.write_i32le(frame.parts.len() as i32);
            for p in &frame.parts {
                write_part(buf, p);
            }

            buf.write_u8(b'\n');
        }
        buf.write_u8(b'\n');
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_id_and_type_match_documented_formula() {
        assert_eq!(local_id_of(42), 42);
        assert_eq!(part_type_of(42), 0);
        assert_eq!(local_id_of(150), 0);
        assert_eq!(part_type_of(150), 3);
        assert_eq!(part_type_of(-1), -1);
        assert_eq!(part_type_of(-50), -2);
        assert_eq!(part_type_of(-51), -2);
    }

    #[test]
    fn is_recoil_detects_substring() {
        let mut w = BitWriter::new();
        let set = SfdAnimationSet {
            animations: vec![Animation {
                name: "WEAPON_RECOIL_01".into(),
                frames: vec![],
                is_recoil: true,
            }],
        };
        write(&mut w, &set).unwrap();
        let bytes = w.into_vec();
        let mut r = BitReader::new(&bytes);
        let back = read(&mut r).unwrap();
        assert!(back.animations[0].is_recoil);
    }

    #[test]
    fn round_trip_frame_with_collisions_and_parts() {
        let mut w = BitWriter::new();
        let frame = Frame {
            event: "hit".into(),
            time: 12,
            collisions: vec![Collision {
                id: 1,
                width: 4.0,
                height: 5.0,
                x: 1.0,
                y: 2.0,
            }],
            parts: vec![AnimPart {
                id: 101,
                x: 0.0,
                y: 0.0,
                rotation: 0.0,
                flip: 0,
                scale_x: 1.0,
                scale_y: 1.0,
                postfix: "_a".into(),
                local_id: local_id_of(101),
                part_type: part_type_of(101),
            }],
        };
        let set = SfdAnimationSet {
            animations: vec![Animation {
                name: "IDLE".into(),
                frames: vec![frame.clone()],
                is_recoil: false,
            }],
        };
        write(&mut w, &set).unwrap();
        let bytes = w.into_vec();
        let mut r = BitReader::new(&bytes);
        let back = read(&mut r).unwrap();
        assert_eq!(back.animations[0].frames[0], frame);
    }
}
