//! Animations, state machines and keyframes.
//!
//! Keyframes are not stored per animation. Each animation points into one
//! shared frame buffer, and the size of a keyframe depends on how many
//! joints the owning moveable has, so keyframes can only be decoded once
//! animations, frames and moveables have all been read.

use serde::{Deserialize, Serialize};
use trlevel_math::{units, BoundingBox, Fixed16, Vec3};

use super::geometry::read_vertex_i16;
use super::mesh::Moveable;
use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};

/// One keyframe: bounds, root offset and per-joint rotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Bounding box of the posed model
    pub bounds: BoundingBox,
    /// Root joint offset
    pub offset: Vec3,
    /// Joint rotations in degrees, applied Y, X, Z
    pub rotations: Vec<Vec3>,
}

/// Record layout of animations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationLayout {
    /// 32 bytes, TR1-TR3
    Classic,
    /// 40 bytes, adds lateral speed and acceleration (TR4+)
    Extended,
}

/// An animation clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    /// Byte offset of the first keyframe in the frame buffer
    pub frame_offset: u32,
    /// Game frames per stored keyframe
    pub frame_rate: u8,
    /// Stored keyframe size in 16-bit words
    pub frame_size: u8,
    /// State this animation plays in
    pub state_id: u16,
    /// Forward speed
    pub speed: Fixed16,
    /// Forward acceleration
    pub accel: Fixed16,
    /// Sideways speed; TR4+
    pub lateral_speed: Option<Fixed16>,
    /// Sideways acceleration; TR4+
    pub lateral_accel: Option<Fixed16>,
    /// First game frame
    pub frame_start: u16,
    /// Last game frame
    pub frame_end: u16,
    /// Animation that follows this one
    pub next_animation: u16,
    /// Frame of `next_animation` to start at
    pub next_frame: u16,
    /// Number of state changes
    pub num_state_changes: u16,
    /// First state change
    pub state_change_offset: u16,
    /// Number of animation commands
    pub num_anim_commands: u16,
    /// First animation command word
    pub anim_command: u16,
    /// Decoded keyframes; empty when no moveable owns this animation
    pub keyframes: Vec<Keyframe>,
}

impl Animation {
    /// Number of keyframes stored for the frame range.
    #[must_use]
    pub fn keyframe_count(&self) -> usize {
        if self.frame_end < self.frame_start {
            return 0;
        }
        let rate = usize::from(self.frame_rate.max(1));
        usize::from(self.frame_end - self.frame_start) / rate + 1
    }
}

/// Decodes one animation header; keyframes are attached later.
pub fn read_animation(cursor: &mut Cursor<'_>, layout: AnimationLayout) -> DecodeResult<Animation> {
    let frame_offset = cursor.read_u32()?;
    let frame_rate = cursor.read_u8()?;
    let frame_size = cursor.read_u8()?;
    let state_id = cursor.read_u16()?;
    let speed = Fixed16(cursor.read_i32()?);
    let accel = Fixed16(cursor.read_i32()?);
    let (lateral_speed, lateral_accel) = match layout {
        AnimationLayout::Classic => (None, None),
        AnimationLayout::Extended => (Some(Fixed16(cursor.read_i32()?)), Some(Fixed16(cursor.read_i32()?))),
    };
    Ok(Animation {
        frame_offset,
        frame_rate,
        frame_size,
        state_id,
        speed,
        accel,
        lateral_speed,
        lateral_accel,
        frame_start: cursor.read_u16()?,
        frame_end: cursor.read_u16()?,
        next_animation: cursor.read_u16()?,
        next_frame: cursor.read_u16()?,
        num_state_changes: cursor.read_u16()?,
        state_change_offset: cursor.read_u16()?,
        num_anim_commands: cursor.read_u16()?,
        anim_command: cursor.read_u16()?,
        keyframes: Vec::new(),
    })
}

/// A transition out of an animation when the target state is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateChange {
    /// Requested state
    pub state_id: u16,
    /// Number of dispatch ranges
    pub num_dispatches: u16,
    /// First dispatch
    pub dispatch_offset: u16,
}

/// Decodes one state change.
pub fn read_state_change(cursor: &mut Cursor<'_>) -> DecodeResult<StateChange> {
    Ok(StateChange {
        state_id: cursor.read_u16()?,
        num_dispatches: cursor.read_u16()?,
        dispatch_offset: cursor.read_u16()?,
    })
}

/// A frame range in which a state change may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnimDispatch {
    /// First frame of the window
    pub low: u16,
    /// Last frame of the window
    pub high: u16,
    /// Animation to switch to
    pub next_animation: u16,
    /// Frame to start it at
    pub next_frame: u16,
}

/// Decodes one dispatch.
pub fn read_anim_dispatch(cursor: &mut Cursor<'_>) -> DecodeResult<AnimDispatch> {
    Ok(AnimDispatch {
        low: cursor.read_u16()?,
        high: cursor.read_u16()?,
        next_animation: cursor.read_u16()?,
        next_frame: cursor.read_u16()?,
    })
}

/// Keyframe rotation encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLayout {
    /// Joint count word, then two words per joint with the low word first
    Tr1,
    /// One word for single-axis rotations, two for all three axes
    Packed {
        /// Units per turn of a single-axis rotation
        single_axis_units: u16,
    },
}

fn three_axis(high: u16, low: u16) -> Vec3 {
    let units_per_turn = units::ROTATION_UNITS_CLASSIC;
    let x = (high & 0x3FF0) >> 4;
    let y = ((high & 0x000F) << 6) | ((low & 0xFC00) >> 10);
    let z = low & 0x03FF;
    Vec3::new(
        units::rotation_to_degrees(x, units_per_turn),
        units::rotation_to_degrees(y, units_per_turn),
        units::rotation_to_degrees(z, units_per_turn),
    )
}

/// Decodes one keyframe of a model with `joints` joints.
pub fn read_keyframe(cursor: &mut Cursor<'_>, joints: usize, layout: FrameLayout) -> DecodeResult<Keyframe> {
    let low = read_vertex_i16(cursor)?;
    let high = read_vertex_i16(cursor)?;
    let bounds = BoundingBox::new(low, high);
    let offset = read_vertex_i16(cursor)?;

    let rotations = match layout {
        FrameLayout::Tr1 => {
            let count_offset = cursor.offset();
            let stored = usize::from(cursor.read_u16()?);
            if stored != joints {
                return Err(DecodeError::malformed(
                    "keyframe",
                    count_offset,
                    format!("{stored} rotations stored for a {joints}-joint model"),
                ));
            }
            cursor.read_n(joints, |c| {
                let low = c.read_u16()?;
                let high = c.read_u16()?;
                Ok(three_axis(high, low))
            })?
        }
        FrameLayout::Packed { single_axis_units } => {
            let mask = single_axis_units - 1;
            let single = |v: u16| units::rotation_to_degrees(v & mask, single_axis_units);
            cursor.read_n(joints, |c| {
                let word = c.read_u16()?;
                Ok(match word & 0xC000 {
                    0x4000 => Vec3::new(single(word), 0.0, 0.0),
                    0x8000 => Vec3::new(0.0, single(word), 0.0),
                    0xC000 => Vec3::new(0.0, 0.0, single(word)),
                    _ => three_axis(word, c.read_u16()?),
                })
            })?
        }
    };
    Ok(Keyframe { bounds, offset, rotations })
}

/// Attaches keyframes to every animation owned by a moveable.
///
/// A moveable owns the animations from its `animation_index` up to the next
/// moveable's first animation. Each keyframe is read from its own slot of
/// the frame buffer, `frame_size` words apart (TR1 slots are sized by joint
/// count instead).
pub fn attach_keyframes(
    animations: &mut [Animation],
    moveables: &[Moveable],
    frames: &Cursor<'_>,
    layout: FrameLayout,
) -> DecodeResult<()> {
    let mut owners: Vec<(usize, usize)> = moveables
        .iter()
        .filter_map(|m| m.animation().map(|a| (usize::from(a), usize::from(m.num_meshes))))
        .filter(|&(a, _)| a < animations.len())
        .collect();
    owners.sort_unstable();
    owners.dedup_by_key(|&mut (a, _)| a);

    for (i, &(first, joints)) in owners.iter().enumerate() {
        let end = owners.get(i + 1).map_or(animations.len(), |&(next, _)| next);
        for animation in &mut animations[first..end] {
            let stride = match layout {
                FrameLayout::Tr1 => 2 * (10 + 2 * joints),
                FrameLayout::Packed { .. } => 2 * usize::from(animation.frame_size),
            };
            if stride == 0 {
                continue;
            }
            let count = animation.keyframe_count();
            let mut keyframes = Vec::with_capacity(count.min(frames.len() / stride + 1));
            for k in 0..count {
                let start = animation.frame_offset as usize + k * stride;
                let mut c = frames.at(start, "frames")?;
                let mut slot = c.sub_cursor(stride.min(c.remaining()), "frames")?;
                keyframes.push(read_keyframe(&mut slot, joints, layout)?);
            }
            animation.keyframes = keyframes;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(values: &[u16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn test_animation_record_sizes() {
        let bytes = vec![0u8; 40];
        let mut c = Cursor::new(&bytes);
        read_animation(&mut c, AnimationLayout::Classic).unwrap();
        assert_eq!(c.position(), 32);
        let mut c = Cursor::new(&bytes);
        let a = read_animation(&mut c, AnimationLayout::Extended).unwrap();
        assert_eq!(c.position(), 40);
        assert_eq!(a.lateral_speed, Some(Fixed16::ZERO));
    }

    #[test]
    fn test_keyframe_count() {
        let mut bytes = vec![0u8; 32];
        bytes[4] = 2; // frame rate
        bytes[16..18].copy_from_slice(&10u16.to_le_bytes());
        bytes[18..20].copy_from_slice(&14u16.to_le_bytes());
        let a = read_animation(&mut Cursor::new(&bytes), AnimationLayout::Classic).unwrap();
        assert_eq!(a.keyframe_count(), 3);
    }

    #[test]
    fn test_packed_rotations() {
        let mut bytes = words(&[0; 9]);
        // x only: 0x100 of 1024 = 90 degrees
        bytes.extend(words(&[0x4000 | 0x100]));
        // all three axes: x = 0x100, y = 0x200, z = 0x80
        let x = 0x100u16;
        let y = 0x200u16;
        let z = 0x080u16;
        bytes.extend(words(&[(x << 4) | (y >> 6), ((y & 0x3F) << 10) | z]));
        let layout = FrameLayout::Packed { single_axis_units: units::ROTATION_UNITS_CLASSIC };
        let k = read_keyframe(&mut Cursor::new(&bytes), 2, layout).unwrap();
        assert!(approx(k.rotations[0], Vec3::new(90.0, 0.0, 0.0)));
        assert!(approx(k.rotations[1], Vec3::new(90.0, 180.0, 45.0)));
    }

    #[test]
    fn test_tr4_single_axis_units() {
        let mut bytes = words(&[0; 9]);
        bytes.extend(words(&[0xC000 | 0x400]));
        let layout = FrameLayout::Packed { single_axis_units: units::ROTATION_UNITS_EXTENDED };
        let k = read_keyframe(&mut Cursor::new(&bytes), 1, layout).unwrap();
        assert!(approx(k.rotations[0], Vec3::new(0.0, 0.0, 90.0)));
    }

    #[test]
    fn test_tr1_rotation_word_order() {
        let mut bytes = words(&[0xFFF0, 0, 0, 16, 32, 8, 1, 2, 3, 1]);
        // low word first
        bytes.extend(words(&[0x0000 | 0x100, 0x100 << 4]));
        let k = read_keyframe(&mut Cursor::new(&bytes), 1, FrameLayout::Tr1).unwrap();
        assert_eq!(k.offset, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(k.bounds.min.x, -16.0);
        assert!(approx(k.rotations[0], Vec3::new(90.0, 0.0, 90.0)));

        let bytes = words(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 2]);
        assert!(matches!(
            read_keyframe(&mut Cursor::new(&bytes), 1, FrameLayout::Tr1),
            Err(DecodeError::MalformedChunk { chunk: "keyframe", offset: 18, .. })
        ));
    }

    #[test]
    fn test_attach_keyframes_uses_owner_joint_count() {
        let mut frames = words(&[0; 9]);
        frames.extend(words(&[0x4000, 0x8000]));
        frames.extend(words(&[0; 9]));
        frames.extend(words(&[0xC000, 0x4000]));

        let anim = Animation {
            frame_offset: 0,
            frame_rate: 1,
            frame_size: 11,
            state_id: 0,
            speed: Fixed16::ZERO,
            accel: Fixed16::ZERO,
            lateral_speed: None,
            lateral_accel: None,
            frame_start: 0,
            frame_end: 1,
            next_animation: 0,
            next_frame: 0,
            num_state_changes: 0,
            state_change_offset: 0,
            num_anim_commands: 0,
            anim_command: 0,
            keyframes: Vec::new(),
        };
        let orphan = Animation { frame_end: 0, ..anim.clone() };
        let mut animations = vec![orphan, anim];
        let moveable = Moveable {
            object_id: 0,
            num_meshes: 2,
            starting_mesh: 0,
            mesh_tree_index: 0,
            frame_offset: 0,
            animation_index: 1,
        };
        let layout = FrameLayout::Packed { single_axis_units: units::ROTATION_UNITS_CLASSIC };
        attach_keyframes(&mut animations, &[moveable], &Cursor::new(&frames), layout).unwrap();
        assert!(animations[0].keyframes.is_empty());
        assert_eq!(animations[1].keyframes.len(), 2);
        assert_eq!(animations[1].keyframes[1].rotations.len(), 2);

        // Frame range running past the buffer is an error.
        animations[1].frame_end = 2;
        assert!(attach_keyframes(&mut animations, &[moveable], &Cursor::new(&frames), layout).is_err());
    }
}
