//! Placed object instances.

use serde::{Deserialize, Serialize};
use trlevel_math::{units, Quaternion, Vec3};

use crate::cursor::Cursor;
use crate::error::DecodeResult;

/// Record layout of entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityLayout {
    /// 22 bytes, one inverted intensity
    Tr1,
    /// 24 bytes, two inverted intensities
    Tr2,
    /// 24 bytes, two direct intensities
    Tr3,
    /// 24 bytes, intensity plus object code bits
    Tr4,
}

/// Flag word of an entity, decoded per generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityFlags {
    /// The raw word
    pub raw: u16,
    /// Starts invisible
    pub invisible: bool,
    /// Five trigger activation bits
    pub activation_mask: u8,
    /// Body is removed once killed; TR2 on
    pub clear_body: bool,
}

impl EntityFlags {
    const INVISIBLE: u16 = 0x0100;
    const ACTIVATION: u16 = 0x3E00;
    const CLEAR_BODY: u16 = 0x8000;

    /// Interprets `raw` the way the given generation does.
    #[must_use]
    pub fn decode(raw: u16, layout: EntityLayout) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let activation_mask = ((raw & Self::ACTIVATION) >> 9) as u8;
        let clear_body = match layout {
            EntityLayout::Tr1 => false,
            EntityLayout::Tr2 | EntityLayout::Tr3 | EntityLayout::Tr4 => raw & Self::CLEAR_BODY != 0,
        };
        Self { raw, invisible: raw & Self::INVISIBLE != 0, activation_mask, clear_body }
    }
}

/// A placed moveable or sprite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Moveable or sprite sequence object id
    pub object_id: i16,
    /// Room the entity starts in
    pub room: i16,
    /// World position in engine units
    pub position: [i32; 3],
    /// Raw 16-bit yaw
    pub angle: u16,
    /// Tint on the direct shade scale; `None` means "use room light"
    pub intensity: Option<i32>,
    /// Object code bits; TR4 on
    pub ocb: Option<i16>,
    /// Decoded flags
    pub flags: EntityFlags,
}

impl Entity {
    /// Position as a float vector in engine space.
    #[must_use]
    pub fn world_position(&self) -> Vec3 {
        Vec3::from_i32(self.position)
    }

    /// Position in a Y-up right-handed frame.
    #[must_use]
    pub fn gl_position(&self) -> Vec3 {
        units::game_to_gl(self.world_position())
    }

    /// Yaw in degrees.
    #[must_use]
    pub fn yaw_degrees(&self) -> f32 {
        units::angle_to_degrees(self.angle)
    }

    /// Orientation as a rotation about the vertical axis.
    #[must_use]
    pub fn orientation(&self) -> Quaternion {
        Quaternion::from_axis_angle(Vec3::Y, self.yaw_degrees())
    }
}

fn intensity(raw: i16, inverted: bool) -> Option<i32> {
    if raw < 0 {
        None
    } else if inverted {
        Some(units::invert_shade(raw))
    } else {
        Some(i32::from(raw))
    }
}

/// Decodes one entity.
pub fn read_entity(cursor: &mut Cursor<'_>, layout: EntityLayout) -> DecodeResult<Entity> {
    let object_id = cursor.read_i16()?;
    let room = cursor.read_i16()?;
    let position = cursor.read_i32_array()?;
    let angle = cursor.read_u16()?;
    let raw_intensity = cursor.read_i16()?;
    let (intensity, ocb) = match layout {
        EntityLayout::Tr1 => (intensity(raw_intensity, true), None),
        EntityLayout::Tr2 => {
            cursor.skip(2)?;
            (intensity(raw_intensity, true), None)
        }
        EntityLayout::Tr3 => {
            cursor.skip(2)?;
            (intensity(raw_intensity, false), None)
        }
        EntityLayout::Tr4 => (intensity(raw_intensity, false), Some(cursor.read_i16()?)),
    };
    let flags = EntityFlags::decode(cursor.read_u16()?, layout);
    Ok(Entity { object_id, room, position, angle, intensity, ocb, flags })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity_bytes(intensity: i16, extra: Option<i16>, flags: u16) -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(&5i16.to_le_bytes());
        b.extend_from_slice(&1i16.to_le_bytes());
        for v in [1024i32, -256, 2048] {
            b.extend_from_slice(&v.to_le_bytes());
        }
        b.extend_from_slice(&0x8000u16.to_le_bytes());
        b.extend_from_slice(&intensity.to_le_bytes());
        if let Some(e) = extra {
            b.extend_from_slice(&e.to_le_bytes());
        }
        b.extend_from_slice(&flags.to_le_bytes());
        b
    }

    #[test]
    fn test_tr1_entity() {
        let bytes = entity_bytes(8191, None, 0x8000 | 0x3E00 | 0x0100);
        let mut c = Cursor::new(&bytes);
        let e = read_entity(&mut c, EntityLayout::Tr1).unwrap();
        assert_eq!(c.position(), 22);
        assert_eq!(e.intensity, Some(0));
        assert_eq!(e.yaw_degrees(), 180.0);
        assert_eq!(e.gl_position(), Vec3::new(1024.0, 256.0, -2048.0));
        assert!(e.flags.invisible);
        assert_eq!(e.flags.activation_mask, 0x1F);
        // TR1 has no clear-body bit.
        assert!(!e.flags.clear_body);
    }

    #[test]
    fn test_flag_layouts_differ_per_generation() {
        let tr1 = EntityFlags::decode(0x8000, EntityLayout::Tr1);
        let tr2 = EntityFlags::decode(0x8000, EntityLayout::Tr2);
        assert!(!tr1.clear_body);
        assert!(tr2.clear_body);
    }

    #[test]
    fn test_tr4_entity_has_ocb() {
        let bytes = entity_bytes(-1, Some(42), 0);
        let mut c = Cursor::new(&bytes);
        let e = read_entity(&mut c, EntityLayout::Tr4).unwrap();
        assert_eq!(c.position(), 24);
        assert_eq!(e.intensity, None);
        assert_eq!(e.ocb, Some(42));
    }

    #[test]
    fn test_tr3_intensity_is_direct() {
        let bytes = entity_bytes(100, Some(0), 0);
        let e = read_entity(&mut Cursor::new(&bytes), EntityLayout::Tr3).unwrap();
        assert_eq!(e.intensity, Some(100));
        assert_eq!(e.ocb, None);
    }
}
