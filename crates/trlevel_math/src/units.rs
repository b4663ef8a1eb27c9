//! Engine unit conventions.
//!
//! The engine works in integer world units with Y pointing down. A sector
//! is 1024 units wide, a "click" (the step of floor heights) is 256. Angles
//! are 16-bit with `0x4000` meaning a quarter turn; keyframe rotations use
//! coarser units depending on generation.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::vector::Vec3;

/// Width of one floor sector in world units.
pub const SECTOR_SIZE: f32 = 1024.0;

/// Height of one click in world units.
pub const CLICK_SIZE: f32 = 256.0;

/// Keyframe rotation units per full turn (10-bit fields, all generations).
pub const ROTATION_UNITS_CLASSIC: u16 = 1024;

/// Single-axis keyframe rotation units per full turn from TR4 on (12-bit).
pub const ROTATION_UNITS_EXTENDED: u16 = 4096;

/// Largest raw vertex shade in the inverted TR1/TR2 scale.
pub const MAX_INVERTED_SHADE: i16 = 8191;

/// Converts engine coordinates (Y down, Z forward) into a right-handed,
/// Y-up frame by negating Y and Z.
#[must_use]
pub fn game_to_gl(v: Vec3) -> Vec3 {
    Vec3::new(v.x, -v.y, -v.z)
}

/// 16-bit engine angle to degrees in `[0, 360)`.
#[must_use]
pub fn angle_to_degrees(angle: u16) -> f32 {
    f32::from(angle) * 90.0 / 16384.0
}

/// Keyframe rotation value to degrees.
#[must_use]
pub fn rotation_to_degrees(value: u16, units_per_turn: u16) -> f32 {
    f32::from(value) * 360.0 / f32::from(units_per_turn)
}

/// Floor or ceiling height in clicks to world units.
#[must_use]
pub fn clicks_to_world(clicks: i8) -> f32 {
    f32::from(clicks) * CLICK_SIZE
}

/// Re-bases a TR1/TR2 shade, where 0 is brightest and 8191 darkest, onto the
/// direct scale used from TR3 on (0 is black).
#[must_use]
pub fn invert_shade(raw: i16) -> i32 {
    (i32::from(MAX_INVERTED_SHADE) - i32::from(raw)) << 2
}

/// 16.16 fixed-point number, used for animation speeds.
#[repr(transparent)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct Fixed16(pub i32);

impl Fixed16 {
    /// Zero
    pub const ZERO: Self = Self(0);

    /// From whole and fractional halves.
    #[must_use]
    pub const fn from_parts(whole: i16, frac: u16) -> Self {
        Self(((whole as i32) << 16) | frac as i32)
    }

    /// Integer part (rounds toward negative infinity).
    #[must_use]
    pub const fn whole(self) -> i16 {
        #[allow(clippy::cast_possible_truncation)]
        let w = (self.0 >> 16) as i16;
        w
    }

    /// Value as a float.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 65536.0
    }
}
