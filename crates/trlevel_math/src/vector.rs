//! Vector types.
//!
//! These are the canonical representations used for every decoded position,
//! normal and texture coordinate.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// A vertex, normal or offset in game units. Y points down, as stored.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec3 {
    /// East-west
    pub x: f32,
    /// Height, growing downwards
    pub y: f32,
    /// North-south
    pub z: f32,
}

impl Vec3 {
    /// Vector from components.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Origin of room or model space.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Axis of pitch rotations.
    pub const X: Self = Self::new(1.0, 0.0, 0.0);

    /// Axis of yaw rotations, the one entity and static mesh headings use.
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);

    /// Axis of roll rotations.
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Components in x, y, z order.
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// From a float triple, as TR5 stores room vertices.
    #[must_use]
    pub const fn from_array(arr: [f32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    /// Widens a 16-bit integer triple, the storage width of most vertices.
    #[must_use]
    pub fn from_i16(v: [i16; 3]) -> Self {
        Self::new(f32::from(v[0]), f32::from(v[1]), f32::from(v[2]))
    }

    /// Converts a 32-bit integer world coordinate triple.
    ///
    /// World coordinates stay well inside the 24-bit mantissa in practice.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_i32(v: [i32; 3]) -> Self {
        Self::new(v[0] as f32, v[1] as f32, v[2] as f32)
    }

    /// Sum of per-axis products.
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Perpendicular to both inputs; used to rotate vectors by a quaternion.
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Euclidean length in game units.
    #[must_use]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len > f32::EPSILON {
            self * (1.0 / len)
        } else {
            Self::ZERO
        }
    }

    /// Per-axis minimum, the low corner of a box through both points.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Per-axis maximum.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// True when exactly one component is ±1 and the others are zero.
    ///
    /// Portal normals in every format are stored this way.
    #[must_use]
    pub fn is_axis_unit(self) -> bool {
        let c = self.to_array();
        let ones = c.iter().filter(|v| v.abs() == 1.0).count();
        let zeros = c.iter().filter(|v| **v == 0.0).count();
        ones == 1 && zeros == 2
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// A UV within one textile, 0 to 1 on both axes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec2 {
    /// Across the page, from the left edge
    pub x: f32,
    /// Down the page, from the top edge
    pub y: f32,
}

impl Vec2 {
    /// UV from its two coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Top-left corner of a textile.
    pub const ZERO: Self = Self::new(0.0, 0.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        let sum = a + b;
        assert_eq!(sum, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(a.dot(b), 32.0);
        assert_eq!(Vec3::new(3.0, 4.0, 0.0).length(), 5.0);
        assert_eq!(-a, Vec3::new(-1.0, -2.0, -3.0));
    }

    #[test]
    fn test_normalize() {
        let v = Vec3::new(0.0, 3.0, 4.0).normalize();
        assert!((v.length() - 1.0).abs() < 1e-6);
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
    }

    #[test]
    fn test_axis_unit() {
        assert!(Vec3::new(0.0, -1.0, 0.0).is_axis_unit());
        assert!(Vec3::Z.is_axis_unit());
        assert!(!Vec3::new(1.0, 1.0, 0.0).is_axis_unit());
        assert!(!Vec3::ZERO.is_axis_unit());
        assert!(!Vec3::new(0.5, 0.0, 0.0).is_axis_unit());
    }

    #[test]
    fn test_integer_widening() {
        assert_eq!(Vec3::from_i16([-1, 2, i16::MAX]), Vec3::new(-1.0, 2.0, 32767.0));
        assert_eq!(Vec3::from_i32([1024, -2048, 0]), Vec3::new(1024.0, -2048.0, 0.0));
    }

    #[test]
    fn test_vec3_bytemuck() {
        let vertices = [Vec3::X, Vec3::Y];
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), 24);
        let back: &[Vec3] = bytemuck::cast_slice(bytes);
        assert_eq!(back, &vertices);
    }
}
