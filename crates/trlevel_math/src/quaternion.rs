//! Rotations and rigid transforms.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::matrix::Mat4;
use crate::vector::Vec3;

/// A joint or entity orientation as a unit quaternion.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Quaternion {
    /// Axis part, x
    pub x: f32,
    /// Axis part, y
    pub y: f32,
    /// Axis part, z
    pub z: f32,
    /// Cosine of half the angle
    pub w: f32,
}

impl Quaternion {
    /// From raw components; the caller keeps it normalised.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// No rotation.
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Rotation of `degrees` about `axis` (normalised internally).
    #[must_use]
    pub fn from_axis_angle(axis: Vec3, degrees: f32) -> Self {
        let axis = axis.normalize();
        let (s, c) = (degrees.to_radians() * 0.5).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    /// Same rotation as [`Mat4::rotation_yxz`].
    #[must_use]
    pub fn from_yxz(degrees: Vec3) -> Self {
        Self::from_axis_angle(Vec3::Y, degrees.y)
            * Self::from_axis_angle(Vec3::X, degrees.x)
            * Self::from_axis_angle(Vec3::Z, degrees.z)
    }

    /// Rotates a vector.
    #[must_use]
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let q = Vec3::new(self.x, self.y, self.z);
        let t = q.cross(v) * 2.0;
        v + t * self.w + q.cross(t)
    }

    /// Rotation matrix.
    #[must_use]
    pub fn to_mat4(self) -> Mat4 {
        let Self { x, y, z, w } = self;
        let mut m = Mat4::IDENTITY;
        m.cols[0] = [1.0 - 2.0 * (y * y + z * z), 2.0 * (x * y + w * z), 2.0 * (x * z - w * y), 0.0];
        m.cols[1] = [2.0 * (x * y - w * z), 1.0 - 2.0 * (x * x + z * z), 2.0 * (y * z + w * x), 0.0];
        m.cols[2] = [2.0 * (x * z + w * y), 2.0 * (y * z - w * x), 1.0 - 2.0 * (x * x + y * y), 0.0];
        m
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl std::ops::Mul for Quaternion {
    type Output = Self;

    fn mul(self, r: Self) -> Self {
        Self::new(
            self.w * r.x + self.x * r.w + self.y * r.z - self.z * r.y,
            self.w * r.y - self.x * r.z + self.y * r.w + self.z * r.x,
            self.w * r.z + self.x * r.y - self.y * r.x + self.z * r.w,
            self.w * r.w - self.x * r.x - self.y * r.y - self.z * r.z,
        )
    }
}

/// Placement of a mesh in its parent's space.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Transform {
    /// Offset from the parent origin
    pub position: Vec3,
    /// Same factor on every axis
    pub scale: f32,
    /// Orientation relative to the parent
    pub rotation: Quaternion,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// Placement from its parts.
    #[must_use]
    pub const fn new(position: Vec3, rotation: Quaternion, scale: f32) -> Self {
        Self { position, scale, rotation }
    }

    /// Sits at the parent origin, unrotated and unscaled.
    pub const IDENTITY: Self = Self::new(Vec3::ZERO, Quaternion::IDENTITY, 1.0);

    /// Applies scale, rotation, then translation.
    #[must_use]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.rotation.rotate(p * self.scale) + self.position
    }

    /// Equivalent matrix.
    #[must_use]
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::translation(self.position)
            * self.rotation.to_mat4()
            * Mat4::scale(Vec3::new(self.scale, self.scale, self.scale))
    }
}
