//! 4x4 transform matrices.
//!
//! Column-major, matching what GPU uniform buffers expect. Rotations take
//! degrees because every angle the decoders produce is in degrees.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::vector::Vec3;

/// Column-major 4x4 matrix.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Mat4 {
    /// Columns, each `[x, y, z, w]`
    pub cols: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    /// Identity matrix
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Translation by `t`.
    #[must_use]
    pub const fn translation(t: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[3] = [t.x, t.y, t.z, 1.0];
        m
    }

    /// Non-uniform scale.
    #[must_use]
    pub const fn scale(s: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[0][0] = s.x;
        m.cols[1][1] = s.y;
        m.cols[2][2] = s.z;
        m
    }

    /// Rotation about the X axis.
    #[must_use]
    pub fn rotation_x(degrees: f32) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        let mut m = Self::IDENTITY;
        m.cols[1] = [0.0, c, s, 0.0];
        m.cols[2] = [0.0, -s, c, 0.0];
        m
    }

    /// Rotation about the Y axis.
    #[must_use]
    pub fn rotation_y(degrees: f32) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        let mut m = Self::IDENTITY;
        m.cols[0] = [c, 0.0, -s, 0.0];
        m.cols[2] = [s, 0.0, c, 0.0];
        m
    }

    /// Rotation about the Z axis.
    #[must_use]
    pub fn rotation_z(degrees: f32) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        let mut m = Self::IDENTITY;
        m.cols[0] = [c, s, 0.0, 0.0];
        m.cols[1] = [-s, c, 0.0, 0.0];
        m
    }

    /// Joint rotation as the engine applies it: Y, then X, then Z.
    #[must_use]
    pub fn rotation_yxz(degrees: Vec3) -> Self {
        Self::rotation_y(degrees.y) * Self::rotation_x(degrees.x) * Self::rotation_z(degrees.z)
    }

    /// Element at `row`, `col`.
    #[must_use]
    pub const fn get(&self, row: usize, col: usize) -> f32 {
        self.cols[col][row]
    }

    /// Transposed copy.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut out = Self::IDENTITY;
        for (c, col) in self.cols.iter().enumerate() {
            for (r, v) in col.iter().enumerate() {
                out.cols[r][c] = *v;
            }
        }
        out
    }

    /// Transforms a point (w = 1).
    #[must_use]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let c = &self.cols;
        Vec3::new(
            c[0][0] * p.x + c[1][0] * p.y + c[2][0] * p.z + c[3][0],
            c[0][1] * p.x + c[1][1] * p.y + c[2][1] * p.z + c[3][1],
            c[0][2] * p.x + c[1][2] * p.y + c[2][2] * p.z + c[3][2],
        )
    }

    /// Transforms a direction (w = 0).
    #[must_use]
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        let c = &self.cols;
        Vec3::new(
            c[0][0] * v.x + c[1][0] * v.y + c[2][0] * v.z,
            c[0][1] * v.x + c[1][1] * v.y + c[2][1] * v.z,
            c[0][2] * v.x + c[1][2] * v.y + c[2][2] * v.z,
        )
    }
}

impl std::ops::Mul for Mat4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let mut out = [[0.0_f32; 4]; 4];
        for (c, out_col) in out.iter_mut().enumerate() {
            for (r, cell) in out_col.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.cols[k][r] * rhs.cols[c][k]).sum();
            }
        }
        Self { cols: out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_translation() {
        let m = Mat4::translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(m.transform_point(Vec3::ZERO), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(m.transform_vector(Vec3::X), Vec3::X);
    }

    #[test]
    fn test_axis_rotations() {
        assert!(approx(Mat4::rotation_y(90.0).transform_vector(Vec3::Z), Vec3::X));
        assert!(approx(Mat4::rotation_x(90.0).transform_vector(Vec3::Y), Vec3::Z));
        assert!(approx(Mat4::rotation_z(90.0).transform_vector(Vec3::X), Vec3::Y));
    }

    #[test]
    fn test_yxz_order() {
        let angles = Vec3::new(90.0, 90.0, 0.0);
        let composed = Mat4::rotation_y(90.0) * Mat4::rotation_x(90.0);
        let v = Vec3::new(0.3, -0.2, 0.9);
        assert!(approx(
            Mat4::rotation_yxz(angles).transform_vector(v),
            composed.transform_vector(v)
        ));
        // X is applied before Y.
        assert!(approx(Mat4::rotation_yxz(angles).transform_vector(Vec3::Y), Vec3::X));
    }

    #[test]
    fn test_identity_mul() {
        let m = Mat4::rotation_x(33.0) * Mat4::translation(Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(m * Mat4::IDENTITY, m);
        assert_eq!(Mat4::IDENTITY * m, m);
        assert_eq!(m.transpose().transpose(), m);
    }
}
