//! Axis-aligned bounding boxes.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::vector::Vec3;

/// Axis-aligned box given by its two extreme corners.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl BoundingBox {
    /// Creates a box from two corners in any order.
    #[must_use]
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self { min: a.min(b), max: a.max(b) }
    }

    /// Engine files store boxes as `min_x, max_x, min_y, max_y, min_z, max_z`.
    #[must_use]
    pub fn from_interleaved(v: [i16; 6]) -> Self {
        Self::new(
            Vec3::from_i16([v[0], v[2], v[4]]),
            Vec3::from_i16([v[1], v[3], v[5]]),
        )
    }

    /// Centre point
    #[must_use]
    pub fn centre(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Inclusive containment test
    #[must_use]
    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }
}
