//! Vertices and faces.

use serde::{Deserialize, Serialize};
use trlevel_math::Vec3;

use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};

/// Reads three `i16`s as a vertex.
pub fn read_vertex_i16(cursor: &mut Cursor<'_>) -> DecodeResult<Vec3> {
    Ok(Vec3::from_i16(cursor.read_i16_array()?))
}

/// Reads three `i32`s as a vertex.
pub fn read_vertex_i32(cursor: &mut Cursor<'_>) -> DecodeResult<Vec3> {
    Ok(Vec3::from_i32(cursor.read_i32_array()?))
}

/// Reads three `f32`s as a vertex.
pub fn read_vertex_f32(cursor: &mut Cursor<'_>) -> DecodeResult<Vec3> {
    Ok(Vec3::from_array(cursor.read_f32_array()?))
}

/// Triangle or quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaceShape {
    /// Three corners
    Triangle,
    /// Four corners
    Quad,
}

impl FaceShape {
    /// Number of corners.
    #[must_use]
    pub const fn corners(self) -> usize {
        match self {
            Self::Triangle => 3,
            Self::Quad => 4,
        }
    }
}

/// How a face's texture word is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureMode {
    /// Whole word is an object texture index
    Index,
    /// Low 15 bits index, bit 15 marks a double-sided face
    IndexDoubleSided,
    /// Palette colour; the high byte also indexes the 16-bit palette when
    /// `with_index16` is set
    Palette {
        /// Whether a 16-bit palette exists
        with_index16: bool,
    },
}

/// Record layout of one face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceLayout {
    /// Corner count
    pub shape: FaceShape,
    /// Texture word interpretation
    pub texture: TextureMode,
    /// A trailing effects word follows the texture word
    pub has_effects: bool,
}

impl FaceLayout {
    /// Shorthand constructor.
    #[must_use]
    pub const fn new(shape: FaceShape, texture: TextureMode, has_effects: bool) -> Self {
        Self { shape, texture, has_effects }
    }
}

/// What a face is painted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaceTexture {
    /// Object texture index
    Textured {
        /// Index into the level's object textures
        index: u16,
        /// Rendered from both sides
        double_sided: bool,
    },
    /// Flat palette colour
    Coloured {
        /// Index into the 8-bit palette
        index8: u8,
        /// Index into the 16-bit palette, where one exists
        index16: Option<u8>,
    },
}

/// One polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Face {
    /// Corner count
    pub shape: FaceShape,
    vertices: [u16; 4],
    /// Texture or colour
    pub texture: FaceTexture,
    /// Effect bits (bit 0 additive alpha, bits 1..=7 shine); zero before TR4
    pub effects: u16,
}

impl Face {
    /// Builds a face from its corner indices.
    #[must_use]
    pub fn new(shape: FaceShape, corners: &[u16], texture: FaceTexture, effects: u16) -> Self {
        let mut vertices = [0u16; 4];
        let n = shape.corners().min(corners.len());
        vertices[..n].copy_from_slice(&corners[..n]);
        Self { shape, vertices, texture, effects }
    }

    /// Corner vertex indices.
    #[must_use]
    pub fn vertices(&self) -> &[u16] {
        &self.vertices[..self.shape.corners()]
    }

    /// Rebases corners that index a layer of `count` vertices starting at
    /// `base` onto the combined vertex list.
    ///
    /// Every corner must lie inside its own layer.
    pub(crate) fn offset_vertices(&mut self, base: u16, count: u16) -> DecodeResult<()> {
        let n = self.shape.corners();
        for v in &mut self.vertices[..n] {
            if *v >= count {
                return Err(DecodeError::broken("face.vertex", *v, usize::from(count)));
            }
            let rebased = i64::from(*v) + i64::from(base);
            *v = v
                .checked_add(base)
                .ok_or_else(|| DecodeError::broken("face.vertex", rebased, usize::from(u16::MAX)))?;
        }
        Ok(())
    }

    /// Object texture index, if textured.
    #[must_use]
    pub fn texture_index(&self) -> Option<u16> {
        match self.texture {
            FaceTexture::Textured { index, .. } => Some(index),
            FaceTexture::Coloured { .. } => None,
        }
    }
}

/// Decodes one face.
pub fn read_face(cursor: &mut Cursor<'_>, layout: FaceLayout) -> DecodeResult<Face> {
    let mut corners = [0u16; 4];
    for v in &mut corners[..layout.shape.corners()] {
        *v = cursor.read_u16()?;
    }
    let word = cursor.read_u16()?;
    let texture = match layout.texture {
        TextureMode::Index => FaceTexture::Textured { index: word, double_sided: false },
        TextureMode::IndexDoubleSided => FaceTexture::Textured {
            index: word & 0x7FFF,
            double_sided: word & 0x8000 != 0,
        },
        TextureMode::Palette { with_index16 } => {
            let [low, high] = word.to_le_bytes();
            FaceTexture::Coloured { index8: low, index16: with_index16.then_some(high) }
        }
    };
    let effects = if layout.has_effects { cursor.read_u16()? } else { 0 };
    Ok(Face::new(layout.shape, &corners, texture, effects))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_with_double_sided_texture() {
        let bytes = [1, 0, 2, 0, 3, 0, 4, 0, 0x05, 0x80];
        let mut c = Cursor::new(&bytes);
        let layout = FaceLayout::new(FaceShape::Quad, TextureMode::IndexDoubleSided, false);
        let face = read_face(&mut c, layout).unwrap();
        assert_eq!(face.vertices(), &[1, 2, 3, 4]);
        assert_eq!(face.texture, FaceTexture::Textured { index: 5, double_sided: true });
        assert_eq!(face.effects, 0);
    }

    #[test]
    fn test_triangle_with_effects() {
        let bytes = [7, 0, 8, 0, 9, 0, 0x05, 0x80, 0x03, 0x00];
        let mut c = Cursor::new(&bytes);
        let layout = FaceLayout::new(FaceShape::Triangle, TextureMode::Index, true);
        let face = read_face(&mut c, layout).unwrap();
        assert_eq!(face.vertices(), &[7, 8, 9]);
        assert_eq!(face.texture_index(), Some(0x8005));
        assert_eq!(face.effects, 3);
    }

    #[test]
    fn test_coloured_face_splits_palette_indices() {
        let bytes = [0, 0, 1, 0, 2, 0, 0x11, 0x22];
        let layout = FaceLayout::new(FaceShape::Triangle, TextureMode::Palette { with_index16: true }, false);
        let face = read_face(&mut Cursor::new(&bytes), layout).unwrap();
        assert_eq!(face.texture, FaceTexture::Coloured { index8: 0x11, index16: Some(0x22) });

        let layout = FaceLayout::new(FaceShape::Triangle, TextureMode::Palette { with_index16: false }, false);
        let face = read_face(&mut Cursor::new(&bytes), layout).unwrap();
        assert_eq!(face.texture, FaceTexture::Coloured { index8: 0x11, index16: None });
        assert_eq!(face.texture_index(), None);
    }

    #[test]
    fn test_offset_vertices_checks_layer_bounds() {
        let layout = FaceLayout::new(FaceShape::Triangle, TextureMode::Index, false);
        let bytes = [0, 0, 1, 0, 2, 0, 0, 0];
        let mut face = read_face(&mut Cursor::new(&bytes), layout).unwrap();
        face.offset_vertices(10, 3).unwrap();
        assert_eq!(face.vertices(), &[10, 11, 12]);

        let mut face = read_face(&mut Cursor::new(&bytes), layout).unwrap();
        assert!(matches!(
            face.offset_vertices(10, 2),
            Err(DecodeError::BrokenReference { field: "face.vertex", index: 2, len: 2 })
        ));

        let mut face = read_face(&mut Cursor::new(&bytes), layout).unwrap();
        assert!(matches!(
            face.offset_vertices(u16::MAX, 3),
            Err(DecodeError::BrokenReference { field: "face.vertex", index: 65536, .. })
        ));
    }

    #[test]
    fn test_vertex_widths() {
        let bytes = [0xFF, 0xFF, 2, 0, 3, 0];
        assert_eq!(read_vertex_i16(&mut Cursor::new(&bytes)).unwrap(), Vec3::new(-1.0, 2.0, 3.0));
        let bytes = 1.5f32.to_le_bytes().repeat(3);
        assert_eq!(read_vertex_f32(&mut Cursor::new(&bytes)).unwrap(), Vec3::new(1.5, 1.5, 1.5));
    }
}
