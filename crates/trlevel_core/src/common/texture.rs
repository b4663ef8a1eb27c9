//! Texture atlases and the rectangles that address them.

use serde::{Deserialize, Serialize};
use trlevel_math::Vec2;

use super::color::{Color, Palette};
use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};

/// Edge length of a textile in pixels.
pub const TEXTILE_SIZE: usize = 256;

/// Pixels in one textile.
pub const TEXTILE_PIXELS: usize = TEXTILE_SIZE * TEXTILE_SIZE;

/// One 256x256 texture atlas page, normalised to RGBA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Textile {
    pixels: Vec<Color>,
}

impl Textile {
    /// From 8-bit palette indices. Index 0 is transparent.
    pub fn from_indexed(indices: &[u8], palette: &Palette) -> DecodeResult<Self> {
        let pixels = indices
            .iter()
            .map(|&i| if i == 0 { Ok(Color::TRANSPARENT) } else { palette.resolve(i) })
            .collect::<DecodeResult<Vec<_>>>()?;
        Ok(Self { pixels })
    }

    /// From little-endian ARGB1555 words.
    #[must_use]
    pub fn from_argb1555(bytes: &[u8]) -> Self {
        let pixels = bytes
            .chunks_exact(2)
            .map(|w| Color::from_argb1555(u16::from_le_bytes([w[0], w[1]])))
            .collect();
        Self { pixels }
    }

    /// From BGRA bytes (little-endian ARGB words).
    #[must_use]
    pub fn from_bgra(bytes: &[u8]) -> Self {
        let pixels = bytes
            .chunks_exact(4)
            .map(|p| Color::from_bgra([p[0], p[1], p[2], p[3]]))
            .collect();
        Self { pixels }
    }

    /// Pixel at `x`, `y`; `None` outside the page.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= TEXTILE_SIZE || y >= TEXTILE_SIZE {
            return None;
        }
        self.pixels.get(y * TEXTILE_SIZE + x).copied()
    }

    /// Row-major pixels.
    #[must_use]
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Raw RGBA bytes, ready for upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

/// One corner of an object texture in atlas space.
///
/// Each axis is a pixel position plus a sub-pixel byte whose sign marks
/// the low or high edge of that pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TexCoord {
    /// Sub-pixel x marker
    pub x_coordinate: i8,
    /// Pixel column
    pub x_pixel: u8,
    /// Sub-pixel y marker
    pub y_coordinate: i8,
    /// Pixel row
    pub y_pixel: u8,
}

impl TexCoord {
    /// Normalised UV within the textile.
    #[must_use]
    pub fn uv(&self) -> Vec2 {
        let axis = |pixel: u8, marker: i8| {
            let edge = if marker < 0 { 1.0 } else { 0.0 };
            (f32::from(pixel) + edge) / 256.0
        };
        Vec2::new(axis(self.x_pixel, self.x_coordinate), axis(self.y_pixel, self.y_coordinate))
    }

    /// A triangle's unused fourth corner is all zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

fn read_tex_coord(cursor: &mut Cursor<'_>) -> DecodeResult<TexCoord> {
    Ok(TexCoord {
        x_coordinate: cursor.read_i8()?,
        x_pixel: cursor.read_u8()?,
        y_coordinate: cursor.read_i8()?,
        y_pixel: cursor.read_u8()?,
    })
}

/// Record layout of object textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectTextureLayout {
    /// 20 bytes, TR1-TR3
    Classic,
    /// 38 bytes, adds flags and size words
    Tr4,
    /// Tr4 plus a trailing zero word
    Tr5,
}

/// A textured quad or triangle in a textile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectTexture {
    /// Blending mode (0 opaque, 1 alpha-tested, 2 additive, ...)
    pub attribute: u16,
    /// Textile index
    pub tile: u16,
    /// Flag from the tile's high byte; marks triangles from TR4 on
    pub is_triangle: bool,
    /// TR4+ mapping flags
    pub flags: u16,
    /// Corners, the fourth unused for triangles
    pub corners: [TexCoord; 4],
    /// TR4+ pixel extents
    pub size: Option<(u32, u32)>,
}

/// Decodes one object texture.
pub fn read_object_texture(cursor: &mut Cursor<'_>, layout: ObjectTextureLayout) -> DecodeResult<ObjectTexture> {
    let attribute = cursor.read_u16()?;
    let tile = u16::from(cursor.read_u8()?);
    let flags_offset = cursor.offset();
    let tile_flags = cursor.read_u8()?;
    let accepted = match layout {
        ObjectTextureLayout::Classic => tile_flags == 0,
        ObjectTextureLayout::Tr4 | ObjectTextureLayout::Tr5 => tile_flags == 0 || tile_flags == 0x80,
    };
    if !accepted {
        return Err(DecodeError::malformed(
            "object texture",
            flags_offset,
            format!("unexpected tile flags {tile_flags:#04x}"),
        ));
    }

    let flags = match layout {
        ObjectTextureLayout::Classic => 0,
        _ => cursor.read_u16()?,
    };
    let mut corners = [TexCoord::default(); 4];
    for corner in &mut corners {
        *corner = read_tex_coord(cursor)?;
    }
    let size = match layout {
        ObjectTextureLayout::Classic => None,
        ObjectTextureLayout::Tr4 | ObjectTextureLayout::Tr5 => {
            cursor.skip(8)?;
            Some((cursor.read_u32()?, cursor.read_u32()?))
        }
    };
    if layout == ObjectTextureLayout::Tr5 {
        cursor.expect_u16(0, "object texture")?;
    }

    Ok(ObjectTexture { attribute, tile, is_triangle: tile_flags == 0x80, flags, corners, size })
}

/// A sprite rectangle in a textile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpriteTexture {
    /// Textile index
    pub tile: u16,
    /// Left pixel
    pub x: u8,
    /// Top pixel
    pub y: u8,
    /// Width in 1/256 pixels
    pub width: u16,
    /// Height in 1/256 pixels
    pub height: u16,
    /// World-space extents relative to the sprite origin:
    /// left, top, right, bottom
    pub extents: [i16; 4],
}

/// Decodes one sprite texture.
pub fn read_sprite_texture(cursor: &mut Cursor<'_>) -> DecodeResult<SpriteTexture> {
    Ok(SpriteTexture {
        tile: cursor.read_u16()?,
        x: cursor.read_u8()?,
        y: cursor.read_u8()?,
        width: cursor.read_u16()?,
        height: cursor.read_u16()?,
        extents: cursor.read_i16_array()?,
    })
}

/// A run of sprite textures forming one sprite object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpriteSequence {
    /// Object id the sequence represents
    pub object_id: i32,
    /// Number of sprite textures
    pub length: u16,
    /// First sprite texture
    pub offset: u16,
}

/// Decodes one sprite sequence. Lengths are stored negated.
pub fn read_sprite_sequence(cursor: &mut Cursor<'_>) -> DecodeResult<SpriteSequence> {
    let object_id = cursor.read_i32()?;
    let length_offset = cursor.offset();
    let negative_length = cursor.read_i16()?;
    let offset = cursor.read_i16()?;
    let length = u16::try_from(-i32::from(negative_length)).map_err(|_| {
        DecodeError::malformed("sprite sequence", length_offset, format!("positive length {negative_length}"))
    })?;
    let offset = u16::try_from(offset).map_err(|_| {
        DecodeError::malformed("sprite sequence", length_offset + 2, format!("negative offset {offset}"))
    })?;
    Ok(SpriteSequence { object_id, length, offset })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_object_texture() {
        let mut bytes = vec![1, 0, 3, 0];
        bytes.extend_from_slice(&[0x01, 10, 0x01, 20, 0xFF, 30, 0x01, 20, 0xFF, 30, 0xFF, 40, 0, 0, 0, 0]);
        let t = read_object_texture(&mut Cursor::new(&bytes), ObjectTextureLayout::Classic).unwrap();
        assert_eq!(t.attribute, 1);
        assert_eq!(t.tile, 3);
        assert!(!t.is_triangle);
        assert_eq!(t.corners[1].x_pixel, 30);
        assert!(t.corners[3].is_zero());
        assert_eq!(t.corners[1].uv(), Vec2::new(31.0 / 256.0, 20.0 / 256.0));
        assert_eq!(t.size, None);
    }

    #[test]
    fn test_classic_rejects_tile_flags() {
        let bytes = [0, 0, 0, 0x80, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let err = read_object_texture(&mut Cursor::new(&bytes), ObjectTextureLayout::Classic).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedChunk { chunk: "object texture", offset: 3, .. }));
    }

    #[test]
    fn test_tr5_object_texture_triangle_flag() {
        let mut bytes = vec![0, 0, 2, 0x80, 5, 0];
        bytes.extend_from_slice(&[0; 16]);
        bytes.extend_from_slice(&[0; 8]);
        bytes.extend_from_slice(&64u32.to_le_bytes());
        bytes.extend_from_slice(&32u32.to_le_bytes());
        bytes.extend_from_slice(&[0, 0]);
        let mut c = Cursor::new(&bytes);
        let t = read_object_texture(&mut c, ObjectTextureLayout::Tr5).unwrap();
        assert!(t.is_triangle);
        assert_eq!(t.flags, 5);
        assert_eq!(t.size, Some((64, 32)));
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn test_sprite_sequence_negated_length() {
        let mut bytes = 190i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&(-3i16).to_le_bytes());
        bytes.extend_from_slice(&7i16.to_le_bytes());
        let s = read_sprite_sequence(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(s, SpriteSequence { object_id: 190, length: 3, offset: 7 });
    }

    #[test]
    fn test_textile_conversions() {
        let palette = Palette::new(vec![Color::WHITE, Color::rgba(9, 8, 7, 255)]);
        let t = Textile::from_indexed(&[0, 1], &palette).unwrap();
        assert_eq!(t.pixels(), &[Color::TRANSPARENT, Color::rgba(9, 8, 7, 255)]);
        assert_eq!(t.as_bytes(), &[0, 0, 0, 0, 9, 8, 7, 255]);

        let t = Textile::from_argb1555(&0xFC00u16.to_le_bytes());
        assert_eq!(t.pixels(), &[Color::rgba(255, 0, 0, 255)]);

        let t = Textile::from_bgra(&[1, 2, 3, 4]);
        assert_eq!(t.pixel(0, 0), Some(Color::rgba(3, 2, 1, 4)));
        assert_eq!(t.pixel(256, 0), None);
    }
}
