//! Colour normalisation.
//!
//! Every format stores colour differently: 6-bit palette triples, 8-bit
//! palette quads, 15-bit packed words with or without an alpha bit, and
//! BGRA bytes. All of them end up as [`Color`] with full 0-255 channels.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};

/// RGBA colour, 8 bits per channel.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize)]
pub struct Color {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha (255 = opaque)
    pub a: u8,
}

/// Expands a 5-bit channel so that 31 maps to 255.
const fn expand5(v: u16) -> u8 {
    let v = (v & 0x1F) as u8;
    (v << 3) | (v >> 2)
}

/// Expands a 6-bit channel so that 63 maps to 255.
const fn expand6(v: u8) -> u8 {
    let v = v & 0x3F;
    (v << 2) | (v >> 4)
}

impl Color {
    /// Creates a colour from its channels.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// Opaque white.
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);

    /// `0RRRRRGGGGGBBBBB`, always opaque.
    #[must_use]
    pub const fn from_rgb555(v: u16) -> Self {
        Self::rgba(expand5(v >> 10), expand5(v >> 5), expand5(v), 255)
    }

    /// `ARRRRRGGGGGBBBBB`, alpha bit selects opaque or transparent.
    #[must_use]
    pub const fn from_argb1555(v: u16) -> Self {
        let a = if v & 0x8000 != 0 { 255 } else { 0 };
        Self::rgba(expand5(v >> 10), expand5(v >> 5), expand5(v), a)
    }

    /// 6-bit-per-channel palette entry, always opaque.
    #[must_use]
    pub const fn from_rgb666(rgb: [u8; 3]) -> Self {
        Self::rgba(expand6(rgb[0]), expand6(rgb[1]), expand6(rgb[2]), 255)
    }

    /// Bytes in memory order B, G, R, A (a little-endian ARGB word).
    #[must_use]
    pub const fn from_bgra(bytes: [u8; 4]) -> Self {
        Self::rgba(bytes[2], bytes[1], bytes[0], bytes[3])
    }

    /// Opaque grey for a shade on the direct 0..=32767 scale.
    #[must_use]
    pub fn from_shade(shade: i32) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let v = (shade.clamp(0, 0x7FFF) * 255 / 0x7FFF) as u8;
        Self::rgba(v, v, v, 255)
    }
}

/// On-disk colour encodings.
#[derive(Debug, Clone, Copy)]
pub enum ColorEncoding<'p> {
    /// Three 6-bit channels in three bytes
    Rgb666,
    /// Four bytes R, G, B, unused
    Rgbx8888,
    /// 16-bit word, no alpha
    Rgb555,
    /// 16-bit word, top bit alpha
    Argb1555,
    /// Four bytes B, G, R, A
    Bgra8888,
    /// One byte indexing a palette
    Indexed8(&'p Palette),
}

/// Decodes one colour from the cursor.
pub fn read_color(cursor: &mut Cursor<'_>, encoding: ColorEncoding<'_>) -> DecodeResult<Color> {
    Ok(match encoding {
        ColorEncoding::Rgb666 => Color::from_rgb666(cursor.read_array()?),
        ColorEncoding::Rgbx8888 => {
            let [r, g, b, _] = cursor.read_array()?;
            Color::rgba(r, g, b, 255)
        }
        ColorEncoding::Rgb555 => Color::from_rgb555(cursor.read_u16()?),
        ColorEncoding::Argb1555 => Color::from_argb1555(cursor.read_u16()?),
        ColorEncoding::Bgra8888 => Color::from_bgra(cursor.read_array()?),
        ColorEncoding::Indexed8(palette) => palette.resolve(cursor.read_u8()?)?,
    })
}

/// Colour lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Palette {
    entries: Vec<Color>,
}

impl Palette {
    /// Builds a palette from normalised entries.
    #[must_use]
    pub fn new(entries: Vec<Color>) -> Self {
        Self { entries }
    }

    /// Reads `count` entries in the given encoding.
    pub fn read(cursor: &mut Cursor<'_>, count: usize, encoding: ColorEncoding<'_>) -> DecodeResult<Self> {
        Ok(Self::new(cursor.read_n(count, |c| read_color(c, encoding))?))
    }

    /// Looks up an entry.
    pub fn resolve(&self, index: u8) -> DecodeResult<Color> {
        self.entries
            .get(usize::from(index))
            .copied()
            .ok_or_else(|| DecodeError::broken("palette.index", index, self.entries.len()))
    }

    /// All entries.
    #[must_use]
    pub fn entries(&self) -> &[Color] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
