//! Per-generation decoders.
//!
//! The five formats are a closed set, so dispatch is a `match` on
//! [`GameVersion`] rather than a trait object. Each decoder walks its file
//! in on-disk order and hands back a [`LevelDraft`] that still needs the
//! assembler's cross-reference pass.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::DecoderConfig;
use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};
use crate::level::LevelDraft;

mod shared;
mod tr1;
mod tr2;
mod tr3;
mod tr4;
mod tr5;

/// Leading tag of TR1 files.
pub const TAG_TR1: [u8; 4] = 0x0000_0020u32.to_le_bytes();
/// Leading tag of TR2 files.
pub const TAG_TR2: [u8; 4] = 0x0000_002Du32.to_le_bytes();
/// Leading tag of TR3 files.
pub const TAG_TR3: [u8; 4] = 0xFF08_0038u32.to_le_bytes();
/// Leading tag of TR3 files from the later release.
pub const TAG_TR3_ALT: [u8; 4] = 0xFF18_0038u32.to_le_bytes();
/// Leading tag shared by TR4 and TR5 files.
pub const TAG_TR4: [u8; 4] = *b"TR4\0";

/// Engine generation a level file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GameVersion {
    /// Tomb Raider (`.PHD`)
    Tr1,
    /// Tomb Raider II (`.TR2`)
    Tr2,
    /// Tomb Raider III (`.TR2`)
    Tr3,
    /// The Last Revelation (`.TR4`)
    Tr4,
    /// Chronicles (`.TRC`)
    Tr5,
}

impl GameVersion {
    /// Every supported generation, oldest first.
    pub const ALL: [Self; 5] = [Self::Tr1, Self::Tr2, Self::Tr3, Self::Tr4, Self::Tr5];

    /// Short display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tr1 => "TR1",
            Self::Tr2 => "TR2",
            Self::Tr3 => "TR3",
            Self::Tr4 => "TR4",
            Self::Tr5 => "TR5",
        }
    }

    /// Whether a file of this generation may start with `tag`.
    #[must_use]
    pub fn accepts_tag(self, tag: [u8; 4]) -> bool {
        match self {
            Self::Tr1 => tag == TAG_TR1,
            Self::Tr2 => tag == TAG_TR2,
            Self::Tr3 => tag == TAG_TR3 || tag == TAG_TR3_ALT,
            Self::Tr4 | Self::Tr5 => tag == TAG_TR4,
        }
    }

    /// Whether the format wraps its chunks in zlib regions.
    #[must_use]
    pub const fn is_compressed(self) -> bool {
        matches!(self, Self::Tr4 | Self::Tr5)
    }
}

impl fmt::Display for GameVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifies the generation of a level from its leading bytes.
///
/// TR4 and TR5 share a tag. They are told apart by what follows the three
/// textile regions: TR5 stores two flag words and 28 zero bytes there,
/// while TR4 goes straight into the geometry region's size header.
pub fn detect(bytes: &[u8]) -> DecodeResult<GameVersion> {
    let tag = Cursor::new(bytes).peek_tag()?;
    if tag == TAG_TR1 {
        Ok(GameVersion::Tr1)
    } else if tag == TAG_TR2 {
        Ok(GameVersion::Tr2)
    } else if tag == TAG_TR3 || tag == TAG_TR3_ALT {
        Ok(GameVersion::Tr3)
    } else if tag == TAG_TR4 {
        detect_tr4_family(bytes)
    } else {
        Err(DecodeError::UnknownFormat { tag })
    }
}

fn detect_tr4_family(bytes: &[u8]) -> DecodeResult<GameVersion> {
    let mut cursor = Cursor::new(bytes);
    cursor.skip(4 + 3 * 2)?;
    for _ in 0..3 {
        let _uncompressed = cursor.read_u32()?;
        let compressed = cursor.read_u32()? as usize;
        cursor.skip(compressed)?;
    }
    let _lara_type = cursor.read_u16()?;
    let _weather = cursor.read_u16()?;
    let padding = cursor.read_bytes(28)?;
    let version = if padding.iter().all(|&b| b == 0) { GameVersion::Tr5 } else { GameVersion::Tr4 };
    tracing::debug!(%version, "told TR4 and TR5 apart");
    Ok(version)
}

/// Runs the decoder for `version` over a cursor positioned at the tag.
pub(crate) fn decode_draft(
    cursor: &mut Cursor<'_>,
    version: GameVersion,
    config: &DecoderConfig,
) -> DecodeResult<LevelDraft> {
    match version {
        GameVersion::Tr1 => tr1::decode(cursor, config),
        GameVersion::Tr2 => tr2::decode(cursor, config),
        GameVersion::Tr3 => tr3::decode(cursor, config),
        GameVersion::Tr4 => tr4::decode(cursor, config),
        GameVersion::Tr5 => tr5::decode(cursor, config),
    }
}
