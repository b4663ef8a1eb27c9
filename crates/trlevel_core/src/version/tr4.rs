//! The Last Revelation (`.TR4`).
//!
//! Three zlib regions of textiles, then one zlib region holding every other
//! chunk. Sound samples follow the geometry region uncompressed; they are
//! bounds-checked and skipped.

use super::shared::{
    expect_u16_in, read_classic_rooms, read_geometry_region, read_objects, read_packed_textiles, skip_chunk,
    AmbientLayout, AnimationFormat, ClassicRoomFormat, FILL16,
};
use super::{GameVersion, TAG_TR4};
use crate::common::entity::read_entity;
use crate::common::texture::{read_object_texture, read_sprite_sequence, read_sprite_texture};
use crate::common::{
    AnimationLayout, EntityLayout, FrameLayout, LightLayout, MeshLayout, ObjectTextureLayout, RoomStaticMeshLayout,
    RoomVertexLayout, SectorLayout, TextureMode,
};
use crate::config::DecoderConfig;
use crate::cursor::{CountWidth, Cursor};
use crate::error::{DecodeError, DecodeResult};
use crate::level::LevelDraft;

const ROOM: ClassicRoomFormat = ClassicRoomFormat {
    vertex: RoomVertexLayout::Tr3,
    face_texture: TextureMode::IndexDoubleSided,
    sector: SectorLayout::WithMaterial,
    ambient: AmbientLayout::Direct,
    light: LightLayout::Tr4,
    static_mesh: RoomStaticMeshLayout::Tr3,
    environment: true,
};

const ANIMATION: AnimationFormat = AnimationFormat {
    animation: AnimationLayout::Extended,
    frames: FrameLayout::Packed { single_axis_units: 4096 },
    tr5_moveables: false,
};

/// Textile pages the misc region may hold.
const MAX_MISC_TEXTILES: usize = 2;

const SOUND_MAP_ENTRIES: usize = 370;

/// Reads the byte ahead of the texture marker and checks it is one of
/// `accepted`.
pub(super) fn read_texture_marker(cursor: &mut Cursor<'_>, accepted: &[u8], marker: &[u8]) -> DecodeResult<()> {
    let offset = cursor.offset();
    let lead = cursor.read_u8()?;
    if !accepted.contains(&lead) {
        return Err(DecodeError::malformed("texture marker", offset, format!("unexpected lead byte {lead}")));
    }
    cursor.expect_bytes(marker, "texture marker")
}

pub(super) fn decode(cursor: &mut Cursor<'_>, config: &DecoderConfig) -> DecodeResult<LevelDraft> {
    cursor.expect_bytes(&TAG_TR4, "version")?;
    let mut draft = LevelDraft::new(GameVersion::Tr4);
    draft.textiles = read_packed_textiles(cursor, config, MAX_MISC_TEXTILES)?;

    let mut geometry = read_geometry_region(cursor, config)?;
    decode_geometry(&mut geometry, &mut draft, config)?;
    let samples = skip_samples(cursor)?;
    tracing::trace!(samples, "skipped sound samples");
    Ok(draft)
}

/// Skips the trailing sample chunk: a count, then per sample its
/// uncompressed size, stored size and stored bytes.
fn skip_samples(cursor: &mut Cursor<'_>) -> DecodeResult<usize> {
    let count = cursor.read_u32()? as usize;
    for _ in 0..count {
        let _uncompressed = cursor.read_u32()?;
        let stored = cursor.read_u32()? as usize;
        cursor.skip(stored)?;
    }
    Ok(count)
}

fn decode_geometry(cursor: &mut Cursor<'_>, draft: &mut LevelDraft, config: &DecoderConfig) -> DecodeResult<()> {
    cursor.expect_u32(0, "unused")?;
    draft.rooms = read_classic_rooms(cursor, &ROOM, config)?;
    read_objects(cursor, draft, MeshLayout::Tr4, ANIMATION)?;

    cursor.expect_bytes(b"SPR", "sprite marker")?;
    draft.sprite_textures = cursor.read_seq(CountWidth::U32, read_sprite_texture)?;
    draft.sprite_sequences = cursor.read_seq(CountWidth::U32, read_sprite_sequence)?;

    skip_chunk(cursor, CountWidth::U32, 16, "cameras")?;
    skip_chunk(cursor, CountWidth::U32, 40, "flyby cameras")?;
    skip_chunk(cursor, CountWidth::U32, 16, "sound sources")?;
    let boxes = skip_chunk(cursor, CountWidth::U32, 8, "boxes")?;
    skip_chunk(cursor, CountWidth::U32, 2, "overlaps")?;
    cursor.skip_records(boxes, 20)?;
    skip_chunk(cursor, CountWidth::U32, 2, "animated textures")?;

    read_texture_marker(cursor, &[0, 1, 2, 4], b"TEX")?;
    draft.object_textures = cursor.read_seq(CountWidth::U32, |c| read_object_texture(c, ObjectTextureLayout::Tr4))?;
    tracing::debug!(
        object_textures = draft.object_textures.len(),
        sprite_textures = draft.sprite_textures.len(),
        "decoded textures"
    );

    draft.entities = cursor.read_seq(CountWidth::U32, |c| read_entity(c, EntityLayout::Tr4))?;
    tracing::debug!(count = draft.entities.len(), "decoded entities");

    skip_chunk(cursor, CountWidth::U32, 24, "ai objects")?;
    skip_chunk(cursor, CountWidth::U16, 1, "demo data")?;
    cursor.skip_records(SOUND_MAP_ENTRIES, 2)?;
    skip_chunk(cursor, CountWidth::U32, 8, "sound details")?;
    skip_chunk(cursor, CountWidth::U32, 4, "sample indices")?;
    for _ in 0..3 {
        expect_u16_in(cursor, &[0, FILL16], "geometry filler")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_are_skipped() {
        let mut bytes = Vec::new();
        bytes.extend(2u32.to_le_bytes());
        bytes.extend(100u32.to_le_bytes());
        bytes.extend(3u32.to_le_bytes());
        bytes.extend([1, 2, 3]);
        bytes.extend(50u32.to_le_bytes());
        bytes.extend(0u32.to_le_bytes());
        let mut c = Cursor::new(&bytes);
        assert_eq!(skip_samples(&mut c).unwrap(), 2);
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn test_truncated_sample_is_eof() {
        let mut bytes = Vec::new();
        bytes.extend(1u32.to_le_bytes());
        bytes.extend(100u32.to_le_bytes());
        bytes.extend(8u32.to_le_bytes());
        bytes.extend([0; 7]);
        assert!(matches!(skip_samples(&mut Cursor::new(&bytes)), Err(DecodeError::UnexpectedEof { .. })));
        assert!(matches!(skip_samples(&mut Cursor::new(&[0, 0])), Err(DecodeError::UnexpectedEof { .. })));
    }
}
