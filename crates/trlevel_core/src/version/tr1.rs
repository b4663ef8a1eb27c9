//! Tomb Raider (`.PHD`).
//!
//! Textiles come first but are 8-bit indices into a palette stored near the
//! end of the file, so they are converted once the palette has been read.

use super::shared::{
    read_classic_rooms, read_indexed_textiles, read_objects, read_palette8, skip_chunk, AmbientLayout,
    AnimationFormat, ClassicRoomFormat, LIGHTMAP_LEN,
};
use super::{GameVersion, TAG_TR1};
use crate::common::entity::read_entity;
use crate::common::texture::{read_object_texture, read_sprite_sequence, read_sprite_texture, TEXTILE_PIXELS};
use crate::common::{
    AnimationLayout, EntityLayout, FrameLayout, LightLayout, MeshLayout, ObjectTextureLayout, RoomStaticMeshLayout,
    RoomVertexLayout, SectorLayout, TextureMode,
};
use crate::config::DecoderConfig;
use crate::cursor::{CountWidth, Cursor};
use crate::error::DecodeResult;
use crate::level::LevelDraft;

const ROOM: ClassicRoomFormat = ClassicRoomFormat {
    vertex: RoomVertexLayout::Tr1,
    face_texture: TextureMode::Index,
    sector: SectorLayout::Flat,
    ambient: AmbientLayout::Inverted,
    light: LightLayout::Tr1,
    static_mesh: RoomStaticMeshLayout::Tr1,
    environment: false,
};

const ANIMATION: AnimationFormat = AnimationFormat {
    animation: AnimationLayout::Classic,
    frames: FrameLayout::Tr1,
    tr5_moveables: false,
};

const SOUND_MAP_ENTRIES: usize = 256;

pub(super) fn decode(cursor: &mut Cursor<'_>, config: &DecoderConfig) -> DecodeResult<LevelDraft> {
    cursor.expect_bytes(&TAG_TR1, "version")?;
    let mut draft = LevelDraft::new(GameVersion::Tr1);

    let textile_count = cursor.read_count(CountWidth::U32)?;
    let textile_start = cursor.position();
    cursor.skip_records(textile_count, TEXTILE_PIXELS)?;
    cursor.expect_u32(0, "unused")?;

    draft.rooms = read_classic_rooms(cursor, &ROOM, config)?;
    read_objects(cursor, &mut draft, MeshLayout::Classic { with_index16: false }, ANIMATION)?;

    draft.object_textures = cursor.read_seq(CountWidth::U32, |c| read_object_texture(c, ObjectTextureLayout::Classic))?;
    draft.sprite_textures = cursor.read_seq(CountWidth::U32, read_sprite_texture)?;
    draft.sprite_sequences = cursor.read_seq(CountWidth::U32, read_sprite_sequence)?;
    tracing::debug!(
        object_textures = draft.object_textures.len(),
        sprite_textures = draft.sprite_textures.len(),
        "decoded textures"
    );

    // The demo build moved the palette ahead of the cameras.
    let demo_palette = if config.demo_layout { Some(read_palette8(cursor)?) } else { None };

    skip_chunk(cursor, CountWidth::U32, 16, "cameras")?;
    skip_chunk(cursor, CountWidth::U32, 16, "sound sources")?;
    let boxes = skip_chunk(cursor, CountWidth::U32, 20, "boxes")?;
    skip_chunk(cursor, CountWidth::U32, 2, "overlaps")?;
    cursor.skip_records(boxes, 12)?;
    skip_chunk(cursor, CountWidth::U32, 2, "animated textures")?;

    draft.entities = cursor.read_seq(CountWidth::U32, |c| read_entity(c, EntityLayout::Tr1))?;
    tracing::debug!(count = draft.entities.len(), "decoded entities");

    cursor.skip(LIGHTMAP_LEN)?;
    let palette = match demo_palette {
        Some(palette) => palette,
        None => read_palette8(cursor)?,
    };

    skip_chunk(cursor, CountWidth::U16, 16, "cinematic frames")?;
    skip_chunk(cursor, CountWidth::U16, 1, "demo data")?;
    cursor.skip_records(SOUND_MAP_ENTRIES, 2)?;
    skip_chunk(cursor, CountWidth::U32, 8, "sound details")?;
    skip_chunk(cursor, CountWidth::U32, 1, "samples")?;
    skip_chunk(cursor, CountWidth::U32, 4, "sample indices")?;

    let mut raw = cursor.window(textile_start, textile_count * TEXTILE_PIXELS, "textiles")?;
    draft.textiles = read_indexed_textiles(&mut raw, textile_count, &palette)?;
    draft.palette = Some(palette);
    tracing::debug!(count = draft.textiles.len(), "decoded textiles");
    Ok(draft)
}
