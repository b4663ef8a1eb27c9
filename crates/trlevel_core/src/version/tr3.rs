//! Tomb Raider III.
//!
//! Same header as TR2. Object textures moved behind the animated textures,
//! and the lightmap is always present.

use super::shared::{
    read_classic_rooms, read_objects, read_palette16, read_palette8, read_textiles16, skip_chunk, AmbientLayout,
    AnimationFormat, ClassicRoomFormat, LIGHTMAP_LEN,
};
use super::{GameVersion, TAG_TR3, TAG_TR3_ALT};
use crate::common::entity::read_entity;
use crate::common::texture::{read_object_texture, read_sprite_sequence, read_sprite_texture, TEXTILE_PIXELS};
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
    light: LightLayout::Tr2,
    static_mesh: RoomStaticMeshLayout::Tr3,
    environment: true,
};

const ANIMATION: AnimationFormat = AnimationFormat {
    animation: AnimationLayout::Classic,
    frames: FrameLayout::Packed { single_axis_units: 1024 },
    tr5_moveables: false,
};

const SOUND_MAP_ENTRIES: usize = 370;

pub(super) fn decode(cursor: &mut Cursor<'_>, config: &DecoderConfig) -> DecodeResult<LevelDraft> {
    let tag = cursor.read_tag()?;
    if tag != TAG_TR3 && tag != TAG_TR3_ALT {
        return Err(DecodeError::malformed("version", 0, format!("{tag:02x?} is not a TR3 tag")));
    }
    let mut draft = LevelDraft::new(GameVersion::Tr3);

    draft.palette = Some(read_palette8(cursor)?);
    draft.palette16 = Some(read_palette16(cursor)?);

    let textile_count = cursor.read_count(CountWidth::U32)?;
    cursor.skip_records(textile_count, TEXTILE_PIXELS)?;
    draft.textiles = read_textiles16(cursor, textile_count)?;
    tracing::debug!(count = draft.textiles.len(), "decoded textiles");
    cursor.expect_u32(0, "unused")?;

    draft.rooms = read_classic_rooms(cursor, &ROOM, config)?;
    read_objects(cursor, &mut draft, MeshLayout::Tr3, ANIMATION)?;

    draft.sprite_textures = cursor.read_seq(CountWidth::U32, read_sprite_texture)?;
    draft.sprite_sequences = cursor.read_seq(CountWidth::U32, read_sprite_sequence)?;

    skip_chunk(cursor, CountWidth::U32, 16, "cameras")?;
    skip_chunk(cursor, CountWidth::U32, 16, "sound sources")?;
    let boxes = skip_chunk(cursor, CountWidth::U32, 8, "boxes")?;
    skip_chunk(cursor, CountWidth::U32, 2, "overlaps")?;
    cursor.skip_records(boxes, 20)?;
    skip_chunk(cursor, CountWidth::U32, 2, "animated textures")?;

    draft.object_textures = cursor.read_seq(CountWidth::U32, |c| read_object_texture(c, ObjectTextureLayout::Classic))?;
    tracing::debug!(
        object_textures = draft.object_textures.len(),
        sprite_textures = draft.sprite_textures.len(),
        "decoded textures"
    );

    draft.entities = cursor.read_seq(CountWidth::U32, |c| read_entity(c, EntityLayout::Tr3))?;
    tracing::debug!(count = draft.entities.len(), "decoded entities");

    cursor.skip(LIGHTMAP_LEN)?;
    skip_chunk(cursor, CountWidth::U16, 16, "cinematic frames")?;
    skip_chunk(cursor, CountWidth::U16, 1, "demo data")?;
    cursor.skip_records(SOUND_MAP_ENTRIES, 2)?;
    skip_chunk(cursor, CountWidth::U32, 8, "sound details")?;
    skip_chunk(cursor, CountWidth::U32, 4, "sample indices")?;
    Ok(draft)
}
