//! Chunk readers shared by several generations.
//!
//! Everything from the floor data to the static mesh definitions has the
//! same order in all five formats; only record layouts differ. Rooms are
//! shared by TR1-TR4, the packed textile regions by TR4 and TR5.

use trlevel_math::{units, Vec3};

use crate::common::animation::{attach_keyframes, read_anim_dispatch, read_animation, read_state_change};
use crate::common::geometry::read_face;
use crate::common::mesh::{read_mesh, read_mesh_trees, read_moveable, read_static_mesh};
use crate::common::room::{
    alternate_room, read_portal, read_room_light, read_room_sprite, read_room_static_mesh, read_room_vertex,
};
use crate::common::texture::TEXTILE_PIXELS;
use crate::common::{
    AnimationLayout, Color, ColorEncoding, FaceLayout, FaceShape, FrameLayout, LightLayout, Mesh, MeshLayout, Palette,
    Room, RoomEnvironment, RoomStaticMeshLayout, RoomVertexLayout, SectorGrid, SectorLayout, Textile, TextureMode,
};
use crate::config::DecoderConfig;
use crate::cursor::{CountWidth, Cursor};
use crate::error::{DecodeError, DecodeResult};
use crate::level::LevelDraft;

/// Fill pattern the level editor leaves in unused 32-bit fields.
pub(crate) const FILL32: u32 = 0xCDCD_CDCD;

/// Fill pattern in unused 16-bit fields.
pub(crate) const FILL16: u16 = 0xCDCD;

/// Bytes of the precomputed lighting table skipped in TR1-TR3.
pub(crate) const LIGHTMAP_LEN: usize = 32 * 256;

/// Entries in the 8-bit and 16-bit palettes.
pub(crate) const PALETTE_ENTRIES: usize = 256;

/// How the room ambient block is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AmbientLayout {
    /// One inverted shade (TR1)
    Inverted,
    /// Two inverted shades and a light mode (TR2)
    InvertedWithMode,
    /// Two direct shades (TR3, TR4)
    Direct,
}

/// Record layouts that make up a TR1-TR4 room.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ClassicRoomFormat {
    pub(crate) vertex: RoomVertexLayout,
    pub(crate) face_texture: TextureMode,
    pub(crate) sector: SectorLayout,
    pub(crate) ambient: AmbientLayout,
    pub(crate) light: LightLayout,
    pub(crate) static_mesh: RoomStaticMeshLayout,
    pub(crate) environment: bool,
}

/// Record layouts of the animation block.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AnimationFormat {
    pub(crate) animation: AnimationLayout,
    pub(crate) frames: FrameLayout,
    pub(crate) tr5_moveables: bool,
}

/// Skips a counted chunk of fixed-size records the model does not keep.
pub(crate) fn skip_chunk(
    cursor: &mut Cursor<'_>,
    width: CountWidth,
    record_size: usize,
    chunk: &'static str,
) -> DecodeResult<usize> {
    let count = cursor.read_count(width)?;
    cursor.skip_records(count, record_size)?;
    tracing::trace!(chunk, count, "skipped chunk");
    Ok(count)
}

/// Reads a `u32` word count and returns the block length in bytes.
fn word_block_len(cursor: &mut Cursor<'_>, chunk: &'static str) -> DecodeResult<usize> {
    let offset = cursor.offset();
    let words = cursor.read_count(CountWidth::U32)?;
    words
        .checked_mul(2)
        .ok_or_else(|| DecodeError::malformed(chunk, offset, format!("{words} words overflow")))
}

/// Reads a `u16` and fails unless it is one of `accepted`.
pub(crate) fn expect_u16_in(cursor: &mut Cursor<'_>, accepted: &[u16], chunk: &'static str) -> DecodeResult<u16> {
    let offset = cursor.offset();
    let v = cursor.read_u16()?;
    if !accepted.contains(&v) {
        return Err(DecodeError::malformed(chunk, offset, format!("unexpected value {v:#06x}")));
    }
    Ok(v)
}

/// Reads a `u32` and fails unless it is one of `accepted`.
pub(crate) fn expect_u32_in(cursor: &mut Cursor<'_>, accepted: &[u32], chunk: &'static str) -> DecodeResult<u32> {
    let offset = cursor.offset();
    let v = cursor.read_u32()?;
    if !accepted.contains(&v) {
        return Err(DecodeError::malformed(chunk, offset, format!("unexpected value {v:#010x}")));
    }
    Ok(v)
}

/// Reads the room count and enforces the configured ceiling.
pub(crate) fn read_room_count(
    cursor: &mut Cursor<'_>,
    width: CountWidth,
    config: &DecoderConfig,
) -> DecodeResult<usize> {
    let offset = cursor.offset();
    let count = cursor.read_count(width)?;
    if count > config.max_room_count {
        return Err(DecodeError::malformed(
            "rooms",
            offset,
            format!("{count} rooms exceed the limit of {}", config.max_room_count),
        ));
    }
    Ok(count)
}

/// The 256-entry 6-bit palette.
pub(crate) fn read_palette8(cursor: &mut Cursor<'_>) -> DecodeResult<Palette> {
    Palette::read(cursor, PALETTE_ENTRIES, ColorEncoding::Rgb666)
}

/// The 256-entry 8-bit palette of TR2 and TR3.
pub(crate) fn read_palette16(cursor: &mut Cursor<'_>) -> DecodeResult<Palette> {
    Palette::read(cursor, PALETTE_ENTRIES, ColorEncoding::Rgbx8888)
}

/// Converts `count` consecutive 8-bit textiles through `palette`.
pub(crate) fn read_indexed_textiles(
    cursor: &mut Cursor<'_>,
    count: usize,
    palette: &Palette,
) -> DecodeResult<Vec<Textile>> {
    cursor.read_n(count, |c| Textile::from_indexed(c.read_bytes(TEXTILE_PIXELS)?, palette))
}

/// Reads `count` consecutive ARGB1555 textiles.
pub(crate) fn read_textiles16(cursor: &mut Cursor<'_>, count: usize) -> DecodeResult<Vec<Textile>> {
    cursor.read_n(count, |c| Ok(Textile::from_argb1555(c.read_bytes(TEXTILE_PIXELS * 2)?)))
}

/// Reads `count` consecutive BGRA textiles.
pub(crate) fn read_textiles32(cursor: &mut Cursor<'_>, count: usize) -> DecodeResult<Vec<Textile>> {
    cursor.read_n(count, |c| Ok(Textile::from_bgra(c.read_bytes(TEXTILE_PIXELS * 4)?)))
}

/// Inflates a region after checking its declared size against the config.
pub(crate) fn inflate_region(
    cursor: &mut Cursor<'_>,
    uncompressed: usize,
    compressed: usize,
    region: &'static str,
    config: &DecoderConfig,
) -> DecodeResult<Cursor<'static>> {
    if uncompressed > config.max_inflated_bytes {
        return Err(DecodeError::malformed(
            region,
            cursor.offset(),
            format!("declared size {uncompressed} exceeds the limit of {}", config.max_inflated_bytes),
        ));
    }
    cursor.inflate(compressed, uncompressed, region)
}

/// Header of one zlib region: uncompressed then compressed size.
struct RegionHeader {
    offset: usize,
    uncompressed: usize,
    compressed: usize,
}

fn read_region_header(cursor: &mut Cursor<'_>, region: &'static str) -> DecodeResult<RegionHeader> {
    let offset = cursor.offset();
    let uncompressed = cursor.read_u32()? as usize;
    let compressed = cursor.read_u32()? as usize;
    if uncompressed == 0 && compressed > 0 {
        return Err(DecodeError::malformed(region, offset, "region declares zero uncompressed bytes"));
    }
    Ok(RegionHeader { offset, uncompressed, compressed })
}

fn expect_region_size(header: &RegionHeader, expected: usize, region: &'static str) -> DecodeResult<()> {
    if header.uncompressed != expected {
        return Err(DecodeError::malformed(
            region,
            header.offset,
            format!("{} bytes declared, {expected} expected for the textile count", header.uncompressed),
        ));
    }
    Ok(())
}

/// Reads the three packed textile regions of TR4 and TR5.
///
/// The 32-bit region wins when present; the 16-bit copy of the same pages
/// is only inflated when it is the sole source. Misc pages (sky, font) are
/// appended after the main pages.
pub(crate) fn read_packed_textiles(
    cursor: &mut Cursor<'_>,
    config: &DecoderConfig,
    max_misc: usize,
) -> DecodeResult<Vec<Textile>> {
    let room = usize::from(cursor.read_u16()?);
    let object = usize::from(cursor.read_u16()?);
    let bump = usize::from(cursor.read_u16()?);
    let main = room + object + bump;
    tracing::debug!(room, object, bump, "textile counts");

    let mut textiles = Vec::new();

    let header = read_region_header(cursor, "textiles32")?;
    if header.compressed > 0 {
        expect_region_size(&header, main * TEXTILE_PIXELS * 4, "textiles32")?;
        let mut region = inflate_region(cursor, header.uncompressed, header.compressed, "textiles32", config)?;
        textiles = read_textiles32(&mut region, main)?;
    }

    let header = read_region_header(cursor, "textiles16")?;
    if header.compressed > 0 {
        if textiles.is_empty() {
            expect_region_size(&header, main * TEXTILE_PIXELS * 2, "textiles16")?;
            let mut region = inflate_region(cursor, header.uncompressed, header.compressed, "textiles16", config)?;
            textiles = read_textiles16(&mut region, main)?;
        } else {
            cursor.skip(header.compressed)?;
        }
    }

    let header = read_region_header(cursor, "misc textiles")?;
    if header.compressed > 0 {
        let page = TEXTILE_PIXELS * 4;
        let misc = header.uncompressed / page;
        if header.uncompressed % page != 0 || misc > max_misc {
            return Err(DecodeError::malformed(
                "misc textiles",
                header.offset,
                format!("{} bytes is not 1 to {max_misc} whole pages", header.uncompressed),
            ));
        }
        let mut region = inflate_region(cursor, header.uncompressed, header.compressed, "misc textiles", config)?;
        textiles.extend(read_textiles32(&mut region, misc)?);
    }

    tracing::debug!(count = textiles.len(), "decoded textiles");
    Ok(textiles)
}

/// Reads the compressed region holding everything after the textiles (TR4).
pub(crate) fn read_geometry_region(cursor: &mut Cursor<'_>, config: &DecoderConfig) -> DecodeResult<Cursor<'static>> {
    let offset = cursor.offset();
    let uncompressed = cursor.read_u32()? as usize;
    let compressed = cursor.read_u32()? as usize;
    if compressed == 0 {
        return Err(DecodeError::malformed("geometry", offset, "geometry region is empty"));
    }
    inflate_region(cursor, uncompressed, compressed, "geometry", config)
}

/// Decodes one TR1-TR4 room.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn read_classic_room(
    cursor: &mut Cursor<'_>,
    format: &ClassicRoomFormat,
    config: &DecoderConfig,
) -> DecodeResult<Room> {
    let [x, z, y_bottom, y_top] = cursor.read_i32_array()?;
    let data_len = word_block_len(cursor, "room data")?;

    let (vertices, rectangles, triangles, sprites) = {
        let mut data = cursor.sub_cursor(data_len, "room data")?;
        let vertices = data.read_seq(CountWidth::U16, |c| read_room_vertex(c, format.vertex))?;
        let quad = FaceLayout::new(FaceShape::Quad, format.face_texture, false);
        let triangle = FaceLayout::new(FaceShape::Triangle, format.face_texture, false);
        let rectangles = data.read_seq(CountWidth::U16, |c| read_face(c, quad))?;
        let triangles = data.read_seq(CountWidth::U16, |c| read_face(c, triangle))?;
        let sprites = data.read_seq(CountWidth::U16, read_room_sprite)?;
        if !config.allow_trailing_room_data {
            data.expect_end("room data")?;
        }
        (vertices, rectangles, triangles, sprites)
    };

    let portals = cursor.read_seq(CountWidth::U16, read_portal)?;
    let sector_grid = SectorGrid::read(cursor, format.sector)?;

    let (ambient, light_mode) = match format.ambient {
        AmbientLayout::Inverted => (units::invert_shade(cursor.read_i16()?), None),
        AmbientLayout::InvertedWithMode => {
            let ambient = units::invert_shade(cursor.read_i16()?);
            cursor.skip(2)?;
            (ambient, Some(cursor.read_i16()?))
        }
        AmbientLayout::Direct => {
            let ambient = i32::from(cursor.read_i16()?);
            cursor.skip(2)?;
            (ambient, None)
        }
    };

    let lights = cursor.read_seq(CountWidth::U16, |c| read_room_light(c, format.light))?;
    let static_meshes = cursor.read_seq(CountWidth::U16, |c| read_room_static_mesh(c, format.static_mesh))?;
    let alternate_room = alternate_room(cursor.read_i16()?);
    let flags = cursor.read_u16()?;
    let environment = if format.environment {
        Some(RoomEnvironment {
            water_scheme: cursor.read_u8()?,
            reverb: cursor.read_u8()?,
            alternate_group: cursor.read_u8()?,
        })
    } else {
        None
    };

    Ok(Room {
        position: Vec3::new(x as f32, 0.0, z as f32),
        y_bottom: y_bottom as f32,
        y_top: y_top as f32,
        vertices,
        rectangles,
        triangles,
        sprites,
        portals,
        sector_grid,
        ambient,
        light_colour: Color::from_shade(ambient),
        light_mode,
        lights,
        static_meshes,
        alternate_room,
        flags,
        environment,
        layers: Vec::new(),
    })
}

/// Reads the `u16`-counted room list of TR1-TR4.
pub(crate) fn read_classic_rooms(
    cursor: &mut Cursor<'_>,
    format: &ClassicRoomFormat,
    config: &DecoderConfig,
) -> DecodeResult<Vec<Room>> {
    let count = read_room_count(cursor, CountWidth::U16, config)?;
    let rooms = cursor.read_n(count, |c| read_classic_room(c, format, config))?;
    tracing::debug!(count, "decoded rooms");
    Ok(rooms)
}

/// Reads the mesh buffer and pointer table.
///
/// Pointers are byte offsets into the buffer, and several may share one
/// mesh. Each distinct offset is decoded once; the returned table maps
/// every pointer to its mesh index.
pub(crate) fn read_mesh_data(cursor: &mut Cursor<'_>, layout: MeshLayout) -> DecodeResult<(Vec<Mesh>, Vec<u32>)> {
    let len = word_block_len(cursor, "mesh data")?;
    let start = cursor.position();
    cursor.skip(len)?;
    let offsets = cursor.read_seq(CountWidth::U32, Cursor::read_u32)?;
    let data = cursor.window(start, len, "mesh data")?;

    let mut unique = offsets.clone();
    unique.sort_unstable();
    unique.dedup();

    let meshes = unique
        .iter()
        .map(|&offset| read_mesh(&mut data.at(offset as usize, "mesh")?, layout))
        .collect::<DecodeResult<Vec<_>>>()?;

    #[allow(clippy::cast_possible_truncation)]
    let pointers = offsets.iter().map(|o| unique.partition_point(|u| u < o) as u32).collect();
    Ok((meshes, pointers))
}

/// Reads floor data through static mesh definitions into `draft`.
pub(crate) fn read_objects(
    cursor: &mut Cursor<'_>,
    draft: &mut LevelDraft,
    mesh: MeshLayout,
    format: AnimationFormat,
) -> DecodeResult<()> {
    draft.floor_data = cursor.read_seq(CountWidth::U32, Cursor::read_u16)?;
    tracing::debug!(words = draft.floor_data.len(), "decoded floor data");

    let (meshes, pointers) = read_mesh_data(cursor, mesh)?;
    tracing::debug!(meshes = meshes.len(), pointers = pointers.len(), "decoded meshes");
    draft.meshes = meshes;
    draft.mesh_pointers = pointers;

    draft.animations = cursor.read_seq(CountWidth::U32, |c| read_animation(c, format.animation))?;
    draft.state_changes = cursor.read_seq(CountWidth::U32, read_state_change)?;
    draft.anim_dispatches = cursor.read_seq(CountWidth::U32, read_anim_dispatch)?;
    draft.anim_commands = cursor.read_seq(CountWidth::U32, Cursor::read_i16)?;
    draft.mesh_trees = read_mesh_trees(cursor)?;

    let frames_len = word_block_len(cursor, "frames")?;
    let frames_start = cursor.position();
    cursor.skip(frames_len)?;
    draft.moveables = cursor.read_seq(CountWidth::U32, |c| read_moveable(c, format.tr5_moveables))?;
    let frames = cursor.window(frames_start, frames_len, "frames")?;
    attach_keyframes(&mut draft.animations, &draft.moveables, &frames, format.frames)?;
    tracing::debug!(
        animations = draft.animations.len(),
        moveables = draft.moveables.len(),
        frame_bytes = frames_len,
        "decoded animation block"
    );

    draft.static_meshes = cursor.read_seq(CountWidth::U32, read_static_mesh)?;
    tracing::debug!(count = draft.static_meshes.len(), "decoded static meshes");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::FaceTexture;

    fn le16(values: &[i16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    const TR1_ROOM: ClassicRoomFormat = ClassicRoomFormat {
        vertex: RoomVertexLayout::Tr1,
        face_texture: TextureMode::Index,
        sector: SectorLayout::Flat,
        ambient: AmbientLayout::Inverted,
        light: LightLayout::Tr1,
        static_mesh: RoomStaticMeshLayout::Tr1,
        environment: false,
    };

    fn minimal_room(data: &[u8]) -> Vec<u8> {
        let mut b: Vec<u8> = [2048i32, 4096, 0, -1024].iter().flat_map(|v| v.to_le_bytes()).collect();
        b.extend_from_slice(&u32::try_from(data.len() / 2).unwrap().to_le_bytes());
        b.extend_from_slice(data);
        // portals, 1x1 sector grid, ambient, lights, statics, alternate, flags
        b.extend(le16(&[0, 1, 1]));
        b.extend_from_slice(&[0, 0, 0xFF, 0xFF, 0xFF, 0, 0xFF, 0]);
        b.extend(le16(&[8191, 0, 0, -1, 1]));
        b
    }

    #[test]
    fn test_classic_room() {
        // one vertex, one quad, no triangles, no sprites
        let mut data = le16(&[1, 10, 20, 30, 0]);
        data.extend(le16(&[1, 0, 0, 0, 0, 5, 0, 0]));
        let bytes = minimal_room(&data);
        let mut c = Cursor::new(&bytes);
        let room = read_classic_room(&mut c, &TR1_ROOM, &DecoderConfig::default()).unwrap();
        assert_eq!(c.remaining(), 0);
        assert_eq!(room.position, Vec3::new(2048.0, 0.0, 4096.0));
        assert_eq!(room.vertices.len(), 1);
        assert_eq!(room.rectangles[0].texture, FaceTexture::Textured { index: 5, double_sided: false });
        assert_eq!(room.ambient, 0);
        assert_eq!(room.alternate_room, None);
        assert!(room.is_water());
        assert_eq!(room.sector_grid.sectors().len(), 1);
    }

    #[test]
    fn test_room_data_must_be_consumed() {
        let data = le16(&[0, 0, 0, 0, 0x7777]);
        let bytes = minimal_room(&data);
        assert!(matches!(
            read_classic_room(&mut Cursor::new(&bytes), &TR1_ROOM, &DecoderConfig::default()),
            Err(DecodeError::MalformedChunk { chunk: "room data", .. })
        ));
        let lenient = DecoderConfig { allow_trailing_room_data: true, ..DecoderConfig::default() };
        assert!(read_classic_room(&mut Cursor::new(&bytes), &TR1_ROOM, &lenient).is_ok());
    }

    #[test]
    fn test_room_count_limit() {
        let bytes = 5u16.to_le_bytes();
        let config = DecoderConfig { max_room_count: 4, ..DecoderConfig::default() };
        assert!(matches!(
            read_room_count(&mut Cursor::new(&bytes), CountWidth::U16, &config),
            Err(DecodeError::MalformedChunk { chunk: "rooms", offset: 0, .. })
        ));
    }

    fn empty_mesh() -> Vec<u8> {
        let mut b = le16(&[0, 0, 0]);
        b.extend_from_slice(&0i32.to_le_bytes());
        b.extend(le16(&[0, 0, 0, 0, 0, 0]));
        b
    }

    #[test]
    fn test_shared_mesh_pointers() {
        let mesh = empty_mesh();
        // two meshes of mesh.len() bytes make mesh.len() words
        let words = u32::try_from(mesh.len()).unwrap();
        let mut bytes = words.to_le_bytes().to_vec();
        bytes.extend(&mesh);
        bytes.extend(&mesh);
        let second = u32::try_from(mesh.len()).unwrap();
        bytes.extend_from_slice(&3u32.to_le_bytes());
        for p in [second, 0, second] {
            bytes.extend_from_slice(&p.to_le_bytes());
        }
        let mut c = Cursor::new(&bytes);
        let (meshes, pointers) = read_mesh_data(&mut c, MeshLayout::Classic { with_index16: false }).unwrap();
        assert_eq!(c.remaining(), 0);
        assert_eq!(meshes.len(), 2);
        assert_eq!(pointers, vec![1, 0, 1]);
    }

    #[test]
    fn test_mesh_pointer_past_buffer() {
        let mut bytes = 0u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&8u32.to_le_bytes());
        assert!(matches!(
            read_mesh_data(&mut Cursor::new(&bytes), MeshLayout::Tr4),
            Err(DecodeError::MalformedChunk { chunk: "mesh", .. })
        ));
    }

    #[test]
    fn test_expect_in() {
        let bytes = [0xCD, 0xCD, 1, 0];
        let mut c = Cursor::new(&bytes);
        assert_eq!(expect_u16_in(&mut c, &[0, FILL16], "filler").unwrap(), FILL16);
        assert!(expect_u16_in(&mut c, &[0, FILL16], "filler").is_err());
    }

    #[test]
    fn test_inflate_limit() {
        let bytes = [0u8; 4];
        let config = DecoderConfig { max_inflated_bytes: 16, ..DecoderConfig::default() };
        assert!(matches!(
            inflate_region(&mut Cursor::new(&bytes), 17, 4, "geometry", &config),
            Err(DecodeError::MalformedChunk { chunk: "geometry", .. })
        ));
    }
}
