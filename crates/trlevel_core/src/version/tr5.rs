//! Chronicles (`.TRC`).
//!
//! Textiles are packed as in TR4, but everything after them is stored
//! uncompressed. Rooms are self-describing blocks: a fixed header followed
//! by sections the header addresses by offset.

use trlevel_math::{BoundingBox, Vec3};

use super::shared::{
    expect_u32_in, read_objects, read_packed_textiles, read_room_count, skip_chunk, AnimationFormat, FILL32,
};
use super::tr4::read_texture_marker;
use super::{GameVersion, TAG_TR4};
use crate::common::color::{read_color, ColorEncoding};
use crate::common::entity::read_entity;
use crate::common::geometry::read_face;
use crate::common::room::{alternate_room, read_portal, read_room_light, read_room_static_mesh, read_room_vertex};
use crate::common::texture::{read_object_texture, read_sprite_sequence, read_sprite_texture};
use crate::common::{
    AnimationLayout, Color, EntityLayout, Face, FaceLayout, FaceShape, FrameLayout, LightLayout, MeshLayout,
    ObjectTextureLayout, Room, RoomLayer, RoomStaticMeshLayout, RoomVertex, RoomVertexLayout, SectorGrid,
    SectorLayout, TextureMode,
};
use crate::config::DecoderConfig;
use crate::cursor::{CountWidth, Cursor};
use crate::error::{DecodeError, DecodeResult};
use crate::level::LevelDraft;

const ANIMATION: AnimationFormat = AnimationFormat {
    animation: AnimationLayout::Extended,
    frames: FrameLayout::Packed { single_axis_units: 4096 },
    tr5_moveables: true,
};

const MAX_MISC_TEXTILES: usize = 3;

const SOUND_MAP_ENTRIES: usize = 450;

/// Leading bytes of every room block.
const ROOM_MAGIC: [u8; 4] = *b"XELA";

/// Size of the fixed room header; section offsets count from its end.
const ROOM_HEADER_LEN: usize = 208;

/// Size of one stored room vertex.
const ROOM_VERTEX_LEN: usize = 28;

/// Shade assigned to TR5 rooms, which light through their vertex colours.
const FULL_AMBIENT: i32 = 0x7FFF;

pub(super) fn decode(cursor: &mut Cursor<'_>, config: &DecoderConfig) -> DecodeResult<LevelDraft> {
    cursor.expect_bytes(&TAG_TR4, "version")?;
    let mut draft = LevelDraft::new(GameVersion::Tr5);
    draft.textiles = read_packed_textiles(cursor, config, MAX_MISC_TEXTILES)?;

    let lara_type = cursor.read_u16()?;
    let weather = cursor.read_u16()?;
    cursor.expect_bytes(&[0; 28], "level flags")?;
    tracing::debug!(lara_type, weather, "level flags");

    // Two copies of the size of the remaining data.
    cursor.skip(8)?;
    cursor.expect_u32(0, "unused")?;

    let room_count = read_room_count(cursor, CountWidth::U32, config)?;
    draft.rooms = cursor.read_n(room_count, read_room)?;
    tracing::debug!(count = room_count, "decoded rooms");

    read_objects(cursor, &mut draft, MeshLayout::Tr4, ANIMATION)?;

    cursor.expect_bytes(b"SPR\0", "sprite marker")?;
    draft.sprite_textures = cursor.read_seq(CountWidth::U32, read_sprite_texture)?;
    draft.sprite_sequences = cursor.read_seq(CountWidth::U32, read_sprite_sequence)?;

    skip_chunk(cursor, CountWidth::U32, 16, "cameras")?;
    skip_chunk(cursor, CountWidth::U32, 40, "flyby cameras")?;
    skip_chunk(cursor, CountWidth::U32, 16, "sound sources")?;
    let boxes = skip_chunk(cursor, CountWidth::U32, 8, "boxes")?;
    skip_chunk(cursor, CountWidth::U32, 2, "overlaps")?;
    cursor.skip_records(boxes, 20)?;
    skip_chunk(cursor, CountWidth::U32, 2, "animated textures")?;

    read_texture_marker(cursor, &[0, 1, 2, 3, 4], b"TEX\0")?;
    draft.object_textures = cursor.read_seq(CountWidth::U32, |c| read_object_texture(c, ObjectTextureLayout::Tr5))?;
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
    Ok(draft)
}

/// Section offsets and counts from the room header.
struct RoomHeader {
    sectors_offset: usize,
    statics_offset: usize,
    position: Vec3,
    y_bottom: f32,
    y_top: f32,
    num_z: u16,
    num_x: u16,
    light_colour: Color,
    num_lights: usize,
    num_static_meshes: usize,
    alternate_room: Option<u16>,
    flags: u16,
    num_triangles: usize,
    num_rectangles: usize,
    num_layers: usize,
    layers_offset: usize,
    vertices_offset: usize,
    polygons_offset: usize,
    vertices_len: usize,
}

fn expect_fill(cursor: &mut Cursor<'_>, count: usize) -> DecodeResult<()> {
    for _ in 0..count {
        cursor.expect_u32(FILL32, "room header")?;
    }
    Ok(())
}

fn expect_separator(cursor: &mut Cursor<'_>) -> DecodeResult<()> {
    expect_u32_in(cursor, &[0, FILL32], "room header").map(|_| ())
}

/// Face counts sometimes hold the fill pattern in place of zero.
fn read_face_count(cursor: &mut Cursor<'_>, what: &'static str) -> DecodeResult<usize> {
    let offset = cursor.offset();
    let raw = cursor.read_u32()?;
    if raw == FILL32 {
        tracing::warn!(offset, what, "face count holds the fill pattern, reading it as zero");
        return Ok(0);
    }
    Ok(raw as usize)
}

#[allow(clippy::cast_precision_loss)]
fn read_room_header(cursor: &mut Cursor<'_>) -> DecodeResult<RoomHeader> {
    expect_fill(cursor, 1)?;
    let _portals_offset = cursor.read_u32()?;
    let sectors_offset = cursor.read_u32()? as usize;
    expect_separator(cursor)?;
    let statics_offset = cursor.read_u32()? as usize;
    let [x, y, z, y_bottom, y_top] = cursor.read_i32_array()?;
    let num_z = cursor.read_u16()?;
    let num_x = cursor.read_u16()?;
    let light_colour = read_color(cursor, ColorEncoding::Bgra8888)?;
    let num_lights = usize::from(cursor.read_u16()?);
    let num_static_meshes = usize::from(cursor.read_u16()?);
    cursor.skip(4)?;
    cursor.expect_u32(0x7FFF, "room header")?;
    cursor.expect_u32(0x7FFF, "room header")?;
    expect_fill(cursor, 2)?;
    cursor.expect_u32(0xFFFF_FFFF, "room header")?;
    let alternate_room = alternate_room(cursor.read_i16()?);
    let flags = cursor.read_u16()?;
    cursor.skip(12)?;
    expect_separator(cursor)?;
    // two unknown halfwords, float room x, an unknown word, float room z
    cursor.skip(16)?;
    expect_fill(cursor, 4)?;
    expect_separator(cursor)?;
    expect_fill(cursor, 1)?;
    let num_triangles = read_face_count(cursor, "triangles")?;
    let num_rectangles = read_face_count(cursor, "rectangles")?;
    cursor.expect_u32(0, "room header")?;
    let _light_data_len = cursor.read_u32()?;
    let offset = cursor.offset();
    let num_lights2 = cursor.read_u32()? as usize;
    if num_lights2 != num_lights {
        return Err(DecodeError::malformed(
            "room header",
            offset,
            format!("light counts disagree: {num_lights} and {num_lights2}"),
        ));
    }
    // unknown word, then float copies of the vertical bounds
    cursor.skip(12)?;
    let num_layers = cursor.read_u32()? as usize;
    let layers_offset = cursor.read_u32()? as usize;
    let vertices_offset = cursor.read_u32()? as usize;
    let offset = cursor.offset();
    let polygons_offset = cursor.read_u32()? as usize;
    let polygons_offset2 = cursor.read_u32()? as usize;
    if polygons_offset != polygons_offset2 {
        return Err(DecodeError::malformed("room header", offset, "polygon offsets disagree"));
    }
    let offset = cursor.offset();
    let vertices_len = cursor.read_u32()? as usize;
    if vertices_len % ROOM_VERTEX_LEN != 0 {
        return Err(DecodeError::malformed(
            "room header",
            offset,
            format!("vertex block of {vertices_len} bytes is not whole vertices"),
        ));
    }
    expect_fill(cursor, 4)?;

    Ok(RoomHeader {
        sectors_offset,
        statics_offset,
        position: Vec3::new(x as f32, y as f32, z as f32),
        y_bottom: y_bottom as f32,
        y_top: y_top as f32,
        num_z,
        num_x,
        light_colour,
        num_lights,
        num_static_meshes,
        alternate_room,
        flags,
        num_triangles,
        num_rectangles,
        num_layers,
        layers_offset,
        vertices_offset,
        polygons_offset,
        vertices_len,
    })
}

fn read_layer(cursor: &mut Cursor<'_>) -> DecodeResult<RoomLayer> {
    let num_vertices = cursor.read_u16()?;
    cursor.skip(4)?;
    let num_rectangles = cursor.read_u16()?;
    let num_triangles = cursor.read_u16()?;
    cursor.skip(4)?;
    cursor.expect_u16(0, "room layer")?;
    let [x1, y1, z1, x2, y2, z2] = cursor.read_f32_array()?;
    cursor.expect_u32(0, "room layer")?;
    cursor.skip(12)?;
    Ok(RoomLayer {
        num_vertices,
        num_rectangles,
        num_triangles,
        bounds: BoundingBox::new(Vec3::new(x1, y1, z1), Vec3::new(x2, y2, z2)),
    })
}

/// Start of a section addressed from the end of the header.
fn section<'a>(data: &'a Cursor<'_>, offset: usize, region: &'static str) -> DecodeResult<Cursor<'a>> {
    data.at(ROOM_HEADER_LEN.saturating_add(offset), region)
}

/// Reads every layer's faces, rebasing vertex indices onto the room's
/// combined vertex list.
fn read_layer_faces(cursor: &mut Cursor<'_>, layers: &[RoomLayer]) -> DecodeResult<(Vec<Face>, Vec<Face>)> {
    let quad = FaceLayout::new(FaceShape::Quad, TextureMode::IndexDoubleSided, true);
    let triangle = FaceLayout::new(FaceShape::Triangle, TextureMode::IndexDoubleSided, true);
    let mut rectangles = Vec::new();
    let mut triangles = Vec::new();
    let mut base = 0u16;
    for layer in layers {
        let offset = cursor.offset();
        let start = rectangles.len();
        rectangles.extend(cursor.read_n(usize::from(layer.num_rectangles), |c| read_face(c, quad))?);
        let tri_start = triangles.len();
        triangles.extend(cursor.read_n(usize::from(layer.num_triangles), |c| read_face(c, triangle))?);
        let end = base
            .checked_add(layer.num_vertices)
            .ok_or_else(|| DecodeError::malformed("room layers", offset, "more than 65535 vertices"))?;
        for face in rectangles[start..].iter_mut().chain(triangles[tri_start..].iter_mut()) {
            face.offset_vertices(base, layer.num_vertices)?;
        }
        base = end;
    }
    Ok((rectangles, triangles))
}

fn read_layer_vertices(cursor: &mut Cursor<'_>, layers: &[RoomLayer]) -> DecodeResult<Vec<RoomVertex>> {
    let mut vertices = Vec::new();
    for layer in layers {
        vertices.extend(cursor.read_n(usize::from(layer.num_vertices), |c| read_room_vertex(c, RoomVertexLayout::Tr5))?);
    }
    Ok(vertices)
}

fn read_room(cursor: &mut Cursor<'_>) -> DecodeResult<Room> {
    cursor.expect_bytes(&ROOM_MAGIC, "room")?;
    let len = cursor.read_u32()? as usize;
    let mut data = cursor.sub_cursor(len, "room data")?;
    let header_offset = data.offset();
    let header = read_room_header(&mut data)?;

    let lights = data.read_n(header.num_lights, |c| read_room_light(c, LightLayout::Tr5))?;

    let mut sectors = section(&data, header.sectors_offset, "room sectors")?;
    let cells = SectorGrid::read_cells(&mut sectors, header.num_z, header.num_x, SectorLayout::WithMaterial)?;
    let portals = sectors.read_seq(CountWidth::U16, read_portal)?;

    let static_meshes = section(&data, header.statics_offset, "room static meshes")?
        .read_n(header.num_static_meshes, |c| read_room_static_mesh(c, RoomStaticMeshLayout::Tr3))?;

    let layers = section(&data, header.layers_offset, "room layers")?.read_n(header.num_layers, read_layer)?;
    let (layer_rectangles, layer_triangles) = layers.iter().fold((0, 0), |(r, t), l| {
        (r + usize::from(l.num_rectangles), t + usize::from(l.num_triangles))
    });
    if layer_rectangles != header.num_rectangles || layer_triangles != header.num_triangles {
        return Err(DecodeError::malformed(
            "room layers",
            header_offset,
            format!(
                "layers hold {layer_rectangles} quads and {layer_triangles} triangles, header says {} and {}",
                header.num_rectangles, header.num_triangles
            ),
        ));
    }
    let layer_vertices: usize = layers.iter().map(|l| usize::from(l.num_vertices)).sum();
    if layer_vertices * ROOM_VERTEX_LEN > header.vertices_len {
        return Err(DecodeError::malformed(
            "room layers",
            header_offset,
            format!("{layer_vertices} vertices overflow a {} byte vertex block", header.vertices_len),
        ));
    }

    let (rectangles, triangles) =
        read_layer_faces(&mut section(&data, header.polygons_offset, "room polygons")?, &layers)?;
    let vertices = read_layer_vertices(&mut section(&data, header.vertices_offset, "room vertices")?, &layers)?;

    Ok(Room {
        position: header.position,
        y_bottom: header.y_bottom,
        y_top: header.y_top,
        vertices,
        rectangles,
        triangles,
        sprites: Vec::new(),
        portals,
        sector_grid: SectorGrid::from_parts(header.num_z, header.num_x, cells),
        ambient: FULL_AMBIENT,
        light_colour: header.light_colour,
        light_mode: None,
        lights,
        static_meshes,
        alternate_room: header.alternate_room,
        flags: header.flags,
        environment: None,
        layers,
    })
}
