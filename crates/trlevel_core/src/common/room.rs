//! Rooms and their parts.
//!
//! Room records are the most version-dependent part of a level. The pieces
//! that every generation shares (portals, sectors, sprites, static mesh
//! placements) decode here; the overall record order lives with each
//! version decoder.

use serde::{Deserialize, Serialize};
use trlevel_math::{units, BoundingBox, Vec3};

use super::color::{read_color, Color, ColorEncoding};
use super::geometry::{read_vertex_f32, read_vertex_i16, read_vertex_i32, Face};
use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};

/// Portal target meaning "no adjacent room".
pub const NO_ROOM: u16 = 0xFFFF;

/// Sector link meaning "no room above/below".
pub const NO_SECTOR_ROOM: u8 = 0xFF;

/// Room flag: the room is filled with water.
pub const ROOM_FLAG_WATER: u16 = 0x0001;

/// A room-space vertex with its lighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomVertex {
    /// Position relative to the room origin
    pub position: Vec3,
    /// Brightness on the direct 0..=32767 scale
    pub shade: i32,
    /// Attribute bits (water ripple, glow, ...); zero for TR1
    pub attributes: u16,
    /// Normalised vertex colour
    pub colour: Color,
    /// Vertex normal; TR5 only
    pub normal: Option<Vec3>,
}

/// Record layout of room vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomVertexLayout {
    /// Position and one inverted shade
    Tr1,
    /// Position, inverted shade, attributes, second inverted shade
    Tr2,
    /// Position, direct shade, attributes, 15-bit colour (TR3 and TR4)
    Tr3,
    /// Float position, float normal, BGRA colour
    Tr5,
}

/// Decodes one room vertex.
pub fn read_room_vertex(cursor: &mut Cursor<'_>, layout: RoomVertexLayout) -> DecodeResult<RoomVertex> {
    Ok(match layout {
        RoomVertexLayout::Tr1 => {
            let position = read_vertex_i16(cursor)?;
            let shade = units::invert_shade(cursor.read_i16()?);
            RoomVertex { position, shade, attributes: 0, colour: Color::from_shade(shade), normal: None }
        }
        RoomVertexLayout::Tr2 => {
            let position = read_vertex_i16(cursor)?;
            let shade = units::invert_shade(cursor.read_i16()?);
            let attributes = cursor.read_u16()?;
            cursor.skip(2)?;
            RoomVertex { position, shade, attributes, colour: Color::from_shade(shade), normal: None }
        }
        RoomVertexLayout::Tr3 => {
            let position = read_vertex_i16(cursor)?;
            let shade = i32::from(cursor.read_i16()?);
            let attributes = cursor.read_u16()?;
            let colour = read_color(cursor, ColorEncoding::Rgb555)?;
            RoomVertex { position, shade, attributes, colour, normal: None }
        }
        RoomVertexLayout::Tr5 => {
            let position = read_vertex_f32(cursor)?;
            let normal = read_vertex_f32(cursor)?;
            let colour = read_color(cursor, ColorEncoding::Bgra8888)?;
            RoomVertex { position, shade: 0x7FFF, attributes: 0, colour, normal: Some(normal) }
        }
    })
}

/// A billboard placed at a room vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomSprite {
    /// Room vertex the sprite sits on
    pub vertex: u16,
    /// Sprite texture index
    pub texture: u16,
}

/// Decodes a room sprite. Both indices are stored signed and must not be negative.
pub fn read_room_sprite(cursor: &mut Cursor<'_>) -> DecodeResult<RoomSprite> {
    let offset = cursor.offset();
    let vertex = cursor.read_i16()?;
    let texture = cursor.read_i16()?;
    match (u16::try_from(vertex), u16::try_from(texture)) {
        (Ok(vertex), Ok(texture)) => Ok(RoomSprite { vertex, texture }),
        _ => Err(DecodeError::malformed(
            "room sprite",
            offset,
            format!("negative index (vertex {vertex}, texture {texture})"),
        )),
    }
}

/// An opening into an adjacent room.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Portal {
    /// Room on the other side, or [`NO_ROOM`]
    pub adjoining_room: u16,
    /// Axis-aligned unit normal, pointing into this room
    pub normal: Vec3,
    /// Corners in room space
    pub vertices: [Vec3; 4],
}

/// Decodes a portal and checks its normal.
pub fn read_portal(cursor: &mut Cursor<'_>) -> DecodeResult<Portal> {
    let adjoining_room = cursor.read_u16()?;
    let normal_offset = cursor.offset();
    let normal = read_vertex_i16(cursor)?;
    if !normal.is_axis_unit() {
        return Err(DecodeError::malformed(
            "portal",
            normal_offset,
            format!("normal ({}, {}, {}) is not an axis-aligned unit vector", normal.x, normal.y, normal.z),
        ));
    }
    let mut vertices = [Vec3::ZERO; 4];
    for v in &mut vertices {
        *v = read_vertex_i16(cursor)?;
    }
    Ok(Portal { adjoining_room, normal, vertices })
}

/// Record layout of sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectorLayout {
    /// Plain box index (TR1, TR2)
    Flat,
    /// Box index in bits 4..=14, footstep material in bits 0..=3 (TR3+)
    WithMaterial,
}

/// One cell of a room's floor grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sector {
    /// Index into the level's floor data
    pub floor_data_index: u16,
    /// Pathfinding box, if any
    pub box_index: Option<u16>,
    /// Footstep material; TR3 on
    pub material: Option<u8>,
    /// Room below, if any
    pub room_below: Option<u8>,
    /// Floor height in clicks
    pub floor: i8,
    /// Room above, if any
    pub room_above: Option<u8>,
    /// Ceiling height in clicks
    pub ceiling: i8,
}

impl Sector {
    /// Floor height in world units.
    #[must_use]
    pub fn floor_height(&self) -> f32 {
        units::clicks_to_world(self.floor)
    }

    /// Ceiling height in world units.
    #[must_use]
    pub fn ceiling_height(&self) -> f32 {
        units::clicks_to_world(self.ceiling)
    }
}

fn room_link(v: u8) -> Option<u8> {
    (v != NO_SECTOR_ROOM).then_some(v)
}

/// Decodes one sector.
pub fn read_sector(cursor: &mut Cursor<'_>, layout: SectorLayout) -> DecodeResult<Sector> {
    let floor_data_index = cursor.read_u16()?;
    let raw_box = cursor.read_u16()?;
    let (box_index, material) = match layout {
        SectorLayout::Flat => ((raw_box != 0xFFFF).then_some(raw_box), None),
        SectorLayout::WithMaterial => {
            let b = (raw_box >> 4) & 0x07FF;
            #[allow(clippy::cast_possible_truncation)]
            let material = (raw_box & 0x000F) as u8;
            ((b != 0x07FF).then_some(b), Some(material))
        }
    };
    Ok(Sector {
        floor_data_index,
        box_index,
        material,
        room_below: room_link(cursor.read_u8()?),
        floor: cursor.read_i8()?,
        room_above: room_link(cursor.read_u8()?),
        ceiling: cursor.read_i8()?,
    })
}

/// The floor grid of a room, stored column by column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SectorGrid {
    /// Sectors along Z
    pub width_z: u16,
    /// Sectors along X
    pub width_x: u16,
    sectors: Vec<Sector>,
}

impl SectorGrid {
    /// Reads the two dimensions then `width_z * width_x` sectors.
    pub fn read(cursor: &mut Cursor<'_>, layout: SectorLayout) -> DecodeResult<Self> {
        let width_z = cursor.read_u16()?;
        let width_x = cursor.read_u16()?;
        let sectors = Self::read_cells(cursor, width_z, width_x, layout)?;
        Ok(Self { width_z, width_x, sectors })
    }

    /// Reads the cells of a grid whose dimensions are already known.
    pub fn read_cells(
        cursor: &mut Cursor<'_>,
        width_z: u16,
        width_x: u16,
        layout: SectorLayout,
    ) -> DecodeResult<Vec<Sector>> {
        let count = usize::from(width_z) * usize::from(width_x);
        cursor.read_n(count, |c| read_sector(c, layout))
    }

    /// Assembles a grid; the cell count must match the dimensions.
    pub(crate) fn from_parts(width_z: u16, width_x: u16, sectors: Vec<Sector>) -> Self {
        debug_assert_eq!(sectors.len(), usize::from(width_z) * usize::from(width_x));
        Self { width_z, width_x, sectors }
    }

    /// Sector at grid column `x`, row `z`.
    #[must_use]
    pub fn get(&self, x: u16, z: u16) -> Option<&Sector> {
        if x >= self.width_x || z >= self.width_z {
            return None;
        }
        self.sectors.get(usize::from(x) * usize::from(self.width_z) + usize::from(z))
    }

    /// All sectors in storage order.
    #[must_use]
    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }
}

/// What kind of light source a room light is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightKind {
    /// Directional
    Sun,
    /// Omni point light
    Point,
    /// Cone light
    Spot,
    /// Negative light
    Shadow,
    /// Volumetric fog bulb
    Fog,
    /// A type value not documented for the format
    Other(u8),
}

impl LightKind {
    fn from_type(t: u8) -> Self {
        match t {
            0 => Self::Sun,
            1 => Self::Point,
            2 => Self::Spot,
            3 => Self::Shadow,
            4 => Self::Fog,
            other => Self::Other(other),
        }
    }
}

/// A room light source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomLight {
    /// Kind of source
    pub kind: LightKind,
    /// World position
    pub position: Vec3,
    /// Light colour (grey before TR4)
    pub colour: Color,
    /// Intensity in the format's own scale
    pub intensity: i32,
    /// Inner and outer falloff radii
    pub falloff: [f32; 2],
    /// Direction for suns and spots
    pub direction: Option<Vec3>,
    /// Spot cone: length and cutoff
    pub cone: Option<[f32; 2]>,
}

/// Record layout of room lights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightLayout {
    /// 18 bytes
    Tr1,
    /// 24 bytes, TR2 and TR3
    Tr2,
    /// 46 bytes
    Tr4,
    /// 88 bytes
    Tr5,
}

/// Decodes one room light.
#[allow(clippy::cast_precision_loss)]
pub fn read_room_light(cursor: &mut Cursor<'_>, layout: LightLayout) -> DecodeResult<RoomLight> {
    match layout {
        LightLayout::Tr1 | LightLayout::Tr2 => {
            let position = read_vertex_i32(cursor)?;
            let raw = cursor.read_u16()?;
            let intensity = if layout == LightLayout::Tr1 {
                units::invert_shade(i16::try_from(raw).unwrap_or(units::MAX_INVERTED_SHADE))
            } else {
                cursor.skip(2)?;
                i32::from(raw)
            };
            let fade = cursor.read_u32()?;
            if layout == LightLayout::Tr2 {
                cursor.skip(4)?;
            }
            Ok(RoomLight {
                kind: LightKind::Point,
                position,
                colour: Color::from_shade(intensity),
                intensity,
                falloff: [0.0, fade as f32],
                direction: None,
                cone: None,
            })
        }
        LightLayout::Tr4 => {
            let position = read_vertex_i32(cursor)?;
            let [r, g, b] = cursor.read_array()?;
            let kind = LightKind::from_type(cursor.read_u8()?);
            cursor.skip(1)?;
            let intensity = i32::from(cursor.read_u8()?);
            let falloff = cursor.read_f32_array::<2>()?;
            let cone = cursor.read_f32_array::<2>()?;
            let direction = read_vertex_f32(cursor)?;
            Ok(RoomLight {
                kind,
                position,
                colour: Color::rgba(r, g, b, 255),
                intensity,
                falloff,
                direction: matches!(kind, LightKind::Sun | LightKind::Spot).then_some(direction),
                cone: (kind == LightKind::Spot).then_some(cone),
            })
        }
        LightLayout::Tr5 => {
            let position = read_vertex_f32(cursor)?;
            let rgb = cursor.read_f32_array::<3>()?;
            cursor.skip(4)?;
            let cone = cursor.read_f32_array::<2>()?;
            let falloff = cursor.read_f32_array::<2>()?;
            let _range = cursor.read_f32()?;
            let direction = read_vertex_f32(cursor)?;
            // Integer copies of position and direction.
            cursor.skip(24)?;
            let kind = LightKind::from_type(cursor.read_u8()?);
            cursor.skip(3)?;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            Ok(RoomLight {
                kind,
                position,
                colour: Color::rgba(channel(rgb[0]), channel(rgb[1]), channel(rgb[2]), 255),
                intensity: 0x7FFF,
                falloff,
                direction: matches!(kind, LightKind::Sun | LightKind::Spot).then_some(direction),
                cone: (kind == LightKind::Spot).then_some(cone),
            })
        }
    }
}

/// A static mesh placed in a room.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomStaticMesh {
    /// World position
    pub position: Vec3,
    /// Raw 16-bit yaw
    pub rotation: u16,
    /// Tint intensity on the direct scale; `None` means "use room light"
    pub intensity: Option<i32>,
    /// Static mesh object id
    pub object_id: u16,
}

impl RoomStaticMesh {
    /// Yaw in degrees.
    #[must_use]
    pub fn rotation_degrees(&self) -> f32 {
        units::angle_to_degrees(self.rotation)
    }
}

/// Record layout of room static meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStaticMeshLayout {
    /// One inverted intensity, 18 bytes
    Tr1,
    /// Two inverted intensities, 20 bytes
    Tr2,
    /// Two direct intensities, 20 bytes (TR3 on)
    Tr3,
}

fn shade(raw: i16, inverted: bool) -> Option<i32> {
    match (raw >= 0, inverted) {
        (false, _) => None,
        (true, true) => Some(units::invert_shade(raw)),
        (true, false) => Some(i32::from(raw)),
    }
}

/// Decodes one room static mesh.
pub fn read_room_static_mesh(cursor: &mut Cursor<'_>, layout: RoomStaticMeshLayout) -> DecodeResult<RoomStaticMesh> {
    let position = read_vertex_i32(cursor)?;
    let rotation = cursor.read_u16()?;
    let raw = cursor.read_i16()?;
    if layout != RoomStaticMeshLayout::Tr1 {
        cursor.skip(2)?;
    }
    let intensity = shade(raw, layout != RoomStaticMeshLayout::Tr3);
    let object_id = cursor.read_u16()?;
    Ok(RoomStaticMesh { position, rotation, intensity, object_id })
}

/// Per-room environment bytes from TR3 on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomEnvironment {
    /// Water tint / caustics scheme
    pub water_scheme: u8,
    /// Reverb preset
    pub reverb: u8,
    /// Alternate room group
    pub alternate_group: u8,
}

/// A TR5 geometry layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomLayer {
    /// Vertices in this layer
    pub num_vertices: u16,
    /// Quads in this layer
    pub num_rectangles: u16,
    /// Triangles in this layer
    pub num_triangles: u16,
    /// Layer bounds
    pub bounds: BoundingBox,
}

/// A convex cell of the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// World-space origin; y is zero before TR5
    pub position: Vec3,
    /// Lowest floor
    pub y_bottom: f32,
    /// Highest ceiling
    pub y_top: f32,
    /// Vertices relative to `position`
    pub vertices: Vec<RoomVertex>,
    /// Quads
    pub rectangles: Vec<Face>,
    /// Triangles
    pub triangles: Vec<Face>,
    /// Sprites
    pub sprites: Vec<RoomSprite>,
    /// Openings to other rooms
    pub portals: Vec<Portal>,
    /// Floor grid
    pub sector_grid: SectorGrid,
    /// Ambient shade on the direct scale
    pub ambient: i32,
    /// Ambient light colour
    pub light_colour: Color,
    /// TR2 light mode
    pub light_mode: Option<i16>,
    /// Light sources
    pub lights: Vec<RoomLight>,
    /// Static mesh placements
    pub static_meshes: Vec<RoomStaticMesh>,
    /// Room swapped in when the alternate state is active
    pub alternate_room: Option<u16>,
    /// Flag bits
    pub flags: u16,
    /// TR3+ environment bytes
    pub environment: Option<RoomEnvironment>,
    /// TR5 geometry layers
    pub layers: Vec<RoomLayer>,
}

impl Room {
    /// Whether the room is under water.
    #[must_use]
    pub fn is_water(&self) -> bool {
        self.flags & ROOM_FLAG_WATER != 0
    }

    /// All faces, quads first.
    pub fn faces(&self) -> impl Iterator<Item = &Face> {
        self.rectangles.iter().chain(self.triangles.iter())
    }

    /// Room vertex in world space.
    #[must_use]
    pub fn world_vertex(&self, index: usize) -> Option<Vec3> {
        self.vertices.get(index).map(|v| v.position + self.position)
    }
}

/// Maps the stored alternate room word to an optional index.
pub(crate) fn alternate_room(raw: i16) -> Option<u16> {
    u16::try_from(raw).ok()
}
