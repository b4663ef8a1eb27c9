//! Meshes, static mesh definitions, moveables and skeleton trees.

use serde::{Deserialize, Serialize};
use trlevel_math::{BoundingBox, Vec3};

use super::geometry::{read_face, read_vertex_i16, read_vertex_i32, Face, FaceLayout, FaceShape, TextureMode};
use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};

/// Moveable animation index meaning "not animated".
pub const NO_ANIMATION: u16 = 0xFFFF;

/// Per-vertex shading of a mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MeshShading {
    /// Dynamically lit, one normal per vertex
    Normals(Vec<Vec3>),
    /// Pre-lit, one shade per vertex
    Lights(Vec<i16>),
}

/// One piece of geometry shared by moveables and static meshes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    /// Bounding sphere centre
    pub centre: Vec3,
    /// Bounding sphere radius
    pub collision_radius: i32,
    /// Vertices in mesh space
    pub vertices: Vec<Vec3>,
    /// Normals or shades
    pub shading: MeshShading,
    /// Textured quads
    pub textured_rectangles: Vec<Face>,
    /// Textured triangles
    pub textured_triangles: Vec<Face>,
    /// Flat-coloured quads; always empty from TR4 on
    pub coloured_rectangles: Vec<Face>,
    /// Flat-coloured triangles; always empty from TR4 on
    pub coloured_triangles: Vec<Face>,
}

impl Mesh {
    /// All faces.
    pub fn faces(&self) -> impl Iterator<Item = &Face> {
        self.textured_rectangles
            .iter()
            .chain(&self.textured_triangles)
            .chain(&self.coloured_rectangles)
            .chain(&self.coloured_triangles)
    }
}

/// Record layout of meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshLayout {
    /// TR1/TR2: textured and coloured faces, plain texture index
    Classic {
        /// Coloured faces also index the 16-bit palette (TR2)
        with_index16: bool,
    },
    /// TR3: like `Classic` with double-sided texture bit
    Tr3,
    /// TR4+: textured faces only, each with an effects word
    Tr4,
}

fn signed_count(cursor: &mut Cursor<'_>, chunk: &'static str) -> DecodeResult<usize> {
    let offset = cursor.offset();
    let n = cursor.read_i16()?;
    usize::try_from(n).map_err(|_| DecodeError::malformed(chunk, offset, format!("negative count {n}")))
}

fn read_faces(cursor: &mut Cursor<'_>, layout: FaceLayout) -> DecodeResult<Vec<Face>> {
    let count = signed_count(cursor, "mesh faces")?;
    cursor.read_n(count, |c| read_face(c, layout))
}

/// Decodes one mesh.
pub fn read_mesh(cursor: &mut Cursor<'_>, layout: MeshLayout) -> DecodeResult<Mesh> {
    let centre = read_vertex_i16(cursor)?;
    let collision_radius = cursor.read_i32()?;
    let vertex_count = signed_count(cursor, "mesh vertices")?;
    let vertices = cursor.read_n(vertex_count, read_vertex_i16)?;

    let n = cursor.read_i16()?;
    let shading = match usize::try_from(n) {
        Ok(count) => MeshShading::Normals(cursor.read_n(count, read_vertex_i16)?),
        Err(_) => MeshShading::Lights(cursor.read_n(n.unsigned_abs().into(), Cursor::read_i16)?),
    };

    let (texture, coloured, has_effects) = match layout {
        MeshLayout::Classic { with_index16 } => (TextureMode::Index, Some(with_index16), false),
        MeshLayout::Tr3 => (TextureMode::IndexDoubleSided, Some(true), false),
        MeshLayout::Tr4 => (TextureMode::IndexDoubleSided, None, true),
    };
    let quad = FaceLayout::new(FaceShape::Quad, texture, has_effects);
    let tri = FaceLayout::new(FaceShape::Triangle, texture, has_effects);
    let textured_rectangles = read_faces(cursor, quad)?;
    let textured_triangles = read_faces(cursor, tri)?;

    let (coloured_rectangles, coloured_triangles) = match coloured {
        Some(with_index16) => {
            let mode = TextureMode::Palette { with_index16 };
            (
                read_faces(cursor, FaceLayout::new(FaceShape::Quad, mode, false))?,
                read_faces(cursor, FaceLayout::new(FaceShape::Triangle, mode, false))?,
            )
        }
        None => (Vec::new(), Vec::new()),
    };

    Ok(Mesh {
        centre,
        collision_radius,
        vertices,
        shading,
        textured_rectangles,
        textured_triangles,
        coloured_rectangles,
        coloured_triangles,
    })
}

/// A static (non-animated) object definition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticMesh {
    /// Object id placements refer to
    pub object_id: u32,
    /// Index into the mesh pointer table
    pub mesh: u16,
    /// Visibility box
    pub visibility_box: BoundingBox,
    /// Collision box
    pub collision_box: BoundingBox,
    /// Flag bits (bit 1: no collision)
    pub flags: u16,
}

/// Decodes one static mesh definition.
pub fn read_static_mesh(cursor: &mut Cursor<'_>) -> DecodeResult<StaticMesh> {
    Ok(StaticMesh {
        object_id: cursor.read_u32()?,
        mesh: cursor.read_u16()?,
        visibility_box: BoundingBox::from_interleaved(cursor.read_i16_array()?),
        collision_box: BoundingBox::from_interleaved(cursor.read_i16_array()?),
        flags: cursor.read_u16()?,
    })
}

/// An animated object definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Moveable {
    /// Object id entities refer to
    pub object_id: u32,
    /// Number of meshes (joints)
    pub num_meshes: u16,
    /// First entry in the mesh pointer table
    pub starting_mesh: u16,
    /// First node in the mesh tree table
    pub mesh_tree_index: u32,
    /// Byte offset of the first keyframe
    pub frame_offset: u32,
    /// First animation, or [`NO_ANIMATION`]
    pub animation_index: u16,
}

impl Moveable {
    /// Animation index, unless the moveable is not animated.
    #[must_use]
    pub fn animation(&self) -> Option<u16> {
        (self.animation_index != NO_ANIMATION).then_some(self.animation_index)
    }
}

/// Decodes one moveable. TR5 records end with a `0xFFEF` filler word.
pub fn read_moveable(cursor: &mut Cursor<'_>, tr5_filler: bool) -> DecodeResult<Moveable> {
    let object_id = cursor.read_u32()?;
    let num_meshes = cursor.read_u16()?;
    let starting_mesh = cursor.read_u16()?;
    let tree_offset = cursor.offset();
    let mesh_tree = cursor.read_u32()?;
    if mesh_tree % 4 != 0 {
        return Err(DecodeError::malformed(
            "moveable",
            tree_offset,
            format!("mesh tree offset {mesh_tree} is not a whole node"),
        ));
    }
    let frame_offset = cursor.read_u32()?;
    let animation_index = cursor.read_u16()?;
    if tr5_filler {
        cursor.expect_u16(0xFFEF, "moveable")?;
    }
    Ok(Moveable {
        object_id,
        num_meshes,
        starting_mesh,
        mesh_tree_index: mesh_tree / 4,
        frame_offset,
        animation_index,
    })
}

/// How a joint attaches to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshTreeNode {
    /// Bit 0 pops the parent stack, bit 1 pushes it
    pub flags: u32,
    /// Offset from the parent joint
    pub offset: Vec3,
}

impl MeshTreeNode {
    /// Pop flag.
    #[must_use]
    pub fn pops(&self) -> bool {
        self.flags & 0x01 != 0
    }

    /// Push flag.
    #[must_use]
    pub fn pushes(&self) -> bool {
        self.flags & 0x02 != 0
    }
}

/// Decodes the mesh tree chunk: a count of 32-bit words, four per node.
pub fn read_mesh_trees(cursor: &mut Cursor<'_>) -> DecodeResult<Vec<MeshTreeNode>> {
    let offset = cursor.offset();
    let words = cursor.read_u32()?;
    if words % 4 != 0 {
        return Err(DecodeError::malformed("mesh trees", offset, format!("{words} words is not a whole number of nodes")));
    }
    cursor.read_n((words / 4) as usize, |c| {
        Ok(MeshTreeNode { flags: c.read_u32()?, offset: read_vertex_i32(c)? })
    })
}
