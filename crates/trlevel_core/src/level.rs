//! The decoded level model.

use std::fmt;

use crate::common::{
    AnimDispatch, Animation, Color, Entity, Face, FaceTexture, Mesh, MeshTreeNode, Moveable, ObjectTexture, Palette,
    Room, SpriteSequence, SpriteTexture, StateChange, StaticMesh, Textile,
};
use crate::version::GameVersion;

/// Everything a version decoder produces, before cross-references are
/// checked.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LevelDraft {
    pub(crate) version: GameVersion,
    pub(crate) textiles: Vec<Textile>,
    pub(crate) palette: Option<Palette>,
    pub(crate) palette16: Option<Palette>,
    pub(crate) rooms: Vec<Room>,
    pub(crate) floor_data: Vec<u16>,
    pub(crate) meshes: Vec<Mesh>,
    pub(crate) mesh_pointers: Vec<u32>,
    pub(crate) static_meshes: Vec<StaticMesh>,
    pub(crate) moveables: Vec<Moveable>,
    pub(crate) mesh_trees: Vec<MeshTreeNode>,
    pub(crate) animations: Vec<Animation>,
    pub(crate) state_changes: Vec<StateChange>,
    pub(crate) anim_dispatches: Vec<AnimDispatch>,
    pub(crate) anim_commands: Vec<i16>,
    pub(crate) object_textures: Vec<ObjectTexture>,
    pub(crate) sprite_textures: Vec<SpriteTexture>,
    pub(crate) sprite_sequences: Vec<SpriteSequence>,
    pub(crate) entities: Vec<Entity>,
}

impl LevelDraft {
    pub(crate) fn new(version: GameVersion) -> Self {
        Self {
            version,
            textiles: Vec::new(),
            palette: None,
            palette16: None,
            rooms: Vec::new(),
            floor_data: Vec::new(),
            meshes: Vec::new(),
            mesh_pointers: Vec::new(),
            static_meshes: Vec::new(),
            moveables: Vec::new(),
            mesh_trees: Vec::new(),
            animations: Vec::new(),
            state_changes: Vec::new(),
            anim_dispatches: Vec::new(),
            anim_commands: Vec::new(),
            object_textures: Vec::new(),
            sprite_textures: Vec::new(),
            sprite_sequences: Vec::new(),
            entities: Vec::new(),
        }
    }
}

/// A fully decoded and validated level.
///
/// Every index stored anywhere in the level resolves inside the same level,
/// except for the documented sentinels. The value is immutable; decode the
/// bytes again for a fresh copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    data: LevelDraft,
}

impl Level {
    /// Wraps a draft that passed validation.
    pub(crate) fn from_validated(data: LevelDraft) -> Self {
        Self { data }
    }

    /// Engine generation of the source file.
    #[must_use]
    pub fn version(&self) -> GameVersion {
        self.data.version
    }

    /// Texture atlas pages, normalised to RGBA.
    #[must_use]
    pub fn textiles(&self) -> &[Textile] {
        &self.data.textiles
    }

    /// 8-bit palette (TR1-TR3).
    #[must_use]
    pub fn palette(&self) -> Option<&Palette> {
        self.data.palette.as_ref()
    }

    /// 16-bit palette (TR2, TR3).
    #[must_use]
    pub fn palette16(&self) -> Option<&Palette> {
        self.data.palette16.as_ref()
    }

    /// Rooms in file order.
    #[must_use]
    pub fn rooms(&self) -> &[Room] {
        &self.data.rooms
    }

    /// Raw floor data words; sectors index into this.
    #[must_use]
    pub fn floor_data(&self) -> &[u16] {
        &self.data.floor_data
    }

    /// Unique meshes in the order they appear in the mesh buffer.
    #[must_use]
    pub fn meshes(&self) -> &[Mesh] {
        &self.data.meshes
    }

    /// Mesh pointer table; each entry indexes [`Level::meshes`].
    #[must_use]
    pub fn mesh_pointers(&self) -> &[u32] {
        &self.data.mesh_pointers
    }

    /// Resolves a mesh pointer table slot.
    #[must_use]
    pub fn mesh_for_pointer(&self, pointer: usize) -> Option<&Mesh> {
        let index = *self.data.mesh_pointers.get(pointer)?;
        self.data.meshes.get(index as usize)
    }

    /// Static mesh definitions.
    #[must_use]
    pub fn static_meshes(&self) -> &[StaticMesh] {
        &self.data.static_meshes
    }

    /// Static mesh definition by object id.
    #[must_use]
    pub fn static_mesh(&self, object_id: u32) -> Option<&StaticMesh> {
        self.data.static_meshes.iter().find(|s| s.object_id == object_id)
    }

    /// Moveable definitions.
    #[must_use]
    pub fn moveables(&self) -> &[Moveable] {
        &self.data.moveables
    }

    /// Moveable definition by object id.
    #[must_use]
    pub fn moveable(&self, object_id: u32) -> Option<&Moveable> {
        self.data.moveables.iter().find(|m| m.object_id == object_id)
    }

    /// Skeleton nodes shared by all moveables.
    #[must_use]
    pub fn mesh_trees(&self) -> &[MeshTreeNode] {
        &self.data.mesh_trees
    }

    /// Animations with their keyframes attached.
    #[must_use]
    pub fn animations(&self) -> &[Animation] {
        &self.data.animations
    }

    /// State changes.
    #[must_use]
    pub fn state_changes(&self) -> &[StateChange] {
        &self.data.state_changes
    }

    /// Dispatch windows.
    #[must_use]
    pub fn anim_dispatches(&self) -> &[AnimDispatch] {
        &self.data.anim_dispatches
    }

    /// Raw animation command words.
    #[must_use]
    pub fn anim_commands(&self) -> &[i16] {
        &self.data.anim_commands
    }

    /// Object textures.
    #[must_use]
    pub fn object_textures(&self) -> &[ObjectTexture] {
        &self.data.object_textures
    }

    /// Sprite textures.
    #[must_use]
    pub fn sprite_textures(&self) -> &[SpriteTexture] {
        &self.data.sprite_textures
    }

    /// Sprite sequences.
    #[must_use]
    pub fn sprite_sequences(&self) -> &[SpriteSequence] {
        &self.data.sprite_sequences
    }

    /// Sprite sequence by object id.
    #[must_use]
    pub fn sprite_sequence(&self, object_id: i32) -> Option<&SpriteSequence> {
        self.data.sprite_sequences.iter().find(|s| s.object_id == object_id)
    }

    /// Placed entities.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.data.entities
    }

    /// Flat colour of a coloured face, preferring the 16-bit palette.
    #[must_use]
    pub fn face_colour(&self, face: &Face) -> Option<Color> {
        let FaceTexture::Coloured { index8, index16 } = face.texture else {
            return None;
        };
        if let (Some(i), Some(p)) = (index16, self.data.palette16.as_ref()) {
            return p.entries().get(usize::from(i)).copied();
        }
        self.data.palette.as_ref()?.entries().get(usize::from(index8)).copied()
    }

    /// Record counts.
    #[must_use]
    pub fn summary(&self) -> LevelSummary {
        let d = &self.data;
        LevelSummary {
            version: d.version,
            textiles: d.textiles.len(),
            rooms: d.rooms.len(),
            meshes: d.meshes.len(),
            mesh_pointers: d.mesh_pointers.len(),
            static_meshes: d.static_meshes.len(),
            moveables: d.moveables.len(),
            animations: d.animations.len(),
            keyframes: d.animations.iter().map(|a| a.keyframes.len()).sum(),
            object_textures: d.object_textures.len(),
            sprite_textures: d.sprite_textures.len(),
            sprite_sequences: d.sprite_sequences.len(),
            entities: d.entities.len(),
        }
    }
}

/// Record counts of a [`Level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSummary {
    /// Engine generation
    pub version: GameVersion,
    /// Texture atlas pages
    pub textiles: usize,
    /// Rooms
    pub rooms: usize,
    /// Unique meshes
    pub meshes: usize,
    /// Mesh pointer slots
    pub mesh_pointers: usize,
    /// Static mesh definitions
    pub static_meshes: usize,
    /// Moveable definitions
    pub moveables: usize,
    /// Animations
    pub animations: usize,
    /// Keyframes across all animations
    pub keyframes: usize,
    /// Object textures
    pub object_textures: usize,
    /// Sprite textures
    pub sprite_textures: usize,
    /// Sprite sequences
    pub sprite_sequences: usize,
    /// Entities
    pub entities: usize,
}

impl fmt::Display for LevelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "version          {}", self.version)?;
        writeln!(f, "textiles         {}", self.textiles)?;
        writeln!(f, "rooms            {}", self.rooms)?;
        writeln!(f, "meshes           {} ({} pointers)", self.meshes, self.mesh_pointers)?;
        writeln!(f, "static meshes    {}", self.static_meshes)?;
        writeln!(f, "moveables        {}", self.moveables)?;
        writeln!(f, "animations       {} ({} keyframes)", self.animations, self.keyframes)?;
        writeln!(f, "object textures  {}", self.object_textures)?;
        writeln!(f, "sprite textures  {} in {} sequences", self.sprite_textures, self.sprite_sequences)?;
        write!(f, "entities         {}", self.entities)
    }
}
