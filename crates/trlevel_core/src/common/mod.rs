//! Format-agnostic value types and the decode routines every version shares.
//!
//! Routines take a [`Cursor`](crate::Cursor) and a small layout enum naming
//! the record variant, so version decoders pick a layout instead of
//! re-implementing the record.

pub mod animation;
pub mod color;
pub mod entity;
pub mod geometry;
pub mod mesh;
pub mod room;
pub mod texture;

pub use animation::{AnimDispatch, Animation, AnimationLayout, FrameLayout, Keyframe, StateChange};
pub use color::{Color, ColorEncoding, Palette};
pub use entity::{Entity, EntityFlags, EntityLayout};
pub use geometry::{Face, FaceLayout, FaceShape, FaceTexture, TextureMode};
pub use mesh::{Mesh, MeshLayout, MeshShading, MeshTreeNode, Moveable, StaticMesh, NO_ANIMATION};
pub use room::{
    LightKind, LightLayout, Portal, Room, RoomEnvironment, RoomLayer, RoomLight, RoomSprite, RoomStaticMesh,
    RoomStaticMeshLayout, RoomVertex, RoomVertexLayout, Sector, SectorGrid, SectorLayout, NO_ROOM,
};
pub use texture::{ObjectTexture, ObjectTextureLayout, SpriteSequence, SpriteTexture, TexCoord, Textile};
