//! Entry points and the cross-reference pass.
//!
//! Version decoders only guarantee that the bytes they read were locally
//! well formed. Everything that needs the whole level, such as an entity's
//! room or a face's texture, is checked here before a [`Level`] is handed
//! out.

use std::collections::HashSet;

use crate::common::{Face, FaceTexture, Room, NO_ROOM};
use crate::config::DecoderConfig;
use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};
use crate::level::{Level, LevelDraft};
use crate::version::{self, GameVersion};

/// Decodes a level with the default configuration.
///
/// # Errors
///
/// Any [`DecodeError`]; no partial level is ever returned.
pub fn decode(bytes: &[u8]) -> DecodeResult<Level> {
    decode_with(bytes, &DecoderConfig::default())
}

/// Decodes a level, detecting its generation from the leading bytes.
///
/// # Errors
///
/// [`DecodeError::UnknownFormat`] for an unrecognised tag, otherwise
/// whatever the version decoder or the cross-reference pass reports.
pub fn decode_with(bytes: &[u8], config: &DecoderConfig) -> DecodeResult<Level> {
    let version = detect_version(bytes)?;
    decode_as(bytes, version, config)
}

/// Decodes a level as a known generation, skipping detection.
///
/// # Errors
///
/// [`DecodeError::MalformedChunk`] on chunk `"version"` when the tag does
/// not belong to `version`, plus everything [`decode_with`] can return.
pub fn decode_as(bytes: &[u8], version: GameVersion, config: &DecoderConfig) -> DecodeResult<Level> {
    let mut cursor = Cursor::new(bytes);
    let tag = cursor.peek_tag()?;
    if !version.accepts_tag(tag) {
        return Err(DecodeError::malformed("version", 0, format!("tag {tag:02x?} does not belong to {version}")));
    }

    let draft = version::decode_draft(&mut cursor, version, config)?;
    validate(&draft)?;
    let level = Level::from_validated(draft);

    let summary = level.summary();
    tracing::info!(
        %version,
        rooms = summary.rooms,
        meshes = summary.meshes,
        moveables = summary.moveables,
        entities = summary.entities,
        bytes = bytes.len(),
        "decoded level"
    );
    Ok(level)
}

/// Identifies the generation of a level without decoding it.
///
/// # Errors
///
/// [`DecodeError::UnknownFormat`] or [`DecodeError::UnexpectedEof`].
pub fn detect_version(bytes: &[u8]) -> DecodeResult<GameVersion> {
    version::detect(bytes)
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Fails unless `index` addresses one of `len` entries.
fn check(field: &'static str, index: impl Into<i64>, len: usize) -> DecodeResult<()> {
    let index = index.into();
    match usize::try_from(index) {
        Ok(i) if i < len => Ok(()),
        _ => Err(DecodeError::broken(field, index, len)),
    }
}

/// Fails unless `count` entries from `start` fit in `len`.
fn check_range(field: &'static str, start: impl Into<i64>, count: impl Into<i64>, len: usize) -> DecodeResult<()> {
    let end = start.into() + count.into();
    if end > to_i64(len) {
        return Err(DecodeError::broken(field, end - 1, len));
    }
    Ok(())
}

/// Runs every cross-reference check over a draft.
pub(crate) fn validate(draft: &LevelDraft) -> DecodeResult<()> {
    Validator::new(draft).run()
}

struct Validator<'a> {
    draft: &'a LevelDraft,
    static_ids: HashSet<u32>,
    object_ids: HashSet<i64>,
}

impl<'a> Validator<'a> {
    fn new(draft: &'a LevelDraft) -> Self {
        let static_ids = draft.static_meshes.iter().map(|s| s.object_id).collect();
        let object_ids = draft
            .moveables
            .iter()
            .map(|m| i64::from(m.object_id))
            .chain(draft.sprite_sequences.iter().map(|s| i64::from(s.object_id)))
            .collect();
        Self { draft, static_ids, object_ids }
    }

    fn run(&self) -> DecodeResult<()> {
        for room in &self.draft.rooms {
            self.room(room)?;
        }
        self.meshes()?;
        self.animations()?;
        self.textures()?;
        self.entities()?;
        tracing::trace!("cross-references resolved");
        Ok(())
    }

    fn face(&self, face: &Face, vertex_count: usize) -> DecodeResult<()> {
        for &v in face.vertices() {
            check("face.vertex", v, vertex_count)?;
        }
        match face.texture {
            FaceTexture::Textured { index, .. } => check("face.texture", index, self.draft.object_textures.len()),
            FaceTexture::Coloured { index8, index16 } => {
                let len = self.draft.palette.as_ref().map_or(0, |p| p.len());
                check("face.colour", index8, len)?;
                if let Some(i) = index16 {
                    let len = self.draft.palette16.as_ref().map_or(0, |p| p.len());
                    check("face.colour16", i, len)?;
                }
                Ok(())
            }
        }
    }

    fn room(&self, room: &Room) -> DecodeResult<()> {
        let rooms = self.draft.rooms.len();
        for face in room.faces() {
            self.face(face, room.vertices.len())?;
        }
        for sprite in &room.sprites {
            check("room_sprite.vertex", sprite.vertex, room.vertices.len())?;
            check("room_sprite.texture", sprite.texture, self.draft.sprite_textures.len())?;
        }
        for portal in &room.portals {
            if portal.adjoining_room != NO_ROOM {
                check("portal.adjoining_room", portal.adjoining_room, rooms)?;
            }
        }
        for sector in room.sector_grid.sectors() {
            check("sector.floor_data", sector.floor_data_index, self.draft.floor_data.len())?;
            if let Some(r) = sector.room_below {
                check("sector.room_below", r, rooms)?;
            }
            if let Some(r) = sector.room_above {
                check("sector.room_above", r, rooms)?;
            }
        }
        if let Some(r) = room.alternate_room {
            check("room.alternate_room", r, rooms)?;
        }
        for placement in &room.static_meshes {
            if !self.static_ids.contains(&u32::from(placement.object_id)) {
                return Err(DecodeError::broken(
                    "room_static_mesh.object_id",
                    placement.object_id,
                    self.draft.static_meshes.len(),
                ));
            }
        }
        Ok(())
    }

    fn meshes(&self) -> DecodeResult<()> {
        let d = self.draft;
        for mesh in &d.meshes {
            for face in mesh.faces() {
                self.face(face, mesh.vertices.len())?;
            }
        }
        for &pointer in &d.mesh_pointers {
            check("mesh_pointer.mesh", pointer, d.meshes.len())?;
        }
        for s in &d.static_meshes {
            check("static_mesh.mesh", s.mesh, d.mesh_pointers.len())?;
        }
        for m in &d.moveables {
            check_range("moveable.meshes", m.starting_mesh, m.num_meshes, d.mesh_pointers.len())?;
            if m.num_meshes > 1 {
                check_range("moveable.mesh_tree", m.mesh_tree_index, m.num_meshes - 1, d.mesh_trees.len())?;
            }
            if let Some(a) = m.animation() {
                check("moveable.animation", a, d.animations.len())?;
            }
        }
        Ok(())
    }

    fn animations(&self) -> DecodeResult<()> {
        let d = self.draft;
        for a in &d.animations {
            check("animation.next_animation", a.next_animation, d.animations.len())?;
            check_range("animation.state_changes", a.state_change_offset, a.num_state_changes, d.state_changes.len())?;
            if a.num_anim_commands > 0 {
                check("animation.commands", a.anim_command, d.anim_commands.len())?;
            }
        }
        for s in &d.state_changes {
            check_range("state_change.dispatches", s.dispatch_offset, s.num_dispatches, d.anim_dispatches.len())?;
        }
        for dispatch in &d.anim_dispatches {
            check("dispatch.next_animation", dispatch.next_animation, d.animations.len())?;
        }
        Ok(())
    }

    fn textures(&self) -> DecodeResult<()> {
        let d = self.draft;
        for t in &d.object_textures {
            check("object_texture.tile", t.tile, d.textiles.len())?;
        }
        for t in &d.sprite_textures {
            check("sprite_texture.tile", t.tile, d.textiles.len())?;
        }
        for s in &d.sprite_sequences {
            check_range("sprite_sequence.textures", s.offset, s.length, d.sprite_textures.len())?;
        }
        Ok(())
    }

    fn entities(&self) -> DecodeResult<()> {
        let d = self.draft;
        for e in &d.entities {
            check("entity.room", e.room, d.rooms.len())?;
            if !self.object_ids.contains(&i64::from(e.object_id)) {
                return Err(DecodeError::broken(
                    "entity.object_id",
                    e.object_id,
                    d.moveables.len() + d.sprite_sequences.len(),
                ));
            }
        }
        Ok(())
    }
}
