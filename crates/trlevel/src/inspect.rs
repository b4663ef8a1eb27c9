//! File loading and plain-text reports.
//!
//! Everything `level_inspect` does besides argument parsing and logging
//! setup, kept here so it can be tested without spawning the binary.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use trlevel_core::{decode_as, decode_with, ConfigError, DecodeError, DecoderConfig, GameVersion, Level};

/// Failures while loading a level or its decoder config from disk.
#[derive(Error, Debug)]
pub enum InspectError {
    /// The file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The config file is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The level did not decode.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

fn read(path: &Path) -> Result<Vec<u8>, InspectError> {
    fs::read(path).map_err(|source| InspectError::Io { path: path.to_path_buf(), source })
}

/// Builds the decoder config from an optional TOML file.
///
/// `demo` forces the demo layout on regardless of what the file says.
pub fn load_config(path: Option<&Path>, demo: bool) -> Result<DecoderConfig, InspectError> {
    let mut config = match path {
        Some(path) => {
            let text =
                fs::read_to_string(path).map_err(|source| InspectError::Io { path: path.to_path_buf(), source })?;
            DecoderConfig::from_toml_str(&text)?
        }
        None => DecoderConfig::default(),
    };
    config.demo_layout |= demo;
    Ok(config)
}

/// Reads and decodes a level file. `version` skips detection.
pub fn load_level(path: &Path, config: &DecoderConfig, version: Option<GameVersion>) -> Result<Level, InspectError> {
    let bytes = read(path)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "read level file");
    let level = match version {
        Some(version) => decode_as(&bytes, version, config)?,
        None => decode_with(&bytes, config)?,
    };
    Ok(level)
}

/// Record counts, one per line.
pub struct SummaryReport<'a>(pub &'a Level);

impl fmt::Display for SummaryReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0.summary();
        writeln!(f, "version           {}", s.version)?;
        writeln!(f, "textiles          {}", s.textiles)?;
        writeln!(f, "rooms             {}", s.rooms)?;
        writeln!(f, "meshes            {} ({} pointers)", s.meshes, s.mesh_pointers)?;
        writeln!(f, "static meshes     {}", s.static_meshes)?;
        writeln!(f, "moveables         {}", s.moveables)?;
        writeln!(f, "animations        {} ({} keyframes)", s.animations, s.keyframes)?;
        writeln!(f, "object textures   {}", s.object_textures)?;
        writeln!(f, "sprite textures   {}", s.sprite_textures)?;
        writeln!(f, "sprite sequences  {}", s.sprite_sequences)?;
        writeln!(f, "entities          {}", s.entities)
    }
}

/// One line per room.
pub struct RoomReport<'a>(pub &'a Level);

impl fmt::Display for RoomReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, room) in self.0.rooms().iter().enumerate() {
            let p = room.position;
            write!(
                f,
                "room {i:4}  at ({:.0}, {:.0}, {:.0})  {} vertices  {} faces  {} portals  {} sectors",
                p.x,
                p.y,
                p.z,
                room.vertices.len(),
                room.rectangles.len() + room.triangles.len(),
                room.portals.len(),
                room.sector_grid.sectors().len(),
            )?;
            if let Some(alt) = room.alternate_room {
                write!(f, "  alternate {alt}")?;
            }
            if room.is_water() {
                f.write_str("  water")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// [`SummaryReport`] as a string.
#[must_use]
pub fn render_summary(level: &Level) -> String {
    SummaryReport(level).to_string()
}

/// [`RoomReport`] as a string.
#[must_use]
pub fn render_rooms(level: &Level) -> String {
    RoomReport(level).to_string()
}
