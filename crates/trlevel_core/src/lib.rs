//! # TRLEVEL Core
//!
//! Decodes the level files of the five Tomb Raider engine generations into
//! one [`Level`] model.
//!
//! ## Design Principles
//!
//! 1. **Bytes in, level out**: [`decode`] takes a slice and returns a fully
//!    validated [`Level`] or a [`DecodeError`]. There is no partial result.
//! 2. **One decoder per generation**: the five file layouts are a closed
//!    set of variants. Each decoder owns its chunk order; shared record
//!    layouts live in [`common`] and are picked by a small layout enum.
//! 3. **Indices, not pointers**: rooms, meshes, textures and animations refer
//!    to each other by index. The assembler checks every index once.
//! 4. **Eager inflation**: compressed regions are expanded whole and their
//!    length checked before a single record is read from them.
//!
//! ## Usage
//!
//! ```rust,no_run
//! let bytes = std::fs::read("LEVEL1.PHD")?;
//! let level = trlevel_core::decode(&bytes)?;
//! println!("{:?}: {} rooms", level.version(), level.rooms().len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod assembler;
pub mod common;
pub mod config;
pub mod cursor;
pub mod error;
pub mod level;
pub mod version;

pub use assembler::{decode, decode_as, decode_with, detect_version};
pub use config::DecoderConfig;
pub use cursor::{CountWidth, Cursor};
pub use error::{ConfigError, DecodeError, DecodeResult};
pub use level::{Level, LevelSummary};
pub use version::GameVersion;
