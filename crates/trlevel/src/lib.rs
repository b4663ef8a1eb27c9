//! # TRLEVEL
//!
//! One name for the whole decoder: [`core`] turns level bytes into a
//! [`Level`], [`math`] holds the geometry types it is expressed in.
//!
//! ## Modules
//!
//! - `inspect`: file loading and text reports used by `level_inspect`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use trlevel::{inspect, DecoderConfig};
//!
//! let level = inspect::load_level("CUT1.TR4".as_ref(), &DecoderConfig::default(), None)?;
//! print!("{}", inspect::render_summary(&level));
//! # Ok::<(), trlevel::inspect::InspectError>(())
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod inspect;

pub use trlevel_core as core;
pub use trlevel_math as math;

pub use trlevel_core::{
    decode, decode_as, decode_with, detect_version, ConfigError, DecodeError, DecodeResult, DecoderConfig,
    GameVersion, Level, LevelSummary,
};
