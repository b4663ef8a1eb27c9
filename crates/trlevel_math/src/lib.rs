//! # TRLEVEL Math
//!
//! Fixed-size vector and matrix primitives plus the unit conversions the
//! level decoders need to turn raw engine numbers into usable geometry.
//!
//! ## Design Principles
//!
//! 1. **Plain old data**: every type is `#[repr(C)]` + `Pod`, so decoded
//!    vertex arrays can be handed to a GPU as bytes without copying.
//! 2. **No surprises**: the engine's conventions (Y points down, 1024 units
//!    per sector, 16-bit angles) live in [`units`] and nowhere else.
//! 3. **Const where possible**: constructors and constants are `const fn`.
//!
//! ## Usage
//!
//! ```rust
//! use trlevel_math::{units, Vec3};
//!
//! let game = Vec3::new(1024.0, -512.0, 2048.0);
//! let gl = units::game_to_gl(game);
//! assert_eq!(gl, Vec3::new(1024.0, 512.0, -2048.0));
//! assert_eq!(units::angle_to_degrees(0x4000), 90.0);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod bounds;
pub mod matrix;
pub mod quaternion;
pub mod units;
pub mod vector;

pub use bounds::BoundingBox;
pub use matrix::Mat4;
pub use quaternion::{Quaternion, Transform};
pub use units::Fixed16;
pub use vector::{Vec2, Vec3};
