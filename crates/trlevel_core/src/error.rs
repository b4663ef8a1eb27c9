//! Decode error types.

use thiserror::Error;

/// Everything that can go wrong while turning bytes into a [`Level`].
///
/// Every variant is terminal for the decode call that produced it.
///
/// [`Level`]: crate::Level
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A read ran past the end of its buffer.
    #[error("unexpected end of {region} at offset {offset:#x} (need {need} bytes, have {have})")]
    UnexpectedEof {
        /// Buffer being read ("file", "geometry", "room data", ...)
        region: &'static str,
        /// Offset of the failed read within that buffer
        offset: usize,
        /// Bytes requested
        need: usize,
        /// Bytes remaining
        have: usize,
    },

    /// The leading version tag matches no supported format.
    #[error("unknown format tag {tag:02x?}")]
    UnknownFormat {
        /// The four leading bytes
        tag: [u8; 4],
    },

    /// A chunk's declared structure is inconsistent.
    #[error("malformed {chunk} at offset {offset:#x}: {reason}")]
    MalformedChunk {
        /// Chunk being decoded
        chunk: &'static str,
        /// Offset of the offending field
        offset: usize,
        /// What was wrong
        reason: String,
    },

    /// A compressed region did not expand to its declared size.
    #[error("cannot inflate {region} at offset {offset:#x}: expected {expected} bytes, got {actual} ({reason})")]
    DecompressionFailure {
        /// Region being inflated
        region: &'static str,
        /// Offset of the compressed payload
        offset: usize,
        /// Declared uncompressed size
        expected: usize,
        /// Bytes actually produced
        actual: usize,
        /// Length mismatch or the underlying stream error
        reason: String,
    },

    /// An index field points outside its target sequence.
    #[error("broken reference in {field}: index {index} out of range (len {len})")]
    BrokenReference {
        /// Field holding the index, e.g. `"entity.room"`
        field: &'static str,
        /// The offending index
        index: i64,
        /// Length of the target sequence
        len: usize,
    },
}

impl DecodeError {
    /// Shorthand for [`DecodeError::MalformedChunk`].
    pub fn malformed(chunk: &'static str, offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedChunk { chunk, offset, reason: reason.into() }
    }

    /// Shorthand for [`DecodeError::BrokenReference`].
    pub fn broken(field: &'static str, index: impl Into<i64>, len: usize) -> Self {
        Self::BrokenReference { field, index: index.into(), len }
    }
}

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Configuration loading failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The TOML text could not be parsed into a [`DecoderConfig`].
    ///
    /// [`DecoderConfig`]: crate::DecoderConfig
    #[error("invalid decoder config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is out of range.
    #[error("invalid decoder config: {0}")]
    Invalid(String),
}
