//! Decoder configuration.
//!
//! Defaults suit retail game files. Tools that batch-process levels usually
//! keep a `trlevel.toml` next to the data:
//!
//! ```toml
//! demo_layout = true
//! max_inflated_bytes = 67108864
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default ceiling for one inflated region (128 MiB).
pub const DEFAULT_MAX_INFLATED_BYTES: usize = 128 * 1024 * 1024;

/// Default ceiling for the room count of one level.
pub const DEFAULT_MAX_ROOM_COUNT: usize = 1024;

/// Decoder configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecoderConfig {
    /// Demo and expansion-pack builds of TR1/TR2 move the palette and
    /// lightmap ahead of the camera chunk.
    pub demo_layout: bool,
    /// Accept room geometry blocks that declare more words than their
    /// vertices, faces and sprites use. Retail files never do this.
    pub allow_trailing_room_data: bool,
    /// Refuse compressed regions that claim to inflate past this size.
    pub max_inflated_bytes: usize,
    /// Refuse levels declaring more rooms than this.
    pub max_room_count: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            demo_layout: false,
            allow_trailing_room_data: false,
            max_inflated_bytes: DEFAULT_MAX_INFLATED_BYTES,
            max_room_count: DEFAULT_MAX_ROOM_COUNT,
        }
    }
}

impl DecoderConfig {
    /// Configuration for demo/expansion layouts.
    #[must_use]
    pub fn demo() -> Self {
        Self { demo_layout: true, ..Self::default() }
    }

    /// Parses and validates TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that limits are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_inflated_bytes == 0 {
            return Err(ConfigError::Invalid("max_inflated_bytes must be positive".into()));
        }
        if self.max_room_count == 0 {
            return Err(ConfigError::Invalid("max_room_count must be positive".into()));
        }
        Ok(())
    }
}
