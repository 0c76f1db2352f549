//! Stream configuration
//!
//! Limits and defaults shared by encoders, decoders and streams. Loaded from
//! TOML; every field is optional.
//!
//! ```toml
//! max_queued_frames = 250
//! max_queued_packets = 250
//! output_sample_rate = 48000
//! output_channels = 2
//! ```

use crate::error::{Result, StreamError};
use crate::format::PcmFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default queue depth: five seconds of 20 ms frames
pub const DEFAULT_MAX_QUEUED: usize = 50 * 5;

/// Stream layer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Frames of PCM an encoder buffers before dropping the oldest
    pub max_queued_frames: usize,
    /// Packets a decoder or remote stream queues before dropping the oldest
    pub max_queued_packets: usize,
    /// Default remote stream output rate, 0 = codec native
    pub output_sample_rate: u32,
    /// Default remote stream output channels, 0 = codec native
    pub output_channels: u8,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_queued_frames: DEFAULT_MAX_QUEUED,
            max_queued_packets: DEFAULT_MAX_QUEUED,
            output_sample_rate: 0,
            output_channels: 0,
        }
    }
}

impl StreamConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: StreamConfig =
            toml::from_str(text).map_err(|e| StreamError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| StreamError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Check limits and the default output format
    pub fn validate(&self) -> Result<()> {
        if self.max_queued_frames == 0 {
            return Err(StreamError::Config("max_queued_frames must be at least 1".into()));
        }
        if self.max_queued_packets == 0 {
            return Err(StreamError::Config("max_queued_packets must be at least 1".into()));
        }
        self.output_format()
            .validate_target()
            .map_err(|e| StreamError::Config(e.to_string()))
    }

    /// Default output format (`0/0` = codec native)
    pub fn output_format(&self) -> PcmFormat {
        PcmFormat::new(self.output_sample_rate, self.output_channels)
    }
}
