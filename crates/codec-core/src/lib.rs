//! # Codec-Core: codec engines for the acodec stream layer
//!
//! This crate provides the per-codec-kind [`CodecEngine`] capability consumed
//! by the stream layer: G.711 A-law/μ-law and the Opus perceptual codec,
//! together with the parameter types every encoder and decoder is created
//! with.
//!
//! ## Usage
//!
//! ```rust
//! use acodec_codec_core::{CodecParameters, EngineFactory};
//!
//! let params = CodecParameters::pcmu();
//! let mut engine = EngineFactory::create(&params)?;
//!
//! let mut packet = Vec::new();
//! engine.encode(&vec![0i16; params.frame_samples()], &params, &mut packet)?;
//! assert_eq!(packet.len(), 160);
//!
//! let mut pcm = Vec::new();
//! engine.decode(&packet, &mut pcm)?;
//! assert_eq!(pcm.len(), 160);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `opus-sim`: simulated perceptual engine (enabled by default)
//! - `opus`: libopus engine (requires the system library)

#![warn(missing_docs)]

pub mod codecs;
pub mod error;
pub mod types;

pub use codecs::EngineFactory;
pub use error::{CodecError, ErrorCategory, Result};
pub use types::{
    CodecEngine, CodecKind, CodecParameters, FrameDuration, G711_SAMPLE_RATE, MAX_COMPLEXITY,
    OPUS_SAMPLE_RATES,
};

/// Version information for the codec library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the codec library
///
/// Builds the G.711 lookup tables up front. Safe to call more than once.
pub fn init() {
    codecs::g711::init_tables();
    tracing::debug!(
        "codec-core v{} initialized, codecs: {:?}",
        VERSION,
        EngineFactory::supported_kinds()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
        assert!(!VERSION.is_empty());
    }
}
