//! Codec engines and factory

use crate::error::{CodecError, Result};
use crate::types::{CodecEngine, CodecKind, CodecParameters};

pub mod g711;

#[cfg(feature = "opus")]
pub mod opus;

#[cfg(feature = "opus-sim")]
pub mod opus_sim;

/// Factory for creating codec engines
pub struct EngineFactory;

impl EngineFactory {
    /// Create an engine for a parameter set
    ///
    /// The parameters are validated first. With both Opus features enabled
    /// the libopus engine wins over the simulated one.
    pub fn create(params: &CodecParameters) -> Result<Box<dyn CodecEngine>> {
        params.validate()?;

        match params.kind {
            CodecKind::G711Pcma | CodecKind::G711Pcmu => {
                Ok(Box::new(g711::G711Engine::for_kind(params.kind)?))
            }
            CodecKind::Opus => Self::create_opus(params),
        }
    }

    #[cfg(feature = "opus")]
    fn create_opus(params: &CodecParameters) -> Result<Box<dyn CodecEngine>> {
        Ok(Box::new(self::opus::OpusEngine::new(params)?))
    }

    #[cfg(all(feature = "opus-sim", not(feature = "opus")))]
    fn create_opus(params: &CodecParameters) -> Result<Box<dyn CodecEngine>> {
        Ok(Box::new(opus_sim::OpusSimEngine::new(params)?))
    }

    #[cfg(not(any(feature = "opus", feature = "opus-sim")))]
    fn create_opus(_params: &CodecParameters) -> Result<Box<dyn CodecEngine>> {
        Err(CodecError::feature_not_enabled("opus"))
    }

    /// Codec kinds this build can create
    pub fn supported_kinds() -> Vec<CodecKind> {
        CodecKind::ALL
            .iter()
            .copied()
            .filter(|&kind| Self::is_supported(kind))
            .collect()
    }

    /// Check if a codec kind can be created in this build
    pub fn is_supported(kind: CodecKind) -> bool {
        match kind {
            CodecKind::G711Pcma | CodecKind::G711Pcmu => true,
            CodecKind::Opus => cfg!(any(feature = "opus", feature = "opus-sim")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_creates_g711() {
        let engine = EngineFactory::create(&CodecParameters::pcmu()).unwrap();
        assert_eq!(engine.kind(), CodecKind::G711Pcmu);
        let engine = EngineFactory::create(&CodecParameters::pcma()).unwrap();
        assert_eq!(engine.kind(), CodecKind::G711Pcma);
    }

    #[test]
    fn test_factory_validates_first() {
        let err = EngineFactory::create(&CodecParameters::opus(44100, 1)).err().unwrap();
        assert!(matches!(err, CodecError::InvalidSampleRate { rate: 44100, .. }));
    }

    #[test]
    fn test_supported_kinds_include_g711() {
        let kinds = EngineFactory::supported_kinds();
        assert!(kinds.contains(&CodecKind::G711Pcma));
        assert!(kinds.contains(&CodecKind::G711Pcmu));
    }

    #[test]
    #[cfg(any(feature = "opus", feature = "opus-sim"))]
    fn test_factory_creates_opus() {
        let engine = EngineFactory::create(&CodecParameters::opus(48000, 2)).unwrap();
        assert_eq!(engine.kind(), CodecKind::Opus);
    }
}
