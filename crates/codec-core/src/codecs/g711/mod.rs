//! G.711 A-law / μ-law engine
//!
//! One byte per sample at a fixed 8 kHz mono format. The codec is stateless,
//! so any byte sequence is a valid payload; only an empty packet is rejected.

pub mod reference;
pub mod tables;

pub use reference::{alaw_compress, alaw_expand, ulaw_compress, ulaw_expand};
pub use tables::init_tables;

use crate::error::{CodecError, Result};
use crate::types::{CodecEngine, CodecKind, CodecParameters};
use tables::{alaw_compress_table, alaw_expand_table, ulaw_compress_table, ulaw_expand_table};

/// Companding law
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum G711Law {
    /// A-law (PCMA)
    ALaw,
    /// μ-law (PCMU)
    MuLaw,
}

/// G.711 codec engine
#[derive(Debug, Clone)]
pub struct G711Engine {
    law: G711Law,
}

impl G711Engine {
    /// Create an A-law engine
    pub fn pcma() -> Self {
        Self { law: G711Law::ALaw }
    }

    /// Create a μ-law engine
    pub fn pcmu() -> Self {
        Self { law: G711Law::MuLaw }
    }

    /// Create the engine for a G.711 codec kind
    pub fn for_kind(kind: CodecKind) -> Result<Self> {
        match kind {
            CodecKind::G711Pcma => Ok(Self::pcma()),
            CodecKind::G711Pcmu => Ok(Self::pcmu()),
            other => Err(CodecError::invalid_config(format!(
                "{} is not a G.711 codec",
                other
            ))),
        }
    }

    /// Companding law of this engine
    pub fn law(&self) -> G711Law {
        self.law
    }
}

impl CodecEngine for G711Engine {
    fn kind(&self) -> CodecKind {
        match self.law {
            G711Law::ALaw => CodecKind::G711Pcma,
            G711Law::MuLaw => CodecKind::G711Pcmu,
        }
    }

    fn encode(&mut self, frame: &[i16], _params: &CodecParameters, packet: &mut Vec<u8>) -> Result<bool> {
        if frame.is_empty() {
            return Err(CodecError::encoding_failed("empty frame"));
        }
        packet.clear();
        match self.law {
            G711Law::ALaw => packet.extend(frame.iter().map(|&s| alaw_compress_table(s))),
            G711Law::MuLaw => packet.extend(frame.iter().map(|&s| ulaw_compress_table(s))),
        }
        Ok(true)
    }

    fn decode(&mut self, packet: &[u8], pcm: &mut Vec<i16>) -> Result<()> {
        if packet.is_empty() {
            return Err(CodecError::decoding_failed("empty G.711 payload"));
        }
        pcm.clear();
        match self.law {
            G711Law::ALaw => pcm.extend(packet.iter().map(|&b| alaw_expand_table(b))),
            G711Law::MuLaw => pcm.extend(packet.iter().map(|&b| ulaw_expand_table(b))),
        }
        Ok(())
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_one_byte_per_sample() {
        let mut engine = G711Engine::pcmu();
        let params = CodecParameters::pcmu();
        let mut packet = Vec::new();
        assert!(engine.encode(&[0i16; 160], &params, &mut packet).unwrap());
        assert_eq!(packet.len(), 160);
        assert!(packet.iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_decode_rejects_empty_payload() {
        let mut engine = G711Engine::pcma();
        let mut pcm = vec![1, 2, 3];
        let err = engine.decode(&[], &mut pcm).unwrap_err();
        assert!(matches!(err, CodecError::DecodingFailed { .. }));
    }

    #[test]
    fn test_round_trip_close() {
        let params = CodecParameters::pcma();
        let frame: Vec<i16> = (0..160).map(|i| ((i as f32 * 0.2).sin() * 8000.0) as i16).collect();
        let mut engine = G711Engine::pcma();
        let mut packet = Vec::new();
        let mut pcm = Vec::new();
        engine.encode(&frame, &params, &mut packet).unwrap();
        engine.decode(&packet, &mut pcm).unwrap();
        assert_eq!(pcm.len(), frame.len());
        for (a, b) in frame.iter().zip(&pcm) {
            assert!((i32::from(*a) - i32::from(*b)).abs() <= 256);
        }
    }

    #[test]
    fn test_for_kind() {
        assert_eq!(G711Engine::for_kind(CodecKind::G711Pcmu).unwrap().law(), G711Law::MuLaw);
        assert!(G711Engine::for_kind(CodecKind::Opus).is_err());
    }
}
