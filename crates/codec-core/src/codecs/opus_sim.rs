//! Simulated perceptual codec
//!
//! Stands in for libopus when the `opus` feature is off. Packets keep the
//! frame structure of the real codec (one packet per frame, decoder validates
//! channel layout and length) while the payload is μ-law companded PCM, so
//! round trips are lossy but deterministic.
//!
//! Packet layout: `[0xA5, channels, samples_per_channel (u16 BE), payload...]`

use super::g711::tables::{ulaw_compress_table, ulaw_expand_table};
use crate::error::{CodecError, Result};
use crate::types::{CodecEngine, CodecKind, CodecParameters};

const SIM_MAGIC: u8 = 0xA5;
const HEADER_LEN: usize = 4;

/// Simulated Opus engine
#[derive(Debug, Clone)]
pub struct OpusSimEngine {
    sample_rate: u32,
    channels: u8,
}

impl OpusSimEngine {
    /// Create an engine for a validated Opus parameter set
    pub fn new(params: &CodecParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            sample_rate: params.sample_rate,
            channels: params.channels,
        })
    }

    /// Sample rate the engine decodes at
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl CodecEngine for OpusSimEngine {
    fn kind(&self) -> CodecKind {
        CodecKind::Opus
    }

    fn encode(&mut self, frame: &[i16], params: &CodecParameters, packet: &mut Vec<u8>) -> Result<bool> {
        let expected = params.frame_samples();
        if frame.len() != expected {
            return Err(CodecError::InvalidFrameSize {
                expected,
                actual: frame.len(),
            });
        }
        let per_channel = u16::try_from(params.frame_samples_per_channel())
            .map_err(|_| CodecError::encoding_failed("frame too long"))?;

        packet.clear();
        packet.reserve(HEADER_LEN + frame.len());
        packet.push(SIM_MAGIC);
        packet.push(self.channels);
        packet.extend_from_slice(&per_channel.to_be_bytes());
        packet.extend(frame.iter().map(|&s| ulaw_compress_table(s)));
        Ok(true)
    }

    fn decode(&mut self, packet: &[u8], pcm: &mut Vec<i16>) -> Result<()> {
        if packet.len() < HEADER_LEN || packet[0] != SIM_MAGIC {
            return Err(CodecError::decoding_failed("not a perceptual codec frame"));
        }
        if packet[1] != self.channels {
            return Err(CodecError::decoding_failed(format!(
                "frame has {} channels, decoder expects {}",
                packet[1], self.channels
            )));
        }
        let per_channel = usize::from(u16::from_be_bytes([packet[2], packet[3]]));
        let payload = &packet[HEADER_LEN..];
        if per_channel == 0 || payload.len() != per_channel * usize::from(self.channels) {
            return Err(CodecError::decoding_failed(format!(
                "truncated frame: {} payload bytes for {} samples per channel",
                payload.len(),
                per_channel
            )));
        }

        pcm.clear();
        pcm.extend(payload.iter().map(|&b| ulaw_expand_table(b)));
        Ok(())
    }

    fn reset(&mut self) {}
}
