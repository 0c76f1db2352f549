//! libopus engine
//!
//! Built with the `opus` feature. The encoder and decoder halves are created
//! on first use so a decode-only stream never allocates an encoder.

use crate::error::{CodecError, Result};
use crate::types::{CodecEngine, CodecKind, CodecParameters};
use tracing::{debug, warn};

/// Largest packet libopus can emit for one frame
const MAX_PACKET_SIZE: usize = 4000;

/// Longest frame libopus can decode, in ms
const MAX_DECODED_FRAME_MS: usize = 120;

/// Opus engine backed by libopus
pub struct OpusEngine {
    sample_rate: u32,
    channels: u8,
    voip: bool,
    encoder: Option<opus::Encoder>,
    decoder: Option<opus::Decoder>,
    applied_bitrate: Option<u32>,
}

impl OpusEngine {
    /// Create an engine for a validated Opus parameter set
    pub fn new(params: &CodecParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            sample_rate: params.sample_rate,
            channels: params.channels,
            voip: params.voip,
            encoder: None,
            decoder: None,
            applied_bitrate: None,
        })
    }

    fn channels(&self) -> opus::Channels {
        if self.channels == 2 {
            opus::Channels::Stereo
        } else {
            opus::Channels::Mono
        }
    }

    fn encoder(&mut self, bitrate: u32) -> Result<&mut opus::Encoder> {
        if self.encoder.is_none() {
            let application = if self.voip {
                opus::Application::Voip
            } else {
                opus::Application::Audio
            };
            let encoder = opus::Encoder::new(self.sample_rate, self.channels(), application)
                .map_err(|e| CodecError::initialization_failed(e.to_string()))?;
            self.encoder = Some(encoder);
            self.applied_bitrate = None;
        }

        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| CodecError::initialization_failed("opus encoder missing"))?;

        if self.applied_bitrate != Some(bitrate) {
            let value = if bitrate == 0 {
                opus::Bitrate::Max
            } else {
                opus::Bitrate::Bits(bitrate as i32)
            };
            encoder
                .set_bitrate(value)
                .map_err(|e| CodecError::invalid_config(e.to_string()))?;
            debug!("opus bitrate set to {}", bitrate);
            self.applied_bitrate = Some(bitrate);
        }

        Ok(encoder)
    }
}

impl CodecEngine for OpusEngine {
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

        // The binding exposes no complexity control; libopus keeps its default.
        let encoder = self.encoder(params.bitrate)?;
        packet.clear();
        packet.resize(MAX_PACKET_SIZE, 0);
        let written = encoder
            .encode(frame, packet)
            .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
        packet.truncate(written);

        // a one-byte packet means DTX: nothing needs to be sent
        Ok(written > 1)
    }

    fn decode(&mut self, packet: &[u8], pcm: &mut Vec<i16>) -> Result<()> {
        // libopus would run loss concealment on an empty packet
        if packet.is_empty() {
            return Err(CodecError::decoding_failed("empty packet"));
        }
        if self.decoder.is_none() {
            let decoder = opus::Decoder::new(self.sample_rate, self.channels())
                .map_err(|e| CodecError::initialization_failed(e.to_string()))?;
            self.decoder = Some(decoder);
        }
        let channels = usize::from(self.channels);
        let decoder = self
            .decoder
            .as_mut()
            .ok_or_else(|| CodecError::initialization_failed("opus decoder missing"))?;

        let capacity = self.sample_rate as usize / 1000 * MAX_DECODED_FRAME_MS * channels;
        pcm.clear();
        pcm.resize(capacity, 0);
        match decoder.decode(packet, pcm, false) {
            Ok(per_channel) => {
                pcm.truncate(per_channel * channels);
                Ok(())
            }
            Err(e) => {
                warn!("opus decode error: {}", e);
                pcm.clear();
                Err(CodecError::decoding_failed(e.to_string()))
            }
        }
    }

    fn reset(&mut self) {
        self.encoder = None;
        self.decoder = None;
        self.applied_bitrate = None;
    }
}
