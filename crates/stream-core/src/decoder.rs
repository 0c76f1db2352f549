//! Packet to PCM decoder

use crate::buffer::PacketQueue;
use crate::config::StreamConfig;
use crate::error::{parameter_error, Result, StreamError};
use crate::format::{PcmBlock, PcmFormat, Resampler};
use acodec_codec_core::{CodecEngine, CodecKind, CodecParameters, EngineFactory};
use bytes::Bytes;
use tracing::{debug, trace, warn};

/// Decoder counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Packets decoded successfully
    pub packets_decoded: u64,
    /// Packets dropped because they could not be decoded
    pub decode_failures: u64,
    /// Packets dropped because the queue was full
    pub packets_dropped: u64,
}

/// Streaming decoder
///
/// Packets are queued whole and decoded one per [`Decoder::output`] call,
/// in arrival order.
pub struct Decoder {
    params: CodecParameters,
    engine: Box<dyn CodecEngine>,
    native: PcmFormat,
    queue: PacketQueue,
    resampler: Option<Resampler>,
    decoded: Vec<i16>,
    block: PcmBlock,
    stats: DecoderStats,
}

impl Decoder {
    /// Create a decoder for a codec kind and its native format
    ///
    /// G.711 always decodes 8000 Hz mono; `sample_rate` and `channels` are
    /// ignored for it.
    pub fn new(kind: CodecKind, sample_rate: u32, channels: u8) -> Result<Self> {
        let params = CodecParameters::new(kind)
            .with_sample_rate(sample_rate)
            .with_channels(channels);
        Self::from_parameters(params)
    }

    /// Create a decoder from a full parameter set
    pub fn from_parameters(params: CodecParameters) -> Result<Self> {
        let engine = EngineFactory::create(&params).map_err(parameter_error)?;
        Self::build(params, engine)
    }

    /// Create a decoder around an existing engine
    pub fn with_engine(params: CodecParameters, engine: Box<dyn CodecEngine>) -> Result<Self> {
        params.validate().map_err(parameter_error)?;
        if engine.kind() != params.kind {
            return Err(StreamError::mismatch(format!(
                "engine implements {}, parameters ask for {}",
                engine.kind(),
                params.kind
            )));
        }
        Self::build(params, engine)
    }

    fn build(params: CodecParameters, engine: Box<dyn CodecEngine>) -> Result<Self> {
        let native = PcmFormat::new(params.effective_sample_rate(), params.effective_channels());
        debug!("Decoder created: {} {}", params.kind, native);
        Ok(Self {
            params,
            engine,
            native,
            queue: PacketQueue::bounded(StreamConfig::default().max_queued_packets),
            resampler: None,
            decoded: Vec::new(),
            block: PcmBlock::default(),
            stats: DecoderStats::default(),
        })
    }

    /// Replace the queue limit; `None` queues without bound
    ///
    /// Already queued packets are kept.
    pub fn with_queue_limit(mut self, limit: Option<usize>) -> Self {
        let mut queue = match limit {
            Some(limit) => PacketQueue::bounded(limit),
            None => PacketQueue::new(),
        };
        while let Some(packet) = self.queue.pop() {
            if queue.push(packet).is_some() {
                self.stats.packets_dropped += 1;
            }
        }
        self.queue = queue;
        self
    }

    /// Queue one packet, returning the queue length
    pub fn input(&mut self, packet: &[u8]) -> usize {
        self.input_bytes(Bytes::copy_from_slice(packet))
    }

    /// Queue one packet without copying it
    pub fn input_bytes(&mut self, packet: Bytes) -> usize {
        if self.queue.push(packet).is_some() {
            self.stats.packets_dropped += 1;
            warn!("Decoder queue full, dropped oldest packet");
        }
        self.queue.len()
    }

    /// Format [`Decoder::output`] produces for a requested target
    pub fn output_format(&self, sample_rate: u32, channels: u8) -> Result<PcmFormat> {
        let target = PcmFormat::new(sample_rate, channels);
        target.validate_target()?;
        Ok(target.resolve(self.native))
    }

    /// Decode the oldest queued packet
    ///
    /// `(0, 0)` selects the codec's native format. Returns `Ok(None)` when no
    /// packet is queued. A packet that fails to decode is dropped and
    /// reported as [`StreamError::DecodeFailure`]; the next call moves on to
    /// the following packet. The returned block borrows an internal buffer
    /// that the next call overwrites.
    pub fn output(&mut self, sample_rate: u32, channels: u8) -> Result<Option<&PcmBlock>> {
        let target = self.output_format(sample_rate, channels)?;
        let Some(packet) = self.queue.pop() else {
            return Ok(None);
        };

        if let Err(e) = self.engine.decode(&packet, &mut self.decoded) {
            return Err(self.drop_packet(packet.len(), e.to_string()));
        }
        if self.decoded.is_empty() {
            return Err(self.drop_packet(packet.len(), "no samples decoded".into()));
        }
        if let Err(e) = self.native.check_len(self.decoded.len()) {
            return Err(self.drop_packet(packet.len(), e.to_string()));
        }

        self.block.samples.clear();
        if target == self.native {
            self.block.samples.extend_from_slice(&self.decoded);
        } else {
            let resampler = match self.resampler.take() {
                Some(r) if r.to_format() == target => r,
                _ => {
                    debug!("Decoder output format {} -> {}", self.native, target);
                    Resampler::new(self.native, target)?
                }
            };
            self.resampler
                .insert(resampler)
                .process(&self.decoded, &mut self.block.samples)?;
        }
        self.block.format = target;
        self.stats.packets_decoded += 1;
        trace!(
            "Decoded {} bytes into {} samples at {}",
            packet.len(),
            self.block.samples.len(),
            target
        );
        Ok(Some(&self.block))
    }

    fn drop_packet(&mut self, len: usize, reason: String) -> StreamError {
        self.stats.decode_failures += 1;
        warn!("Dropping undecodable {} packet ({} bytes): {}", self.params.kind, len, reason);
        StreamError::DecodeFailure(reason)
    }

    /// Drop the oldest queued packet without decoding it
    pub fn discard_oldest(&mut self) -> bool {
        self.queue.discard_oldest()
    }

    /// Queued packets
    pub fn pending_packets(&self) -> usize {
        self.queue.len()
    }

    /// Format the codec decodes to
    pub fn native_format(&self) -> PcmFormat {
        self.native
    }

    /// Parameters the decoder was created with
    pub fn parameters(&self) -> &CodecParameters {
        &self.params
    }

    /// Counters
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Drop queued packets, conversion history and engine state
    pub fn reset(&mut self) {
        self.queue.clear();
        if let Some(r) = self.resampler.as_mut() {
            r.reset();
        }
        self.engine.reset();
    }
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("kind", &self.params.kind)
            .field("native", &self.native)
            .field("pending_packets", &self.queue.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_queue_is_not_ready() {
        let mut dec = Decoder::new(CodecKind::G711Pcmu, 8000, 1).unwrap();
        assert!(dec.output(0, 0).unwrap().is_none());
    }

    #[test]
    fn test_g711_ignores_requested_format() {
        let dec = Decoder::new(CodecKind::G711Pcma, 48000, 2).unwrap();
        assert_eq!(dec.native_format(), PcmFormat::new(8000, 1));
    }

    #[test]
    fn test_decode_native() {
        let mut dec = Decoder::new(CodecKind::G711Pcmu, 8000, 1).unwrap();
        assert_eq!(dec.input(&[0xFF; 160]), 1);
        let block = dec.output(0, 0).unwrap().unwrap();
        assert_eq!(block.format, PcmFormat::new(8000, 1));
        assert_eq!(block.samples.len(), 160);
        assert!(block.samples.iter().all(|&s| s == 0));
        assert_eq!(dec.stats().packets_decoded, 1);
    }

    #[test]
    fn test_decode_to_stereo() {
        let mut dec = Decoder::new(CodecKind::G711Pcmu, 8000, 1).unwrap();
        dec.input(&[0x80; 160]);
        let block = dec.output(8000, 2).unwrap().unwrap();
        assert_eq!(block.format, PcmFormat::new(8000, 2));
        assert_eq!(block.samples.len(), 320);
        assert_eq!(block.samples[0], block.samples[1]);
    }

    #[test]
    fn test_malformed_packet_is_isolated() {
        let mut dec = Decoder::new(CodecKind::G711Pcma, 8000, 1).unwrap();
        dec.input(&[]);
        dec.input(&[0xD5; 80]);
        assert!(matches!(dec.output(0, 0), Err(StreamError::DecodeFailure(_))));
        assert_eq!(dec.output(0, 0).unwrap().unwrap().samples.len(), 80);
        assert_eq!(dec.stats().decode_failures, 1);
    }

    #[test]
    fn test_invalid_target_keeps_packet() {
        let mut dec = Decoder::new(CodecKind::G711Pcma, 8000, 1).unwrap();
        dec.input(&[0xD5; 80]);
        assert!(matches!(dec.output(11025, 3), Err(StreamError::ParameterMismatch(_))));
        assert_eq!(dec.pending_packets(), 1);
        assert_eq!(dec.output_format(0, 0).unwrap(), PcmFormat::new(8000, 1));
        assert_eq!(dec.output_format(16000, 2).unwrap(), PcmFormat::new(16000, 2));
    }

    #[test]
    fn test_queue_limit() {
        let mut dec = Decoder::new(CodecKind::G711Pcmu, 8000, 1)
            .unwrap()
            .with_queue_limit(Some(2));
        dec.input(&[0xFF; 1]);
        dec.input(&[0xFF; 2]);
        assert_eq!(dec.input(&[0xFF; 3]), 2);
        assert_eq!(dec.stats().packets_dropped, 1);
        assert_eq!(dec.output(0, 0).unwrap().unwrap().samples.len(), 2);
        assert!(dec.discard_oldest());
        assert_eq!(dec.pending_packets(), 0);
    }
}
