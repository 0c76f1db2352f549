//! PCM to packet encoder
//!
//! An [`Encoder`] accepts PCM in any chunk size and any supported native
//! format, converts it to the codec format, buffers it, and hands out one
//! encoded packet per [`Encoder::output`] call once a full frame is
//! available.

use crate::buffer::FrameBuffer;
use crate::config::StreamConfig;
use crate::error::{parameter_error, Result, StreamError};
use crate::format::{PcmFormat, Resampler};
use acodec_codec_core::{CodecEngine, CodecParameters, EngineFactory, MAX_COMPLEXITY};
use tracing::{debug, trace, warn};

/// Encoder counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderStats {
    /// Frames that produced a packet
    pub frames_encoded: u64,
    /// Frames the engine consumed without producing a packet
    pub frames_suppressed: u64,
    /// Frames dropped because the engine failed
    pub encode_failures: u64,
    /// Samples dropped because the frame buffer was full
    pub samples_dropped: u64,
}

/// Streaming encoder
pub struct Encoder {
    params: CodecParameters,
    engine: Box<dyn CodecEngine>,
    codec_format: PcmFormat,
    buffer: FrameBuffer,
    resampler: Option<Resampler>,
    converted: Vec<i16>,
    frame: Vec<i16>,
    packet: Vec<u8>,
    frames_consumed: u64,
    stats: EncoderStats,
}

impl Encoder {
    /// Create an encoder with default limits
    pub fn new(params: CodecParameters) -> Result<Self> {
        Self::with_config(params, &StreamConfig::default())
    }

    /// Create an encoder with limits from `config`
    pub fn with_config(params: CodecParameters, config: &StreamConfig) -> Result<Self> {
        let engine = EngineFactory::create(&params).map_err(parameter_error)?;
        Self::build(params, engine, config.max_queued_frames)
    }

    /// Create an encoder around an existing engine
    pub fn with_engine(params: CodecParameters, engine: Box<dyn CodecEngine>) -> Result<Self> {
        params.validate().map_err(parameter_error)?;
        if engine.kind() != params.kind {
            return Err(StreamError::mismatch(format!(
                "engine implements {}, parameters ask for {}",
                engine.kind(),
                params.kind
            )));
        }
        Self::build(params, engine, StreamConfig::default().max_queued_frames)
    }

    fn build(params: CodecParameters, engine: Box<dyn CodecEngine>, max_frames: usize) -> Result<Self> {
        let codec_format = PcmFormat::new(params.effective_sample_rate(), params.effective_channels());
        let frame_len = params.frame_samples();
        debug!(
            "Encoder created: {} {} {} frame={} samples bitrate={} complexity={}",
            params.kind, params.frame_duration, codec_format, frame_len, params.bitrate, params.complexity
        );
        Ok(Self {
            params,
            engine,
            codec_format,
            buffer: FrameBuffer::new(frame_len, max_frames),
            resampler: None,
            converted: Vec::new(),
            frame: Vec::with_capacity(frame_len),
            packet: Vec::new(),
            frames_consumed: 0,
            stats: EncoderStats::default(),
        })
    }

    /// Set the complexity used for subsequent frames
    pub fn set_complexity(&mut self, complexity: u8) -> Result<()> {
        if complexity > MAX_COMPLEXITY {
            return Err(StreamError::mismatch(format!(
                "complexity {} outside 0-{}",
                complexity, MAX_COMPLEXITY
            )));
        }
        debug!("Encoder complexity {} -> {}", self.params.complexity, complexity);
        self.params.complexity = complexity;
        Ok(())
    }

    /// Set the bitrate used for subsequent frames (0 = maximum)
    pub fn set_bitrate(&mut self, bitrate: u32) {
        debug!("Encoder bitrate {} -> {}", self.params.bitrate, bitrate);
        self.params.bitrate = bitrate;
    }

    /// Append PCM in its native format
    ///
    /// `(0, 0)` means the PCM is already in the codec format. Returns the
    /// number of whole frames ready for [`Encoder::output`]. On error nothing
    /// is buffered.
    pub fn input(&mut self, pcm: &[i16], sample_rate: u32, channels: u8) -> Result<usize> {
        let native = PcmFormat::new(sample_rate, channels).resolve(self.codec_format);
        native.validate()?;
        native.check_len(pcm.len())?;

        let dropped = if native == self.codec_format {
            self.buffer.push(pcm)
        } else {
            let resampler = match self.resampler.take() {
                Some(r) if r.from_format() == native => r,
                _ => {
                    debug!("Encoder input format {} -> {}", native, self.codec_format);
                    Resampler::new(native, self.codec_format)?
                }
            };
            let resampler = self.resampler.insert(resampler);
            self.converted.clear();
            resampler.process(pcm, &mut self.converted)?;
            self.buffer.push(&self.converted)
        };

        if dropped > 0 {
            self.stats.samples_dropped += dropped as u64;
            warn!("Encoder buffer full, dropped {} oldest samples", dropped);
        }
        Ok(self.buffer.frames_available())
    }

    /// Encode the next buffered frame
    ///
    /// Returns `Ok(None)` when less than a frame is buffered, or when the
    /// engine consumed the frame without emitting a packet; use
    /// [`Encoder::has_pending_frame`] to tell the two apart. The returned
    /// packet borrows an internal buffer that the next call overwrites.
    pub fn output(&mut self) -> Result<Option<&[u8]>> {
        let params = self.params;
        if !self.buffer.carve_into(&mut self.frame) {
            return Ok(None);
        }
        self.frames_consumed += 1;

        match self.engine.encode(&self.frame, &params, &mut self.packet) {
            Ok(true) => {
                self.stats.frames_encoded += 1;
                trace!("Encoded frame {} into {} bytes", self.frames_consumed, self.packet.len());
                Ok(Some(self.packet.as_slice()))
            }
            Ok(false) => {
                self.stats.frames_suppressed += 1;
                trace!("Frame {} suppressed", self.frames_consumed);
                Ok(None)
            }
            Err(e) => {
                self.stats.encode_failures += 1;
                warn!("Dropping frame {}: {}", self.frames_consumed, e);
                Err(StreamError::EncodeFailure(e.to_string()))
            }
        }
    }

    /// Whether a whole frame is buffered
    pub fn has_pending_frame(&self) -> bool {
        self.buffer.frames_available() > 0
    }

    /// Frames carved from the buffer so far, suppressed and failed ones included
    pub fn frames_consumed(&self) -> u64 {
        self.frames_consumed
    }

    /// Buffered samples not yet encoded
    pub fn buffered_samples(&self) -> usize {
        self.buffer.len()
    }

    /// Current parameters
    pub fn parameters(&self) -> &CodecParameters {
        &self.params
    }

    /// Format the engine is fed with
    pub fn codec_format(&self) -> PcmFormat {
        self.codec_format
    }

    /// Counters
    pub fn stats(&self) -> EncoderStats {
        self.stats
    }

    /// Drop buffered PCM, conversion history and engine state
    pub fn reset(&mut self) {
        self.buffer.clear();
        if let Some(r) = self.resampler.as_mut() {
            r.reset();
        }
        self.engine.reset();
    }
}

impl std::fmt::Debug for Encoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoder")
            .field("params", &self.params)
            .field("buffered_samples", &self.buffer.len())
            .field("stats", &self.stats)
            .finish()
    }
}
