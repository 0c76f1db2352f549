//! Core types and traits for the codec library
//!
//! This module defines the codec kinds understood by the stream layer, the
//! parameter set every encoder/decoder is created with, and the
//! [`CodecEngine`] capability that each codec kind implements.

use crate::error::{CodecError, Result};
use std::fmt;

/// Sample rates accepted by the perceptual codec
pub const OPUS_SAMPLE_RATES: &[u32] = &[8000, 12000, 16000, 24000, 48000];

/// Sample rate of the G.711 waveform codecs
pub const G711_SAMPLE_RATE: u32 = 8000;

/// Maximum complexity accepted by [`CodecParameters::with_complexity`]
pub const MAX_COMPLEXITY: u8 = 10;

/// Codec kinds supported by the engine factory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecKind {
    /// Opus perceptual codec
    Opus,
    /// G.711 A-law (PCMA)
    G711Pcma,
    /// G.711 μ-law (PCMU)
    G711Pcmu,
}

impl CodecKind {
    /// All codec kinds, in preference order
    pub const ALL: [CodecKind; 3] = [CodecKind::Opus, CodecKind::G711Pcma, CodecKind::G711Pcmu];

    /// Codec name as used in SDP
    pub fn name(self) -> &'static str {
        match self {
            Self::Opus => "opus",
            Self::G711Pcma => "PCMA",
            Self::G711Pcmu => "PCMU",
        }
    }

    /// Static RTP payload type, if the codec has one
    pub fn static_payload_type(self) -> Option<u8> {
        match self {
            Self::G711Pcmu => Some(0),
            Self::G711Pcma => Some(8),
            Self::Opus => None,
        }
    }

    /// RTP clock rate used for timestamps
    pub fn rtp_clock_rate(self) -> u32 {
        match self {
            Self::Opus => 48000,
            Self::G711Pcma | Self::G711Pcmu => G711_SAMPLE_RATE,
        }
    }

    /// Default sample rate
    pub fn default_sample_rate(self) -> u32 {
        match self {
            Self::Opus => 48000,
            Self::G711Pcma | Self::G711Pcmu => G711_SAMPLE_RATE,
        }
    }

    /// Supported sample rates
    pub fn supported_sample_rates(self) -> &'static [u32] {
        match self {
            Self::Opus => OPUS_SAMPLE_RATES,
            Self::G711Pcma | Self::G711Pcmu => &[G711_SAMPLE_RATE],
        }
    }

    /// Supported channel counts
    pub fn supported_channels(self) -> &'static [u8] {
        match self {
            Self::Opus => &[1, 2],
            Self::G711Pcma | Self::G711Pcmu => &[1],
        }
    }

    /// Whether the codec runs at a fixed 8 kHz mono format
    pub fn is_fixed_format(self) -> bool {
        matches!(self, Self::G711Pcma | Self::G711Pcmu)
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Duration of one codec frame
///
/// Stored in tenths of a millisecond so that 2.5 ms frames stay exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FrameDuration {
    /// 2.5 ms
    Ms2_5,
    /// 5 ms
    Ms5,
    /// 10 ms
    Ms10,
    /// 20 ms
    Ms20,
    /// 40 ms
    Ms40,
    /// 60 ms
    Ms60,
}

impl FrameDuration {
    /// All frame durations, shortest first
    pub const ALL: [FrameDuration; 6] = [
        FrameDuration::Ms2_5,
        FrameDuration::Ms5,
        FrameDuration::Ms10,
        FrameDuration::Ms20,
        FrameDuration::Ms40,
        FrameDuration::Ms60,
    ];

    /// Parse a duration given in milliseconds
    pub fn from_millis(ms: f32) -> Result<Self> {
        let tenths = (ms * 10.0).round() as i64;
        Self::ALL
            .iter()
            .copied()
            .find(|d| i64::from(d.tenths_of_ms()) == tenths && (ms * 10.0 - tenths as f32).abs() < 1e-3)
            .ok_or(CodecError::InvalidFrameDuration { millis: ms })
    }

    /// Duration in tenths of a millisecond
    pub fn tenths_of_ms(self) -> u32 {
        match self {
            Self::Ms2_5 => 25,
            Self::Ms5 => 50,
            Self::Ms10 => 100,
            Self::Ms20 => 200,
            Self::Ms40 => 400,
            Self::Ms60 => 600,
        }
    }

    /// Duration in milliseconds
    pub fn as_millis_f32(self) -> f32 {
        self.tenths_of_ms() as f32 / 10.0
    }

    /// Samples per channel in one frame at `sample_rate`
    pub fn samples_per_channel(self, sample_rate: u32) -> usize {
        (u64::from(sample_rate) * u64::from(self.tenths_of_ms()) / 10_000) as usize
    }
}

impl Default for FrameDuration {
    fn default() -> Self {
        Self::Ms20
    }
}

impl fmt::Display for FrameDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.as_millis_f32())
    }
}

/// Parameters an encoder or decoder is created with
///
/// G.711 ignores the sample rate, channel count, bitrate, complexity and
/// application fields; they are stored unchanged so a parameter set can be
/// switched between codec kinds. [`CodecParameters::effective_sample_rate`]
/// and [`CodecParameters::effective_channels`] report what the codec really
/// runs at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodecParameters {
    /// Codec kind
    pub kind: CodecKind,
    /// Frame duration
    pub frame_duration: FrameDuration,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u8,
    /// Target bitrate in bits per second, 0 selects the codec maximum
    pub bitrate: u32,
    /// Encoder complexity, 0-10
    pub complexity: u8,
    /// Tune the perceptual codec for speech rather than general audio
    pub voip: bool,
}

impl CodecParameters {
    /// Default parameters for a codec kind: native rate, mono, 20 ms frames
    pub fn new(kind: CodecKind) -> Self {
        Self {
            kind,
            frame_duration: FrameDuration::Ms20,
            sample_rate: kind.default_sample_rate(),
            channels: 1,
            bitrate: 0,
            complexity: MAX_COMPLEXITY,
            voip: true,
        }
    }

    /// Opus parameters
    pub fn opus(sample_rate: u32, channels: u8) -> Self {
        Self::new(CodecKind::Opus)
            .with_sample_rate(sample_rate)
            .with_channels(channels)
    }

    /// G.711 A-law parameters
    pub fn pcma() -> Self {
        Self::new(CodecKind::G711Pcma)
    }

    /// G.711 μ-law parameters
    pub fn pcmu() -> Self {
        Self::new(CodecKind::G711Pcmu)
    }

    /// Set frame duration
    pub fn with_frame_duration(mut self, frame_duration: FrameDuration) -> Self {
        self.frame_duration = frame_duration;
        self
    }

    /// Set sample rate
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set channel count
    pub fn with_channels(mut self, channels: u8) -> Self {
        self.channels = channels;
        self
    }

    /// Set bitrate (0 = maximum)
    pub fn with_bitrate(mut self, bitrate: u32) -> Self {
        self.bitrate = bitrate;
        self
    }

    /// Set complexity
    pub fn with_complexity(mut self, complexity: u8) -> Self {
        self.complexity = complexity;
        self
    }

    /// Select the speech or general-audio application
    pub fn with_voip(mut self, voip: bool) -> Self {
        self.voip = voip;
        self
    }

    /// Sample rate the codec actually runs at
    pub fn effective_sample_rate(&self) -> u32 {
        if self.kind.is_fixed_format() {
            G711_SAMPLE_RATE
        } else {
            self.sample_rate
        }
    }

    /// Channel count the codec actually runs at
    pub fn effective_channels(&self) -> u8 {
        if self.kind.is_fixed_format() {
            1
        } else {
            self.channels
        }
    }

    /// Interleaved samples in one frame
    pub fn frame_samples(&self) -> usize {
        self.frame_duration.samples_per_channel(self.effective_sample_rate())
            * usize::from(self.effective_channels())
    }

    /// Samples per channel in one frame
    pub fn frame_samples_per_channel(&self) -> usize {
        self.frame_duration.samples_per_channel(self.effective_sample_rate())
    }

    /// Whether two parameter sets describe the same stream format
    ///
    /// Bitrate and complexity may differ; everything that changes frame
    /// layout or codec state may not.
    pub fn same_format(&self, other: &CodecParameters) -> bool {
        self.kind == other.kind
            && self.frame_duration == other.frame_duration
            && self.effective_sample_rate() == other.effective_sample_rate()
            && self.effective_channels() == other.effective_channels()
            && (self.kind.is_fixed_format() || self.voip == other.voip)
    }

    /// Validate the parameters against the codec's supported domain
    pub fn validate(&self) -> Result<()> {
        if self.complexity > MAX_COMPLEXITY {
            return Err(CodecError::InvalidComplexity {
                complexity: self.complexity,
            });
        }

        if self.kind.is_fixed_format() {
            return Ok(());
        }

        let rates = self.kind.supported_sample_rates();
        if !rates.contains(&self.sample_rate) {
            return Err(CodecError::InvalidSampleRate {
                rate: self.sample_rate,
                supported: rates.to_vec(),
            });
        }

        let channels = self.kind.supported_channels();
        if !channels.contains(&self.channels) {
            return Err(CodecError::InvalidChannelCount {
                channels: self.channels,
                supported: channels.to_vec(),
            });
        }

        Ok(())
    }
}

/// Per-codec-kind encode/decode capability
///
/// Engines are stateful and owned by exactly one encoder or decoder. Output
/// goes into caller-provided buffers so the owner can reuse one allocation
/// across calls.
pub trait CodecEngine: Send {
    /// Codec kind implemented by this engine
    fn kind(&self) -> CodecKind;

    /// Encode one frame of interleaved PCM
    ///
    /// `packet` is cleared and filled with the encoded frame. Returns
    /// `Ok(false)` when the engine produced no packet for this frame (for
    /// example discontinuous transmission during silence).
    fn encode(&mut self, frame: &[i16], params: &CodecParameters, packet: &mut Vec<u8>) -> Result<bool>;

    /// Decode one packet into interleaved PCM
    ///
    /// `pcm` is cleared and filled with the decoded samples.
    fn decode(&mut self, packet: &[u8], pcm: &mut Vec<i16>) -> Result<()>;

    /// Drop any internal history
    fn reset(&mut self);
}
