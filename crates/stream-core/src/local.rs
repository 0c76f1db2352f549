//! Capture side stream: PCM in, RTP media frames out

use crate::config::StreamConfig;
use crate::encoder::{Encoder, EncoderStats};
use crate::error::{parameter_error, Result, StreamError};
use crate::format::{planar_to_interleaved, PcmFormat};
use crate::rtp::{MediaFrame, MAX_PAYLOAD_TYPE};
use acodec_codec_core::CodecParameters;
use tracing::{debug, info};

/// Encoder plus the RTP state of one outbound stream
///
/// Codec parameters are read at the start of every [`LocalStream::output`]
/// call. Changing only bitrate or complexity keeps buffered PCM; any other
/// change replaces the encoder and drops what was buffered.
#[derive(Debug)]
pub struct LocalStream {
    config: StreamConfig,
    encoder: Option<Encoder>,
    input_format: PcmFormat,
    payload_type: u8,
    ssrc: u32,
    sequence: u16,
    next_timestamp: u32,
    timestamp_step: u32,
    talkspurt_start: bool,
    planar: Vec<i16>,
    frame: MediaFrame,
}

impl Default for LocalStream {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalStream {
    /// Create an unconfigured stream
    pub fn new() -> Self {
        Self::with_config(StreamConfig::default())
    }

    /// Create an unconfigured stream with explicit limits
    pub fn with_config(config: StreamConfig) -> Self {
        let next_timestamp = rand::random::<u32>();
        let sequence = rand::random::<u16>();
        debug!("LocalStream created, first seq={} ts={}", sequence, next_timestamp);
        Self {
            config,
            encoder: None,
            input_format: PcmFormat::NATIVE,
            payload_type: 0,
            ssrc: 0,
            sequence,
            next_timestamp,
            timestamp_step: 0,
            talkspurt_start: true,
            planar: Vec::new(),
            frame: MediaFrame::default(),
        }
    }

    /// Configure the codec
    pub fn set_codec_parameters(&mut self, params: CodecParameters) -> Result<()> {
        if let Some(encoder) = self.encoder.as_mut() {
            if encoder.parameters().same_format(&params) {
                params.validate().map_err(parameter_error)?;
                encoder.set_bitrate(params.bitrate);
                encoder.set_complexity(params.complexity)?;
                return Ok(());
            }
        }

        let encoder = Encoder::with_config(params, &self.config)?;
        if let Some(old) = self.encoder.replace(encoder) {
            debug!(
                "LocalStream codec {} -> {}, dropped {} buffered samples",
                old.parameters().kind,
                params.kind,
                old.buffered_samples()
            );
        }
        self.timestamp_step = params
            .frame_duration
            .samples_per_channel(params.kind.rtp_clock_rate()) as u32;
        self.talkspurt_start = true;
        info!(
            "LocalStream codec={} frame={} format={}Hz/{}ch timestamp step={}",
            params.kind,
            params.frame_duration,
            params.effective_sample_rate(),
            params.effective_channels(),
            self.timestamp_step
        );
        Ok(())
    }

    /// Change the bitrate for subsequent frames
    pub fn set_codec_bitrate(&mut self, bitrate: u32) -> Result<()> {
        self.encoder_mut("set_codec_bitrate")?.set_bitrate(bitrate);
        Ok(())
    }

    /// Change the complexity for subsequent frames
    pub fn set_codec_complexity(&mut self, complexity: u8) -> Result<()> {
        self.encoder_mut("set_codec_complexity")?.set_complexity(complexity)
    }

    /// Set the SSRC and payload type stamped on outgoing frames
    pub fn set_rtp_parameters(&mut self, ssrc: u32, payload_type: u8) -> Result<()> {
        if payload_type > MAX_PAYLOAD_TYPE {
            return Err(StreamError::mismatch(format!("payload type {} above 127", payload_type)));
        }
        debug!("LocalStream rtp ssrc={} payload type={}", ssrc, payload_type);
        self.ssrc = ssrc;
        self.payload_type = payload_type;
        Ok(())
    }

    /// Declare the format of PCM passed to [`LocalStream::input`]
    ///
    /// `(0, 0)` means the PCM is already in the codec format.
    pub fn set_input_parameters(&mut self, sample_rate: u32, channels: u8) -> Result<()> {
        let format = PcmFormat::new(sample_rate, channels);
        format.validate_target()?;
        if format != self.input_format {
            debug!("LocalStream input format {}", format);
        }
        self.input_format = format;
        Ok(())
    }

    /// Append interleaved PCM in the declared input format
    pub fn input(&mut self, pcm: &[i16]) -> Result<usize> {
        let format = self.input_format;
        self.encoder_mut("input")?
            .input(pcm, format.sample_rate, format.channels)
    }

    /// Append planar float PCM, updating the declared input format
    ///
    /// Samples are clamped to `[-1, 1]` and scaled to 16 bits.
    pub fn input2(&mut self, planar: &[f32], sample_rate: u32, channels: u8) -> Result<usize> {
        let codec_format = self.encoder_mut("input2")?.codec_format();
        let format = PcmFormat::new(sample_rate, channels);
        format.validate_target()?;

        let mut pcm = std::mem::take(&mut self.planar);
        let result = planar_to_interleaved(planar, format.resolve(codec_format).channels, &mut pcm)
            .and_then(|()| {
                self.set_input_parameters(sample_rate, channels)?;
                self.input(&pcm)
            });
        self.planar = pcm;
        result
    }

    /// Encode the next buffered frame into a media frame
    ///
    /// Returns `Ok(None)` when no frame is ready or the codec suppressed the
    /// frame. Every consumed frame advances the RTP timestamp; only emitted
    /// frames advance the sequence number. The returned frame borrows an
    /// internal buffer that the next call overwrites.
    pub fn output(&mut self) -> Result<Option<&MediaFrame>> {
        let Some(encoder) = self.encoder.as_mut() else {
            return Err(StreamError::NotConfigured("output"));
        };
        if !encoder.has_pending_frame() {
            return Ok(None);
        }

        let timestamp = self.next_timestamp;
        self.next_timestamp = self.next_timestamp.wrapping_add(self.timestamp_step);

        let Some(packet) = encoder.output()? else {
            self.talkspurt_start = true;
            return Ok(None);
        };

        self.frame.payload.clear();
        self.frame.payload.extend_from_slice(packet);
        self.frame.payload_type = self.payload_type;
        self.frame.ssrc = self.ssrc;
        self.frame.sequence = self.sequence;
        self.frame.timestamp = timestamp;
        self.frame.marker = self.talkspurt_start;
        self.sequence = self.sequence.wrapping_add(1);
        self.talkspurt_start = false;
        Ok(Some(&self.frame))
    }

    fn encoder_mut(&mut self, op: &'static str) -> Result<&mut Encoder> {
        self.encoder.as_mut().ok_or(StreamError::NotConfigured(op))
    }

    /// Current codec parameters
    pub fn parameters(&self) -> Option<&CodecParameters> {
        self.encoder.as_ref().map(Encoder::parameters)
    }

    /// Declared input format
    pub fn input_format(&self) -> PcmFormat {
        self.input_format
    }

    /// Payload type stamped on outgoing frames
    pub fn payload_type(&self) -> u8 {
        self.payload_type
    }

    /// SSRC stamped on outgoing frames
    pub fn ssrc(&self) -> u32 {
        self.ssrc
    }

    /// Sequence number of the next emitted frame
    pub fn next_sequence(&self) -> u16 {
        self.sequence
    }

    /// Timestamp of the next consumed frame
    pub fn next_timestamp(&self) -> u32 {
        self.next_timestamp
    }

    /// Encoder counters, if configured
    pub fn stats(&self) -> Option<EncoderStats> {
        self.encoder.as_ref().map(Encoder::stats)
    }
}
