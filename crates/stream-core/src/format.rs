//! PCM formats and format conversion
//!
//! [`Resampler`] converts interleaved 16-bit PCM between two
//! (sample rate, channels) pairs. Channel mapping runs first, then linear
//! interpolation on the rate. Interpolation position and the last input
//! frame carry over between calls, so a signal fed in arbitrary chunks
//! converts the same as one fed in a single call.

use crate::error::{Result, StreamError};
use std::fmt;

/// Lowest sample rate the converter accepts
pub const MIN_SAMPLE_RATE: u32 = 8000;

/// Highest sample rate the converter accepts
pub const MAX_SAMPLE_RATE: u32 = 96000;

/// Sample rate and channel count of interleaved PCM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PcmFormat {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Interleaved channels
    pub channels: u8,
}

impl PcmFormat {
    /// Create a format
    pub const fn new(sample_rate: u32, channels: u8) -> Self {
        Self { sample_rate, channels }
    }

    /// `(0, 0)`: whatever the producer natively emits
    pub const NATIVE: PcmFormat = PcmFormat::new(0, 0);

    /// Whether this is the `(0, 0)` placeholder
    pub fn is_native(&self) -> bool {
        self.sample_rate == 0 && self.channels == 0
    }

    /// Replace the `(0, 0)` placeholder with `native`
    pub fn resolve(self, native: PcmFormat) -> PcmFormat {
        if self.is_native() {
            native
        } else {
            self
        }
    }

    /// Check the format against the converter domain
    pub fn validate(&self) -> Result<()> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(StreamError::mismatch(format!(
                "sample rate {}Hz outside {}-{}Hz",
                self.sample_rate, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE
            )));
        }
        if !(1..=2).contains(&self.channels) {
            return Err(StreamError::mismatch(format!(
                "{} channels, expected 1 or 2",
                self.channels
            )));
        }
        Ok(())
    }

    /// Like [`PcmFormat::validate`] but also accepts `(0, 0)`
    pub fn validate_target(&self) -> Result<()> {
        if self.is_native() {
            Ok(())
        } else {
            self.validate()
        }
    }

    /// Check that `len` interleaved samples hold whole frames
    pub fn check_len(&self, len: usize) -> Result<()> {
        if self.channels == 0 || len % usize::from(self.channels) != 0 {
            return Err(StreamError::mismatch(format!(
                "{} samples is not a multiple of {} channels",
                len, self.channels
            )));
        }
        Ok(())
    }
}

impl fmt::Display for PcmFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Hz/{}ch", self.sample_rate, self.channels)
    }
}

/// Interleaved PCM with the format it is in
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PcmBlock {
    /// Interleaved samples
    pub samples: Vec<i16>,
    /// Format of `samples`
    pub format: PcmFormat,
}

impl PcmBlock {
    /// Samples per channel
    pub fn frames(&self) -> usize {
        match self.format.channels {
            0 => 0,
            ch => self.samples.len() / usize::from(ch),
        }
    }

    /// Duration in milliseconds
    pub fn duration_ms(&self) -> f64 {
        if self.format.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 * 1000.0 / f64::from(self.format.sample_rate)
    }
}

/// Convert planar float PCM in `[-1, 1]` to interleaved 16-bit PCM
///
/// `planar` holds all samples of channel 0, then all of channel 1. Values
/// outside the range are clamped.
pub fn planar_to_interleaved(planar: &[f32], channels: u8, out: &mut Vec<i16>) -> Result<()> {
    if !(1..=2).contains(&channels) {
        return Err(StreamError::mismatch(format!("{} planar channels", channels)));
    }
    let channels = usize::from(channels);
    if planar.len() % channels != 0 {
        return Err(StreamError::mismatch(format!(
            "{} planar samples is not a multiple of {} channels",
            planar.len(),
            channels
        )));
    }

    let frames = planar.len() / channels;
    out.clear();
    out.reserve(planar.len());
    for i in 0..frames {
        for ch in 0..channels {
            out.push(float_to_i16(planar[ch * frames + i]));
        }
    }
    Ok(())
}

fn float_to_i16(sample: f32) -> i16 {
    let s = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Streaming sample rate and channel converter
#[derive(Debug, Clone)]
pub struct Resampler {
    from: PcmFormat,
    to: PcmFormat,
    /// Channel-mapped input, prefixed by `history`
    work: Vec<i16>,
    /// Last mapped input frame of the previous call
    history: Vec<i16>,
    /// Read position in 1/`to.sample_rate` input frames, relative to `work`.
    /// Never behind the last frame of the previous call once rebased.
    position: u64,
}

impl Resampler {
    /// Create a converter between two formats
    pub fn new(from: PcmFormat, to: PcmFormat) -> Result<Self> {
        from.validate()?;
        to.validate()?;
        Ok(Self {
            from,
            to,
            work: Vec::new(),
            history: Vec::new(),
            position: 0,
        })
    }

    /// Input format
    pub fn from_format(&self) -> PcmFormat {
        self.from
    }

    /// Output format
    pub fn to_format(&self) -> PcmFormat {
        self.to
    }

    /// Whether input passes through unchanged
    pub fn is_passthrough(&self) -> bool {
        self.from == self.to
    }

    /// Convert one chunk, appending the result to `out`
    pub fn process(&mut self, input: &[i16], out: &mut Vec<i16>) -> Result<()> {
        self.from.check_len(input.len())?;

        if self.is_passthrough() {
            out.extend_from_slice(input);
            return Ok(());
        }

        if self.from.sample_rate == self.to.sample_rate {
            map_channels(input, self.from.channels, self.to.channels, out);
            return Ok(());
        }

        let mut work = std::mem::take(&mut self.work);
        work.clear();
        work.extend_from_slice(&self.history);
        map_channels(input, self.from.channels, self.to.channels, &mut work);
        self.interpolate(&work, out);
        self.work = work;
        Ok(())
    }

    fn interpolate(&mut self, work: &[i16], out: &mut Vec<i16>) {
        let channels = usize::from(self.to.channels);
        let frames = (work.len() / channels) as u64;
        if frames == 0 {
            return;
        }

        let step = u64::from(self.from.sample_rate);
        let denom = u64::from(self.to.sample_rate);

        // Output covers exactly the input received so far; the tail past the
        // last frame holds that frame until the next call supplies its successor.
        let end = frames * denom;
        while self.position < end {
            let index = (self.position / denom) as usize;
            let next = (index + 1).min(frames as usize - 1);
            let frac = (self.position % denom) as i64;
            for ch in 0..channels {
                let s0 = i64::from(work[index * channels + ch]);
                let s1 = i64::from(work[next * channels + ch]);
                out.push((s0 + (s1 - s0) * frac / denom as i64) as i16);
            }
            self.position += step;
        }

        let last = (frames - 1) as usize;
        self.position -= last as u64 * denom;
        self.history.clear();
        self.history
            .extend_from_slice(&work[last * channels..(last + 1) * channels]);
    }

    /// Drop interpolation history
    pub fn reset(&mut self) {
        self.history.clear();
        self.work.clear();
        self.position = 0;
    }
}

fn map_channels(input: &[i16], from: u8, to: u8, out: &mut Vec<i16>) {
    match (from, to) {
        (1, 2) => {
            out.reserve(input.len() * 2);
            for &sample in input {
                out.push(sample);
                out.push(sample);
            }
        }
        (2, 1) => {
            out.reserve(input.len() / 2);
            for pair in input.chunks_exact(2) {
                out.push(((i32::from(pair[0]) + i32::from(pair[1])) / 2) as i16);
            }
        }
        _ => out.extend_from_slice(input),
    }
}
