//! Encode/decode round trips and decoder error isolation

use acodec_codec_core::{CodecKind, CodecParameters, EngineFactory, FrameDuration};
use acodec_stream_core::{Decoder, Encoder, PcmFormat, StreamError};

fn sine(len: usize, channels: usize, rate: u32, amplitude: f64) -> Vec<i16> {
    (0..len)
        .map(|i| {
            let t = (i / channels) as f64 / f64::from(rate);
            (amplitude * (2.0 * std::f64::consts::PI * 440.0 * t).sin()) as i16
        })
        .collect()
}

fn round_trip(params: CodecParameters, frames: usize) -> (Vec<i16>, Vec<i16>) {
    let mut enc = Encoder::new(params).unwrap();
    let mut dec = Decoder::from_parameters(params).unwrap();

    let rate = params.effective_sample_rate();
    let channels = usize::from(params.effective_channels());
    let input = sine(params.frame_samples() * frames, channels, rate, 10000.0);
    enc.input(&input, 0, 0).unwrap();
    while enc.has_pending_frame() {
        if let Some(packet) = enc.output().unwrap() {
            dec.input(packet);
        }
    }

    let mut output = Vec::new();
    while let Some(block) = dec.output(0, 0).unwrap() {
        assert_eq!(block.format, PcmFormat::new(rate, params.effective_channels()));
        assert_eq!(block.samples.len(), params.frame_samples());
        output.extend_from_slice(&block.samples);
    }
    (input, output)
}

fn max_error(a: &[i16], b: &[i16]) -> i32 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| (i32::from(x) - i32::from(y)).abs())
        .max()
        .unwrap_or(0)
}

#[test]
fn test_g711_round_trip_is_near_lossless() {
    for params in [CodecParameters::pcma(), CodecParameters::pcmu()] {
        let (input, output) = round_trip(params, 10);
        assert_eq!(output.len(), 10 * 160);
        assert!(max_error(&input, &output) <= 512, "{}", params.kind);
    }
}

#[test]
fn test_opus_round_trip_has_no_frame_drift() {
    for (rate, channels, duration) in [
        (8000, 1, FrameDuration::Ms20),
        (16000, 2, FrameDuration::Ms10),
        (48000, 2, FrameDuration::Ms60),
    ] {
        let params = CodecParameters::opus(rate, channels).with_frame_duration(duration);
        let (input, output) = round_trip(params, 6);
        assert_eq!(output.len(), input.len());
    }
}

#[cfg(not(feature = "opus"))]
#[test]
fn test_simulated_opus_error_is_bounded() {
    let (input, output) = round_trip(CodecParameters::opus(24000, 1), 4);
    assert!(max_error(&input, &output) <= 512);
}

#[test]
fn test_decoder_resamples_to_target() {
    let params = CodecParameters::pcmu();
    let mut enc = Encoder::new(params).unwrap();
    enc.input(&vec![0; 160 * 3], 0, 0).unwrap();

    let mut dec = Decoder::new(CodecKind::G711Pcmu, 8000, 1).unwrap();
    while let Some(packet) = enc.output().unwrap() {
        dec.input(packet);
    }

    let mut blocks = 0;
    while let Some(block) = dec.output(48000, 2).unwrap() {
        assert_eq!(block.format, PcmFormat::new(48000, 2));
        assert_eq!(block.samples.len(), 960 * 2);
        blocks += 1;
    }
    assert_eq!(blocks, 3);
}

#[test]
fn test_resampled_blocks_have_no_frame_drift() {
    let mut enc = Encoder::new(CodecParameters::pcmu()).unwrap();
    enc.input(&sine(160 * 5, 1, 8000, 8000.0), 0, 0).unwrap();

    let mut dec = Decoder::new(CodecKind::G711Pcmu, 8000, 1).unwrap();
    while let Some(packet) = enc.output().unwrap() {
        dec.input(packet);
    }

    let mut lengths = Vec::new();
    while let Some(block) = dec.output(48000, 1).unwrap() {
        lengths.push(block.samples.len());
    }
    assert_eq!(lengths, vec![960; 5]);
}

#[test]
fn test_engine_kind_must_match() {
    let engine = EngineFactory::create(&CodecParameters::pcma()).unwrap();
    let err = Decoder::with_engine(CodecParameters::pcmu(), engine).err().unwrap();
    assert!(matches!(err, StreamError::ParameterMismatch(_)));

    let engine = EngineFactory::create(&CodecParameters::pcmu()).unwrap();
    assert!(Decoder::with_engine(CodecParameters::pcmu(), engine).is_ok());
}

#[test]
fn test_malformed_packet_then_next_decodes() {
    let mut dec = Decoder::new(CodecKind::Opus, 16000, 1).unwrap();
    let mut enc = Encoder::new(CodecParameters::opus(16000, 1)).unwrap();
    enc.input(&[0; 320], 0, 0).unwrap();
    let good = enc.output().unwrap().unwrap().to_vec();

    dec.input(&[]);
    dec.input(&good);
    assert!(matches!(dec.output(0, 0), Err(StreamError::DecodeFailure(_))));
    let block = dec.output(0, 0).unwrap().unwrap();
    assert_eq!(block.samples.len(), 320);
    assert!(dec.output(0, 0).unwrap().is_none());
    assert_eq!(dec.stats().decode_failures, 1);
    assert_eq!(dec.stats().packets_decoded, 1);
}
