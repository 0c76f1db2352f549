//! RemoteStream demultiplexing tests
//!
//! Marker engines fill every decoded sample with the id of the engine
//! instance, so each output block shows which decoder produced it.

use acodec_codec_core::{CodecEngine, CodecError, CodecKind, CodecParameters};
use acodec_stream_core::{RemoteStream, StreamError};
use std::sync::atomic::{AtomicI16, Ordering};
use std::sync::Arc;

struct MarkerEngine {
    kind: CodecKind,
    id: i16,
}

impl CodecEngine for MarkerEngine {
    fn kind(&self) -> CodecKind {
        self.kind
    }

    fn encode(&mut self, _frame: &[i16], _params: &CodecParameters, _packet: &mut Vec<u8>) -> acodec_codec_core::Result<bool> {
        Err(CodecError::encoding_failed("decode only"))
    }

    fn decode(&mut self, packet: &[u8], pcm: &mut Vec<i16>) -> acodec_codec_core::Result<()> {
        if packet.first() == Some(&0xEE) {
            return Err(CodecError::decoding_failed("marked bad"));
        }
        pcm.clear();
        pcm.resize(packet.len(), self.id);
        Ok(())
    }

    fn reset(&mut self) {}
}

fn marker_stream() -> (RemoteStream, Arc<AtomicI16>) {
    let next_id = Arc::new(AtomicI16::new(1));
    let ids = Arc::clone(&next_id);
    let stream = RemoteStream::new().with_engine_factory(Box::new(move |params: &CodecParameters| {
        Ok(Box::new(MarkerEngine {
            kind: params.kind,
            id: ids.fetch_add(1, Ordering::SeqCst),
        }) as Box<dyn CodecEngine>)
    }));
    (stream, next_id)
}

fn drain(stream: &mut RemoteStream) -> Vec<Vec<i16>> {
    let mut blocks = Vec::new();
    while let Some(block) = stream.output(0, 0).unwrap() {
        blocks.push(block.samples.clone());
    }
    blocks
}

#[test]
fn test_interleaved_payload_types_drain_in_arrival_order() {
    let (mut stream, next_id) = marker_stream();
    stream.register_payload_type(1, CodecKind::G711Pcmu, 8000, 1).unwrap();
    stream.register_payload_type(2, CodecKind::G711Pcma, 8000, 1).unwrap();

    stream.input(1, &[0; 3]).unwrap();
    stream.input(2, &[0; 4]).unwrap();
    stream.input(1, &[0; 5]).unwrap();

    // one decoder per payload type, created on first packet
    assert_eq!(next_id.load(Ordering::SeqCst), 3);
    assert_eq!(drain(&mut stream), vec![vec![1; 3], vec![2; 4], vec![1; 5]]);
}

#[test]
fn test_burst_of_one_type_does_not_starve_order() {
    let (mut stream, _) = marker_stream();
    stream.register_payload_type(96, CodecKind::Opus, 48000, 1).unwrap();
    stream.register_payload_type(0, CodecKind::G711Pcmu, 8000, 1).unwrap();

    for len in [1, 2, 3] {
        stream.input(96, &vec![0; len]).unwrap();
    }
    stream.input(0, &[0; 9]).unwrap();
    stream.input(96, &[0; 4]).unwrap();

    let lens: Vec<usize> = drain(&mut stream).iter().map(Vec::len).collect();
    assert_eq!(lens, vec![1, 2, 3, 9, 4]);
}

#[test]
fn test_unknown_payload_type_leaves_no_trace() {
    let (mut stream, next_id) = marker_stream();
    stream.register_payload_type(1, CodecKind::G711Pcmu, 8000, 1).unwrap();
    stream.input(1, &[0; 2]).unwrap();

    assert!(matches!(stream.input(7, &[0; 10]), Err(StreamError::UnknownPayloadType(7))));
    assert_eq!(stream.pending_packets(), 1);
    assert_eq!(next_id.load(Ordering::SeqCst), 2);
    assert_eq!(drain(&mut stream), vec![vec![1; 2]]);
    assert_eq!(stream.stats().unknown_payload_type, 1);
}

#[test]
fn test_rebinding_discards_stale_packets() {
    let (mut stream, _) = marker_stream();
    stream.register_payload_type(1, CodecKind::G711Pcmu, 8000, 1).unwrap();
    stream.register_payload_type(2, CodecKind::G711Pcma, 8000, 1).unwrap();
    stream.input(1, &[0; 3]).unwrap();
    stream.input(2, &[0; 4]).unwrap();
    stream.input(1, &[0; 5]).unwrap();

    stream.register_payload_type(1, CodecKind::Opus, 16000, 2).unwrap();
    assert_eq!(stream.pending_packets(), 1);
    assert_eq!(stream.stats().stale_packets_dropped, 2);

    stream.input(1, &[0; 6]).unwrap();
    // payload type 1 gets a fresh decoder (id 3)
    assert_eq!(drain(&mut stream), vec![vec![2; 4], vec![3; 6]]);
    assert_eq!(stream.binding(1).unwrap().kind, CodecKind::Opus);
}

#[test]
fn test_rebinding_same_format_keeps_decoder() {
    let (mut stream, next_id) = marker_stream();
    stream.register_payload_type(0, CodecKind::G711Pcmu, 8000, 1).unwrap();
    stream.input(0, &[0; 2]).unwrap();
    // G.711 ignores rate and channels, so this is the same format
    stream.register_payload_type(0, CodecKind::G711Pcmu, 16000, 2).unwrap();
    stream.input(0, &[0; 3]).unwrap();

    assert_eq!(drain(&mut stream), vec![vec![1; 2], vec![1; 3]]);
    assert_eq!(next_id.load(Ordering::SeqCst), 2);
}

#[test]
fn test_decode_failure_is_isolated() {
    let (mut stream, _) = marker_stream();
    stream.register_payload_type(1, CodecKind::G711Pcmu, 8000, 1).unwrap();
    stream.register_payload_type(2, CodecKind::G711Pcma, 8000, 1).unwrap();
    stream.input(1, &[0xEE, 0]).unwrap();
    stream.input(2, &[0; 2]).unwrap();
    stream.input(1, &[0; 3]).unwrap();

    assert!(matches!(stream.output(0, 0), Err(StreamError::DecodeFailure(_))));
    assert_eq!(stream.output(0, 0).unwrap().unwrap().samples, vec![2; 2]);
    assert_eq!(stream.output(0, 0).unwrap().unwrap().samples, vec![1; 3]);
    assert!(stream.output(0, 0).unwrap().is_none());
    assert_eq!(stream.stats().decode_failures, 1);
}

#[test]
fn test_real_codecs_share_one_output_queue() {
    let mut stream = RemoteStream::new();
    stream.register_payload_type(0, CodecKind::G711Pcmu, 8000, 1).unwrap();
    stream.register_payload_type(8, CodecKind::G711Pcma, 8000, 1).unwrap();

    stream.input(0, &[0xFF; 160]).unwrap();
    stream.input(8, &[0xD5; 160]).unwrap();

    let first = stream.output(16000, 1).unwrap().unwrap().clone();
    assert!(first.samples.iter().all(|&s| s == 0));
    let second = stream.output(0, 0).unwrap().unwrap();
    assert_eq!(second.samples.len(), 160);
    assert!(second.samples.iter().all(|&s| s == 8));
}

#[test]
fn test_invalid_output_format_keeps_queue() {
    let mut stream = RemoteStream::new();
    stream.register_payload_type(0, CodecKind::G711Pcmu, 8000, 1).unwrap();
    stream.input(0, &[0xFF; 160]).unwrap();
    assert!(matches!(stream.output(1000, 1), Err(StreamError::ParameterMismatch(_))));
    assert_eq!(stream.pending_packets(), 1);
}
