//! Playback side stream: interleaved packets of several payload types in,
//! PCM out
//!
//! Each payload type is bound to a codec format and gets its own
//! [`Decoder`], created when the first packet for it arrives. Output follows
//! the order packets arrived in across all payload types.

use crate::config::StreamConfig;
use crate::decoder::Decoder;
use crate::error::{parameter_error, Result, StreamError};
use crate::format::{PcmBlock, PcmFormat};
use crate::rtp::{parse_payload_type, MAX_PAYLOAD_TYPE};
use acodec_codec_core::{CodecEngine, CodecKind, CodecParameters};
use bytes::Bytes;
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info, warn};

/// Codec format a payload type is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadTypeBinding {
    /// RTP payload type, 0-127
    pub payload_type: u8,
    /// Codec kind
    pub kind: CodecKind,
    /// Sample rate the remote encodes at
    pub sample_rate: u32,
    /// Channels the remote encodes
    pub channels: u8,
}

impl PayloadTypeBinding {
    /// Decoder parameters for this binding
    pub fn parameters(&self) -> CodecParameters {
        CodecParameters::new(self.kind)
            .with_sample_rate(self.sample_rate)
            .with_channels(self.channels)
    }
}

/// Remote stream counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoteStreamStats {
    /// Packets accepted into the stream
    pub packets_received: u64,
    /// Packets dropped for an unbound payload type
    pub unknown_payload_type: u64,
    /// Undecoded packets discarded when their binding changed
    pub stale_packets_dropped: u64,
    /// Packets that failed to decode
    pub decode_failures: u64,
    /// Packets dropped because the stream queue was full
    pub overflow_drops: u64,
}

/// Creates the engine for a newly bound payload type
pub type EngineFactoryFn =
    Box<dyn Fn(&CodecParameters) -> acodec_codec_core::Result<Box<dyn CodecEngine>> + Send>;

struct Slot {
    binding: PayloadTypeBinding,
    decoder: Option<Decoder>,
}

/// Payload type demultiplexer and decoder set
pub struct RemoteStream {
    slots: BTreeMap<u8, Slot>,
    /// Payload type of every queued packet, oldest first
    arrivals: VecDeque<u8>,
    max_queued_packets: usize,
    output_format: PcmFormat,
    engine_factory: Option<EngineFactoryFn>,
    stats: RemoteStreamStats,
}

impl Default for RemoteStream {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteStream {
    /// Create a stream with no bindings
    pub fn new() -> Self {
        Self::with_config(StreamConfig::default())
    }

    /// Create a stream with explicit limits and default output format
    pub fn with_config(config: StreamConfig) -> Self {
        Self {
            slots: BTreeMap::new(),
            arrivals: VecDeque::new(),
            max_queued_packets: config.max_queued_packets.max(1),
            output_format: config.output_format(),
            engine_factory: None,
            stats: RemoteStreamStats::default(),
        }
    }

    /// Create decoder engines with `factory` instead of the built-in one
    pub fn with_engine_factory(mut self, factory: EngineFactoryFn) -> Self {
        self.engine_factory = Some(factory);
        self
    }

    /// Bind a payload type to a codec format
    ///
    /// Registering the same format again is a no-op. A different format
    /// replaces the binding; packets queued under the old one are dropped.
    pub fn register_payload_type(
        &mut self,
        payload_type: u8,
        kind: CodecKind,
        sample_rate: u32,
        channels: u8,
    ) -> Result<()> {
        if payload_type > MAX_PAYLOAD_TYPE {
            return Err(StreamError::mismatch(format!("payload type {} above 127", payload_type)));
        }
        let binding = PayloadTypeBinding {
            payload_type,
            kind,
            sample_rate,
            channels,
        };
        let params = binding.parameters();
        params.validate().map_err(parameter_error)?;

        if let Some(old) = self.slots.get(&payload_type).map(|s| s.binding) {
            if old.parameters().same_format(&params) {
                debug!("Payload type {} already bound to {}", payload_type, kind);
                return Ok(());
            }
            let stale = self.purge(payload_type);
            info!(
                "Payload type {} rebound {} -> {}, dropped {} queued packets",
                payload_type, old.kind, kind, stale
            );
        } else {
            info!(
                "Payload type {} bound to {} {}Hz/{}ch",
                payload_type,
                kind,
                params.effective_sample_rate(),
                params.effective_channels()
            );
        }

        self.slots.insert(
            payload_type,
            Slot {
                binding,
                decoder: None,
            },
        );
        Ok(())
    }

    /// Remove a binding and its queued packets
    pub fn unregister_payload_type(&mut self, payload_type: u8) -> bool {
        if self.slots.remove(&payload_type).is_none() {
            return false;
        }
        let stale = self.purge(payload_type);
        info!("Payload type {} unbound, dropped {} queued packets", payload_type, stale);
        true
    }

    fn purge(&mut self, payload_type: u8) -> usize {
        let before = self.arrivals.len();
        self.arrivals.retain(|&pt| pt != payload_type);
        let stale = before - self.arrivals.len();
        self.stats.stale_packets_dropped += stale as u64;
        stale
    }

    /// Set the format [`RemoteStream::pull`] decodes to (`0, 0` = native)
    pub fn set_output_parameters(&mut self, sample_rate: u32, channels: u8) -> Result<()> {
        let format = PcmFormat::new(sample_rate, channels);
        format.validate_target()?;
        debug!("RemoteStream output format {}", format);
        self.output_format = format;
        Ok(())
    }

    /// Route one packet to the decoder bound to `payload_type`
    pub fn input(&mut self, payload_type: u8, packet: &[u8]) -> Result<()> {
        self.input_bytes(payload_type, Bytes::copy_from_slice(packet))
    }

    /// Route one packet without copying it
    pub fn input_bytes(&mut self, payload_type: u8, packet: Bytes) -> Result<()> {
        let Some(slot) = self.slots.get_mut(&payload_type) else {
            self.stats.unknown_payload_type += 1;
            debug!("Dropping packet for unbound payload type {}", payload_type);
            return Err(StreamError::UnknownPayloadType(payload_type));
        };

        if slot.decoder.is_none() {
            let params = slot.binding.parameters();
            let decoder = match &self.engine_factory {
                Some(factory) => Decoder::with_engine(params, factory(&params).map_err(parameter_error)?)?,
                None => Decoder::from_parameters(params)?,
            }
            .with_queue_limit(None);
            debug!("Decoder for payload type {} created", payload_type);
            slot.decoder = Some(decoder);
        }
        if let Some(decoder) = slot.decoder.as_mut() {
            decoder.input_bytes(packet);
        }
        self.arrivals.push_back(payload_type);
        self.stats.packets_received += 1;

        if self.arrivals.len() > self.max_queued_packets {
            if let Some(oldest) = self.arrivals.pop_front() {
                if let Some(decoder) = self.slots.get_mut(&oldest).and_then(|s| s.decoder.as_mut()) {
                    decoder.discard_oldest();
                }
                self.stats.overflow_drops += 1;
                warn!("RemoteStream queue full, dropped oldest packet (payload type {})", oldest);
            }
        }
        Ok(())
    }

    /// Route an RTP datagram by its header payload type
    pub fn input_rtp(&mut self, datagram: &[u8]) -> Result<()> {
        let (payload_type, payload) = parse_payload_type(datagram)?;
        self.input(payload_type, payload)
    }

    /// Decode the oldest queued packet of any payload type
    ///
    /// `(0, 0)` selects the native format of the packet's codec. Returns
    /// `Ok(None)` when nothing is queued. The returned block borrows the
    /// decoder's buffer and is valid until the next call.
    pub fn output(&mut self, sample_rate: u32, channels: u8) -> Result<Option<&PcmBlock>> {
        PcmFormat::new(sample_rate, channels).validate_target()?;

        let payload_type = loop {
            let Some(pt) = self.arrivals.pop_front() else {
                return Ok(None);
            };
            if self.slots.get(&pt).is_some_and(|s| s.decoder.is_some()) {
                break pt;
            }
        };

        let Some(decoder) = self
            .slots
            .get_mut(&payload_type)
            .and_then(|s| s.decoder.as_mut())
        else {
            return Ok(None);
        };

        match decoder.output(sample_rate, channels) {
            Err(e) => {
                self.stats.decode_failures += 1;
                Err(e)
            }
            ok => ok,
        }
    }

    /// Decode the oldest queued packet to the configured output format
    pub fn pull(&mut self) -> Result<Option<&PcmBlock>> {
        let format = self.output_format;
        self.output(format.sample_rate, format.channels)
    }

    /// Current bindings, by payload type
    pub fn bindings(&self) -> Vec<PayloadTypeBinding> {
        self.slots.values().map(|s| s.binding).collect()
    }

    /// Binding of one payload type
    pub fn binding(&self, payload_type: u8) -> Option<PayloadTypeBinding> {
        self.slots.get(&payload_type).map(|s| s.binding)
    }

    /// Packets waiting to be decoded
    pub fn pending_packets(&self) -> usize {
        self.arrivals.len()
    }

    /// Format [`RemoteStream::pull`] decodes to
    pub fn output_format(&self) -> PcmFormat {
        self.output_format
    }

    /// Counters
    pub fn stats(&self) -> RemoteStreamStats {
        self.stats
    }
}

impl std::fmt::Debug for RemoteStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStream")
            .field("bindings", &self.bindings())
            .field("pending_packets", &self.arrivals.len())
            .field("stats", &self.stats)
            .finish()
    }
}
