//! Minimal RTP framing
//!
//! Enough of RFC 3550 to wrap an encoded frame in a fixed header and to
//! find the payload type and payload of an inbound datagram. Header
//! extensions, CSRC lists and padding are skipped, never interpreted.

use crate::error::{Result, StreamError};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// RTP protocol version
pub const RTP_VERSION: u8 = 2;

/// Size of the fixed RTP header
pub const RTP_HEADER_SIZE: usize = 12;

/// Highest valid payload type
pub const MAX_PAYLOAD_TYPE: u8 = 127;

/// One encoded frame with its RTP metadata
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaFrame {
    /// Payload type
    pub payload_type: u8,
    /// Synchronization source
    pub ssrc: u32,
    /// Sequence number
    pub sequence: u16,
    /// Media timestamp in codec clock units
    pub timestamp: u32,
    /// Marker bit
    pub marker: bool,
    /// Encoded frame
    pub payload: Vec<u8>,
}

impl MediaFrame {
    /// Size of the serialized packet in bytes
    pub fn size(&self) -> usize {
        RTP_HEADER_SIZE + self.payload.len()
    }

    /// Append header and payload to `buf`
    pub fn serialize(&self, buf: &mut BytesMut) {
        buf.reserve(self.size());

        // V=2, P=0, X=0, CC=0
        buf.put_u8(RTP_VERSION << 6);
        let marker = if self.marker { 0x80 } else { 0 };
        buf.put_u8(marker | (self.payload_type & MAX_PAYLOAD_TYPE));
        buf.put_u16(self.sequence);
        buf.put_u32(self.timestamp);
        buf.put_u32(self.ssrc);
        buf.put_slice(&self.payload);
    }

    /// Serialize to a standalone RTP packet
    pub fn to_rtp_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.size());
        self.serialize(&mut buf);
        buf.freeze()
    }
}

/// Header fields and payload of an inbound RTP packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpPacketRef<'a> {
    /// Payload type
    pub payload_type: u8,
    /// Marker bit
    pub marker: bool,
    /// Sequence number
    pub sequence: u16,
    /// Media timestamp
    pub timestamp: u32,
    /// Synchronization source
    pub ssrc: u32,
    /// Payload with padding removed
    pub payload: &'a [u8],
}

/// Split an RTP datagram into header fields and payload
pub fn parse_rtp(datagram: &[u8]) -> Result<RtpPacketRef<'_>> {
    if datagram.len() < RTP_HEADER_SIZE {
        return Err(StreamError::MalformedRtp(format!(
            "{} bytes, need at least {}",
            datagram.len(),
            RTP_HEADER_SIZE
        )));
    }

    let mut buf = datagram;
    let first = buf.get_u8();
    let version = first >> 6;
    if version != RTP_VERSION {
        return Err(StreamError::MalformedRtp(format!("version {}", version)));
    }
    let padding = first & 0x20 != 0;
    let extension = first & 0x10 != 0;
    let csrc_count = usize::from(first & 0x0f);

    let second = buf.get_u8();
    let sequence = buf.get_u16();
    let timestamp = buf.get_u32();
    let ssrc = buf.get_u32();

    let mut header_len = RTP_HEADER_SIZE + csrc_count * 4;
    if extension {
        if datagram.len() < header_len + 4 {
            return Err(StreamError::MalformedRtp("truncated header extension".into()));
        }
        let words = u16::from_be_bytes([datagram[header_len + 2], datagram[header_len + 3]]);
        header_len += 4 + usize::from(words) * 4;
    }
    if datagram.len() < header_len {
        return Err(StreamError::MalformedRtp(format!(
            "header needs {} bytes, packet has {}",
            header_len,
            datagram.len()
        )));
    }

    let mut end = datagram.len();
    if padding {
        let pad = usize::from(datagram[end - 1]);
        if pad == 0 || header_len + pad > end {
            return Err(StreamError::MalformedRtp(format!("invalid padding length {}", pad)));
        }
        end -= pad;
    }

    Ok(RtpPacketRef {
        payload_type: second & MAX_PAYLOAD_TYPE,
        marker: second & 0x80 != 0,
        sequence,
        timestamp,
        ssrc,
        payload: &datagram[header_len..end],
    })
}

/// Extract just the payload type and payload of an RTP datagram
pub fn parse_payload_type(datagram: &[u8]) -> Result<(u8, &[u8])> {
    let packet = parse_rtp(datagram)?;
    Ok((packet.payload_type, packet.payload))
}
