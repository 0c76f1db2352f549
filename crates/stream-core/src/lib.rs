//! # Stream-Core: audio transcoding streams
//!
//! Normalizes PCM and compressed packets from heterogeneous sources against
//! a target codec, sample rate and channel layout.
//!
//! - [`Encoder`]: PCM chunks of any size and native format in, one packet
//!   per codec frame out
//! - [`Decoder`]: packets in, PCM blocks in a requested format out
//! - [`LocalStream`]: an encoder that stamps RTP metadata on its frames
//! - [`RemoteStream`]: one decoder per payload type, output in arrival order
//!
//! Everything is synchronous and single-owner. Outputs borrow an internal
//! buffer and stay valid until the next call on the same instance:
//!
//! ```compile_fail
//! use acodec_stream_core::Encoder;
//! use acodec_codec_core::CodecParameters;
//!
//! let mut enc = Encoder::new(CodecParameters::pcmu()).unwrap();
//! enc.input(&[0; 320], 8000, 1).unwrap();
//! let first = enc.output().unwrap();
//! let second = enc.output().unwrap();
//! println!("{:?} {:?}", first, second);
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use acodec_codec_core::{CodecKind, CodecParameters};
//! use acodec_stream_core::{LocalStream, RemoteStream};
//!
//! let mut local = LocalStream::new();
//! local.set_codec_parameters(CodecParameters::pcmu())?;
//! local.set_rtp_parameters(0x1234, 0)?;
//! local.set_input_parameters(16000, 2)?;
//!
//! let mut remote = RemoteStream::new();
//! remote.register_payload_type(0, CodecKind::G711Pcmu, 8000, 1)?;
//!
//! local.input(&vec![0i16; 640 * 2])?;
//! while let Some(frame) = local.output()? {
//!     remote.input_rtp(&frame.to_rtp_bytes())?;
//! }
//! while let Some(block) = remote.output(48000, 2)? {
//!     assert_eq!(block.format.sample_rate, 48000);
//! }
//! # Ok::<(), acodec_stream_core::StreamError>(())
//! ```

#![warn(missing_docs)]

pub mod buffer;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod format;
pub mod local;
pub mod logging;
pub mod remote;
pub mod rtp;

pub use buffer::{FrameBuffer, PacketQueue};
pub use config::StreamConfig;
pub use decoder::{Decoder, DecoderStats};
pub use encoder::{Encoder, EncoderStats};
pub use error::{Result, StreamError};
pub use format::{PcmBlock, PcmFormat, Resampler};
pub use local::LocalStream;
pub use logging::{setup_logging, LoggingConfig};
pub use remote::{EngineFactoryFn, PayloadTypeBinding, RemoteStream, RemoteStreamStats};
pub use rtp::{parse_payload_type, parse_rtp, MediaFrame, RtpPacketRef};

/// Version information for the stream library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
