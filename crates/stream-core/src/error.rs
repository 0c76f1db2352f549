//! Error types for the stream layer
//!
//! Every error is scoped to the single call (and the single input unit) that
//! raised it; none of them leaves buffered state of other frames or packets
//! changed. "Not ready yet" is not an error: `output` methods return
//! `Ok(None)` for it.

use acodec_codec_core::{CodecError, ErrorCategory};
use thiserror::Error;

/// Result type alias for stream operations
pub type Result<T> = std::result::Result<T, StreamError>;

/// Stream layer error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StreamError {
    /// A requested format is outside the supported domain; rejected eagerly
    #[error("Parameter mismatch: {0}")]
    ParameterMismatch(String),

    /// One packet could not be decoded; it was dropped
    #[error("Decode failure: {0}")]
    DecodeFailure(String),

    /// One frame could not be encoded; it was dropped
    #[error("Encode failure: {0}")]
    EncodeFailure(String),

    /// Packet referenced a payload type with no binding; it was dropped
    #[error("Unknown payload type: {0}")]
    UnknownPayloadType(u8),

    /// Operation needs codec parameters that were never set
    #[error("Stream not configured: {0}")]
    NotConfigured(&'static str),

    /// Datagram is not an RTP v2 packet
    #[error("Malformed RTP packet: {0}")]
    MalformedRtp(String),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Codec engine rejected its parameters
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl StreamError {
    /// Create a parameter mismatch error
    pub fn mismatch(details: impl Into<String>) -> Self {
        Self::ParameterMismatch(details.into())
    }

    /// Whether the stream keeps working normally after this error
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::DecodeFailure(_)
            | Self::EncodeFailure(_)
            | Self::UnknownPayloadType(_)
            | Self::MalformedRtp(_) => true,
            Self::ParameterMismatch(_) | Self::NotConfigured(_) | Self::Config(_) => false,
            Self::Codec(e) => e.is_recoverable(),
        }
    }
}

/// Map an engine parameter error onto the stream taxonomy
pub(crate) fn parameter_error(err: CodecError) -> StreamError {
    match err.category() {
        ErrorCategory::Configuration => StreamError::ParameterMismatch(err.to_string()),
        ErrorCategory::Processing | ErrorCategory::Initialization => StreamError::Codec(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverability() {
        assert!(StreamError::DecodeFailure("bad frame".into()).is_recoverable());
        assert!(StreamError::UnknownPayloadType(96).is_recoverable());
        assert!(!StreamError::mismatch("rate").is_recoverable());
    }

    #[test]
    fn test_parameter_error_mapping() {
        let err = parameter_error(CodecError::InvalidComplexity { complexity: 11 });
        assert!(matches!(err, StreamError::ParameterMismatch(_)));
        let err = parameter_error(CodecError::decoding_failed("x"));
        assert!(matches!(err, StreamError::Codec(_)));
        let err = parameter_error(CodecError::initialization_failed("opus_encoder_create"));
        assert!(matches!(err, StreamError::Codec(_)));
        let err = parameter_error(CodecError::feature_not_enabled("opus"));
        assert!(matches!(err, StreamError::ParameterMismatch(_)));
    }
}
