//! Protocol error types.

use thiserror::Error;

/// Convenience alias for protocol results.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while decoding or encoding frames.
///
/// None of these are fatal: callers log them and drop the offending frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame text is not valid JSON or not an envelope object
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// Frame has no usable `type` tag
    #[error("frame is missing its type tag")]
    MissingTag,

    /// Frame exceeds [`crate::MAX_FRAME_SIZE`]
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge {
        /// Size of the rejected frame
        size: usize,
        /// Configured limit
        max: usize,
    },

    /// Payload does not have the shape its tag requires
    #[error("invalid payload for {tag}: {reason}")]
    InvalidPayload {
        /// Tag of the frame carrying the payload
        tag: String,
        /// Decoder message
        reason: String,
    },

    /// Outbound payload could not be serialized
    #[error("encode failed: {0}")]
    Encode(String),
}
