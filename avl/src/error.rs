//! Codec-level errors with context for logging and metrics
//!
//! Every variant is recoverable at the connection handler: the message (or
//! the remainder of the packet) is dropped and the connection stays open.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AvlError {
    /// A record extends past the end of the payload, or the payload is
    /// shorter than the minimum packet. Fixes decoded before the
    /// truncation point are still returned.
    #[error("Truncated packet at offset {offset}: need {need} bytes, {available} available")]
    TruncatedPacket {
        offset: usize,
        need: usize,
        available: usize,
    },

    /// A message opened with `{` but did not parse as a handshake.
    #[error("Malformed handshake: {0}")]
    MalformedHandshake(#[from] serde_json::Error),

    /// The `avlHex` handshake field held an odd-length or non-hex string.
    #[error("Invalid hex payload: {0}")]
    HexDecode(#[from] hex::FromHexError),
}

pub type AvlResult<T> = std::result::Result<T, AvlError>;
