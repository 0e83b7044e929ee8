//! Protocol errors

use thiserror::Error;

use super::Side;

/// Errors that can occur during protocol communication
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Structural violation: missing head marker, bad hex, field count mismatch
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Integrity failure; the frame is dropped as a whole
    #[error("Checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumError { expected: u8, actual: u8 },

    /// Explicit NACK from the device
    #[error("Command rejected by device (NACK)")]
    CommandRejected,

    /// A data frame arrived for a different side than the one awaited
    #[error("Channel mismatch: expected side {expected}, got {actual}")]
    ChannelMismatch { expected: Side, actual: Side },

    #[error("Response timeout")]
    ResponseTimeout,

    /// Caller supplied something the wire format cannot represent
    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Command {0:#04x} already has a pending transaction")]
    TransactionPending(u8),

    #[error("Serial port error: {0}")]
    SerialError(String),

    #[error("Port not found: {0}")]
    PortNotFound(String),

    #[error("Not connected to device")]
    NotConnected,

    #[error("Already connected")]
    AlreadyConnected,

    #[error("Buffer overflow: frame too large")]
    BufferOverflow,

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
