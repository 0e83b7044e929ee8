//! Device operation errors

use thiserror::Error;

use crate::protocol::{Command, ProtocolError, Side};

/// Errors raised by the Venus3 command catalog
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Invalid value for '{name}': {message}")]
    InvalidParameter { name: &'static str, message: String },

    #[error("Side {0} cannot be read back, select left or right")]
    SideNotReadable(Side),

    #[error("Response to {command:?} too short: expected {expected} bytes, got {actual}")]
    ShortResponse {
        command: Command,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown {what} value {value:#04x}")]
    UnknownValue { what: &'static str, value: u8 },
}
