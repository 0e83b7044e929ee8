//! Serial Protocol Communication
//!
//! Implements the Venus3 ASCII command/response protocol: comma-delimited,
//! null-terminated frames guarded by a truncated CRC-16, with ACK/NACK
//! commit signals and keyed buffering of data responses.

pub mod checksum;
pub mod commands;
mod connection;
pub mod correlator;
mod error;
pub mod frame;
pub mod serial;
pub mod stream;

pub use checksum::checksum;
pub use commands::Command;
pub use connection::{Connection, ConnectionConfig, ConnectionState};
pub use correlator::Correlator;
pub use error::ProtocolError;
pub use frame::{decode, encode, encode_raw, parse_frame, DataFrame, Frame, Side};
pub use serial::{clear_buffers, configure_port, find_port, list_ports, open_port, PortInfo};
pub use stream::{FrameChannel, SerialChannel, StreamChannel};

/// Default baud rate of the Venus3 virtual COM port
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Default timeout for responses in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 500;

/// Per-read timeout of the serial port itself
pub const PORT_READ_TIMEOUT_MS: u64 = 50;

/// USB description prefix of the Venus3 virtual COM port
pub const VENUS3_PORT_DESCRIPTION: &str = "EVK1XXX Virtual Com Port";

/// Default capacity of the pending transaction map
pub const DEFAULT_MAX_PENDING: usize = 32;

/// Maximum payload bytes in one frame
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Maximum frame size on the wire, delimiter included
pub const MAX_FRAME_LEN: usize = 1024;

/// Head marker starting every frame
pub const FRAME_HEAD: u8 = b'#';

/// Terminator ending every frame
pub const FRAME_DELIMITER: u8 = 0;
