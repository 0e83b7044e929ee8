//! # venuslink Core Library
//!
//! Host-side protocol engine for the Coretronics Venus3 stereo DLP driver
//! board, which exposes two TI DLP controllers (left and right) behind one
//! USB virtual COM port.
//!
//! This library provides:
//! - Frame encoding/decoding with the board's truncated CRC-16
//! - Correlation of ACK/NACK and data frames to the commands that caused them
//! - Serial port discovery and null-delimited frame transport
//! - The typed Venus3 command catalog
//!
//! ## Example
//!
//! ```rust,ignore
//! use venuslink_core::device::{Rgb, Venus3};
//! use venuslink_core::protocol::{ConnectionConfig, Side};
//!
//! let mut dlp = Venus3::connect(ConnectionConfig::default())?;
//! dlp.set_rgb_currents(Side::Left, Rgb::new(200, 200, 200))?;
//! println!("{:?}", dlp.get_rgb_currents(Side::Left)?);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod device;
pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::device::{DeviceError, Venus3};
    pub use crate::protocol::{
        Command, Connection, ConnectionConfig, ConnectionState, Frame, ProtocolError, Side,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
