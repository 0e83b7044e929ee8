//! Frame checksum
//!
//! CRC-16 with polynomial 0x1021, initial value 0, no reflection and no
//! final XOR (the XMODEM parameter set), truncated to its low byte. Covers
//! the ASCII text from the `#` head through the comma preceding the
//! checksum field.

use crc::{Crc, CRC_16_XMODEM};

const CRC_FRAME: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Compute the frame checksum over `data`
pub fn checksum(data: &[u8]) -> u8 {
    (CRC_FRAME.checksum(data) & 0xFF) as u8
}

/// Full 16-bit CRC, exposed for diagnostics
pub fn crc16(data: &[u8]) -> u16 {
    CRC_FRAME.checksum(data)
}

/// Render a checksum the way it appears on the wire
pub fn checksum_hex(data: &[u8]) -> String {
    format!("{:02X}", checksum(data))
}
