//! Frame encoding/decoding
//!
//! Implements the comma-delimited ASCII frame format spoken by the Venus3
//! board. Every frame is terminated by a null byte on the wire.
//!
//! Frame format:
//! - `#`            : head marker
//! - `CC`           : command id, two hex digits
//! - `S`            : side selector, `0` left, `1` right, `2` both
//! - `L`            : payload length, bare hex (not zero padded)
//! - `,PP` * L      : payload bytes, two hex digits each
//! - `,KK`          : low byte of CRC-16 over `#` .. last comma inclusive
//!
//! e.g. `#54,0,6,C8,00,C8,00,C8,00,76\0`
//!
//! The device answers with `#A` (ACK) or `#N` (NACK) frames, optionally
//! preceded by a data frame in the format above.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::checksum::{checksum, checksum_hex};
use super::{ProtocolError, FRAME_DELIMITER, FRAME_HEAD, MAX_PAYLOAD_LEN};

/// Which of the two attached DLP controllers a frame concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Left controller (`'0'`)
    Left,
    /// Right controller (`'1'`)
    Right,
    /// Both controllers (`'2'`), only valid as a command side
    Both,
}

impl Side {
    /// The single digit used on the wire
    pub fn wire_char(self) -> char {
        match self {
            Side::Left => '0',
            Side::Right => '1',
            Side::Both => '2',
        }
    }

    /// Parse the wire digit
    pub fn from_wire(c: char) -> Option<Self> {
        match c {
            '0' => Some(Side::Left),
            '1' => Some(Side::Right),
            '2' => Some(Side::Both),
            _ => None,
        }
    }

    /// True for the sides a single controller can answer on
    pub fn is_single(self) -> bool {
        !matches!(self, Side::Both)
    }
}

impl TryFrom<u8> for Side {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Side::Left),
            1 => Ok(Side::Right),
            2 => Ok(Side::Both),
            other => Err(ProtocolError::EncodingError(format!(
                "side selector {} out of range 0..=2",
                other
            ))),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Both => "both",
        };
        write!(f, "{} ({})", name, self.wire_char())
    }
}

/// A data-carrying frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFrame {
    /// Command id the frame belongs to
    pub command_id: u8,
    /// Side that sent (or is addressed by) the frame
    pub side: Side,
    /// Payload bytes
    pub payload: Vec<u8>,
}

impl DataFrame {
    /// Create a new data frame
    pub fn new(command_id: u8, side: Side, payload: Vec<u8>) -> Self {
        Self {
            command_id,
            side,
            payload,
        }
    }

    /// Encode the frame to raw bytes, including the null terminator
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        encode(self.command_id, self.side, &self.payload)
    }
}

/// One complete wire message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Terminal success signal, no payload
    Ack,
    /// Terminal rejection signal, no payload
    Nack,
    /// Checksummed frame carrying a payload
    Data(DataFrame),
}

impl Frame {
    /// Structurally parse a delimiter-stripped line (see [`parse_frame`])
    pub fn from_bytes(line: &[u8]) -> Result<Self, ProtocolError> {
        parse_frame(line)
    }

    /// Encode the frame to raw bytes, including the null terminator
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        match self {
            Frame::Ack => Ok(vec![FRAME_HEAD, b'A', FRAME_DELIMITER]),
            Frame::Nack => Ok(vec![FRAME_HEAD, b'N', FRAME_DELIMITER]),
            Frame::Data(data) => data.to_bytes(),
        }
    }

    /// Command id of a data frame
    pub fn command_id(&self) -> Option<u8> {
        match self {
            Frame::Data(data) => Some(data.command_id),
            _ => None,
        }
    }
}

/// Encode a command into wire bytes, including the null terminator
pub fn encode(command_id: u8, side: Side, payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::EncodingError(format!(
            "payload of {} bytes exceeds maximum of {}",
            payload.len(),
            MAX_PAYLOAD_LEN
        )));
    }

    let mut text = String::with_capacity(10 + payload.len() * 3);
    text.push(FRAME_HEAD as char);
    text.push_str(&format!(
        "{:02X},{},{:X}",
        command_id,
        side.wire_char(),
        payload.len()
    ));
    for byte in payload {
        text.push_str(&format!(",{:02X}", byte));
    }
    text.push(',');

    let crc = checksum_hex(text.as_bytes());
    text.push_str(&crc);

    let mut bytes = text.into_bytes();
    bytes.push(FRAME_DELIMITER);
    Ok(bytes)
}

/// Encode from unchecked integers, rejecting values the wire cannot carry
pub fn encode_raw(command_id: u32, side: u8, payload: &[u32]) -> Result<Vec<u8>, ProtocolError> {
    let command_id = u8::try_from(command_id).map_err(|_| {
        ProtocolError::EncodingError(format!("command id {:#x} exceeds 0xFF", command_id))
    })?;
    let side = Side::try_from(side)?;
    let payload = payload
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            u8::try_from(value).map_err(|_| {
                ProtocolError::EncodingError(format!(
                    "payload byte {} ({:#x}) exceeds 0xFF",
                    i, value
                ))
            })
        })
        .collect::<Result<Vec<u8>, _>>()?;
    encode(command_id, side, &payload)
}

/// Decode a delimiter-stripped line
///
/// A NACK fails with [`ProtocolError::CommandRejected`]; use [`parse_frame`]
/// to observe NACKs as values.
pub fn decode(line: &[u8]) -> Result<Frame, ProtocolError> {
    match parse_frame(line)? {
        Frame::Nack => Err(ProtocolError::CommandRejected),
        frame => Ok(frame),
    }
}

/// Structurally parse a delimiter-stripped line into a [`Frame`]
pub fn parse_frame(line: &[u8]) -> Result<Frame, ProtocolError> {
    let text = std::str::from_utf8(line)
        .ok()
        .filter(|t| t.is_ascii())
        .ok_or_else(|| ProtocolError::MalformedFrame("frame is not ASCII text".to_string()))?;
    let bytes = text.as_bytes();

    if bytes.first() != Some(&FRAME_HEAD) {
        return Err(ProtocolError::MalformedFrame(format!(
            "expected '#' head marker in {:?}",
            text
        )));
    }

    match bytes.get(1) {
        None => Err(ProtocolError::MalformedFrame(
            "frame has no body after head marker".to_string(),
        )),
        Some(b'N') | Some(b'n') => Ok(Frame::Nack),
        // Command ids 0xA0..=0xAF also start with 'A'
        Some(b'A') | Some(b'a') if !has_command_prefix(bytes) => Ok(Frame::Ack),
        Some(_) => parse_data_frame(text).map(Frame::Data),
    }
}

/// `#` followed by two hex digits and a comma
fn has_command_prefix(bytes: &[u8]) -> bool {
    bytes.len() > 3
        && bytes[1].is_ascii_hexdigit()
        && bytes[2].is_ascii_hexdigit()
        && bytes[3] == b','
}

fn parse_data_frame(text: &str) -> Result<DataFrame, ProtocolError> {
    let last_comma = text
        .rfind(',')
        .ok_or_else(|| ProtocolError::MalformedFrame("missing checksum field".to_string()))?;

    // Integrity first: nothing in the body is trusted until the checksum matches
    let actual = parse_hex_byte(&text[last_comma + 1..], "checksum")?;
    let expected = checksum(&text.as_bytes()[..=last_comma]);
    if expected != actual {
        return Err(ProtocolError::ChecksumError { expected, actual });
    }

    let fields: Vec<&str> = text[1..last_comma].split(',').collect();
    if fields.len() < 3 {
        return Err(ProtocolError::MalformedFrame(format!(
            "expected at least 3 header fields, found {}",
            fields.len()
        )));
    }

    let command_id = parse_hex_byte(fields[0], "command id")?;
    let side = parse_side(fields[1])?;
    let length = parse_length(fields[2])?;

    let payload_fields = &fields[3..];
    if payload_fields.len() != length {
        return Err(ProtocolError::MalformedFrame(format!(
            "length field declares {} payload bytes, found {}",
            length,
            payload_fields.len()
        )));
    }

    let payload = payload_fields
        .iter()
        .map(|field| parse_hex_byte(field, "payload byte"))
        .collect::<Result<Vec<u8>, _>>()?;

    Ok(DataFrame {
        command_id,
        side,
        payload,
    })
}

fn parse_hex_byte(field: &str, what: &str) -> Result<u8, ProtocolError> {
    if field.len() != 2 || !field.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ProtocolError::MalformedFrame(format!(
            "{} {:?} is not two hex digits",
            what, field
        )));
    }
    u8::from_str_radix(field, 16)
        .map_err(|e| ProtocolError::MalformedFrame(format!("{} {:?}: {}", what, field, e)))
}

fn parse_side(field: &str) -> Result<Side, ProtocolError> {
    let mut chars = field.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Side::from_wire(c),
        _ => None,
    }
    .ok_or_else(|| ProtocolError::MalformedFrame(format!("invalid side selector {:?}", field)))
}

fn parse_length(field: &str) -> Result<usize, ProtocolError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ProtocolError::MalformedFrame(format!(
            "length {:?} is not hex",
            field
        )));
    }
    let length = usize::from_str_radix(field, 16)
        .map_err(|e| ProtocolError::MalformedFrame(format!("length {:?}: {}", field, e)))?;
    if length > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::MalformedFrame(format!(
            "length {} exceeds maximum of {}",
            length, MAX_PAYLOAD_LEN
        )));
    }
    Ok(length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strip(mut bytes: Vec<u8>) -> Vec<u8> {
        assert_eq!(bytes.pop(), Some(FRAME_DELIMITER));
        bytes
    }

    #[test]
    fn test_encode_set_currents() {
        let bytes = encode(0x54, Side::Left, &[200, 0, 200, 0, 200, 0]).unwrap();
        assert_eq!(bytes, b"#54,0,6,C8,00,C8,00,C8,00,76\0".to_vec());
    }

    #[test]
    fn test_decode_set_currents() {
        let frame = decode(b"#54,0,6,C8,00,C8,00,C8,00,76").unwrap();
        assert_eq!(
            frame,
            Frame::Data(DataFrame::new(
                0x54,
                Side::Left,
                vec![0xC8, 0x00, 0xC8, 0x00, 0xC8, 0x00]
            ))
        );
    }

    #[test]
    fn test_roundtrip_sides_and_lengths() {
        let lengths = [0usize, 1, 9, 10, 16, 255];
        for side in [Side::Left, Side::Right, Side::Both] {
            for len in lengths {
                let payload: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
                let bytes = encode(0xD5, side, &payload).unwrap();
                let frame = decode(&strip(bytes)).unwrap();
                assert_eq!(frame, Frame::Data(DataFrame::new(0xD5, side, payload)));
            }
        }
    }

    #[test]
    fn test_length_is_bare_hex() {
        let bytes = strip(encode(0x01, Side::Right, &[0u8; 16]).unwrap());
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("#01,1,10,00,"));

        let bytes = strip(encode(0x06, Side::Left, &[]).unwrap());
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("#06,0,0,"));
        assert_eq!(text.len(), "#06,0,0,".len() + 2);
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        let err = encode(0x01, Side::Left, &[0u8; 256]).unwrap_err();
        assert!(matches!(err, ProtocolError::EncodingError(_)));
    }

    #[test]
    fn test_encode_raw_range_checks() {
        assert!(matches!(
            encode_raw(0x100, 0, &[]),
            Err(ProtocolError::EncodingError(_))
        ));
        assert!(matches!(
            encode_raw(0x54, 3, &[]),
            Err(ProtocolError::EncodingError(_))
        ));
        assert!(matches!(
            encode_raw(0x54, 0, &[1, 256]),
            Err(ProtocolError::EncodingError(_))
        ));
        assert_eq!(
            encode_raw(0x54, 0, &[200, 0, 200, 0, 200, 0]).unwrap(),
            encode(0x54, Side::Left, &[200, 0, 200, 0, 200, 0]).unwrap()
        );
    }

    #[test]
    fn test_checksum_sensitivity() {
        let line = strip(encode(0x54, Side::Left, &[200, 0, 200, 0, 200, 0]).unwrap());
        let last_comma = line.iter().rposition(|&b| b == b',').unwrap();
        for pos in 2..last_comma {
            let mut corrupted = line.clone();
            corrupted[pos] ^= 0x01;
            let err = decode(&corrupted).unwrap_err();
            assert!(
                matches!(err, ProtocolError::ChecksumError { .. }),
                "byte {} flip gave {:?}",
                pos,
                err
            );
        }
    }

    #[test]
    fn test_ack_and_nack() {
        assert_eq!(decode(b"#A").unwrap(), Frame::Ack);
        assert_eq!(decode(b"#ACK").unwrap(), Frame::Ack);
        assert_eq!(parse_frame(b"#N").unwrap(), Frame::Nack);
        assert!(matches!(decode(b"#N"), Err(ProtocolError::CommandRejected)));
    }

    #[test]
    fn test_command_ids_starting_with_a_are_data() {
        let bytes = strip(encode(0xA3, Side::Right, &[0x01]).unwrap());
        let frame = decode(&bytes).unwrap();
        assert_eq!(frame.command_id(), Some(0xA3));
    }

    #[test]
    fn test_missing_head_is_malformed() {
        assert!(matches!(decode(b"54,0,0,00"), Err(ProtocolError::MalformedFrame(_))));
        assert!(matches!(decode(b""), Err(ProtocolError::MalformedFrame(_))));
        assert!(matches!(decode(b"#"), Err(ProtocolError::MalformedFrame(_))));
    }

    #[test]
    fn test_short_payload_is_malformed() {
        // Declares 5 payload bytes but carries 3, with a valid checksum
        let prefix = "#23,0,5,01,02,03,";
        let line = format!("{}{}", prefix, checksum_hex(prefix.as_bytes()));
        assert!(matches!(
            decode(line.as_bytes()),
            Err(ProtocolError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_bad_hex_is_malformed() {
        let prefix = "#23,0,1,G1,";
        let line = format!("{}{}", prefix, checksum_hex(prefix.as_bytes()));
        assert!(matches!(
            decode(line.as_bytes()),
            Err(ProtocolError::MalformedFrame(_))
        ));

        let prefix = "#23,7,0,";
        let line = format!("{}{}", prefix, checksum_hex(prefix.as_bytes()));
        assert!(matches!(
            decode(line.as_bytes()),
            Err(ProtocolError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_lowercase_hex_accepted() {
        let prefix = "#d9,1,2,0a,ff,";
        let line = format!("{}{}", prefix, checksum_hex(prefix.as_bytes()));
        let frame = decode(line.as_bytes()).unwrap();
        assert_eq!(
            frame,
            Frame::Data(DataFrame::new(0xD9, Side::Right, vec![0x0A, 0xFF]))
        );
    }

    #[test]
    fn test_frame_to_bytes() {
        assert_eq!(Frame::Ack.to_bytes().unwrap(), b"#A\0".to_vec());
        assert_eq!(Frame::Nack.to_bytes().unwrap(), b"#N\0".to_vec());
    }

    #[test]
    fn test_side_conversions() {
        assert_eq!(Side::try_from(1).unwrap(), Side::Right);
        assert!(Side::try_from(3).is_err());
        assert_eq!(Side::from_wire('2'), Some(Side::Both));
        assert_eq!(Side::from_wire('x'), None);
        assert!(!Side::Both.is_single());
    }
}
