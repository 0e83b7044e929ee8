//! Typed values exchanged with the Venus3 board
//!
//! Packing and unpacking of the fixed-layout payloads. Multi-byte fields
//! are little-endian on the wire.

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Video source feeding a DLP controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputSource {
    ExternalVideoPort,
    TestPatternGenerator,
    SplashScreen,
}

impl InputSource {
    pub fn to_byte(self) -> u8 {
        match self {
            InputSource::ExternalVideoPort => 0,
            InputSource::TestPatternGenerator => 1,
            InputSource::SplashScreen => 2,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(InputSource::ExternalVideoPort),
            1 => Some(InputSource::TestPatternGenerator),
            2 => Some(InputSource::SplashScreen),
            _ => None,
        }
    }
}

/// Internal test patterns of the DLP controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestPattern {
    ColorBars,
    SolidFieldWhite,
    SolidFieldRed,
    SolidFieldGreen,
    SolidFieldBlue,
    HorizontalRamp,
    Grid,
    Checkerboard,
    SolidFieldBlack,
    SolidFieldCyan,
    SolidFieldYellow,
    VerticalRamp,
    HorizontalLines,
    VerticalLines,
    DiagonalLines,
}

impl TestPattern {
    const ALL: [TestPattern; 15] = [
        TestPattern::ColorBars,
        TestPattern::SolidFieldWhite,
        TestPattern::SolidFieldRed,
        TestPattern::SolidFieldGreen,
        TestPattern::SolidFieldBlue,
        TestPattern::HorizontalRamp,
        TestPattern::Grid,
        TestPattern::Checkerboard,
        TestPattern::SolidFieldBlack,
        TestPattern::SolidFieldCyan,
        TestPattern::SolidFieldYellow,
        TestPattern::VerticalRamp,
        TestPattern::HorizontalLines,
        TestPattern::VerticalLines,
        TestPattern::DiagonalLines,
    ];

    /// Pattern index, 0..=14
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.get(byte as usize).copied()
    }
}

/// Image flip/rotation bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Orientation {
    /// Flip along the long axis
    pub flip_x: bool,
    /// Flip along the short axis
    pub flip_y: bool,
    /// Rotate 90 degrees counterclockwise
    pub rot_90: bool,
}

impl Orientation {
    pub fn to_byte(self) -> u8 {
        (self.flip_y as u8) << 2 | (self.flip_x as u8) << 1 | self.rot_90 as u8
    }

    pub fn from_byte(byte: u8) -> Self {
        Self {
            flip_x: byte & 0x02 != 0,
            flip_y: byte & 0x04 != 0,
            rot_90: byte & 0x01 != 0,
        }
    }
}

/// Per-LED enable flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgbEnable {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
}

impl RgbEnable {
    pub fn to_byte(self) -> u8 {
        (self.blue as u8) << 2 | (self.green as u8) << 1 | self.red as u8
    }

    pub fn from_byte(byte: u8) -> Self {
        Self {
            red: byte & 0x01 != 0,
            green: byte & 0x02 != 0,
            blue: byte & 0x04 != 0,
        }
    }
}

/// Three 16-bit LED values (currents or duty cycles)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl Rgb {
    pub fn new(red: u16, green: u16, blue: u16) -> Self {
        Self { red, green, blue }
    }

    /// Pack as three little-endian u16 values
    pub fn to_payload(self) -> [u8; 6] {
        let mut buf = [0u8; 6];
        LittleEndian::write_u16(&mut buf[0..2], self.red);
        LittleEndian::write_u16(&mut buf[2..4], self.green);
        LittleEndian::write_u16(&mut buf[4..6], self.blue);
        buf
    }

    /// Unpack from at least six bytes
    pub fn from_payload(payload: &[u8]) -> Self {
        Self {
            red: LittleEndian::read_u16(&payload[0..2]),
            green: LittleEndian::read_u16(&payload[2..4]),
            blue: LittleEndian::read_u16(&payload[4..6]),
        }
    }

    pub fn channels(self) -> [(&'static str, u16); 3] {
        [("red", self.red), ("green", self.green), ("blue", self.blue)]
    }
}

/// Display tonality preset and related timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookSettings {
    pub look_id: u8,
    pub sequence_id: u8,
    pub frame_rate: u32,
}

impl LookSettings {
    pub fn from_payload(payload: &[u8]) -> Self {
        Self {
            look_id: payload[0],
            sequence_id: payload[1],
            frame_rate: LittleEndian::read_u32(&payload[2..6]),
        }
    }
}

/// Local area brightness boost mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabbControl {
    Disabled,
    Manual,
    /// Driven by the light sensor
    Automatic,
}

impl LabbControl {
    pub fn to_bits(self) -> u8 {
        match self {
            LabbControl::Disabled => 0,
            LabbControl::Manual => 1,
            LabbControl::Automatic => 2,
        }
    }

    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(LabbControl::Disabled),
            1 => Some(LabbControl::Manual),
            2 => Some(LabbControl::Automatic),
            _ => None,
        }
    }
}

/// Writable brightness boost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrightnessBoost {
    /// Sharpness strength, 0..=15
    pub sharpness: u8,
    pub control: LabbControl,
    pub manual_setting: u8,
}

impl BrightnessBoost {
    pub fn to_payload(self) -> [u8; 2] {
        [(self.sharpness << 4) | self.control.to_bits(), self.manual_setting]
    }
}

/// Brightness boost parameters as read back, including the applied gain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrightnessBoostStatus {
    pub settings: BrightnessBoost,
    pub gain: u8,
}

/// DLP controller model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AsicDevice {
    Dlp3430,
    Dlp3433,
    Dlp3435,
}

impl AsicDevice {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(AsicDevice::Dlp3430),
            1 => Some(AsicDevice::Dlp3433),
            4 => Some(AsicDevice::Dlp3435),
            _ => None,
        }
    }
}

impl fmt::Display for AsicDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AsicDevice::Dlp3430 => "DLP3430",
            AsicDevice::Dlp3433 => "DLP3433",
            AsicDevice::Dlp3435 => "DLP3435",
        };
        f.write_str(name)
    }
}

/// DMD identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmdInfo {
    /// Low three bits of the first byte
    pub device_id: u8,
    /// Little-endian 32-bit type code
    pub type_code: u32,
}

impl DmdInfo {
    /// WVGA DMD
    pub const TYPE_WVGA: u32 = 0x6400_0D60;
    /// 720p DMD
    pub const TYPE_720P: u32 = 0x6800_0D60;
    /// DMD fitted to the stereo board
    pub const TYPE_STEREO: u32 = 0x7200_0D60;

    pub fn from_payload(payload: &[u8]) -> Self {
        Self {
            device_id: payload[0] & 0x07,
            type_code: LittleEndian::read_u32(&payload[0..4]),
        }
    }

    /// Type code as the uppercase hex string the vendor documents
    pub fn type_hex(&self) -> String {
        format!("{:X}", self.type_code)
    }
}

/// DLP flash image version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u16,
}

impl FlashVersion {
    pub fn from_payload(payload: &[u8]) -> Self {
        Self {
            patch: LittleEndian::read_u16(&payload[0..2]),
            minor: payload[2],
            major: payload[3],
        }
    }
}

impl fmt::Display for FlashVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{:X}", self.major, self.minor, self.patch)
    }
}
