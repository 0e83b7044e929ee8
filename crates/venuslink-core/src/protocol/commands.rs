//! Protocol commands
//!
//! Defines the command ids understood by the Venus3 board.

use serde::{Deserialize, Serialize};

/// Protocol commands for Venus3 communication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Select video source (0x05)
    SetInputSource,
    /// Read video source (0x06)
    GetInputSource,
    /// Select internal test pattern (0x0B)
    SetTestPattern,
    /// Set flip/rotation bits (0x14)
    SetImageOrientation,
    /// Read flip/rotation bits (0x15)
    GetImageOrientation,
    /// Freeze or unfreeze the displayed image (0x1A)
    SetImageFreeze,
    /// Read the freeze setting (0x1B)
    GetImageFreeze,
    /// Select display tonality preset (0x22)
    SetLook,
    /// Read look, sequence and frame rate (0x23)
    GetLook,
    /// Write LED duty cycles (0x25, undocumented by the vendor)
    SetRgbDutyCycle,
    /// Read LED duty cycles (0x26)
    GetRgbDutyCycle,
    /// Enable content adaptive illumination control (0x50)
    SetCaicEnable,
    /// Read CAIC enablement (0x51)
    GetCaicEnable,
    /// Enable individual LEDs (0x52)
    SetRgbEnable,
    /// Read LED enablement (0x53)
    GetRgbEnable,
    /// Write LED currents (0x54)
    SetRgbCurrents,
    /// Read LED currents (0x55)
    GetRgbCurrents,
    /// Write local area brightness boost parameters (0x80)
    SetBrightnessBoost,
    /// Read local area brightness boost parameters (0x81)
    GetBrightnessBoost,
    /// Read DLP controller device id (0xD4)
    GetAsicDeviceId,
    /// Read DMD device id and type code (0xD5)
    GetDmdDeviceId,
    /// Read DLP flash version (0xD9)
    GetFlashVersion,
}

impl Command {
    /// Every known command
    pub const ALL: [Command; 22] = [
        Command::SetInputSource,
        Command::GetInputSource,
        Command::SetTestPattern,
        Command::SetImageOrientation,
        Command::GetImageOrientation,
        Command::SetImageFreeze,
        Command::GetImageFreeze,
        Command::SetLook,
        Command::GetLook,
        Command::SetRgbDutyCycle,
        Command::GetRgbDutyCycle,
        Command::SetCaicEnable,
        Command::GetCaicEnable,
        Command::SetRgbEnable,
        Command::GetRgbEnable,
        Command::SetRgbCurrents,
        Command::GetRgbCurrents,
        Command::SetBrightnessBoost,
        Command::GetBrightnessBoost,
        Command::GetAsicDeviceId,
        Command::GetDmdDeviceId,
        Command::GetFlashVersion,
    ];

    /// Get the wire command id
    pub fn id(&self) -> u8 {
        match self {
            Command::SetInputSource => 0x05,
            Command::GetInputSource => 0x06,
            Command::SetTestPattern => 0x0B,
            Command::SetImageOrientation => 0x14,
            Command::GetImageOrientation => 0x15,
            Command::SetImageFreeze => 0x1A,
            Command::GetImageFreeze => 0x1B,
            Command::SetLook => 0x22,
            Command::GetLook => 0x23,
            Command::SetRgbDutyCycle => 0x25,
            Command::GetRgbDutyCycle => 0x26,
            Command::SetCaicEnable => 0x50,
            Command::GetCaicEnable => 0x51,
            Command::SetRgbEnable => 0x52,
            Command::GetRgbEnable => 0x53,
            Command::SetRgbCurrents => 0x54,
            Command::GetRgbCurrents => 0x55,
            Command::SetBrightnessBoost => 0x80,
            Command::GetBrightnessBoost => 0x81,
            Command::GetAsicDeviceId => 0xD4,
            Command::GetDmdDeviceId => 0xD5,
            Command::GetFlashVersion => 0xD9,
        }
    }

    /// Look up a command by wire id
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|cmd| cmd.id() == id)
    }

    /// Check if this command answers with a data frame before its ACK
    pub fn expects_response(&self) -> bool {
        matches!(
            self,
            Command::GetInputSource
                | Command::GetImageOrientation
                | Command::GetImageFreeze
                | Command::GetLook
                | Command::GetRgbDutyCycle
                | Command::GetCaicEnable
                | Command::GetRgbEnable
                | Command::GetRgbCurrents
                | Command::GetBrightnessBoost
                | Command::GetAsicDeviceId
                | Command::GetDmdDeviceId
                | Command::GetFlashVersion
        )
    }

    /// Minimum number of payload bytes a response must carry
    pub fn response_len(&self) -> usize {
        match self {
            Command::GetLook | Command::GetRgbDutyCycle | Command::GetRgbCurrents => 6,
            Command::GetDmdDeviceId | Command::GetFlashVersion => 4,
            Command::GetBrightnessBoost => 3,
            cmd if cmd.expects_response() => 1,
            _ => 0,
        }
    }
}
