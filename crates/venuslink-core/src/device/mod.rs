//! Venus3 command catalog
//!
//! Typed wrappers around the protocol's send/receive primitives. Each
//! operation uses a fixed command id and a small fixed-layout payload;
//! parameter range checks live here, not in the protocol layer.
//!
//! Read operations address a single controller (`Left` or `Right`), write
//! operations may also target `Both`.

mod error;
pub mod types;

pub use error::DeviceError;
pub use types::{
    AsicDevice, BrightnessBoost, BrightnessBoostStatus, DmdInfo, FlashVersion, InputSource,
    LabbControl, LookSettings, Orientation, Rgb, RgbEnable, TestPattern,
};

use crate::protocol::{Command, Connection, ConnectionConfig, Side};

/// Allowed LED current range
pub const LED_CURRENT_RANGE: std::ops::RangeInclusive<u16> = 12..=350;

/// Maximum brightness boost sharpness
pub const MAX_SHARPNESS: u8 = 15;

/// High-level handle to a Venus3 stereo DLP board
pub struct Venus3 {
    conn: Connection,
}

impl Venus3 {
    /// Wrap an already connected (or attached) connection
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open the board described by `config`
    pub fn connect(config: ConnectionConfig) -> Result<Self, DeviceError> {
        let mut conn = Connection::new(config);
        conn.connect()?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    pub fn into_inner(self) -> Connection {
        self.conn
    }

    fn set(&mut self, command: Command, side: Side, payload: &[u8]) -> Result<(), DeviceError> {
        tracing::debug!("{:?} on {} <- {:02X?}", command, side, payload);
        self.conn.command(command.id(), side, payload)?;
        Ok(())
    }

    fn get(&mut self, command: Command, side: Side) -> Result<Vec<u8>, DeviceError> {
        if !side.is_single() {
            return Err(DeviceError::SideNotReadable(side));
        }
        let payload = self.conn.query(command.id(), side, &[])?;
        tracing::debug!("{:?} on {} -> {:02X?}", command, side, payload);

        let expected = command.response_len();
        if payload.len() < expected {
            return Err(DeviceError::ShortResponse {
                command,
                expected,
                actual: payload.len(),
            });
        }
        Ok(payload)
    }

    /// Select the video source
    pub fn set_input_source(
        &mut self,
        side: Side,
        source: InputSource,
    ) -> Result<(), DeviceError> {
        self.set(Command::SetInputSource, side, &[source.to_byte()])
    }

    pub fn get_input_source(&mut self, side: Side) -> Result<InputSource, DeviceError> {
        let payload = self.get(Command::GetInputSource, side)?;
        InputSource::from_byte(payload[0]).ok_or(DeviceError::UnknownValue {
            what: "input source",
            value: payload[0],
        })
    }

    pub fn set_test_pattern(
        &mut self,
        side: Side,
        pattern: TestPattern,
    ) -> Result<(), DeviceError> {
        self.set(Command::SetTestPattern, side, &[pattern.to_byte()])
    }

    pub fn set_image_orientation(
        &mut self,
        side: Side,
        orientation: Orientation,
    ) -> Result<(), DeviceError> {
        self.set(Command::SetImageOrientation, side, &[orientation.to_byte()])
    }

    pub fn get_image_orientation(&mut self, side: Side) -> Result<Orientation, DeviceError> {
        let payload = self.get(Command::GetImageOrientation, side)?;
        Ok(Orientation::from_byte(payload[0]))
    }

    pub fn set_image_freeze(&mut self, side: Side, frozen: bool) -> Result<(), DeviceError> {
        self.set(Command::SetImageFreeze, side, &[frozen as u8])
    }

    pub fn get_image_freeze(&mut self, side: Side) -> Result<bool, DeviceError> {
        let payload = self.get(Command::GetImageFreeze, side)?;
        Ok(payload[0] & 0x01 != 0)
    }

    /// Select a proprietary display tonality preset
    pub fn set_look(&mut self, side: Side, look_id: u8) -> Result<(), DeviceError> {
        self.set(Command::SetLook, side, &[look_id])
    }

    pub fn get_look(&mut self, side: Side) -> Result<LookSettings, DeviceError> {
        let payload = self.get(Command::GetLook, side)?;
        Ok(LookSettings::from_payload(&payload))
    }

    /// Write LED duty cycles. Not documented by the vendor.
    pub fn set_rgb_duty_cycle(&mut self, side: Side, duty: Rgb) -> Result<(), DeviceError> {
        self.set(Command::SetRgbDutyCycle, side, &duty.to_payload())
    }

    pub fn get_rgb_duty_cycle(&mut self, side: Side) -> Result<Rgb, DeviceError> {
        let payload = self.get(Command::GetRgbDutyCycle, side)?;
        Ok(Rgb::from_payload(&payload))
    }

    /// Enable content adaptive illumination control
    pub fn set_caic_enable(&mut self, side: Side, enabled: bool) -> Result<(), DeviceError> {
        self.set(Command::SetCaicEnable, side, &[enabled as u8])
    }

    pub fn get_caic_enable(&mut self, side: Side) -> Result<bool, DeviceError> {
        let payload = self.get(Command::GetCaicEnable, side)?;
        Ok(payload[0] & 0x01 != 0)
    }

    pub fn set_rgb_enable(&mut self, side: Side, enable: RgbEnable) -> Result<(), DeviceError> {
        self.set(Command::SetRgbEnable, side, &[enable.to_byte()])
    }

    pub fn get_rgb_enable(&mut self, side: Side) -> Result<RgbEnable, DeviceError> {
        let payload = self.get(Command::GetRgbEnable, side)?;
        Ok(RgbEnable::from_byte(payload[0]))
    }

    /// Write LED currents; each channel must lie in [`LED_CURRENT_RANGE`]
    pub fn set_rgb_currents(&mut self, side: Side, currents: Rgb) -> Result<(), DeviceError> {
        for (name, value) in currents.channels() {
            if !LED_CURRENT_RANGE.contains(&value) {
                return Err(DeviceError::InvalidParameter {
                    name,
                    message: format!(
                        "{} outside {}..={}",
                        value,
                        LED_CURRENT_RANGE.start(),
                        LED_CURRENT_RANGE.end()
                    ),
                });
            }
        }
        self.set(Command::SetRgbCurrents, side, &currents.to_payload())
    }

    pub fn get_rgb_currents(&mut self, side: Side) -> Result<Rgb, DeviceError> {
        let payload = self.get(Command::GetRgbCurrents, side)?;
        Ok(Rgb::from_payload(&payload))
    }

    /// Write local area brightness boost parameters
    pub fn set_brightness_boost(
        &mut self,
        side: Side,
        boost: BrightnessBoost,
    ) -> Result<(), DeviceError> {
        if boost.sharpness > MAX_SHARPNESS {
            return Err(DeviceError::InvalidParameter {
                name: "sharpness",
                message: format!("{} exceeds {}", boost.sharpness, MAX_SHARPNESS),
            });
        }
        self.set(Command::SetBrightnessBoost, side, &boost.to_payload())
    }

    pub fn get_brightness_boost(
        &mut self,
        side: Side,
    ) -> Result<BrightnessBoostStatus, DeviceError> {
        let payload = self.get(Command::GetBrightnessBoost, side)?;
        let control_bits = payload[0] & 0x03;
        let control = LabbControl::from_bits(control_bits).ok_or(DeviceError::UnknownValue {
            what: "LABB control",
            value: control_bits,
        })?;
        Ok(BrightnessBoostStatus {
            settings: BrightnessBoost {
                sharpness: payload[0] >> 4,
                control,
                manual_setting: payload[1],
            },
            gain: payload[2],
        })
    }

    /// Read the DLP controller model
    pub fn get_asic_device_id(&mut self, side: Side) -> Result<AsicDevice, DeviceError> {
        let payload = self.get(Command::GetAsicDeviceId, side)?;
        AsicDevice::from_byte(payload[0]).ok_or(DeviceError::UnknownValue {
            what: "ASIC device id",
            value: payload[0],
        })
    }

    pub fn get_dmd_device_id(&mut self, side: Side) -> Result<DmdInfo, DeviceError> {
        let payload = self.get(Command::GetDmdDeviceId, side)?;
        Ok(DmdInfo::from_payload(&payload))
    }

    pub fn get_flash_version(&mut self, side: Side) -> Result<FlashVersion, DeviceError> {
        let payload = self.get(Command::GetFlashVersion, side)?;
        Ok(FlashVersion::from_payload(&payload))
    }
}
