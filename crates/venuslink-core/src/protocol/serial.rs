//! Serial port handling
//!
//! Discovery and setup of the Venus3 virtual COM port. The board is found by
//! the USB description string its driver reports, not by a fixed port name.

use serialport::{ClearBuffer, SerialPort, SerialPortInfo, SerialPortType};
use std::time::Duration;

use super::{ProtocolError, DEFAULT_BAUD_RATE, PORT_READ_TIMEOUT_MS};

/// An attached serial port as seen during discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// OS name of the port, e.g. `COM7` or `/dev/ttyACM0`
    pub name: String,
    /// USB vendor/product ids for USB ports
    pub usb_ids: Option<(u16, u16)>,
    /// Description reported by the USB driver
    pub description: Option<String>,
}

impl PortInfo {
    fn unnamed(name: String) -> Self {
        Self {
            name,
            usb_ids: None,
            description: None,
        }
    }

    /// Whether the port description starts with `prefix`
    pub fn matches_description(&self, prefix: &str) -> bool {
        self.description
            .as_deref()
            .is_some_and(|d| d.starts_with(prefix))
    }
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let SerialPortType::UsbPort(usb) = info.port_type else {
            return Self::unnamed(info.port_name);
        };
        // Windows drivers put the friendly name in `product`
        let description = usb.product.or(usb.manufacturer);
        Self {
            name: info.port_name,
            usb_ids: Some((usb.vid, usb.pid)),
            description,
        }
    }
}

/// Order USB ports first, then by the trailing port number
fn port_order(port: &PortInfo) -> (bool, u32, String) {
    let digits = port
        .name
        .rfind(|c: char| !c.is_ascii_digit())
        .map_or(port.name.as_str(), |i| &port.name[i + 1..]);
    (
        port.usb_ids.is_none(),
        digits.parse().unwrap_or(u32::MAX),
        port.name.clone(),
    )
}

fn serial_error(e: serialport::Error) -> ProtocolError {
    ProtocolError::SerialError(e.to_string())
}

/// Enumerate attached serial ports in a stable order
pub fn list_ports() -> Vec<PortInfo> {
    let mut ports: Vec<PortInfo> = match serialport::available_ports() {
        Ok(found) => found.into_iter().map(PortInfo::from).collect(),
        Err(e) => {
            tracing::warn!("port enumeration failed: {}", e);
            Vec::new()
        }
    };
    ports.sort_by_key(port_order);
    ports
}

/// Pick the first port whose description starts with `description`
pub fn select_port<'a>(ports: &'a [PortInfo], description: &str) -> Option<&'a PortInfo> {
    ports.iter().find(|p| p.matches_description(description))
}

/// Find the Venus3 board among the attached ports
pub fn find_port(description: &str) -> Result<PortInfo, ProtocolError> {
    let ports = list_ports();
    tracing::debug!("find_port: {} candidate ports", ports.len());
    select_port(&ports, description)
        .cloned()
        .ok_or_else(|| ProtocolError::PortNotFound(description.to_string()))
}

/// Open a port; reads time out after [`PORT_READ_TIMEOUT_MS`] so the frame
/// channel can enforce its own response deadline
pub fn open_port(name: &str, baud_rate: Option<u32>) -> Result<Box<dyn SerialPort>, ProtocolError> {
    serialport::new(name, baud_rate.unwrap_or(DEFAULT_BAUD_RATE))
        .timeout(Duration::from_millis(PORT_READ_TIMEOUT_MS))
        .open()
        .map_err(serial_error)
}

/// Set 8N1 framing without flow control
pub fn configure_port(port: &mut dyn SerialPort) -> Result<(), ProtocolError> {
    port.set_data_bits(serialport::DataBits::Eight)
        .and_then(|_| port.set_parity(serialport::Parity::None))
        .and_then(|_| port.set_stop_bits(serialport::StopBits::One))
        .and_then(|_| port.set_flow_control(serialport::FlowControl::None))
        .map_err(serial_error)
}

/// Drop anything pending in the selected OS buffers
pub fn clear_buffers(port: &mut dyn SerialPort, buffer: ClearBuffer) -> Result<(), ProtocolError> {
    port.clear(buffer).map_err(serial_error)
}
