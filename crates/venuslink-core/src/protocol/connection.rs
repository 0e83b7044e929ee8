//! Connection management
//!
//! Handles the connection lifecycle and command execution with the board.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use serialport::ClearBuffer;

use super::{
    correlator::Correlator,
    frame::{encode, Side},
    serial::{clear_buffers, configure_port, find_port, list_ports, open_port, PortInfo},
    stream::{FrameChannel, SerialChannel},
    ProtocolError, DEFAULT_BAUD_RATE, DEFAULT_MAX_PENDING, DEFAULT_TIMEOUT_MS,
    VENUS3_PORT_DESCRIPTION,
};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Not connected
    Disconnected,
    /// Opening the port
    Connecting,
    /// Connected and ready
    Connected,
    /// Connection error
    Error,
}

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Serial port name; discovered by description when absent
    pub port_name: Option<String>,
    /// USB port description prefix used for discovery
    pub port_description: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Response timeout in milliseconds
    pub timeout_ms: u64,
    /// Capacity of the pending transaction map
    pub max_pending: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port_name: None,
            port_description: VENUS3_PORT_DESCRIPTION.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_pending: DEFAULT_MAX_PENDING,
        }
    }
}

impl ConnectionConfig {
    /// Load a configuration from a JSON file; missing keys take defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Save the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, content)
    }

    /// Response timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Link to a Venus3 board
pub struct Connection {
    /// Frame transport
    channel: Option<Box<dyn FrameChannel>>,
    /// Current connection state
    state: ConnectionState,
    /// Connection configuration
    config: ConnectionConfig,
    /// Name of the opened port, if any
    port_name: Option<String>,
    /// In-flight transactions and buffered responses
    correlator: Correlator,
    /// Metrics: cumulative bytes/frames sent
    tx_bytes: u64,
    tx_frames: u64,
}

impl Connection {
    /// Create a new connection (not yet connected)
    pub fn new(config: ConnectionConfig) -> Self {
        let correlator = Correlator::new(config.max_pending);
        Self {
            channel: None,
            state: ConnectionState::Disconnected,
            config,
            port_name: None,
            correlator,
            tx_bytes: 0,
            tx_frames: 0,
        }
    }

    /// List available serial ports
    pub fn list_ports() -> Vec<PortInfo> {
        list_ports()
    }

    /// Get current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Get the configuration
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Name of the opened serial port
    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    /// Access the correlator, e.g. to inspect buffered responses
    pub fn correlator(&self) -> &Correlator {
        &self.correlator
    }

    /// Get cumulative tx/rx bytes and frame counters
    pub fn get_counters(&self) -> (u64, u64, u64, u64) {
        let (rx_bytes, rx_frames) = self.correlator.rx_counters();
        (self.tx_bytes, rx_bytes, self.tx_frames, rx_frames)
    }

    /// Open the configured (or discovered) serial port
    pub fn connect(&mut self) -> Result<(), ProtocolError> {
        if self.state == ConnectionState::Connected {
            return Err(ProtocolError::AlreadyConnected);
        }

        self.state = ConnectionState::Connecting;
        match self.open_serial() {
            Ok((name, channel)) => {
                tracing::info!("connected to {} at {} baud", name, self.config.baud_rate);
                self.port_name = Some(name);
                self.attach_channel(channel);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("connect failed: {}", e);
                self.state = ConnectionState::Error;
                Err(e)
            }
        }
    }

    fn open_serial(&self) -> Result<(String, Box<dyn FrameChannel>), ProtocolError> {
        let name = match &self.config.port_name {
            Some(name) => name.clone(),
            None => find_port(&self.config.port_description)?.name,
        };

        let mut port = open_port(&name, Some(self.config.baud_rate))?;
        configure_port(port.as_mut())?;
        clear_buffers(port.as_mut(), ClearBuffer::All)?;
        Ok((name, Box::new(SerialChannel::new(port))))
    }

    /// Use an already opened transport instead of a serial port
    pub fn attach(&mut self, channel: Box<dyn FrameChannel>) -> Result<(), ProtocolError> {
        if self.state == ConnectionState::Connected {
            return Err(ProtocolError::AlreadyConnected);
        }
        self.attach_channel(channel);
        Ok(())
    }

    fn attach_channel(&mut self, channel: Box<dyn FrameChannel>) {
        self.channel = Some(channel);
        self.correlator.clear();
        self.state = ConnectionState::Connected;
    }

    /// Disconnect from the board
    pub fn disconnect(&mut self) {
        self.channel = None;
        self.port_name = None;
        self.correlator.clear();
        self.state = ConnectionState::Disconnected;
    }

    /// Encode and write a command, registering its transaction.
    ///
    /// With no other command awaited, unread input is discarded first: it
    /// can only be the tail of a transaction that already failed.
    pub fn send(
        &mut self,
        command_id: u8,
        side: Side,
        payload: &[u8],
    ) -> Result<(), ProtocolError> {
        let channel = self.channel.as_mut().ok_or(ProtocolError::NotConnected)?;
        let bytes = encode(command_id, side, payload)?;
        if self.correlator.awaiting_count() == 0 {
            if let Err(e) = channel.clear_input() {
                self.state = ConnectionState::Error;
                return Err(e);
            }
        }
        self.correlator.begin(command_id, side)?;

        tracing::debug!(
            "send: {:?}",
            String::from_utf8_lossy(&bytes[..bytes.len() - 1])
        );

        if let Err(e) = channel.write_frame(&bytes) {
            self.correlator.evict(command_id);
            self.state = ConnectionState::Error;
            return Err(e);
        }

        self.tx_bytes = self.tx_bytes.saturating_add(bytes.len() as u64);
        self.tx_frames = self.tx_frames.saturating_add(1);
        Ok(())
    }

    /// Wait for the response to a previously sent command
    pub fn receive(
        &mut self,
        command_id: u8,
        side: Side,
        ack_only: bool,
    ) -> Result<Option<Vec<u8>>, ProtocolError> {
        let timeout = self.config.timeout();
        let channel = self.channel.as_mut().ok_or(ProtocolError::NotConnected)?;
        let result = self
            .correlator
            .await_response(channel.as_mut(), timeout, command_id, side, ack_only);

        if let Err(ProtocolError::SerialError(_) | ProtocolError::IoError(_)) = result {
            self.state = ConnectionState::Error;
        }
        result
    }

    /// Send a command that is answered by a bare ACK
    pub fn command(
        &mut self,
        command_id: u8,
        side: Side,
        payload: &[u8],
    ) -> Result<(), ProtocolError> {
        self.send(command_id, side, payload)?;
        if let Some(extra) = self.receive(command_id, side, true)? {
            tracing::debug!(
                "command {:#04x}: ignoring {} unexpected response bytes",
                command_id,
                extra.len()
            );
        }
        Ok(())
    }

    /// Send a command and return the payload committed by its ACK
    pub fn query(
        &mut self,
        command_id: u8,
        side: Side,
        payload: &[u8],
    ) -> Result<Vec<u8>, ProtocolError> {
        self.send(command_id, side, payload)?;
        self.receive(command_id, side, false)?.ok_or_else(|| {
            ProtocolError::MalformedFrame(format!(
                "command {:#04x} acknowledged without data",
                command_id
            ))
        })
    }

    /// Fetch a response that was buffered while another command was awaited
    pub fn take_buffered(
        &mut self,
        command_id: u8,
        side: Side,
    ) -> Result<Option<Vec<u8>>, ProtocolError> {
        self.correlator.take_buffered(command_id, side)
    }
}
