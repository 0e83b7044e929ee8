//! Frame transport
//!
//! Null-delimited frame I/O over any ordered, reliable byte stream.

use serialport::{ClearBuffer, SerialPort};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::time::{Duration, Instant};

use super::serial::clear_buffers;
use super::{ProtocolError, FRAME_DELIMITER, MAX_FRAME_LEN};

/// Abstraction for the link carrying frames to and from the device
pub trait FrameChannel: Send {
    /// Write one encoded frame (terminator included)
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), ProtocolError>;

    /// Read bytes up to the next null delimiter, returning them without it.
    ///
    /// Fails with [`ProtocolError::ResponseTimeout`] once no byte has arrived
    /// for `timeout`.
    fn read_frame(&mut self, timeout: Duration) -> Result<Vec<u8>, ProtocolError>;

    /// Discard any input received so far, so leftovers of an earlier
    /// transaction cannot be read as the reply to the next command
    fn clear_input(&mut self) -> Result<(), ProtocolError>;
}

/// [`FrameChannel`] over any `Read + Write` byte stream
///
/// The underlying reader is expected to return `TimedOut`/`WouldBlock` (or
/// `Ok(0)` at end of stream) when no data is available.
pub struct StreamChannel<T: Read + Write + Send> {
    reader: BufReader<T>,
}

impl<T: Read + Write + Send> StreamChannel<T> {
    pub fn new(inner: T) -> Self {
        Self {
            reader: BufReader::new(inner),
        }
    }

    /// Access the wrapped stream
    pub fn get_ref(&self) -> &T {
        self.reader.get_ref()
    }

    /// Mutable access to the wrapped stream
    pub fn get_mut(&mut self) -> &mut T {
        self.reader.get_mut()
    }

    /// Unwrap the stream; buffered input is lost
    pub fn into_inner(self) -> T {
        self.reader.into_inner()
    }
}

impl<T: Read + Write + Send> FrameChannel for StreamChannel<T> {
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), ProtocolError> {
        let stream = self.reader.get_mut();
        stream
            .write_all(frame)
            .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
        stream
            .flush()
            .map_err(|e| ProtocolError::SerialError(e.to_string()))
    }

    fn read_frame(&mut self, timeout: Duration) -> Result<Vec<u8>, ProtocolError> {
        let mut line = Vec::new();
        let mut last_progress = Instant::now();

        loop {
            let before = line.len();
            // Partial data stays in `line` even when read_until errors
            let result = self.reader.read_until(FRAME_DELIMITER, &mut line);
            if line.len() > before {
                last_progress = Instant::now();
            }
            if line.len() > MAX_FRAME_LEN {
                return Err(ProtocolError::BufferOverflow);
            }

            match result {
                Ok(_) if line.last() == Some(&FRAME_DELIMITER) => {
                    line.pop();
                    return Ok(line);
                }
                Ok(_) => {
                    // End of stream: nothing further will ever arrive
                    tracing::debug!(
                        "read_frame: stream ended with {} unterminated bytes",
                        line.len()
                    );
                    return Err(ProtocolError::ResponseTimeout);
                }
                Err(ref e)
                    if e.kind() == io::ErrorKind::TimedOut
                        || e.kind() == io::ErrorKind::WouldBlock =>
                {
                    if last_progress.elapsed() >= timeout {
                        tracing::debug!(
                            "read_frame: no data for {}ms ({} bytes pending)",
                            timeout.as_millis(),
                            line.len()
                        );
                        return Err(ProtocolError::ResponseTimeout);
                    }
                }
                Err(e) => return Err(ProtocolError::SerialError(e.to_string())),
            }
        }
    }

    fn clear_input(&mut self) -> Result<(), ProtocolError> {
        // Only what the BufReader already pulled in; the stream itself
        // offers no way to discard
        let buffered = self.reader.buffer().len();
        if buffered > 0 {
            tracing::debug!("clear_input: dropping {} stale bytes", buffered);
        }
        self.reader.consume(buffered);
        Ok(())
    }
}

/// Transport used against real hardware
///
/// Clearing input also flushes the OS receive buffer of the port.
pub struct SerialChannel {
    inner: StreamChannel<Box<dyn SerialPort>>,
}

impl SerialChannel {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self {
            inner: StreamChannel::new(port),
        }
    }
}

impl FrameChannel for SerialChannel {
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), ProtocolError> {
        self.inner.write_frame(frame)
    }

    fn read_frame(&mut self, timeout: Duration) -> Result<Vec<u8>, ProtocolError> {
        self.inner.read_frame(timeout)
    }

    fn clear_input(&mut self) -> Result<(), ProtocolError> {
        self.inner.clear_input()?;
        clear_buffers(self.inner.get_mut().as_mut(), ClearBuffer::Input)
    }
}
