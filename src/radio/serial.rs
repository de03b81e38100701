use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::SerialPort;
use tracing::info;

use crate::core::{Error, Result, SerialConfig};

/// Byte-oriented serial duplex to the modem.
///
/// Every call must return promptly: reads only return what is already
/// buffered and writes only accept what fits without blocking.
pub trait SerialLink {
    /// Reconfigures the line rate
    fn set_baud(&mut self, baud: u32) -> Result<()>;

    /// Bytes ready to read
    fn available(&mut self) -> Result<usize>;

    /// Reads up to `buf.len()` buffered bytes
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Writes up to `data.len()` bytes, returning how many were accepted
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Bytes that can be written right now without blocking
    fn available_for_write(&mut self) -> usize;
}

/// Host serial port adapter over the `serialport` crate
pub struct HostSerial {
    port: Box<dyn SerialPort>,
    write_chunk: usize,
}

impl HostSerial {
    /// Opens the configured device at the modem's factory baud rate
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(&config.device, 9600)
            .timeout(Duration::from_millis(1))
            .open()
            .map_err(|e| Error::config(format!("Failed to open {}: {}", config.device, e)))?;

        info!(device = %config.device, "Opened modem serial port");
        Ok(HostSerial::from_port(port, config.write_chunk))
    }

    pub fn from_port(port: Box<dyn SerialPort>, write_chunk: usize) -> Self {
        HostSerial { port, write_chunk }
    }

    pub fn port_mut(&mut self) -> &mut dyn SerialPort {
        self.port.as_mut()
    }
}

impl SerialLink for HostSerial {
    fn set_baud(&mut self, baud: u32) -> Result<()> {
        self.port.set_baud_rate(baud)?;
        Ok(())
    }

    fn available(&mut self) -> Result<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.port.read(buf) {
            Ok(count) => Ok(count),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        match self.port.write(data) {
            Ok(count) => Ok(count),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn available_for_write(&mut self) -> usize {
        let queued = self.port.bytes_to_write().unwrap_or(0) as usize;
        self.write_chunk.saturating_sub(queued)
    }
}
