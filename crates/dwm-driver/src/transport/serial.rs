//! Serial port transport.

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::SerialPort;
use tracing::debug;

use super::Transport;
use crate::error::TransportError;

/// A UART opened through the `serialport` crate.
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    name: String,
}

impl SerialTransport {
    /// Open `path` at `baud_rate` with the given per-read timeout.
    pub fn open(path: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self, TransportError> {
        let port = serialport::new(path, baud_rate)
            .timeout(read_timeout)
            .open()?;
        debug!(
            "opened {} at {} baud, read timeout {:?}",
            path, baud_rate, read_timeout
        );
        Ok(SerialTransport {
            port: Some(port),
            name: path.to_string(),
        })
    }

    /// Port path this transport was opened on.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>, TransportError> {
        self.port.as_mut().ok_or(TransportError::Closed)
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        let port = self.port()?;
        let n = Write::write(&mut *port, data)?;
        Write::flush(port)?;
        Ok(n)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match Read::read(self.port()?, buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if self.port.take().is_some() {
            debug!("closed {}", self.name);
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("name", &self.name)
            .field("open", &self.port.is_some())
            .finish()
    }
}
