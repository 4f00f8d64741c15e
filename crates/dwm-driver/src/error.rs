//! Driver error types.

use dwm_protocol::{DeviceStatus, ProtocolError};
use thiserror::Error;

/// Failures of the byte channel itself.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The transport was closed.
    #[error("transport is closed")]
    Closed,

    /// A write call accepted no bytes.
    #[error("transport accepted no bytes")]
    WriteZero,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port could not be opened or configured.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

/// Errors surfaced by driver operations.
#[derive(Error, Debug)]
pub enum DriverError {
    /// The transport failed or is closed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Fewer bytes arrived than a frame declared.
    #[error("incomplete frame: expected {expected} bytes, got {actual}")]
    IncompleteFrame {
        /// Bytes requested.
        expected: usize,
        /// Bytes received before the read timed out.
        actual: usize,
    },

    /// Bytes kept arriving past the data envelope without a gap.
    #[error("response overran {limit} trailing bytes without a read gap")]
    FrameOverrun {
        /// Trailing byte limit that was exceeded.
        limit: usize,
    },

    /// The module reported a non-zero status.
    #[error("device error: {0}")]
    Device(DeviceStatus),

    /// The module reported a status outside the known table.
    #[error("unrecognized device status: {0}")]
    UnrecognizedStatus(u64),

    /// The post-reset interrupt configuration failed.
    #[error("initialization failed: {0}")]
    Initialization(#[source] Box<DriverError>),

    /// A response could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(ProtocolError),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DriverError {
    /// Whether this is a framing failure (short read or overrun).
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            DriverError::IncompleteFrame { .. } | DriverError::FrameOverrun { .. }
        )
    }

    /// The device status carried by this error, if any.
    pub fn device_status(&self) -> Option<DeviceStatus> {
        match self {
            DriverError::Device(status) => Some(*status),
            DriverError::Initialization(inner) => inner.device_status(),
            _ => None,
        }
    }
}

impl From<ProtocolError> for DriverError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Device(status) => DriverError::Device(status),
            ProtocolError::UnrecognizedStatus(code) => DriverError::UnrecognizedStatus(code),
            other => DriverError::Protocol(other),
        }
    }
}

/// Result alias for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;
