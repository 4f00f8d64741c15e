//! Protocol error types.

use thiserror::Error;

use crate::status::DeviceStatus;

/// Errors that can occur when encoding or decoding DWM1001 TLV messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Value does not fit behind a single length byte.
    #[error("value too long: maximum {max} bytes, got {actual}")]
    ValueTooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length supplied.
        actual: usize,
    },

    /// Buffer ends before the declared record does.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length available.
        actual: usize,
    },

    /// A record of one type was expected but another was found.
    #[error("unexpected TLV type: expected 0x{expected:02X}, got 0x{actual:02X}")]
    UnexpectedType {
        /// Expected type code.
        expected: u8,
        /// Type code found.
        actual: u8,
    },

    /// A required record is missing from the response.
    #[error("missing TLV record 0x{0:02X}")]
    MissingRecord(u8),

    /// Status value outside the known table.
    #[error("unrecognized device status: {0}")]
    UnrecognizedStatus(u64),

    /// The module reported a non-zero status.
    #[error("device error: {0}")]
    Device(DeviceStatus),
}

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
