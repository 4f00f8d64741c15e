//! Device status decoding.
//!
//! Every response starts with a return-value envelope whose value is the
//! module's status. Zero means success; 1 through 5 name a failure; anything
//! else is outside the table and is rejected rather than mapped.

use std::fmt;

use crate::error::{ProtocolError, Result};

/// Display names, indexed by status code.
const STATUS_NAMES: [&str; 6] = [
    "OK",
    "UNKNOWN COMMAND",
    "INTERNAL ERROR",
    "INVALID PARAMETER",
    "TAG BUSY",
    "OPERATION NOT PERMITTED",
];

/// Outcome reported by the module in the return-value envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceStatus {
    /// Command completed.
    Ok,
    /// Command type not recognised.
    UnknownCommand,
    /// Module internal error.
    InternalError,
    /// Parameter out of range or malformed.
    InvalidParameter,
    /// Module busy.
    TagBusy,
    /// Operation not allowed in the current mode.
    OperationNotPermitted,
}

impl DeviceStatus {
    const TABLE: [DeviceStatus; 6] = [
        DeviceStatus::Ok,
        DeviceStatus::UnknownCommand,
        DeviceStatus::InternalError,
        DeviceStatus::InvalidParameter,
        DeviceStatus::TagBusy,
        DeviceStatus::OperationNotPermitted,
    ];

    /// Map a status code to its outcome.
    ///
    /// Codes past the end of the table fail with
    /// [`ProtocolError::UnrecognizedStatus`].
    pub fn from_code(code: u64) -> Result<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::TABLE.get(idx).copied())
            .ok_or(ProtocolError::UnrecognizedStatus(code))
    }

    /// Decode the value bytes of a return-value envelope.
    ///
    /// The value is read as a little-endian unsigned integer. Values wider
    /// than eight bytes are only accepted when they are all zero.
    pub fn from_value(value: &[u8]) -> Result<Self> {
        Self::from_code(status_code(value))
    }

    /// The wire code for this outcome.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// The upper-case name the module's documentation uses.
    pub fn name(self) -> &'static str {
        STATUS_NAMES[self as usize]
    }

    /// Whether this is the success outcome.
    pub fn is_ok(self) -> bool {
        self == DeviceStatus::Ok
    }

    /// Turn a non-success outcome into an error.
    pub fn into_result(self) -> Result<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(ProtocolError::Device(self))
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Little-endian integer value of a status field.
///
/// Saturates to `u64::MAX` when non-zero bytes lie beyond the eighth, which
/// is never a valid status.
pub fn status_code(value: &[u8]) -> u64 {
    let (low, high) = value.split_at(value.len().min(8));
    if high.iter().any(|&b| b != 0) {
        return u64::MAX;
    }
    low.iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}
