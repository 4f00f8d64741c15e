//! Byte transports.
//!
//! A transport is a blocking duplex byte channel with a per-read timeout.
//! A read that times out with nothing available returns `Ok(0)`; that is a
//! normal outcome, not an error.

mod mock;
mod serial;

pub use mock::MockTransport;
pub use serial::SerialTransport;

use crate::error::TransportError;

/// Blocking byte channel to the module.
///
/// Not safe to close while another call is reading or writing; the session
/// holds it by `&mut` so this can't happen within one owner.
pub trait Transport {
    /// Write some bytes, returning how many were accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Read up to `buf.len()` bytes. Returns `Ok(0)` if the read timed out
    /// with nothing available.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Release the channel. Later calls fail with [`TransportError::Closed`].
    fn close(&mut self) -> Result<(), TransportError>;

    /// Whether the channel is still open.
    fn is_open(&self) -> bool;

    /// Write all of `data`.
    fn write_all(&mut self, mut data: &[u8]) -> Result<(), TransportError> {
        while !data.is_empty() {
            match self.write(data)? {
                0 => return Err(TransportError::WriteZero),
                n => data = &data[n..],
            }
        }
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        (**self).read(buf)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}
