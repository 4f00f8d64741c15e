//! Reading TLV responses off a transport.
//!
//! A response is a return-value envelope, then, when the status is zero, a
//! data envelope. The module doesn't mark where the data ends: some
//! responses (the version query for one) carry further records after the
//! first data envelope. The reader takes the declared length of the data
//! envelope, then keeps pulling single bytes until a read comes back empty.
//! That gap is the only end-of-response signal the module gives, so it is
//! used for trailing bytes only and capped.

use dwm_protocol::{DeviceStatus, TlvFrame, TLV_HEADER_SIZE, TLV_TYPE_RET_VAL};
use tracing::{trace, warn};

use crate::error::{DriverError, Result};
use crate::transport::Transport;

/// Default cap on bytes accepted after the data envelope.
pub const DEFAULT_MAX_TRAILING_BYTES: usize = 255;

/// Bytes thrown away after an overrun before giving up on finding the gap.
pub const OVERRUN_DISCARD_LIMIT: usize = 4096;

/// Reads envelopes from a borrowed transport.
pub struct FrameReader<'a, T: Transport + ?Sized> {
    transport: &'a mut T,
    max_trailing_bytes: usize,
}

impl<'a, T: Transport + ?Sized> FrameReader<'a, T> {
    /// Wrap a transport.
    pub fn new(transport: &'a mut T) -> Self {
        FrameReader {
            transport,
            max_trailing_bytes: DEFAULT_MAX_TRAILING_BYTES,
        }
    }

    /// Set the cap on bytes accepted after the data envelope.
    pub fn with_max_trailing_bytes(mut self, limit: usize) -> Self {
        self.max_trailing_bytes = limit;
        self
    }

    /// Read exactly `buf.len()` bytes.
    ///
    /// Fails with [`DriverError::IncompleteFrame`] if a read times out before
    /// the buffer is full.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.transport.read(&mut buf[filled..])? {
                0 => {
                    return Err(DriverError::IncompleteFrame {
                        expected: buf.len(),
                        actual: filled,
                    })
                }
                n => filled += n,
            }
        }
        Ok(())
    }

    /// Read one complete envelope.
    pub fn read_envelope(&mut self) -> Result<TlvFrame> {
        let mut header = [0u8; TLV_HEADER_SIZE];
        self.read_exact(&mut header)?;
        let mut value = vec![0u8; header[1] as usize];
        self.read_exact(&mut value)?;
        trace!(
            "rx TLV 0x{:02X} [{}]: {}",
            header[0],
            header[1],
            hex::encode(&value)
        );
        Ok(TlvFrame {
            tlv_type: header[0],
            value,
        })
    }

    /// Read a full response and return its raw bytes.
    ///
    /// On a non-zero status the data envelope is never read; the status is
    /// returned as [`DriverError::Device`] or
    /// [`DriverError::UnrecognizedStatus`].
    pub fn read_response(&mut self) -> Result<Vec<u8>> {
        let status = self.read_envelope()?;
        if status.tlv_type != TLV_TYPE_RET_VAL {
            warn!(
                "response led with TLV 0x{:02X}, expected return value",
                status.tlv_type
            );
        }
        let code = DeviceStatus::from_value(&status.value)?;
        if !code.is_ok() {
            return Err(DriverError::Device(code));
        }

        let mut raw = status.encode();

        // A status-only response is followed by silence.
        let mut tlv_type = [0u8; 1];
        if self.transport.read(&mut tlv_type)? == 0 {
            trace!("rx status-only response");
            return Ok(raw);
        }
        let mut len = [0u8; 1];
        self.read_exact(&mut len)?;
        let mut value = vec![0u8; len[0] as usize];
        self.read_exact(&mut value)?;
        raw.push(tlv_type[0]);
        raw.push(len[0]);
        raw.extend_from_slice(&value);

        let trailing = self.drain_trailing(&mut raw)?;
        trace!("rx response: {} bytes ({} trailing)", raw.len(), trailing);
        Ok(raw)
    }

    /// Append bytes until a read comes back empty.
    ///
    /// Past the cap the rest of the burst is discarded up to the gap, so the
    /// next transaction starts on a clean line.
    fn drain_trailing(&mut self, raw: &mut Vec<u8>) -> Result<usize> {
        let mut byte = [0u8; 1];
        let mut count = 0;
        while self.transport.read(&mut byte)? != 0 {
            if count == self.max_trailing_bytes {
                let discarded = self.discard_until_gap()?;
                warn!(
                    "response exceeded {} trailing bytes, discarded {} more",
                    self.max_trailing_bytes,
                    discarded + 1
                );
                return Err(DriverError::FrameOverrun {
                    limit: self.max_trailing_bytes,
                });
            }
            raw.push(byte[0]);
            count += 1;
        }
        Ok(count)
    }

    /// Read and drop bytes until a read comes back empty or the discard
    /// limit is reached.
    fn discard_until_gap(&mut self) -> Result<usize> {
        let mut buf = [0u8; 64];
        let mut discarded = 0;
        while discarded < OVERRUN_DISCARD_LIMIT {
            match self.transport.read(&mut buf)? {
                0 => break,
                n => discarded += n,
            }
        }
        Ok(discarded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    #[test]
    fn test_read_exact_across_chunks() {
        let mut mock = MockTransport::new();
        mock.push_read(&[0x41]);
        mock.push_read(&[0x02, 0xAB]);
        mock.push_read(&[0xCD]);
        let frame = FrameReader::new(&mut mock).read_envelope().expect("frame");
        assert_eq!(frame.tlv_type, 0x41);
        assert_eq!(frame.value, vec![0xAB, 0xCD]);
    }

    #[test]
    fn test_short_value_is_incomplete() {
        let mut mock = MockTransport::new();
        mock.push_read(&[0x41, 0x04, 0x01, 0x02]);
        let err = FrameReader::new(&mut mock).read_envelope().unwrap_err();
        assert!(matches!(
            err,
            DriverError::IncompleteFrame { expected: 4, actual: 2 }
        ));
    }

    #[test]
    fn test_silence_is_incomplete() {
        let mut mock = MockTransport::new();
        let err = FrameReader::new(&mut mock).read_response().unwrap_err();
        assert!(matches!(
            err,
            DriverError::IncompleteFrame { expected: 2, actual: 0 }
        ));
    }

    #[test]
    fn test_response_with_data() {
        let mut mock = MockTransport::new();
        mock.push_read(&[0x40, 0x01, 0x00]);
        mock.push_read(&[0x41, 0x02, 0xAB, 0xCD]);
        mock.push_gap();
        let raw = FrameReader::new(&mut mock).read_response().expect("raw");
        assert_eq!(raw, vec![0x40, 0x01, 0x00, 0x41, 0x02, 0xAB, 0xCD]);
    }

    #[test]
    fn test_response_keeps_trailing_records() {
        let mut mock = MockTransport::new();
        mock.push_read(&[0x40, 0x01, 0x00]);
        mock.push_read(&[0x50, 0x01, 0x11, 0x51, 0x01, 0x22]);
        mock.push_read(&[0x52, 0x01, 0x33]);
        mock.push_gap();
        let raw = FrameReader::new(&mut mock).read_response().expect("raw");
        assert_eq!(
            raw,
            vec![0x40, 0x01, 0x00, 0x50, 0x01, 0x11, 0x51, 0x01, 0x22, 0x52, 0x01, 0x33]
        );
    }

    #[test]
    fn test_status_only_response() {
        let mut mock = MockTransport::new();
        mock.push_read(&[0x40, 0x01, 0x00]);
        mock.push_gap();
        let raw = FrameReader::new(&mut mock).read_response().expect("raw");
        assert_eq!(raw, vec![0x40, 0x01, 0x00]);
    }

    #[test]
    fn test_missing_data_length_is_incomplete() {
        let mut mock = MockTransport::new();
        mock.push_read(&[0x40, 0x01, 0x00, 0x41]);
        let err = FrameReader::new(&mut mock).read_response().unwrap_err();
        assert!(matches!(
            err,
            DriverError::IncompleteFrame { expected: 1, actual: 0 }
        ));
    }

    #[test]
    fn test_error_status_stops_reading() {
        let mut mock = MockTransport::new();
        mock.push_read(&[0x40, 0x01, 0x03]);
        mock.push_read(&[0x41, 0x02, 0xAB, 0xCD]);
        let err = FrameReader::new(&mut mock).read_response().unwrap_err();
        assert!(matches!(
            err,
            DriverError::Device(DeviceStatus::InvalidParameter)
        ));
        assert_eq!(mock.pending_bytes(), 4);
    }

    #[test]
    fn test_unrecognized_status() {
        let mut mock = MockTransport::new();
        mock.push_read(&[0x40, 0x01, 0x06]);
        let err = FrameReader::new(&mut mock).read_response().unwrap_err();
        assert!(matches!(err, DriverError::UnrecognizedStatus(6)));
    }

    #[test]
    fn test_trailing_overrun() {
        let mut mock = MockTransport::new();
        mock.push_read(&[0x40, 0x01, 0x00, 0x41, 0x00]);
        mock.push_read(&[0xEE; 8]);
        let err = FrameReader::new(&mut mock)
            .with_max_trailing_bytes(4)
            .read_response()
            .unwrap_err();
        assert!(matches!(err, DriverError::FrameOverrun { limit: 4 }));
    }

    #[test]
    fn test_overrun_drains_to_gap() {
        let mut mock = MockTransport::new();
        mock.push_read(&[0x40, 0x01, 0x00, 0x41, 0x00]);
        mock.push_read(&[0xEE; 8]);
        mock.push_gap();
        mock.push_response(0, &[(0x5A, &[0x01u8, 0x00][..])]);

        let err = FrameReader::new(&mut mock)
            .with_max_trailing_bytes(4)
            .read_response()
            .unwrap_err();
        assert!(matches!(err, DriverError::FrameOverrun { limit: 4 }));

        let raw = FrameReader::new(&mut mock).read_response().expect("raw");
        assert_eq!(raw, vec![0x40, 0x01, 0x00, 0x5A, 0x02, 0x01, 0x00]);
        assert_eq!(mock.pending_bytes(), 0);
    }

    #[test]
    fn test_overrun_discard_is_bounded() {
        let mut mock = MockTransport::new();
        mock.push_read(&[0x40, 0x01, 0x00, 0x41, 0x00]);
        for _ in 0..100 {
            mock.push_read(&[0xEE; 64]);
        }
        let err = FrameReader::new(&mut mock)
            .with_max_trailing_bytes(4)
            .read_response()
            .unwrap_err();
        assert!(matches!(err, DriverError::FrameOverrun { limit: 4 }));
        assert!(mock.pending_bytes() > 0);
    }
}
