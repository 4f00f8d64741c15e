//! TLV envelope encoding/decoding.
//!
//! Every message on the wire is one or more envelopes:
//!
//! ```text
//! +------+--------+-------------------+
//! | type | length | value[0..length]  |
//! +------+--------+-------------------+
//! ```
//!
//! The length is a single byte, so values are limited to 255 bytes.

use bytes::{BufMut, BytesMut};

use crate::constants::*;
use crate::error::{ProtocolError, Result};
use crate::status::DeviceStatus;

/// One TLV envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvFrame {
    /// Type code.
    pub tlv_type: u8,
    /// Value bytes. Never longer than [`TLV_MAX_VALUE_SIZE`].
    pub value: Vec<u8>,
}

impl TlvFrame {
    /// Create a frame, rejecting values that don't fit the length byte.
    pub fn new(tlv_type: u8, value: impl Into<Vec<u8>>) -> Result<Self> {
        let value = value.into();
        if value.len() > TLV_MAX_VALUE_SIZE {
            return Err(ProtocolError::ValueTooLong {
                max: TLV_MAX_VALUE_SIZE,
                actual: value.len(),
            });
        }
        Ok(TlvFrame { tlv_type, value })
    }

    /// The declared length byte.
    pub fn length(&self) -> u8 {
        // Bounded by the constructor.
        self.value.len() as u8
    }

    /// Total encoded size including the header.
    pub fn encoded_len(&self) -> usize {
        TLV_HEADER_SIZE + self.value.len()
    }

    /// Encode as `[type][length][value]`.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf.to_vec()
    }

    /// Append the encoded frame to `buf`.
    pub fn encode_into(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.tlv_type);
        buf.put_u8(self.length());
        buf.put_slice(&self.value);
    }

    /// Parse one frame from the start of `data`.
    ///
    /// Returns the frame and the number of bytes consumed.
    pub fn parse(data: &[u8]) -> Result<(Self, usize)> {
        if data.len() < TLV_HEADER_SIZE {
            return Err(ProtocolError::FrameTooShort {
                expected: TLV_HEADER_SIZE,
                actual: data.len(),
            });
        }
        let tlv_type = data[0];
        let len = data[1] as usize;
        let end = TLV_HEADER_SIZE + len;
        if data.len() < end {
            return Err(ProtocolError::FrameTooShort {
                expected: end,
                actual: data.len(),
            });
        }
        log::trace!("parsed TLV 0x{:02X} with {} value bytes", tlv_type, len);
        Ok((
            TlvFrame {
                tlv_type,
                value: data[TLV_HEADER_SIZE..end].to_vec(),
            },
            end,
        ))
    }

    /// Interpret this frame as a return-value envelope.
    pub fn status(&self) -> Result<DeviceStatus> {
        if self.tlv_type != TLV_TYPE_RET_VAL {
            return Err(ProtocolError::UnexpectedType {
                expected: TLV_TYPE_RET_VAL,
                actual: self.tlv_type,
            });
        }
        DeviceStatus::from_value(&self.value)
    }
}

/// Encode a request envelope from its parts.
pub fn encode_request(tlv_type: u8, payload: &[u8]) -> Result<Vec<u8>> {
    Ok(TlvFrame::new(tlv_type, payload)?.encode())
}

/// Iterator over consecutive TLV records in a buffer.
///
/// Yields an error and stops if the buffer ends mid-record.
#[derive(Debug, Clone)]
pub struct TlvRecords<'a> {
    data: &'a [u8],
    failed: bool,
}

impl<'a> TlvRecords<'a> {
    /// Iterate over the records in `data`.
    pub fn new(data: &'a [u8]) -> Self {
        TlvRecords {
            data,
            failed: false,
        }
    }
}

impl Iterator for TlvRecords<'_> {
    type Item = Result<TlvFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.data.is_empty() {
            return None;
        }
        match TlvFrame::parse(self.data) {
            Ok((frame, used)) => {
                self.data = &self.data[used..];
                Some(Ok(frame))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Split a raw transaction payload into its status and data records.
///
/// The first record must be a return-value envelope reporting success;
/// anything else becomes an error.
pub fn split_response(raw: &[u8]) -> Result<Vec<TlvFrame>> {
    let mut records = TlvRecords::new(raw);
    let first = records.next().ok_or(ProtocolError::FrameTooShort {
        expected: TLV_HEADER_SIZE,
        actual: 0,
    })??;
    first.status()?.into_result()?;
    records.collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_empty_payload() {
        let encoded = encode_request(DWM_POS_GET, &[]).expect("encode");
        assert_eq!(encoded, vec![0x02, 0x00]);
    }

    #[test]
    fn test_encode_decode() {
        for len in [0usize, 1, 13, 254, 255] {
            let payload: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
            let encoded = encode_request(0x34, &payload).expect("encode");
            assert_eq!(encoded.len(), 2 + len);
            assert_eq!(encoded[1] as usize, len);

            let (frame, used) = TlvFrame::parse(&encoded).expect("parse");
            assert_eq!(used, encoded.len());
            assert_eq!(frame.tlv_type, 0x34);
            assert_eq!(frame.value, payload);
        }
    }

    #[test]
    fn test_encode_rejects_long_payload() {
        let payload = vec![0u8; 256];
        assert_eq!(
            encode_request(0x01, &payload),
            Err(ProtocolError::ValueTooLong {
                max: 255,
                actual: 256
            })
        );
    }

    #[test]
    fn test_parse_partial() {
        assert!(matches!(
            TlvFrame::parse(&[0x41]),
            Err(ProtocolError::FrameTooShort { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            TlvFrame::parse(&[0x41, 0x03, 0xAA]),
            Err(ProtocolError::FrameTooShort { expected: 5, actual: 3 })
        ));
    }

    #[test]
    fn test_records_multiple() {
        let data = [0x40, 0x01, 0x00, 0x50, 0x01, 0xAA, 0x51, 0x00];
        let records: Vec<_> = TlvRecords::new(&data)
            .collect::<Result<_>>()
            .expect("records");
        assert_eq!(records.len(), 3);
        assert_eq!(records[1], TlvFrame { tlv_type: 0x50, value: vec![0xAA] });
        assert!(records[2].value.is_empty());
    }

    #[test]
    fn test_records_stop_after_error() {
        let data = [0x40, 0x01, 0x00, 0x50, 0x04, 0xAA];
        let mut records = TlvRecords::new(&data);
        assert!(records.next().expect("first").is_ok());
        assert!(records.next().expect("second").is_err());
        assert!(records.next().is_none());
    }

    #[test]
    fn test_split_response_device_error() {
        let data = [0x40, 0x01, 0x04];
        assert_eq!(
            split_response(&data),
            Err(ProtocolError::Device(DeviceStatus::TagBusy))
        );
    }

    #[test]
    fn test_split_response_wrong_leading_type() {
        let data = [0x41, 0x01, 0x00];
        assert!(matches!(
            split_response(&data),
            Err(ProtocolError::UnexpectedType { expected: 0x40, actual: 0x41 })
        ));
    }

    #[test]
    fn test_split_response_ok() {
        let data = [0x40, 0x01, 0x00, 0x5A, 0x02, 0x01, 0x00];
        let records = split_response(&data).expect("split");
        assert_eq!(records, vec![TlvFrame { tlv_type: 0x5A, value: vec![0x01, 0x00] }]);
    }
}
