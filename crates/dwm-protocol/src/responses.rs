//! Responses from the module.
//!
//! A raw response is the return-value envelope followed by zero or more data
//! records. Decoders receive the whole thing, status envelope included.

use bytes::Buf;

use crate::constants::*;
use crate::error::{ProtocolError, Result};
use crate::frame::{split_response, TlvFrame};
use crate::types::*;

/// Decode a typed value from a raw transaction payload.
pub trait DecodeResponse: Sized {
    /// Decode from the full raw payload.
    fn decode_response(raw: &[u8]) -> Result<Self>;
}

fn find_record(records: &[TlvFrame], tlv_type: u8) -> Result<&TlvFrame> {
    records
        .iter()
        .find(|r| r.tlv_type == tlv_type)
        .ok_or(ProtocolError::MissingRecord(tlv_type))
}

fn decode_u32(value: &[u8]) -> Result<u32> {
    ensure_len(value, VERSION_SIZE)?;
    Ok(u32::from_le_bytes([value[0], value[1], value[2], value[3]]))
}

/// Responses that carry only the status envelope.
impl DecodeResponse for () {
    fn decode_response(raw: &[u8]) -> Result<Self> {
        split_response(raw).map(|_| ())
    }
}

impl DecodeResponse for Position {
    fn decode_response(raw: &[u8]) -> Result<Self> {
        let records = split_response(raw)?;
        Position::decode(&find_record(&records, TLV_TYPE_POS_XYZ)?.value)
    }
}

impl DecodeResponse for NodeConfig {
    fn decode_response(raw: &[u8]) -> Result<Self> {
        let records = split_response(raw)?;
        NodeConfig::decode(&find_record(&records, TLV_TYPE_CFG)?.value)
    }
}

impl DecodeResponse for SystemStatus {
    fn decode_response(raw: &[u8]) -> Result<Self> {
        let records = split_response(raw)?;
        SystemStatus::decode(&find_record(&records, TLV_TYPE_STATUS)?.value)
    }
}

impl DecodeResponse for VersionInfo {
    fn decode_response(raw: &[u8]) -> Result<Self> {
        let records = split_response(raw)?;
        Ok(VersionInfo {
            firmware: FirmwareVersion::decode(&find_record(&records, TLV_TYPE_FW_VER)?.value)?,
            config: decode_u32(&find_record(&records, TLV_TYPE_CFG_VER)?.value)?,
            hardware: decode_u32(&find_record(&records, TLV_TYPE_HW_VER)?.value)?,
        })
    }
}

impl DecodeResponse for Location {
    fn decode_response(raw: &[u8]) -> Result<Self> {
        let records = split_response(raw)?;
        let position = Position::decode(&find_record(&records, TLV_TYPE_POS_XYZ)?.value)?;

        let distances = match records.iter().find(|r| {
            r.tlv_type == TLV_TYPE_RNG_AN_POS_DIST || r.tlv_type == TLV_TYPE_RNG_AN_DIST
        }) {
            Some(record) if record.tlv_type == TLV_TYPE_RNG_AN_POS_DIST => {
                decode_distances(&record.value, TAG_DIST_ENTRY_SIZE, |entry| {
                    let mut buf = entry;
                    Ok(AnchorDistance {
                        address: u64::from(buf.get_u16_le()),
                        distance: buf.get_u32_le(),
                        quality: buf.get_u8(),
                        position: Some(Position::decode(buf)?),
                    })
                })?
            }
            Some(record) => decode_distances(&record.value, ANCHOR_DIST_ENTRY_SIZE, |entry| {
                let mut buf = entry;
                Ok(AnchorDistance {
                    address: buf.get_u64_le(),
                    distance: buf.get_u32_le(),
                    quality: buf.get_u8(),
                    position: None,
                })
            })?,
            None => Vec::new(),
        };

        Ok(Location {
            position,
            distances,
        })
    }
}

/// Decode a count-prefixed list of fixed-size entries.
fn decode_distances<F>(value: &[u8], entry_size: usize, decode: F) -> Result<Vec<AnchorDistance>>
where
    F: Fn(&[u8]) -> Result<AnchorDistance>,
{
    ensure_len(value, 1)?;
    let count = value[0] as usize;
    let body = &value[1..];
    ensure_len(body, count * entry_size)?;
    body.chunks_exact(entry_size)
        .take(count)
        .map(decode)
        .collect()
}
