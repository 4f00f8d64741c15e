//! Common types used in the protocol.

use std::fmt;

use bytes::Buf;

use crate::constants::*;
use crate::error::{ProtocolError, Result};

/// Check that a record value is at least `expected` bytes long.
pub(crate) fn ensure_len(value: &[u8], expected: usize) -> Result<()> {
    if value.len() < expected {
        return Err(ProtocolError::FrameTooShort {
            expected,
            actual: value.len(),
        });
    }
    Ok(())
}

/// Position in millimetres with a quality factor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    /// X coordinate (mm).
    pub x: i32,
    /// Y coordinate (mm).
    pub y: i32,
    /// Z coordinate (mm).
    pub z: i32,
    /// Quality factor, 0-100.
    pub quality: u8,
}

impl Position {
    /// Decode a 13-byte position.
    pub fn decode(mut value: &[u8]) -> Result<Self> {
        ensure_len(value, POSITION_SIZE)?;
        Ok(Position {
            x: value.get_i32_le(),
            y: value.get_i32_le(),
            z: value.get_i32_le(),
            quality: value.get_u8(),
        })
    }

    /// Coordinates in metres.
    pub fn to_meters(&self) -> (f64, f64, f64) {
        (
            f64::from(self.x) / 1000.0,
            f64::from(self.y) / 1000.0,
            f64::from(self.z) / 1000.0,
        )
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y, z) = self.to_meters();
        write!(f, "x={:.3}m y={:.3}m z={:.3}m q={}", x, y, z, self.quality)
    }
}

/// Ranging result to a single anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorDistance {
    /// UWB address of the anchor. Tags report 16-bit short addresses.
    pub address: u64,
    /// Distance (mm).
    pub distance: u32,
    /// Quality factor, 0-100.
    pub quality: u8,
    /// Anchor position, present in tag reports only.
    pub position: Option<Position>,
}

/// Location report: own position plus ranging distances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// Own position.
    pub position: Position,
    /// Distances to anchors in range.
    pub distances: Vec<AnchorDistance>,
}

/// UWB radio mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UwbMode {
    /// Radio off.
    Off,
    /// Passive (listening only).
    Passive,
    /// Active.
    Active,
    /// Reserved value.
    Reserved,
}

impl From<u8> for UwbMode {
    fn from(bits: u8) -> Self {
        match bits & 0x03 {
            0 => UwbMode::Off,
            1 => UwbMode::Passive,
            2 => UwbMode::Active,
            _ => UwbMode::Reserved,
        }
    }
}

/// Measurement mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasMode {
    /// Two-way ranging.
    Twr,
    /// Reserved value.
    Reserved(u8),
}

impl From<u8> for MeasMode {
    fn from(bits: u8) -> Self {
        match bits & 0x03 {
            0 => MeasMode::Twr,
            other => MeasMode::Reserved(other),
        }
    }
}

/// Node role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeMode {
    /// Tag.
    Tag,
    /// Anchor.
    Anchor,
}

/// Node configuration as reported by the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeConfig {
    /// UWB radio mode.
    pub uwb_mode: UwbMode,
    /// Firmware update over UWB allowed.
    pub fw_update_en: bool,
    /// BLE enabled.
    pub ble_en: bool,
    /// Status LEDs enabled.
    pub led_en: bool,
    /// UWB encryption enabled.
    pub enc_en: bool,
    /// Internal location engine enabled.
    pub loc_engine_en: bool,
    /// Low power mode enabled.
    pub low_power_en: bool,
    /// Measurement mode.
    pub meas_mode: MeasMode,
    /// Accelerometer enabled.
    pub accel_en: bool,
    /// Bridge node.
    pub bridge: bool,
    /// Initiator anchor.
    pub initiator: bool,
    /// Tag or anchor.
    pub mode: NodeMode,
}

impl NodeConfig {
    /// Decode the two configuration bytes.
    pub fn decode(value: &[u8]) -> Result<Self> {
        ensure_len(value, CFG_SIZE)?;
        let (lo, hi) = (value[0], value[1]);
        let bit = |byte: u8, n: u8| byte & (1 << n) != 0;
        Ok(NodeConfig {
            uwb_mode: UwbMode::from(lo),
            fw_update_en: bit(lo, 2),
            ble_en: bit(lo, 3),
            led_en: bit(lo, 4),
            enc_en: bit(lo, 5),
            loc_engine_en: bit(lo, 6),
            low_power_en: bit(lo, 7),
            meas_mode: MeasMode::from(hi),
            accel_en: bit(hi, 2),
            bridge: bit(hi, 3),
            initiator: bit(hi, 4),
            mode: if bit(hi, 5) {
                NodeMode::Anchor
            } else {
                NodeMode::Tag
            },
        })
    }
}

/// Firmware version number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FirmwareVersion {
    /// Major version.
    pub major: u8,
    /// Minor version.
    pub minor: u8,
    /// Patch version.
    pub patch: u8,
    /// Build variant.
    pub variant: u8,
}

impl FirmwareVersion {
    /// Decode the packed little-endian version word.
    pub fn decode(value: &[u8]) -> Result<Self> {
        ensure_len(value, VERSION_SIZE)?;
        let word = u32::from_le_bytes([value[0], value[1], value[2], value[3]]);
        Ok(FirmwareVersion {
            major: (word >> 24) as u8,
            minor: (word >> 16) as u8,
            patch: (word >> 8) as u8,
            variant: (word & 0x0F) as u8,
        })
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.patch, self.variant
        )
    }
}

/// Version information reported by the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionInfo {
    /// Firmware version.
    pub firmware: FirmwareVersion,
    /// Configuration version.
    pub config: u32,
    /// Hardware version.
    pub hardware: u32,
}

/// System status flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemStatus {
    /// Raw flag word.
    pub raw: u16,
}

impl SystemStatus {
    /// Decode the two status bytes.
    pub fn decode(value: &[u8]) -> Result<Self> {
        ensure_len(value, STATUS_SIZE)?;
        Ok(SystemStatus {
            raw: u16::from_le_bytes([value[0], value[1]]),
        })
    }

    fn flag(&self, n: u16) -> bool {
        self.raw & (1 << n) != 0
    }

    /// New location data is available.
    pub fn loc_ready(&self) -> bool {
        self.flag(0)
    }

    /// Node has joined the UWB network.
    pub fn uwbmac_joined(&self) -> bool {
        self.flag(1)
    }

    /// Backhaul data ready.
    pub fn bh_data_ready(&self) -> bool {
        self.flag(2)
    }

    /// Backhaul status changed.
    pub fn bh_status_changed(&self) -> bool {
        self.flag(3)
    }

    /// UWB scan results ready.
    pub fn uwb_scan_ready(&self) -> bool {
        self.flag(5)
    }

    /// User data received over UWB.
    pub fn usr_data_ready(&self) -> bool {
        self.flag(6)
    }

    /// User data sent over UWB.
    pub fn usr_data_sent(&self) -> bool {
        self.flag(7)
    }

    /// Firmware update in progress.
    pub fn fwup_in_progress(&self) -> bool {
        self.flag(8)
    }
}

/// Events that can raise the module's interrupt pin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InterruptConfig {
    /// SPI response ready.
    pub spi_data_ready: bool,
    /// New location available.
    pub loc_ready: bool,
    /// Backhaul status changed.
    pub bh_status_changed: bool,
    /// Backhaul data ready.
    pub bh_data_ready: bool,
    /// Backhaul initialised state changed.
    pub bh_initialized_changed: bool,
    /// UWB scan ready.
    pub uwb_scan_ready: bool,
    /// User data received.
    pub usr_data_ready: bool,
    /// UWB network joined state changed.
    pub uwbmac_joined_changed: bool,
    /// User data sent.
    pub usr_data_sent: bool,
}

impl InterruptConfig {
    /// Only the location-ready (data ready) interrupt enabled.
    pub fn data_ready_only() -> Self {
        InterruptConfig {
            loc_ready: true,
            ..Default::default()
        }
    }

    /// Encode as the two flag bytes of the request payload.
    pub fn encode(&self) -> [u8; INT_CFG_SIZE] {
        let flags = [
            self.spi_data_ready,
            self.loc_ready,
            self.bh_status_changed,
            self.bh_data_ready,
            self.bh_initialized_changed,
            self.uwb_scan_ready,
            self.usr_data_ready,
            self.uwbmac_joined_changed,
        ];
        let lo = flags
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, &on)| acc | (u8::from(on) << i));
        [lo, u8::from(self.usr_data_sent)]
    }
}
