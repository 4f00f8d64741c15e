//! Protocol constants
//!
//! TLV type codes and field sizes used by the DWM1001 UART API.

// ============================================================================
// Request Types (host → module)
// ============================================================================

/// Get the tag/anchor position.
pub const DWM_POS_GET: u8 = 0x02;
/// Get the node configuration.
pub const DWM_CFG_GET: u8 = 0x08;
/// Get the last location (position + ranging distances).
pub const DWM_LOC_GET: u8 = 0x0C;
/// Reboot the module.
pub const DWM_RESET: u8 = 0x14;
/// Get firmware, configuration and hardware versions.
pub const DWM_VER_GET: u8 = 0x15;
/// Get the system status flags.
pub const DWM_STATUS_GET: u8 = 0x32;
/// Configure which events raise the interrupt pin.
pub const DWM_INT_CFG_SET: u8 = 0x34;

// ============================================================================
// Response Types (module → host)
// ============================================================================

/// Return value (device status) envelope. Leads every response.
pub const TLV_TYPE_RET_VAL: u8 = 0x40;
/// Position: x, y, z and quality factor.
pub const TLV_TYPE_POS_XYZ: u8 = 0x41;
/// Node configuration flags.
pub const TLV_TYPE_CFG: u8 = 0x46;
/// Distance list as reported by an anchor.
pub const TLV_TYPE_RNG_AN_DIST: u8 = 0x48;
/// Distance list with anchor positions as reported by a tag.
pub const TLV_TYPE_RNG_AN_POS_DIST: u8 = 0x49;
/// Firmware version.
pub const TLV_TYPE_FW_VER: u8 = 0x50;
/// Configuration version.
pub const TLV_TYPE_CFG_VER: u8 = 0x51;
/// Hardware version.
pub const TLV_TYPE_HW_VER: u8 = 0x52;
/// System status flags.
pub const TLV_TYPE_STATUS: u8 = 0x5A;

// ============================================================================
// Device Status Codes
// ============================================================================

/// Command completed.
pub const RV_OK: u8 = 0;
/// Command type not recognised.
pub const RV_UNKNOWN_COMMAND: u8 = 1;
/// Module internal error.
pub const RV_INTERNAL_ERROR: u8 = 2;
/// Parameter out of range or malformed.
pub const RV_INVALID_PARAMETER: u8 = 3;
/// Module busy, try again later.
pub const RV_TAG_BUSY: u8 = 4;
/// Operation not allowed in the current mode.
pub const RV_OPERATION_NOT_PERMITTED: u8 = 5;

// ============================================================================
// Sizes
// ============================================================================

/// Size of the type and length header of one TLV envelope.
pub const TLV_HEADER_SIZE: usize = 2;
/// Maximum value length, bounded by the single length byte.
pub const TLV_MAX_VALUE_SIZE: usize = u8::MAX as usize;
/// Encoded position: three i32 coordinates and a quality byte.
pub const POSITION_SIZE: usize = 13;
/// Encoded node configuration.
pub const CFG_SIZE: usize = 2;
/// Encoded version word.
pub const VERSION_SIZE: usize = 4;
/// Encoded status flags.
pub const STATUS_SIZE: usize = 2;
/// Encoded interrupt configuration.
pub const INT_CFG_SIZE: usize = 2;
/// One tag-side distance entry: address, distance, quality, position.
pub const TAG_DIST_ENTRY_SIZE: usize = 2 + 4 + 1 + POSITION_SIZE;
/// One anchor-side distance entry: address, distance, quality.
pub const ANCHOR_DIST_ENTRY_SIZE: usize = 8 + 4 + 1;

/// Bytes written to force the module's API state machine back to idle.
pub const SOFT_RESET_SEQUENCE: [u8; 3] = [0xFF, 0xFF, 0xFF];
