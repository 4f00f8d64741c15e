//! Requests that can be sent to the module.

use crate::constants::*;
use crate::frame::TlvFrame;
use crate::types::InterruptConfig;

/// Requests understood by the DWM1001 UART API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Get the node configuration.
    GetConfig,
    /// Get firmware, configuration and hardware versions.
    GetVersion,
    /// Get system status flags.
    GetStatus,
    /// Get the current position.
    GetPosition,
    /// Get position and ranging distances.
    GetLocation,
    /// Reboot the module. The module does not answer.
    Reset,
    /// Select which events raise the interrupt pin.
    SetInterruptConfig(InterruptConfig),
}

impl Request {
    /// The request's TLV type code.
    pub fn tlv_type(&self) -> u8 {
        match self {
            Request::GetConfig => DWM_CFG_GET,
            Request::GetVersion => DWM_VER_GET,
            Request::GetStatus => DWM_STATUS_GET,
            Request::GetPosition => DWM_POS_GET,
            Request::GetLocation => DWM_LOC_GET,
            Request::Reset => DWM_RESET,
            Request::SetInterruptConfig(_) => DWM_INT_CFG_SET,
        }
    }

    /// Whether the module sends a response to this request.
    pub fn expects_response(&self) -> bool {
        !matches!(self, Request::Reset)
    }

    /// Encode as a ready-to-send TLV buffer.
    pub fn encode(&self) -> Vec<u8> {
        let frame = match self {
            Request::SetInterruptConfig(cfg) => TlvFrame {
                tlv_type: self.tlv_type(),
                value: cfg.encode().to_vec(),
            },
            _ => TlvFrame {
                tlv_type: self.tlv_type(),
                value: Vec::new(),
            },
        };
        frame.encode()
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Request::GetConfig => "dwm_cfg_get",
            Request::GetVersion => "dwm_ver_get",
            Request::GetStatus => "dwm_status_get",
            Request::GetPosition => "dwm_pos_get",
            Request::GetLocation => "dwm_loc_get",
            Request::Reset => "dwm_reset",
            Request::SetInterruptConfig(_) => "dwm_int_cfg_set",
        }
    }
}
