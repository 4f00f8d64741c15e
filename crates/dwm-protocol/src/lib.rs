//! DWM1001 UART TLV Protocol
//!
//! This crate provides the message types for talking to a Decawave DWM1001
//! module over its UART API. It does no I/O: it builds request buffers and
//! decodes response buffers. Driving the serial line lives in `dwm-driver`.
//!
//! # Protocol Overview
//!
//! Every message is a sequence of Type-Length-Value envelopes:
//!
//! - **Requests** (host → module): one envelope, `[type][len][payload]`
//! - **Responses** (module → host): a return-value envelope (`0x40`) whose
//!   value is the device status, followed on success by data envelopes
//!
//! # Example
//!
//! ```rust
//! use dwm_protocol::{DecodeResponse, Position, Request};
//!
//! let frame = Request::GetPosition.encode();
//! assert_eq!(frame, vec![0x02, 0x00]);
//!
//! let raw = [
//!     0x40, 0x01, 0x00, 0x41, 0x0D, 0xE8, 0x03, 0x00, 0x00, 0xD0, 0x07, 0x00, 0x00,
//!     0x00, 0x00, 0x00, 0x00, 0x64,
//! ];
//! let pos = Position::decode_response(&raw).unwrap();
//! assert_eq!((pos.x, pos.y, pos.quality), (1000, 2000, 100));
//! ```

mod commands;
mod constants;
mod error;
mod frame;
mod responses;
mod status;
mod types;

pub use commands::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use responses::*;
pub use status::*;
pub use types::*;
