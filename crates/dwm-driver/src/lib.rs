//! DWM1001 UART Driver
//!
//! Drives a Decawave DWM1001 module over a serial line using the TLV
//! protocol from `dwm-protocol`. Everything is synchronous: each call writes
//! one request and blocks until its response is read or a read times out.
//!
//! # Example
//!
//! ```rust,ignore
//! use dwm_driver::{DriverConfig, DriverSession};
//!
//! let config = DriverConfig::for_port("/dev/ttyACM0");
//! let mut session = DriverSession::open_and_init(&config)?;
//! let pos = session.get_pos()?;
//! println!("{}", pos);
//! session.close()?;
//! ```

pub mod config;
pub mod error;
pub mod reader;
pub mod retry;
pub mod sequencer;
pub mod session;
pub mod transport;

pub use config::DriverConfig;
pub use error::{DriverError, Result, TransportError};
pub use reader::FrameReader;
pub use retry::{is_retryable, with_retries};
pub use sequencer::{SessionState, Sleeper, ThreadSleeper};
pub use session::DriverSession;
pub use transport::{MockTransport, SerialTransport, Transport};
