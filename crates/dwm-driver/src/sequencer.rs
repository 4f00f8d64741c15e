//! Reset and initialisation sequencing.
//!
//! ```text
//! Unknown --soft reset--> Idle --enable interrupt--> Ready
//! Unknown --hard reset--> [reboot] --soft reset--> Idle --enable interrupt--> Ready
//! ```

use std::time::Duration;

use dwm_protocol::{Request, SOFT_RESET_SEQUENCE};
use tracing::{debug, info};

use crate::error::{DriverError, Result};
use crate::session::DriverSession;
use crate::transport::Transport;

/// Where the module's API state machine is believed to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing is known; responses may be out of sync.
    Unknown,
    /// A soft reset was sent; the module is waiting for a request.
    Idle,
    /// Interrupts are configured.
    Ready,
    /// The session was closed.
    Closed,
}

/// Blocks the calling thread while the module reboots.
pub trait Sleeper {
    /// Sleep for `duration`.
    fn sleep(&mut self, duration: Duration);
}

/// Sleeps with [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<T: Transport, S: Sleeper> DriverSession<T, S> {
    /// Return the module's state machine to idle.
    ///
    /// Writes three `0xFF` bytes and reads nothing. Use it when responses
    /// appear out of order.
    pub fn soft_reset(&mut self) -> Result<()> {
        self.send(&SOFT_RESET_SEQUENCE)?;
        self.state = SessionState::Idle;
        debug!("soft reset sent");
        Ok(())
    }

    /// Reboot the module, wait for it to come back, then initialise it.
    ///
    /// Blocks for the configured reboot delay (2.5 s by default).
    pub fn reset(&mut self) -> Result<()> {
        self.submit(Request::Reset)?;
        self.state = SessionState::Unknown;
        let delay = self.config.reboot_delay();
        info!("module rebooting, waiting {:?}", delay);
        self.sleeper.sleep(delay);
        self.init()
    }

    /// Soft reset, then enable the configured interrupts.
    ///
    /// A failing interrupt configuration is returned as
    /// [`DriverError::Initialization`]; the session stays `Idle`.
    pub fn init(&mut self) -> Result<()> {
        self.soft_reset()?;
        let request = Request::SetInterruptConfig(self.config.interrupts);
        self.execute(&request.encode())
            .map_err(|e| DriverError::Initialization(Box::new(e)))?;
        self.state = SessionState::Ready;
        debug!("module ready");
        Ok(())
    }
}
