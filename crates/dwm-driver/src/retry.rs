//! Opt-in retries around session operations.
//!
//! Sessions never retry on their own. Callers that want to ride out a busy
//! module or a garbled response wrap the call here.

use dwm_protocol::DeviceStatus;
use tracing::warn;

use crate::error::{DriverError, Result};
use crate::sequencer::Sleeper;
use crate::session::DriverSession;
use crate::transport::Transport;

/// Whether an error is worth another attempt after a soft reset.
pub fn is_retryable(err: &DriverError) -> bool {
    err.is_framing() || matches!(err, DriverError::Device(DeviceStatus::TagBusy))
}

/// Run `op`, retrying up to the session's `max_retry_count` times.
///
/// Only framing errors and `TAG BUSY` are retried, each after a soft reset.
/// Any other error, or the last failure, is returned as is.
pub fn with_retries<T, S, R, F>(session: &mut DriverSession<T, S>, mut op: F) -> Result<R>
where
    T: Transport,
    S: Sleeper,
    F: FnMut(&mut DriverSession<T, S>) -> Result<R>,
{
    let retries = session.max_retry_count();
    let mut attempt = 0;
    loop {
        match op(session) {
            Ok(value) => return Ok(value),
            Err(e) if attempt < retries && is_retryable(&e) => {
                attempt += 1;
                warn!("attempt {} failed: {}; soft reset and retry", attempt, e);
                session.soft_reset()?;
            }
            Err(e) => return Err(e),
        }
    }
}
