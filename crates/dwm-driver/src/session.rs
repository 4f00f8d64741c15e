//! Driver session and transaction engine.
//!
//! A [`DriverSession`] owns one transport for its lifetime. Each request is
//! written, then its response is read in full before the call returns; the
//! protocol has no request IDs, so responses match requests by order alone.
//! Sharing a session between threads requires an external mutex.

use std::time::Instant;

use dwm_protocol::{
    DecodeResponse, Location, NodeConfig, Position, Request, SystemStatus, VersionInfo,
};
use tracing::{debug, trace};

use crate::config::DriverConfig;
use crate::error::{DriverError, Result, TransportError};
use crate::reader::FrameReader;
use crate::sequencer::{SessionState, Sleeper, ThreadSleeper};
use crate::transport::{SerialTransport, Transport};

/// One connection to a DWM1001 module.
pub struct DriverSession<T: Transport, S: Sleeper = ThreadSleeper> {
    pub(crate) transport: T,
    pub(crate) sleeper: S,
    pub(crate) state: SessionState,
    pub(crate) config: DriverConfig,
    last_activity: Instant,
}

impl DriverSession<SerialTransport> {
    /// Open the serial port named in `config`. The module is not touched.
    pub fn open(config: &DriverConfig) -> Result<Self> {
        config.validate()?;
        if config.port.is_empty() {
            return Err(DriverError::Config("serial port not set".to_string()));
        }
        let transport =
            SerialTransport::open(&config.port, config.baud_rate, config.read_timeout())?;
        Ok(DriverSession::new(transport, config.clone()))
    }

    /// Open the serial port and run post-reset initialisation.
    pub fn open_and_init(config: &DriverConfig) -> Result<Self> {
        let mut session = Self::open(config)?;
        session.init()?;
        Ok(session)
    }
}

impl<T: Transport> DriverSession<T> {
    /// Wrap an already-open transport.
    pub fn new(transport: T, config: DriverConfig) -> Self {
        DriverSession::with_sleeper(transport, ThreadSleeper, config)
    }
}

impl<T: Transport, S: Sleeper> DriverSession<T, S> {
    /// Wrap a transport, waiting on reboots through `sleeper`.
    pub fn with_sleeper(transport: T, sleeper: S, config: DriverConfig) -> Self {
        DriverSession {
            transport,
            sleeper,
            state: SessionState::Unknown,
            config,
            last_activity: Instant::now(),
        }
    }

    /// Current sequencer state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// When the last exchange with the module completed.
    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    /// Configured retry limit.
    ///
    /// Advisory only: no session operation retries. See
    /// [`with_retries`](crate::with_retries) for an explicit wrapper.
    pub fn max_retry_count(&self) -> u32 {
        self.config.max_retry_count
    }

    /// Session configuration.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The sleeper used for reboot waits.
    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.state == SessionState::Closed || !self.transport.is_open() {
            return Err(TransportError::Closed.into());
        }
        Ok(())
    }

    /// Write raw bytes with no response expected.
    pub(crate) fn send(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_open()?;
        trace!("tx {}", hex::encode(data));
        self.transport.write_all(data)?;
        self.last_activity = Instant::now();
        Ok(())
    }

    /// Write an encoded request and read its response.
    ///
    /// Returns the raw response bytes, status envelope included. A non-zero
    /// status fails without reading further. Nothing is retried.
    pub fn execute(&mut self, request: &[u8]) -> Result<Vec<u8>> {
        self.send(request)?;
        let raw = FrameReader::new(&mut self.transport)
            .with_max_trailing_bytes(self.config.max_trailing_bytes)
            .read_response();
        self.last_activity = Instant::now();
        raw
    }

    /// Send a catalog request, reading a response only if the module sends
    /// one. Returns `None` for fire-and-forget requests such as reset.
    pub fn submit(&mut self, request: Request) -> Result<Option<Vec<u8>>> {
        debug!("{}", request.name());
        if request.expects_response() {
            self.execute(&request.encode()).map(Some)
        } else {
            self.send(&request.encode())?;
            Ok(None)
        }
    }

    /// Execute a catalog request and decode its response.
    pub fn query<R: DecodeResponse>(&mut self, request: Request) -> Result<R> {
        debug!("{}", request.name());
        let raw = self.execute(&request.encode())?;
        Ok(R::decode_response(&raw)?)
    }

    /// Read the node configuration.
    pub fn get_cfg(&mut self) -> Result<NodeConfig> {
        self.query(Request::GetConfig)
    }

    /// Read firmware, configuration and hardware versions.
    pub fn get_ver(&mut self) -> Result<VersionInfo> {
        self.query(Request::GetVersion)
    }

    /// Read the system status flags.
    pub fn get_status(&mut self) -> Result<SystemStatus> {
        self.query(Request::GetStatus)
    }

    /// Read the current position.
    pub fn get_pos(&mut self) -> Result<Position> {
        self.query(Request::GetPosition)
    }

    /// Read the position and ranging distances.
    pub fn get_loc(&mut self) -> Result<Location> {
        self.query(Request::GetLocation)
    }

    /// Release the transport. Later operations fail with a transport error.
    ///
    /// Not supported while another call on this session is in progress.
    pub fn close(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.state = SessionState::Closed;
        self.transport.close()?;
        debug!("session closed");
        Ok(())
    }
}

impl<T: Transport, S: Sleeper> Drop for DriverSession<T, S> {
    fn drop(&mut self) {
        if self.state != SessionState::Closed {
            let _ = self.transport.close();
        }
    }
}
