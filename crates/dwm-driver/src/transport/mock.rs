//! Scripted in-memory transport for testing.

use std::collections::VecDeque;
use std::sync::Arc;

use dwm_protocol::{TlvFrame, TLV_MAX_VALUE_SIZE, TLV_TYPE_RET_VAL};
use parking_lot::Mutex;

use super::Transport;
use crate::error::TransportError;

#[derive(Debug, Default)]
struct MockState {
    /// Scripted read results. An empty chunk yields one `Ok(0)` read.
    reads: VecDeque<Vec<u8>>,
    writes: Vec<Vec<u8>>,
    read_calls: usize,
    closed: bool,
}

/// In-memory transport that replays scripted reads and records writes.
///
/// Clones share state, so a test can keep a handle after moving one clone
/// into a session. Once the script runs out every read returns `Ok(0)`, the
/// same as a serial line that has gone quiet.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for later reads. A read returns at most one chunk.
    pub fn push_read(&self, data: &[u8]) {
        self.state.lock().reads.push_back(data.to_vec());
    }

    /// Queue a read that times out with nothing available.
    pub fn push_gap(&self) {
        self.state.lock().reads.push_back(Vec::new());
    }

    /// Queue a complete response: status envelope, then data records, then
    /// a read gap.
    ///
    /// # Panics
    ///
    /// If a record value is longer than a TLV length byte can describe.
    pub fn push_response(&self, status: u8, records: &[(u8, &[u8])]) {
        let mut state = self.state.lock();
        state.reads.push_back(vec![TLV_TYPE_RET_VAL, 0x01, status]);
        for (tlv_type, value) in records {
            assert!(
                value.len() <= TLV_MAX_VALUE_SIZE,
                "record 0x{:02X} value is {} bytes, max {}",
                tlv_type,
                value.len(),
                TLV_MAX_VALUE_SIZE
            );
            let frame = TlvFrame {
                tlv_type: *tlv_type,
                value: value.to_vec(),
            };
            state.reads.push_back(frame.encode());
        }
        state.reads.push_back(Vec::new());
    }

    /// Every write, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().writes.clone()
    }

    /// All written bytes concatenated.
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().writes.concat()
    }

    /// Number of read calls made so far.
    pub fn read_calls(&self) -> usize {
        self.state.lock().read_calls
    }

    /// Scripted bytes not yet consumed.
    pub fn pending_bytes(&self) -> usize {
        self.state.lock().reads.iter().map(Vec::len).sum()
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl Transport for MockTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        state.writes.push(data.to_vec());
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        state.read_calls += 1;
        let Some(chunk) = state.reads.front_mut() else {
            return Ok(0);
        };
        if chunk.is_empty() {
            state.reads.pop_front();
            return Ok(0);
        }
        let n = buf.len().min(chunk.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        chunk.drain(..n);
        if chunk.is_empty() {
            state.reads.pop_front();
        }
        Ok(n)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.state.lock().closed = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.state.lock().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_split_chunks() {
        let mut mock = MockTransport::new();
        mock.push_read(&[1, 2, 3]);
        let mut buf = [0u8; 2];
        assert_eq!(mock.read(&mut buf).unwrap(), 2);
        assert_eq!(buf, [1, 2]);
        assert_eq!(mock.read(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], 3);
        assert_eq!(mock.read(&mut buf).unwrap(), 0);
        assert_eq!(mock.read_calls(), 3);
    }

    #[test]
    fn test_gap_is_one_empty_read() {
        let mut mock = MockTransport::new();
        mock.push_gap();
        mock.push_read(&[9]);
        let mut buf = [0u8; 4];
        assert_eq!(mock.read(&mut buf).unwrap(), 0);
        assert_eq!(mock.read(&mut buf).unwrap(), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let handle = MockTransport::new();
        let mut moved = handle.clone();
        moved.write_all(&[0xFF, 0xFF]).unwrap();
        assert_eq!(handle.written(), vec![0xFF, 0xFF]);
        moved.close().unwrap();
        assert!(handle.is_closed());
        assert!(matches!(moved.write(&[1]), Err(TransportError::Closed)));
        assert!(matches!(moved.read(&mut [0u8; 1]), Err(TransportError::Closed)));
    }

    #[test]
    fn test_push_response_layout() {
        let mut mock = MockTransport::new();
        mock.push_response(0, &[(0x41, &[0xAA, 0xBB][..])]);
        let mut buf = [0u8; 8];
        assert_eq!(mock.read(&mut buf).unwrap(), 3);
        assert_eq!(buf[..3], [0x40, 0x01, 0x00]);
        assert_eq!(mock.read(&mut buf).unwrap(), 4);
        assert_eq!(buf[..4], [0x41, 0x02, 0xAA, 0xBB]);
        assert_eq!(mock.read(&mut buf).unwrap(), 0);
    }

    #[test]
    #[should_panic(expected = "max 255")]
    fn test_push_response_rejects_oversized_value() {
        let mock = MockTransport::new();
        mock.push_response(0, &[(0x41, &[0u8; 256][..])]);
    }
}
