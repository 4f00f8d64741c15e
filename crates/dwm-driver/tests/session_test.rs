//! Integration tests driving a session through the scripted transport.

use std::time::Duration;

use dwm_driver::{
    with_retries, DriverConfig, DriverError, DriverSession, MockTransport, SessionState, Sleeper,
    TransportError,
};
use dwm_protocol::{
    DeviceStatus, InterruptConfig, NodeMode, Position, Request, SOFT_RESET_SEQUENCE,
    TLV_TYPE_CFG, TLV_TYPE_CFG_VER, TLV_TYPE_FW_VER, TLV_TYPE_HW_VER, TLV_TYPE_POS_XYZ,
    TLV_TYPE_RNG_AN_POS_DIST, TLV_TYPE_STATUS,
};

/// Records what had been written when each sleep started.
struct JournalSleeper {
    transport: MockTransport,
    journal: Vec<(Duration, Vec<Vec<u8>>)>,
}

impl Sleeper for JournalSleeper {
    fn sleep(&mut self, duration: Duration) {
        self.journal.push((duration, self.transport.writes()));
    }
}

fn session() -> (DriverSession<MockTransport>, MockTransport) {
    let mock = MockTransport::new();
    (
        DriverSession::new(mock.clone(), DriverConfig::for_port("mock")),
        mock,
    )
}

fn position_bytes(x: i32, y: i32, z: i32, q: u8) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&x.to_le_bytes());
    v.extend_from_slice(&y.to_le_bytes());
    v.extend_from_slice(&z.to_le_bytes());
    v.push(q);
    v
}

// ============================================================================
// Transactions
// ============================================================================

#[test]
fn test_execute_concatenates_envelopes() {
    let (mut session, mock) = session();
    mock.push_read(&[0x40, 0x01, 0x00]);
    mock.push_read(&[0x41, 0x02, 0xAB, 0xCD]);
    mock.push_gap();

    let raw = session
        .execute(&Request::GetPosition.encode())
        .expect("execute");
    assert_eq!(raw, vec![0x40, 0x01, 0x00, 0x41, 0x02, 0xAB, 0xCD]);
}

#[test]
fn test_device_error_skips_second_envelope() {
    let (mut session, mock) = session();
    mock.push_read(&[0x40, 0x01, 0x03]);
    mock.push_read(&[0x41, 0x02, 0xAB, 0xCD]);

    let err = session.get_pos().unwrap_err();
    assert!(matches!(err, DriverError::Device(DeviceStatus::InvalidParameter)));
    assert_eq!(err.device_status().map(DeviceStatus::name), Some("INVALID PARAMETER"));
    assert_eq!(mock.read_calls(), 2);
    assert_eq!(mock.pending_bytes(), 4);
}

#[test]
fn test_every_known_status_is_named() {
    for code in 1u8..=5 {
        let (mut session, mock) = session();
        mock.push_read(&[0x40, 0x01, code]);
        match session.get_status() {
            Err(DriverError::Device(status)) => assert_eq!(status.code(), code),
            other => panic!("code {}: unexpected {:?}", code, other),
        }
    }
}

#[test]
fn test_unrecognized_status_fails_explicitly() {
    let (mut session, mock) = session();
    mock.push_read(&[0x40, 0x01, 0x09]);
    assert!(matches!(
        session.get_cfg(),
        Err(DriverError::UnrecognizedStatus(9))
    ));
}

#[test]
fn test_truncated_response_is_framing_error() {
    let (mut session, mock) = session();
    mock.push_read(&[0x40, 0x01, 0x00, 0x41, 0x0D, 0x01, 0x02]);
    let err = session.get_pos().unwrap_err();
    assert!(err.is_framing());
    assert!(matches!(
        err,
        DriverError::IncompleteFrame { expected: 13, actual: 2 }
    ));
}

#[test]
fn test_version_response_with_trailing_records() {
    let (mut session, mock) = session();
    let fw: u32 = (1 << 24) | (2 << 16) | (5 << 8) | 3;
    mock.push_response(
        0,
        &[
            (TLV_TYPE_FW_VER, &fw.to_le_bytes()[..]),
            (TLV_TYPE_CFG_VER, &0x0006_0200u32.to_le_bytes()[..]),
            (TLV_TYPE_HW_VER, &0x2A00_CAFEu32.to_le_bytes()[..]),
        ],
    );

    let ver = session.get_ver().expect("version");
    assert_eq!(ver.firmware.to_string(), "1.2.5.3");
    assert_eq!(ver.config, 0x0006_0200);
    assert_eq!(ver.hardware, 0x2A00_CAFE);
}

#[test]
fn test_location_with_tag_distances() {
    let (mut session, mock) = session();
    let mut list = vec![1u8];
    list.extend_from_slice(&0x1234u16.to_le_bytes());
    list.extend_from_slice(&2500u32.to_le_bytes());
    list.push(100);
    list.extend_from_slice(&position_bytes(0, 5000, 2000, 100));
    mock.push_response(
        0,
        &[
            (TLV_TYPE_POS_XYZ, &position_bytes(1200, 3400, 0, 60)[..]),
            (TLV_TYPE_RNG_AN_POS_DIST, &list[..]),
        ],
    );

    let loc = session.get_loc().expect("location");
    assert_eq!(loc.position, Position { x: 1200, y: 3400, z: 0, quality: 60 });
    assert_eq!(loc.distances.len(), 1);
    assert_eq!(loc.distances[0].address, 0x1234);
    assert_eq!(loc.distances[0].distance, 2500);
    assert_eq!(mock.written(), Request::GetLocation.encode());
}

#[test]
fn test_back_to_back_transactions_stay_in_sync() {
    let (mut session, mock) = session();
    mock.push_response(0, &[(TLV_TYPE_STATUS, &[0x02, 0x00][..])]);
    mock.push_response(0, &[(TLV_TYPE_CFG, &[0x02, 0x20][..])]);

    let status = session.get_status().expect("status");
    assert!(status.uwbmac_joined());
    let cfg = session.get_cfg().expect("config");
    assert_eq!(cfg.mode, NodeMode::Anchor);
    assert_eq!(mock.pending_bytes(), 0);
}

#[test]
fn test_overrun_leaves_line_clean_for_next_request() {
    let mock = MockTransport::new();
    let config = DriverConfig {
        max_trailing_bytes: 4,
        ..DriverConfig::for_port("mock")
    };
    let mut session = DriverSession::new(mock.clone(), config);
    mock.push_read(&[0x40, 0x01, 0x00, 0x41, 0x00]);
    mock.push_read(&[0xEE; 8]);
    mock.push_gap();
    mock.push_response(0, &[(TLV_TYPE_STATUS, &[0x01, 0x00][..])]);

    assert!(matches!(
        session.execute(&Request::GetPosition.encode()),
        Err(DriverError::FrameOverrun { limit: 4 })
    ));
    let status = session.get_status().expect("status after overrun");
    assert!(status.loc_ready());
    assert_eq!(mock.pending_bytes(), 0);
}

// ============================================================================
// Reset sequencing
// ============================================================================

#[test]
fn test_soft_reset_only_writes() {
    let (mut session, mock) = session();
    session.soft_reset().expect("soft reset");
    assert_eq!(mock.written(), SOFT_RESET_SEQUENCE.to_vec());
    assert_eq!(mock.read_calls(), 0);
}

#[test]
fn test_reset_waits_before_reinitialising() {
    let mock = MockTransport::new();
    let sleeper = JournalSleeper {
        transport: mock.clone(),
        journal: Vec::new(),
    };
    let mut session =
        DriverSession::with_sleeper(mock.clone(), sleeper, DriverConfig::for_port("mock"));
    mock.push_response(0, &[]);

    session.reset().expect("reset");

    let journal = &session.sleeper().journal;
    assert_eq!(journal.len(), 1);
    let (slept, written_before) = &journal[0];
    assert_eq!(*slept, Duration::from_millis(2500));
    assert_eq!(written_before, &vec![Request::Reset.encode()]);

    let int_cfg = Request::SetInterruptConfig(InterruptConfig::data_ready_only()).encode();
    assert_eq!(
        mock.writes(),
        vec![Request::Reset.encode(), SOFT_RESET_SEQUENCE.to_vec(), int_cfg]
    );
    assert_eq!(session.state(), SessionState::Ready);
}

#[test]
fn test_reset_with_failing_interrupt_config() {
    let mock = MockTransport::new();
    let sleeper = JournalSleeper {
        transport: mock.clone(),
        journal: Vec::new(),
    };
    let mut session =
        DriverSession::with_sleeper(mock.clone(), sleeper, DriverConfig::for_port("mock"));
    mock.push_read(&[0x40, 0x01, 0x04]);

    let err = session.reset().unwrap_err();
    assert!(matches!(err, DriverError::Initialization(_)));
    assert_eq!(err.device_status(), Some(DeviceStatus::TagBusy));
    assert_ne!(session.state(), SessionState::Ready);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_everything_fails_after_close() {
    let (mut session, mock) = session();
    session.close().expect("close");
    assert!(mock.is_closed());

    let closed = |r: Result<(), DriverError>| {
        matches!(r, Err(DriverError::Transport(TransportError::Closed)))
    };
    assert!(closed(session.get_cfg().map(|_| ())));
    assert!(closed(session.get_ver().map(|_| ())));
    assert!(closed(session.get_status().map(|_| ())));
    assert!(closed(session.get_pos().map(|_| ())));
    assert!(closed(session.get_loc().map(|_| ())));
    assert!(closed(session.soft_reset()));
    assert!(closed(session.reset()));
    assert!(mock.writes().is_empty());
}

#[test]
fn test_independent_sessions() {
    let (mut a, mock_a) = session();
    let (mut b, mock_b) = session();
    mock_a.push_response(0, &[(TLV_TYPE_STATUS, &[0x01, 0x00][..])]);
    mock_b.push_read(&[0x40, 0x01, 0x02]);

    assert!(a.get_status().expect("a").loc_ready());
    assert!(matches!(
        b.get_status(),
        Err(DriverError::Device(DeviceStatus::InternalError))
    ));
    a.close().expect("close a");
    assert!(!mock_b.is_closed());
}

#[test]
fn test_retry_wrapper_recovers_from_garbled_response() {
    let (mut session, mock) = session();
    // Half a status envelope, then silence.
    mock.push_read(&[0x40]);
    mock.push_gap();
    mock.push_response(0, &[(TLV_TYPE_POS_XYZ, &position_bytes(1, 2, 3, 4)[..])]);

    let pos = with_retries(&mut session, |s| s.get_pos()).expect("position");
    assert_eq!(pos, Position { x: 1, y: 2, z: 3, quality: 4 });
}
