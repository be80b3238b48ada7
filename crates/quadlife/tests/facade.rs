//! The facade's prelude is enough to run and render a session.

use std::time::{Duration, Instant};

use quadlife::prelude::*;
use quadlife_test_utils::BLOCK_RLE;

#[test]
fn prelude_runs_a_session_and_renders_it() {
    let config = SessionConfig {
        initial_pattern: BLOCK_RLE.into(),
        pattern_name: "block.rle".into(),
        ..SessionConfig::default()
    };
    let mut session = Session::<Universe>::new(config).unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while session.status().age < 4 {
        assert!(Instant::now() < deadline);
        if let Poll::Wait(d) = session.pump(Instant::now()).unwrap() {
            std::thread::sleep(d);
        } else {
            session.wait_for_reply(Duration::from_millis(100)).unwrap();
        }
    }
    let mut surface = MemorySurface::new();
    assert!(session.frame(&mut surface));
    let frame = surface.last_frame().unwrap();
    let lit = frame.data.chunks_exact(4).filter(|px| px[0] > 0).count();
    let cell = session.controller().viewport().cell_size() as usize;
    assert_eq!(lit, 4 * cell * cell);
    assert_eq!(session.status().live_cells, 4);
}

#[test]
fn headless_rejects_bad_config() {
    let config = SessionConfig {
        gc_threshold_exponent: 99,
        ..SessionConfig::default()
    };
    let err = quadlife::headless::run::<Universe>(config, 8).unwrap_err();
    assert!(matches!(err, SessionError::Config(ConfigError::GcExponentOutOfRange { .. })));
}
