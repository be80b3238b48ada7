//! End-to-end session runs against the hashlife universe.
//!
//! These drive a real worker thread headlessly: pump, wait for the reply,
//! repeat. Each test bounds its own wall-clock time.

use std::thread;
use std::time::{Duration, Instant};

use quadlife_core::Engine;
use quadlife_hashlife::Universe;
use quadlife_runtime::{
    Catalog, ControlEvent, MemorySurface, Poll, Session, SessionConfig, SessionError,
};
use quadlife_test_utils::{BLINKER_RLE, GLIDER_RLE, HEADERLESS_TEXT, SPACESHIP_RLE};

// ── Helpers ─────────────────────────────────────────────────────

fn session() -> Session<Universe> {
    let mut s = Session::new(SessionConfig::default()).unwrap();
    for _ in 0..12 {
        s.apply(ControlEvent::RaiseFps).unwrap();
    }
    s
}

/// Pump until `done` holds, or panic after five seconds.
fn drive_until(s: &mut Session<Universe>, mut done: impl FnMut(&Session<Universe>) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done(s) {
        assert!(Instant::now() < deadline, "session did not converge");
        match s.pump(Instant::now()).unwrap() {
            Poll::Send(_) => {
                s.wait_for_reply(Duration::from_millis(500)).unwrap();
            }
            Poll::Wait(d) => thread::sleep(d),
            Poll::Idle => {
                s.wait_for_reply(Duration::from_millis(10)).unwrap();
            }
        }
    }
}

// ── Stepping ────────────────────────────────────────────────────

#[test]
fn default_pattern_advances_and_keeps_its_population_per_period() {
    let mut s = session();
    for _ in 0..4 {
        s.apply(ControlEvent::Faster).unwrap();
    }
    assert_eq!(s.status().steps_per_frame, 32);
    drive_until(&mut s, |s| s.status().age >= 256);
    let status = s.status();
    assert_eq!(status.age % 32, 0);
    assert_eq!(status.live_cells, 28);
    assert!(status.worker_nodes > 0);
    let report = s.shutdown();
    assert!(report.worker_joined);
    let metrics = report.worker_metrics.unwrap();
    assert!(metrics.steps_applied >= 8);
    assert_eq!(metrics.load_failures, 0);
}

#[test]
fn paused_session_sends_nothing() {
    let mut s = session();
    s.apply(ControlEvent::TogglePause).unwrap();
    drive_until(&mut s, |s| s.controller().worker_ready());
    for _ in 0..5 {
        assert_eq!(s.pump(Instant::now()).unwrap(), Poll::Idle);
    }
    assert_eq!(s.status().age, 0);
}

// ── Pattern switching ───────────────────────────────────────────

#[test]
fn result_for_replaced_pattern_is_dropped() {
    let mut s = session();
    drive_until(&mut s, |s| s.controller().worker_ready());
    while !matches!(s.pump(Instant::now()).unwrap(), Poll::Send(_)) {
        thread::sleep(Duration::from_millis(1));
    }
    s.apply(ControlEvent::LoadPattern {
        name: "glider.rle".into(),
        text: GLIDER_RLE.into(),
    })
    .unwrap();
    assert_eq!(s.status().live_cells, 5);

    drive_until(&mut s, |s| s.status().age >= 8);
    let status = s.status();
    assert_eq!(status.stale_results, 1);
    assert_eq!(status.live_cells, 5);
}

#[test]
fn unparsable_pattern_keeps_running_session() {
    let mut s = session();
    let before = s.controller().generation();
    let err = s
        .apply(ControlEvent::LoadPattern {
            name: "bad.rle".into(),
            text: HEADERLESS_TEXT.into(),
        })
        .unwrap_err();
    assert!(matches!(err, SessionError::Pattern(_)));
    assert_eq!(s.controller().generation(), before);
    drive_until(&mut s, |s| s.status().age >= 4);
    assert_eq!(s.controller().pattern_name(), "example_spaceship.rle");
}

#[test]
fn catalog_load_switches_pattern() {
    let mut catalog = Catalog::new();
    catalog.insert("blinker.rle", BLINKER_RLE);
    let mut s = session();
    s.load_from(&catalog, "blinker.rle").unwrap();
    assert_eq!(s.controller().pattern_name(), "blinker.rle");
    drive_until(&mut s, |s| s.status().age >= 6);
    assert_eq!(s.status().live_cells, 3);
}

// ── Export and render ───────────────────────────────────────────

#[test]
fn export_reloads_to_the_same_population() {
    let mut s = session();
    drive_until(&mut s, |s| s.status().age >= 16);
    let export = s.export();
    let age = s.status().age;
    assert_eq!(export.file_name, format!("example_spaceship.rle.{age}"));
    let reloaded = <Universe as Engine>::from_text(&export.text).unwrap();
    assert_eq!(reloaded.alive_count(), s.status().live_cells);
    assert_eq!(Engine::age(&reloaded), 0);
}

#[test]
fn frames_follow_results() {
    let mut s = session();
    let mut surface = MemorySurface::new();
    assert!(s.frame(&mut surface));
    assert!(!s.frame(&mut surface));
    drive_until(&mut s, |s| s.status().age >= 2);
    assert!(s.frame(&mut surface));
    let frame = surface.last_frame().unwrap();
    let lit = frame.data.chunks_exact(4).filter(|px| px[0] > 0).count();
    assert!(lit > 0);
    assert_eq!(s.render_loop().drawn(), 2);
}

#[test]
fn spaceship_fixture_is_the_default() {
    assert_eq!(SessionConfig::default().initial_pattern, SPACESHIP_RLE);
}
