//! Engine handle contract checks for the hashlife universe.

use quadlife_core::{Engine, EngineError, PatternError, Point, RenderWindow};
use quadlife_hashlife::Universe;
use quadlife_test_utils::{BLINKER_RLE, BLOCK_RLE, GLIDER_RLE, HEADERLESS_TEXT, SPACESHIP_RLE};

// ── Helpers ─────────────────────────────────────────────────────

fn load(text: &str) -> Universe {
    <Universe as Engine>::from_text(text).unwrap()
}

fn window(width: u32, height: u32) -> RenderWindow {
    RenderWindow {
        x0: -8,
        y0: -8,
        width,
        height,
        cell_size: 1,
        zoom_level: 0,
        brightness: 1.0,
    }
}

// ── Loading ─────────────────────────────────────────────────────

#[test]
fn default_pattern_loads() {
    let u = load(SPACESHIP_RLE);
    assert_eq!(u.alive_count(), 28);
    assert_eq!(Engine::age(&u), 0);
    assert!(Engine::node_count(&u) > 2);
}

#[test]
fn headerless_text_is_a_pattern_error() {
    let err = <Universe as Engine>::from_text(HEADERLESS_TEXT).unwrap_err();
    assert!(matches!(err, PatternError::MalformedHeader { .. }));
}

#[test]
fn empty_handle_has_no_cells() {
    let u = <Universe as Engine>::empty();
    assert_eq!(u.alive_count(), 0);
    assert_eq!(Engine::age(&u), 0);
}

// ── Stepping ────────────────────────────────────────────────────

#[test]
fn blinker_has_period_two() {
    let mut u = load(BLINKER_RLE);
    let start = u.live_cells();
    Engine::step(&mut u, 1);
    assert_ne!(u.live_cells(), start);
    Engine::step(&mut u, 1);
    assert_eq!(u.live_cells(), start);
}

#[test]
fn block_survives_a_million_generations() {
    let mut u = load(BLOCK_RLE);
    Engine::step(&mut u, 1 << 20);
    assert_eq!(u.alive_count(), 4);
    assert_eq!(Engine::age(&u), 1 << 20);
}

#[test]
fn glider_travels_one_cell_per_four_generations() {
    let mut u = load(GLIDER_RLE);
    let start = u.live_cells();
    Engine::step(&mut u, 1024);
    let moved: Vec<Point> = start
        .iter()
        .map(|p| Point::new(p.x + 256, p.y + 256))
        .collect();
    assert_eq!(u.live_cells(), moved);
}

#[test]
fn spaceship_keeps_population_every_period() {
    let mut u = load(SPACESHIP_RLE);
    for _ in 0..16 {
        Engine::step(&mut u, 4);
        assert_eq!(u.alive_count(), 28);
    }
}

// ── Prune and snapshot ──────────────────────────────────────────

#[test]
fn prune_preserves_state_and_leaves_source_usable() {
    let mut u = load(SPACESHIP_RLE);
    Engine::step(&mut u, 500);
    let pruned = Engine::prune(&u);
    assert_eq!(pruned.alive_count(), u.alive_count());
    assert_eq!(Engine::age(&pruned), Engine::age(&u));
    assert!(Engine::node_count(&pruned) <= Engine::node_count(&u));
    Engine::step(&mut u, 1);
    assert_eq!(Engine::age(&u), 501);
}

#[test]
fn snapshot_round_trip_reproduces_future() {
    let mut a = load(SPACESHIP_RLE);
    Engine::step(&mut a, 37);
    let mut b = <Universe as Engine>::deserialize(&a.serialize()).unwrap();
    assert_eq!(Engine::node_count(&b), Engine::node_count(&a));
    Engine::step(&mut a, 100);
    Engine::step(&mut b, 100);
    assert_eq!(a.live_cells(), b.live_cells());
}

#[test]
fn garbage_snapshot_is_rejected() {
    let err = <Universe as Engine>::deserialize(b"not a snapshot").unwrap_err();
    assert_eq!(err, EngineError::InvalidMagic);
}

// ── Text and rendering ──────────────────────────────────────────

#[test]
fn exported_text_reloads_to_same_cells() {
    let mut u = load(SPACESHIP_RLE);
    Engine::step(&mut u, 13);
    let reloaded = load(&u.to_text());
    let base = u.live_cells()[0];
    let shifted: Vec<Point> = u.live_cells().iter().map(|&p| p - base).collect();
    let reloaded_base = reloaded.live_cells()[0];
    let reloaded_shifted: Vec<Point> = reloaded
        .live_cells()
        .iter()
        .map(|&p| p - reloaded_base)
        .collect();
    assert_eq!(shifted, reloaded_shifted);
}

#[test]
fn render_lights_exactly_the_live_cells() {
    let u = load(SPACESHIP_RLE);
    let buf = u.render_window(&window(32, 32));
    let lit = buf.data.chunks_exact(4).filter(|px| px[0] == 255).count();
    assert_eq!(lit, 28);
}
