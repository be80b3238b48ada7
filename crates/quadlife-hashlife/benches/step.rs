//! Criterion micro-benchmarks for stepping, pruning and snapshots.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quadlife_core::Engine;
use quadlife_hashlife::Universe;
use quadlife_test_utils::SPACESHIP_RLE;

fn loaded(generations: u64) -> Universe {
    let mut u = <Universe as Engine>::from_text(SPACESHIP_RLE).unwrap();
    u.step(generations);
    u
}

/// Benchmark: advance the default pattern 2^16 generations from load.
fn bench_step_pow2(c: &mut Criterion) {
    c.bench_function("step_spaceship_65536", |b| {
        b.iter(|| {
            let mut u = loaded(0);
            u.step(black_box(1 << 16));
            black_box(u.population())
        });
    });
}

/// Benchmark: prune a store after 4096 generations.
fn bench_prune(c: &mut Criterion) {
    let u = loaded(4096);
    c.bench_function("prune_after_4096", |b| {
        b.iter(|| black_box(u.pruned().node_count()));
    });
}

/// Benchmark: snapshot encode plus decode.
fn bench_snapshot(c: &mut Criterion) {
    let u = loaded(4096).pruned();
    c.bench_function("snapshot_round_trip", |b| {
        b.iter(|| {
            let bytes = u.serialize();
            black_box(<Universe as Engine>::deserialize(&bytes).map(|u| u.node_count()))
        });
    });
}

criterion_group!(benches, bench_step_pow2, bench_prune, bench_snapshot);
criterion_main!(benches);
