use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use threes_bridge::core::{EncodedState, RawSnapshot, StateBridge};
use threes_bridge::engine::{Orchestrator, OrchestratorConfig};
use threes_bridge::types::Move;

fn snapshot() -> RawSnapshot {
    RawSnapshot {
        board: [[1, 2, 3, 6], [12, 24, 48, 96], [0, 3, 0, 2], [1, 0, 0, 192]],
        deck: Some(vec![1, 2, 2, 3]),
        next_tile: 3,
    }
}

fn bench_resolve_and_encode(c: &mut Criterion) {
    let bridge = StateBridge::new();
    let raw = snapshot();

    c.bench_function("resolve_encode", |b| {
        b.iter(|| {
            let state = bridge.resolve(black_box(&raw)).unwrap();
            state.encode().unwrap()
        })
    });
}

fn bench_bonus_resolution(c: &mut Criterion) {
    let bridge = StateBridge::new();
    let mut raw = snapshot();
    raw.next_tile = 24;

    c.bench_function("resolve_bonus", |b| {
        b.iter(|| bridge.resolve(black_box(&raw)).unwrap())
    });
}

fn bench_select_best_move(c: &mut Criterion) {
    // Cheap stand-in for the search engine: measures fan-out overhead only.
    let oracle = Arc::new(|state: &EncodedState, mv: Move| {
        ((state.board >> (mv.ordinal() * 4)) & 0xf) as f32 + 1.0
    });
    let state = bridge_state();
    let parallel = Orchestrator::new(oracle.clone(), OrchestratorConfig::default()).unwrap();
    let sequential = Orchestrator::sequential(oracle);

    c.bench_function("select_best_move_parallel", |b| {
        b.iter(|| parallel.select_best_move(black_box(&state)))
    });
    c.bench_function("select_best_move_sequential", |b| {
        b.iter(|| sequential.select_best_move(black_box(&state)))
    });
}

fn bridge_state() -> EncodedState {
    StateBridge::new()
        .resolve(&snapshot())
        .and_then(|s| s.encode())
        .unwrap()
}

criterion_group!(
    benches,
    bench_resolve_and_encode,
    bench_bonus_resolution,
    bench_select_best_move
);
criterion_main!(benches);
