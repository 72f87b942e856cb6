//! Criterion benchmarks for simulator hot paths.
//!
//! Benchmarks:
//! 1. `step()` across asset counts
//! 2. Chart-window queries on a long history
//! 3. A full two-minute trading session

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use sineside_core::{
    Asset, MarketSimulator, Scenario, SeededRandom, SessionId, SessionSettings, TradingSession,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_assets(n: usize) -> Vec<Asset> {
    (0..n)
        .map(|i| Asset::new(format!("A{i}"), format!("Asset {i}"), 100.0 + i as f64, 0.02))
        .collect()
}

// ── 1. Step ──────────────────────────────────────────────────────────

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");
    for n in [1usize, 10, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut sim = MarketSimulator::with_scenario(
                make_assets(n),
                Scenario::HighVolatility,
                SeededRandom::new(42),
            )
            .unwrap();
            b.iter(|| black_box(sim.step()));
        });
    }
    group.finish();
}

// ── 2. History queries ───────────────────────────────────────────────

fn bench_history(c: &mut Criterion) {
    let mut sim = MarketSimulator::with_scenario(
        vec![Asset::bitcoin()],
        Scenario::Tutorial,
        SeededRandom::new(1),
    )
    .unwrap();
    for _ in 0..100_000 {
        sim.step();
    }
    c.bench_function("get_history_100_of_100k", |b| {
        b.iter(|| black_box(sim.get_history(black_box("BTC"), 100)))
    });
}

// ── 3. Session ───────────────────────────────────────────────────────

fn bench_session(c: &mut Criterion) {
    c.bench_function("session_120_ticks", |b| {
        b.iter(|| {
            let sim = MarketSimulator::with_scenario(
                vec![Asset::bitcoin()],
                Scenario::BullMarket,
                SeededRandom::new(7),
            )
            .unwrap();
            let mut session =
                TradingSession::new(SessionId(1), sim, SessionSettings::default()).unwrap();
            session.buy(5_000.0).unwrap();
            while !session.is_finished() {
                session.tick().unwrap();
                black_box(session.chart());
            }
            black_box(session.end())
        })
    });
}

criterion_group!(benches, bench_step, bench_history, bench_session);
criterion_main!(benches);
