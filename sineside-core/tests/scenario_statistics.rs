//! Statistical behaviour of the scenarios over many seeded runs.
//!
//! 1. Bull Market trends upward on average
//! 2. High Volatility per-tick returns are far noisier than Tutorial's
//! 3. Mean reversion keeps a flat-drift market near its base price

use sineside_core::{Asset, MarketSimulator, Scenario, SeedHierarchy};

fn ending_price(scenario: Scenario, seed_index: u64, ticks: usize) -> f64 {
    let seeds = SeedHierarchy::new(2024);
    let mut sim = MarketSimulator::with_scenario(
        vec![Asset::bitcoin()],
        scenario,
        seeds.source_for("statistics", seed_index),
    )
    .unwrap();
    for _ in 0..ticks {
        sim.step();
    }
    sim.current_price("BTC").unwrap()
}

fn return_variance(scenario: Scenario, seed_index: u64, ticks: usize) -> f64 {
    let seeds = SeedHierarchy::new(7);
    let mut sim = MarketSimulator::with_scenario(
        vec![Asset::bitcoin()],
        scenario,
        seeds.source_for("variance", seed_index),
    )
    .unwrap();
    for _ in 0..ticks {
        sim.step();
    }
    let prices = sim.get_history("BTC", usize::MAX);
    let returns: Vec<f64> = prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (returns.len() - 1) as f64
}

#[test]
fn bull_market_trends_upward() {
    let runs = 200;
    let endings: Vec<f64> = (0..runs).map(|i| ending_price(Scenario::BullMarket, i, 500)).collect();

    let mean = endings.iter().sum::<f64>() / runs as f64;
    let above = endings.iter().filter(|&&p| p > 50_000.0).count();

    assert!(mean > 52_500.0, "mean ending price {mean}");
    assert!(above as f64 / runs as f64 > 0.75, "{above}/{runs} runs ended above base");
}

#[test]
fn high_volatility_is_noisier_than_tutorial() {
    for i in 0..5 {
        let tutorial = return_variance(Scenario::Tutorial, i, 2_000);
        let high = return_variance(Scenario::HighVolatility, i, 2_000);
        assert!(high > 4.0 * tutorial, "run {i}: high {high} vs tutorial {tutorial}");
    }
}

#[test]
fn sudden_crash_behaves_like_a_calm_market() {
    let runs = 100;
    let mean = (0..runs)
        .map(|i| ending_price(Scenario::SuddenCrash, i, 300))
        .sum::<f64>()
        / runs as f64;
    assert!((mean - 50_000.0).abs() < 5_000.0, "mean ending price {mean}");
}
