//! Property tests for simulator invariants.
//!
//! Uses proptest to verify:
//! 1. Positivity: every recorded price is at least the floor
//! 2. Lock-step growth: history length is n + 1 for every asset
//! 3. Tail queries: bounded length, last entry equals the current price
//! 4. Determinism: same seed, bit-identical paths

use proptest::prelude::*;
use sineside_core::simulator::PRICE_FLOOR;
use sineside_core::{Asset, MarketSimulator, Scenario, SeededRandom};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_scenario() -> impl Strategy<Value = Scenario> {
    prop::sample::select(Scenario::ALL.to_vec())
}

fn arb_asset(symbol: &'static str) -> impl Strategy<Value = Asset> {
    (0.5..100_000.0_f64, 0.0..5.0_f64)
        .prop_map(move |(base, vol)| Asset::new(symbol, symbol, base, vol))
}

fn arb_assets() -> impl Strategy<Value = Vec<Asset>> {
    (arb_asset("BTC"), arb_asset("ETH"), arb_asset("SOL"), 1..=3_usize)
        .prop_map(|(a, b, c, n)| vec![a, b, c].into_iter().take(n).collect())
}

fn build(assets: Vec<Asset>, scenario: Scenario, seed: u64) -> MarketSimulator {
    MarketSimulator::with_scenario(assets, scenario, SeededRandom::new(seed))
        .expect("generated assets are valid")
}

// ── 1. Positivity ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn prices_never_fall_below_floor(
        assets in arb_assets(),
        scenario in arb_scenario(),
        seed in any::<u64>(),
        steps in 0..400_usize,
    ) {
        let symbols: Vec<String> = assets.iter().map(|a| a.symbol.clone()).collect();
        let mut sim = build(assets, scenario, seed);
        for _ in 0..steps {
            let tick = sim.step();
            for price in tick.prices.values() {
                prop_assert!(*price >= PRICE_FLOOR);
                prop_assert!(price.is_finite());
            }
        }
        for symbol in &symbols {
            for price in sim.get_history(symbol, usize::MAX) {
                prop_assert!(price >= PRICE_FLOOR);
            }
        }
    }
}

// ── 2. Lock-step growth ──────────────────────────────────────────────

proptest! {
    #[test]
    fn history_length_is_steps_plus_one(
        assets in arb_assets(),
        scenario in arb_scenario(),
        seed in any::<u64>(),
        steps in 0..200_usize,
    ) {
        let symbols: Vec<String> = assets.iter().map(|a| a.symbol.clone()).collect();
        let mut sim = build(assets, scenario, seed);
        for _ in 0..steps {
            let tick = sim.step();
            prop_assert_eq!(tick.prices.len(), symbols.len());
        }
        for symbol in &symbols {
            prop_assert_eq!(sim.history_len(symbol), Some(steps + 1));
        }
        prop_assert_eq!(sim.tick_count(), steps as u64);
    }
}

// ── 3. Tail queries ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn tail_query_is_bounded_and_ends_at_current_price(
        asset in arb_asset("BTC"),
        scenario in arb_scenario(),
        seed in any::<u64>(),
        steps in 0..150_usize,
        n_points in 0..300_usize,
    ) {
        let mut sim = build(vec![asset.clone()], scenario, seed);
        for _ in 0..steps {
            sim.step();
        }
        let history = sim.get_history("BTC", n_points);
        prop_assert_eq!(history.len(), n_points.min(steps + 1));
        if let Some(last) = history.last() {
            prop_assert_eq!(Some(*last), sim.current_price("BTC"));
        }
        let full = sim.get_history("BTC", usize::MAX);
        prop_assert_eq!(full[0], asset.base_price);
    }

    #[test]
    fn unknown_symbols_are_empty(
        scenario in arb_scenario(),
        seed in any::<u64>(),
        n_points in 0..50_usize,
    ) {
        let mut sim = build(vec![Asset::bitcoin()], scenario, seed);
        sim.step();
        prop_assert!(sim.get_history("NOPE", n_points).is_empty());
        prop_assert_eq!(sim.current_price("NOPE"), None);
    }
}

// ── 4. Determinism ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn identical_seeds_give_identical_paths(
        assets in arb_assets(),
        scenario in arb_scenario(),
        seed in any::<u64>(),
        steps in 1..150_usize,
    ) {
        let symbols: Vec<String> = assets.iter().map(|a| a.symbol.clone()).collect();
        let mut a = build(assets.clone(), scenario, seed);
        let mut b = build(assets, scenario, seed);
        for _ in 0..steps {
            a.step();
            b.step();
        }
        for symbol in &symbols {
            let pa: Vec<u64> = a.get_history(symbol, usize::MAX).iter().map(|p| p.to_bits()).collect();
            let pb: Vec<u64> = b.get_history(symbol, usize::MAX).iter().map(|p| p.to_bits()).collect();
            prop_assert_eq!(pa, pb);
        }
    }
}
