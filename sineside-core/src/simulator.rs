//! MarketSimulator: the per-scenario stochastic price process.
//!
//! Each call to [`MarketSimulator::step`] advances every managed asset by one
//! tick, in lock-step:
//!
//! 1. bump the tick counter
//! 2. let the drift walk (scenarios that allow it)
//! 3. per asset: `last * (1 + drift + noise)`, pulled toward the base price by
//!    [`MEAN_REVERSION_RATE`], floored at [`PRICE_FLOOR`]
//!
//! Noise is Gaussian with standard deviation
//! `volatility * volatility_multiplier * NOISE_DAMPING`, drawn independently
//! per asset. All randomness goes through the injected [`RandomSource`].

use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{Asset, AssetError, MarketTick};
use crate::history::PriceHistory;
use crate::rng::{RandomSource, SeededRandom};
use crate::scenario::{Scenario, ScenarioConfig};

/// Scales raw asset volatility down to a per-tick noise level.
pub const NOISE_DAMPING: f64 = 0.1;

/// Fraction of the gap to the base price closed each tick.
pub const MEAN_REVERSION_RATE: f64 = 0.000_5;

/// Prices never go below this.
pub const PRICE_FLOOR: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulatorError {
    #[error("at least one asset is required")]
    NoAssets,

    #[error(transparent)]
    InvalidAsset(#[from] AssetError),

    #[error("duplicate asset symbol {0}")]
    DuplicateSymbol(String),

    #[error("history capacity must be at least 1")]
    ZeroHistoryCapacity,
}

/// One price update: drift and noise applied to the last price, then mean
/// reversion toward `base_price`, then the floor.
pub fn next_price(last_price: f64, base_price: f64, drift: f64, noise: f64) -> f64 {
    let candidate = last_price * (1.0 + drift + noise);
    let reverted = candidate + (base_price - candidate) * MEAN_REVERSION_RATE;
    reverted.max(PRICE_FLOOR)
}

#[derive(Debug, Clone)]
struct Track {
    asset: Asset,
    history: PriceHistory,
}

/// Stateful price simulator for a fixed set of assets and one scenario.
///
/// Histories are seeded with each asset's base price and grow by exactly one
/// entry per asset per `step()`, so all histories always have equal length
/// (or equal `recorded()` count when a capacity is set).
#[derive(Debug, Clone)]
pub struct MarketSimulator<R = SeededRandom> {
    tracks: Vec<Track>,
    index: HashMap<String, usize>,
    scenario: ScenarioConfig,
    tick: u64,
    rng: R,
}

impl<R: RandomSource> MarketSimulator<R> {
    /// Build from a scenario name; unknown names fall back to Tutorial.
    pub fn new(assets: Vec<Asset>, scenario_name: &str, rng: R) -> Result<Self, SimulatorError> {
        Self::with_scenario(assets, Scenario::resolve(scenario_name), rng)
    }

    pub fn with_scenario(
        assets: Vec<Asset>,
        scenario: Scenario,
        rng: R,
    ) -> Result<Self, SimulatorError> {
        Self::with_history_capacity(assets, scenario, rng, None)
    }

    /// Like [`MarketSimulator::with_scenario`] with each history capped at
    /// `capacity` prices. `None` keeps the full session history.
    pub fn with_history_capacity(
        assets: Vec<Asset>,
        scenario: Scenario,
        mut rng: R,
        capacity: Option<usize>,
    ) -> Result<Self, SimulatorError> {
        if assets.is_empty() {
            return Err(SimulatorError::NoAssets);
        }
        if capacity == Some(0) {
            return Err(SimulatorError::ZeroHistoryCapacity);
        }

        let mut tracks = Vec::with_capacity(assets.len());
        let mut index = HashMap::with_capacity(assets.len());
        for asset in assets {
            asset.validate()?;
            if index.contains_key(&asset.symbol) {
                return Err(SimulatorError::DuplicateSymbol(asset.symbol));
            }
            index.insert(asset.symbol.clone(), tracks.len());
            let history = PriceHistory::with_capacity(asset.base_price, capacity);
            tracks.push(Track { asset, history });
        }

        let scenario = ScenarioConfig::new(scenario, &mut rng);
        info!(
            scenario = %scenario.scenario(),
            assets = tracks.len(),
            drift = scenario.drift(),
            "market simulator ready"
        );

        Ok(Self { tracks, index, scenario, tick: 0, rng })
    }

    /// Advance every asset by one tick and return the new prices.
    pub fn step(&mut self) -> MarketTick {
        self.tick += 1;
        self.scenario.advance_drift(&mut self.rng);

        let drift = self.scenario.drift();
        let multiplier = self.scenario.volatility_multiplier();
        let mut prices = BTreeMap::new();

        for track in &mut self.tracks {
            let last = track.history.last().unwrap_or(track.asset.base_price);
            let std_dev = track.asset.volatility * multiplier * NOISE_DAMPING;
            let noise = self.rng.gaussian(0.0, std_dev);
            let price = next_price(last, track.asset.base_price, drift, noise);
            track.history.push(price);
            prices.insert(track.asset.symbol.clone(), price);
        }

        debug!(tick = self.tick, drift, "market step");
        MarketTick::new(self.tick, Utc::now(), prices)
    }
}

impl<R> MarketSimulator<R> {
    /// The last `n_points` prices of `symbol`, oldest first. Empty for an
    /// unknown symbol.
    pub fn get_history(&self, symbol: &str, n_points: usize) -> Vec<f64> {
        self.track(symbol).map(|t| t.history.tail(n_points)).unwrap_or_default()
    }

    pub fn current_price(&self, symbol: &str) -> Option<f64> {
        self.track(symbol).and_then(|t| t.history.last())
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario.scenario()
    }

    pub fn scenario_config(&self) -> &ScenarioConfig {
        &self.scenario
    }

    pub fn asset(&self, symbol: &str) -> Option<&Asset> {
        self.track(symbol).map(|t| &t.asset)
    }

    /// Assets in construction order.
    pub fn assets(&self) -> impl Iterator<Item = &Asset> {
        self.tracks.iter().map(|t| &t.asset)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.index.contains_key(symbol)
    }

    /// Prices currently retained for `symbol`.
    pub fn history_len(&self, symbol: &str) -> Option<usize> {
        self.track(symbol).map(|t| t.history.len())
    }

    fn track(&self, symbol: &str) -> Option<&Track> {
        self.index.get(symbol).map(|&i| &self.tracks[i])
    }
}
