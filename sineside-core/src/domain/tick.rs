//! MarketTick: one step's worth of simulated prices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prices produced by a single `step()`.
///
/// Owned entirely by the caller; the simulator keeps only the prices, folded
/// into each asset's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketTick {
    /// Tick counter value after the step (first step is 1).
    pub tick: u64,
    pub timestamp: DateTime<Utc>,
    pub prices: BTreeMap<String, f64>,
}

impl MarketTick {
    pub fn new(tick: u64, timestamp: DateTime<Utc>, prices: BTreeMap<String, f64>) -> Self {
        Self { tick, timestamp, prices }
    }

    /// Price of `symbol` in this tick, if the simulator manages it.
    pub fn price(&self, symbol: &str) -> Option<f64> {
        self.prices.get(symbol).copied()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.prices.keys().map(|s| s.as_str())
    }
}
