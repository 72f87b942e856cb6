//! Per-asset price history.
//!
//! Append-only from the simulator's point of view. An optional capacity turns
//! it into a ring buffer: the oldest prices are evicted once full, while
//! `recorded()` keeps counting every price ever pushed.

use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    prices: VecDeque<f64>,
    capacity: Option<usize>,
    recorded: u64,
}

impl PriceHistory {
    /// Unbounded history seeded with one price.
    pub fn new(seed_price: f64) -> Self {
        Self::with_capacity(seed_price, None)
    }

    /// History holding at most `capacity` prices (at least one is always kept).
    pub fn with_capacity(seed_price: f64, capacity: Option<usize>) -> Self {
        let capacity = capacity.map(|c| c.max(1));
        let mut prices = VecDeque::with_capacity(capacity.unwrap_or(64).min(4096));
        prices.push_back(seed_price);
        Self { prices, capacity, recorded: 1 }
    }

    pub fn push(&mut self, price: f64) {
        if let Some(cap) = self.capacity {
            while self.prices.len() >= cap {
                self.prices.pop_front();
            }
        }
        self.prices.push_back(price);
        self.recorded += 1;
    }

    pub fn last(&self) -> Option<f64> {
        self.prices.back().copied()
    }

    /// The most recent `n` prices in chronological order, as an owned snapshot.
    pub fn tail(&self, n: usize) -> Vec<f64> {
        let skip = self.prices.len().saturating_sub(n);
        self.prices.iter().skip(skip).copied().collect()
    }

    /// Prices currently retained.
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Total prices ever pushed, including the seed and evicted entries.
    pub fn recorded(&self) -> u64 {
        self.recorded
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.prices.iter().copied()
    }
}
