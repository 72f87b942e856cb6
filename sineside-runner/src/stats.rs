//! Per-tick return statistics over a price series.

use serde::{Deserialize, Serialize};

/// Simple returns `p[i] / p[i-1] - 1`.
pub fn simple_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// Return from first to last price, or `None` for fewer than two prices.
pub fn total_return(prices: &[f64]) -> Option<f64> {
    match (prices.first(), prices.last()) {
        (Some(first), Some(last)) if prices.len() >= 2 => Some(last / first - 1.0),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnStats {
    pub count: usize,
    pub mean: f64,
    /// Sample variance (n - 1 denominator).
    pub variance: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl ReturnStats {
    /// Needs at least three prices (two returns) for a sample variance.
    pub fn from_prices(prices: &[f64]) -> Option<Self> {
        Self::from_returns(&simple_returns(prices))
    }

    pub fn from_returns(returns: &[f64]) -> Option<Self> {
        if returns.len() < 2 {
            return None;
        }
        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let min = returns.iter().copied().fold(f64::INFINITY, f64::min);
        let max = returns.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self { count: returns.len(), mean, variance, std_dev: variance.sqrt(), min, max })
    }
}
