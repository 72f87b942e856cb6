use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A tradable instrument driven by the simulator (e.g. BTC).
///
/// `base_price` is the reference level the price process reverts toward and
/// `volatility` is the raw per-tick noise scale before scenario scaling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub symbol: String,
    pub name: String,
    pub base_price: f64,
    pub volatility: f64,
}

impl Asset {
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        base_price: f64,
        volatility: f64,
    ) -> Self {
        Self { symbol: symbol.into(), name: name.into(), base_price, volatility }
    }

    /// Bitcoin at 50 000 with 2% raw volatility, the game's default asset.
    pub fn bitcoin() -> Self {
        Self::new("BTC", "Bitcoin", 50_000.0, 0.02)
    }

    /// Check the fields the price process relies on.
    pub fn validate(&self) -> Result<(), AssetError> {
        if self.symbol.trim().is_empty() {
            return Err(AssetError::EmptySymbol);
        }
        if !self.base_price.is_finite() || self.base_price <= 0.0 {
            return Err(AssetError::InvalidBasePrice {
                symbol: self.symbol.clone(),
                base_price: self.base_price,
            });
        }
        if !self.volatility.is_finite() || self.volatility < 0.0 {
            return Err(AssetError::InvalidVolatility {
                symbol: self.symbol.clone(),
                volatility: self.volatility,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssetError {
    #[error("asset symbol must not be empty")]
    EmptySymbol,

    #[error("asset {symbol}: base price must be positive and finite, got {base_price}")]
    InvalidBasePrice { symbol: String, base_price: f64 },

    #[error("asset {symbol}: volatility must be non-negative and finite, got {volatility}")]
    InvalidVolatility { symbol: String, volatility: f64 },
}
