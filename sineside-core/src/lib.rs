//! SineSide Core: the market simulator behind the trading game.
//!
//! This crate contains:
//! - Domain types (assets, market ticks, session and trade records)
//! - Scenario table (Tutorial, Bull Market, Sudden Crash, High Volatility)
//! - Injectable, seedable randomness
//! - Bounded per-asset price history
//! - The tick-driven `MarketSimulator`
//! - `TradingSession` game economics priced off the simulator

pub mod domain;
pub mod history;
pub mod rng;
pub mod scenario;
pub mod session;
pub mod simulator;

pub use domain::{
    Asset, AssetError, MarketTick, PlayerStats, SessionId, SessionRecord, SessionResult, TradeAction,
    TradeRecord,
};
pub use history::PriceHistory;
pub use rng::{RandomSource, SeedHierarchy, SeededRandom};
pub use scenario::{Scenario, ScenarioConfig};
pub use session::{SessionError, SessionSettings, SessionStatus, TradingSession};
pub use simulator::{MarketSimulator, SimulatorError};
