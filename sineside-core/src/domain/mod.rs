//! Domain types for the SineSide simulator

pub mod asset;
pub mod records;
pub mod tick;

pub use asset::{Asset, AssetError};
pub use records::{PlayerStats, SessionId, SessionRecord, SessionResult, TradeAction, TradeRecord};
pub use tick::MarketTick;
