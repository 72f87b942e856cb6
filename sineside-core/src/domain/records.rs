//! Session and trade records handed to the storage layer.
//!
//! The simulator itself never sees these. They are produced by
//! [`crate::session::TradingSession`] and serialize with the tag spellings the
//! persisted tables use (`WIN`, `BUY`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque session identifier assigned by the storage layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome tag of a trading session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionResult {
    Win,
    Loss,
    Draw,
    InProgress,
}

impl SessionResult {
    /// Classify a finished session by its profit.
    pub fn from_profit(profit: f64) -> Self {
        if profit > 0.0 {
            Self::Win
        } else if profit < 0.0 {
            Self::Loss
        } else {
            Self::Draw
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Win => "WIN",
            Self::Loss => "LOSS",
            Self::Draw => "DRAW",
            Self::InProgress => "IN_PROGRESS",
        }
    }
}

impl fmt::Display for SessionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("BUY"),
            Self::Sell => f.write_str("SELL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub result: SessionResult,
    pub profit: f64,
}

impl SessionRecord {
    /// A freshly started session: no end time, zero profit.
    pub fn started(session_id: SessionId, start_time: DateTime<Utc>) -> Self {
        Self {
            session_id,
            start_time,
            end_time: None,
            result: SessionResult::InProgress,
            profit: 0.0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.result != SessionResult::InProgress
    }
}

/// A single executed trade, priced at the simulator's current price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub session_id: SessionId,
    pub action: TradeAction,
    pub price: f64,
    pub quantity: f64,
    pub timestamp: DateTime<Utc>,
}

impl TradeRecord {
    /// Cash value of the trade.
    pub fn notional(&self) -> f64 {
        self.price * self.quantity
    }
}

/// Lifetime totals over a player's finished sessions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Finished sessions, draws included.
    pub total_sessions: u64,
    pub wins: u64,
    pub losses: u64,
    pub total_profit: f64,
}

impl PlayerStats {
    /// Totals over `records`. Sessions still in progress are skipped; no
    /// finished sessions gives all zeros.
    pub fn from_records(records: &[SessionRecord]) -> Self {
        records.iter().filter(|r| r.is_finished()).fold(Self::default(), |mut stats, r| {
            stats.total_sessions += 1;
            match r.result {
                SessionResult::Win => stats.wins += 1,
                SessionResult::Loss => stats.losses += 1,
                SessionResult::Draw | SessionResult::InProgress => {}
            }
            stats.total_profit += r.profit;
            stats
        })
    }

    pub fn draws(&self) -> u64 {
        self.total_sessions - self.wins - self.losses
    }
}
