//! TradingSession: the game economics played on top of a simulator.
//!
//! A session trades one symbol with a cash balance and a countdown measured
//! in ticks. Every trade is priced at the simulator's current price; the
//! simulator knows nothing about balances or trades.
//!
//! Ending a session (explicitly or when the countdown runs out) sells any open
//! position, classifies the profit, and freezes the [`SessionRecord`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{MarketTick, SessionId, SessionRecord, SessionResult, TradeAction, TradeRecord};
use crate::rng::{RandomSource, SeededRandom};
use crate::simulator::MarketSimulator;

/// Tolerance for float comparisons against balance and holdings.
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionSettings {
    /// Symbol the player trades.
    pub symbol: String,
    pub initial_balance: f64,
    /// Session length in ticks (120 one-second ticks = two minutes).
    pub duration_ticks: u32,
    /// Points shown on the price chart.
    pub chart_points: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            symbol: "BTC".into(),
            initial_balance: 10_000.0,
            duration_ticks: 120,
            chart_points: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("symbol {0} is not managed by the simulator")]
    UnknownSymbol(String),

    #[error("initial balance must be positive and finite, got {0}")]
    InvalidBalance(f64),

    #[error("session duration must be at least one tick")]
    ZeroDuration,

    #[error("amount must be positive and finite, got {0}")]
    InvalidAmount(f64),

    #[error("insufficient funds: requested {requested:.2}, available {available:.2}")]
    InsufficientFunds { requested: f64, available: f64 },

    #[error("insufficient holdings: requested {requested:.6}, held {held:.6}")]
    InsufficientHoldings { requested: f64, held: f64 },

    #[error("no open position to sell")]
    NoPosition,

    #[error("session has ended")]
    Finished,
}

/// Snapshot of the player's position, for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub tick: u64,
    pub price: f64,
    pub balance: f64,
    pub quantity: f64,
    pub portfolio_value: f64,
    pub ticks_remaining: u32,
}

#[derive(Debug, Clone)]
pub struct TradingSession<R = SeededRandom> {
    simulator: MarketSimulator<R>,
    settings: SessionSettings,
    balance: f64,
    quantity: f64,
    current_price: f64,
    ticks_remaining: u32,
    trades: Vec<TradeRecord>,
    record: SessionRecord,
}

impl<R: RandomSource> TradingSession<R> {
    pub fn new(
        session_id: SessionId,
        simulator: MarketSimulator<R>,
        settings: SessionSettings,
    ) -> Result<Self, SessionError> {
        Self::started_at(session_id, simulator, settings, Utc::now())
    }

    pub fn started_at(
        session_id: SessionId,
        simulator: MarketSimulator<R>,
        settings: SessionSettings,
        start_time: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let current_price = simulator
            .current_price(&settings.symbol)
            .ok_or_else(|| SessionError::UnknownSymbol(settings.symbol.clone()))?;
        if !settings.initial_balance.is_finite() || settings.initial_balance <= 0.0 {
            return Err(SessionError::InvalidBalance(settings.initial_balance));
        }
        if settings.duration_ticks == 0 {
            return Err(SessionError::ZeroDuration);
        }

        info!(
            session = %session_id,
            scenario = %simulator.scenario(),
            symbol = %settings.symbol,
            balance = settings.initial_balance,
            "session started"
        );

        Ok(Self {
            balance: settings.initial_balance,
            quantity: 0.0,
            current_price,
            ticks_remaining: settings.duration_ticks,
            trades: Vec::new(),
            record: SessionRecord::started(session_id, start_time),
            simulator,
            settings,
        })
    }

    /// Advance the market one tick and count down. The session ends itself
    /// on the tick that exhausts the countdown.
    pub fn tick(&mut self) -> Result<MarketTick, SessionError> {
        self.ensure_open()?;
        let tick = self.simulator.step();
        if let Some(price) = tick.price(&self.settings.symbol) {
            self.current_price = price;
        }
        self.ticks_remaining = self.ticks_remaining.saturating_sub(1);
        if self.ticks_remaining == 0 {
            self.end();
        }
        Ok(tick)
    }

    /// Spend `amount` of cash on the traded symbol at the current price.
    pub fn buy(&mut self, amount: f64) -> Result<TradeRecord, SessionError> {
        self.ensure_open()?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(SessionError::InvalidAmount(amount));
        }
        if amount > self.balance + EPSILON {
            warn!(requested = amount, available = self.balance, "buy rejected");
            return Err(SessionError::InsufficientFunds {
                requested: amount,
                available: self.balance,
            });
        }
        let amount = amount.min(self.balance);
        let quantity = amount / self.current_price;
        self.balance -= amount;
        self.quantity += quantity;
        Ok(self.record_trade(TradeAction::Buy, quantity))
    }

    /// Sell `quantity` units at the current price.
    pub fn sell(&mut self, quantity: f64) -> Result<TradeRecord, SessionError> {
        self.ensure_open()?;
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(SessionError::InvalidAmount(quantity));
        }
        if quantity > self.quantity + EPSILON {
            warn!(requested = quantity, held = self.quantity, "sell rejected");
            return Err(SessionError::InsufficientHoldings {
                requested: quantity,
                held: self.quantity,
            });
        }
        let quantity = quantity.min(self.quantity);
        self.balance += quantity * self.current_price;
        self.quantity -= quantity;
        if self.quantity < EPSILON {
            self.quantity = 0.0;
        }
        Ok(self.record_trade(TradeAction::Sell, quantity))
    }

    /// Sell the whole position.
    pub fn sell_all(&mut self) -> Result<TradeRecord, SessionError> {
        self.ensure_open()?;
        if self.quantity <= 0.0 {
            return Err(SessionError::NoPosition);
        }
        self.sell(self.quantity)
    }
}

impl<R> TradingSession<R> {
    /// Close the session: liquidate, classify, and freeze the record.
    /// Calling it again returns the same record.
    pub fn end(&mut self) -> SessionRecord {
        if self.record.is_finished() {
            return self.record.clone();
        }
        if self.quantity > 0.0 {
            let quantity = self.quantity;
            self.balance += quantity * self.current_price;
            self.quantity = 0.0;
            self.record_trade(TradeAction::Sell, quantity);
        }

        let profit = self.balance - self.settings.initial_balance;
        self.record.end_time = Some(Utc::now());
        self.record.result = SessionResult::from_profit(profit);
        self.record.profit = profit;

        info!(
            session = %self.record.session_id,
            result = %self.record.result,
            profit,
            trades = self.trades.len(),
            "session ended"
        );
        self.record.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.record.is_finished()
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn current_price(&self) -> f64 {
        self.current_price
    }

    pub fn ticks_remaining(&self) -> u32 {
        self.ticks_remaining
    }

    pub fn portfolio_value(&self) -> f64 {
        self.balance + self.quantity * self.current_price
    }

    /// Unrealized profit against the starting balance.
    pub fn profit(&self) -> f64 {
        self.portfolio_value() - self.settings.initial_balance
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            tick: self.simulator.tick_count(),
            price: self.current_price,
            balance: self.balance,
            quantity: self.quantity,
            portfolio_value: self.portfolio_value(),
            ticks_remaining: self.ticks_remaining,
        }
    }

    /// Price chart window for the traded symbol.
    pub fn chart(&self) -> Vec<f64> {
        self.simulator.get_history(&self.settings.symbol, self.settings.chart_points)
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn record(&self) -> &SessionRecord {
        &self.record
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn simulator(&self) -> &MarketSimulator<R> {
        &self.simulator
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.record.is_finished() {
            Err(SessionError::Finished)
        } else {
            Ok(())
        }
    }

    fn record_trade(&mut self, action: TradeAction, quantity: f64) -> TradeRecord {
        let trade = TradeRecord {
            session_id: self.record.session_id,
            action,
            price: self.current_price,
            quantity,
            timestamp: Utc::now(),
        };
        self.trades.push(trade.clone());
        trade
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Asset;
    use crate::scenario::Scenario;

    fn session(seed: u64, settings: SessionSettings) -> TradingSession {
        let sim = MarketSimulator::with_scenario(
            vec![Asset::bitcoin()],
            Scenario::Tutorial,
            SeededRandom::new(seed),
        )
        .unwrap();
        TradingSession::new(SessionId(1), sim, settings).unwrap()
    }

    #[test]
    fn starts_at_base_price_with_full_balance() {
        let s = session(1, SessionSettings::default());
        assert_eq!(s.current_price(), 50_000.0);
        assert_eq!(s.balance(), 10_000.0);
        assert_eq!(s.portfolio_value(), 10_000.0);
        assert_eq!(s.ticks_remaining(), 120);
        assert_eq!(s.record().result, SessionResult::InProgress);
    }

    #[test]
    fn buy_then_sell_round_trip_at_same_price() {
        let mut s = session(1, SessionSettings::default());
        let buy = s.buy(1_000.0).unwrap();
        assert_eq!(buy.action, TradeAction::Buy);
        assert!((buy.quantity - 0.02).abs() < 1e-12);
        assert!((s.balance() - 9_000.0).abs() < 1e-9);
        assert!((s.portfolio_value() - 10_000.0).abs() < 1e-9);

        let sell = s.sell_all().unwrap();
        assert_eq!(sell.action, TradeAction::Sell);
        assert_eq!(s.quantity(), 0.0);
        assert!((s.balance() - 10_000.0).abs() < 1e-9);
        assert_eq!(s.trades().len(), 2);
    }

    #[test]
    fn rejects_bad_orders() {
        let mut s = session(1, SessionSettings::default());
        assert_eq!(s.buy(0.0).unwrap_err(), SessionError::InvalidAmount(0.0));
        assert!(matches!(s.buy(f64::NAN), Err(SessionError::InvalidAmount(_))));
        assert!(matches!(s.buy(10_000.01), Err(SessionError::InsufficientFunds { .. })));
        assert!(matches!(s.sell(0.1), Err(SessionError::InsufficientHoldings { .. })));
        assert!(s.trades().is_empty());
    }

    #[test]
    fn sell_all_without_position_reports_no_position() {
        let mut s = session(1, SessionSettings::default());
        assert_eq!(s.sell_all().unwrap_err(), SessionError::NoPosition);

        s.buy(500.0).unwrap();
        s.sell_all().unwrap();
        assert_eq!(s.sell_all().unwrap_err(), SessionError::NoPosition);
        assert_eq!(s.trades().len(), 2);
    }

    #[test]
    fn can_spend_entire_balance() {
        let mut s = session(1, SessionSettings::default());
        s.buy(10_000.0).unwrap();
        assert_eq!(s.balance(), 0.0);
    }

    #[test]
    fn portfolio_tracks_price_moves() {
        let mut s = session(5, SessionSettings::default());
        s.buy(5_000.0).unwrap();
        let tick = s.tick().unwrap();
        let price = tick.price("BTC").unwrap();
        assert_eq!(s.current_price(), price);
        let expected = s.balance() + s.quantity() * price;
        assert!((s.portfolio_value() - expected).abs() < 1e-9);
    }

    #[test]
    fn countdown_ends_session_and_liquidates() {
        let settings = SessionSettings { duration_ticks: 3, ..SessionSettings::default() };
        let mut s = session(9, settings);
        s.buy(2_500.0).unwrap();
        for _ in 0..3 {
            s.tick().unwrap();
        }
        assert!(s.is_finished());
        assert_eq!(s.quantity(), 0.0);
        assert_eq!(s.trades().last().unwrap().action, TradeAction::Sell);
        assert_eq!(s.tick().unwrap_err(), SessionError::Finished);
        assert_eq!(s.buy(1.0).unwrap_err(), SessionError::Finished);

        let record = s.record().clone();
        assert!(record.end_time.is_some());
        assert!((record.profit - (s.balance() - 10_000.0)).abs() < 1e-9);
        assert_eq!(record.result, SessionResult::from_profit(record.profit));
    }

    #[test]
    fn end_without_trades_is_a_draw_and_idempotent() {
        let mut s = session(2, SessionSettings::default());
        s.tick().unwrap();
        let first = s.end();
        assert_eq!(first.result, SessionResult::Draw);
        assert_eq!(first.profit, 0.0);
        let second = s.end();
        assert_eq!(first, second);
        assert!(s.trades().is_empty());
    }

    #[test]
    fn chart_window_is_bounded() {
        let settings = SessionSettings { chart_points: 5, ..SessionSettings::default() };
        let mut s = session(3, settings);
        for _ in 0..10 {
            s.tick().unwrap();
        }
        let chart = s.chart();
        assert_eq!(chart.len(), 5);
        assert_eq!(chart.last().copied(), Some(s.current_price()));
    }

    #[test]
    fn rejects_unknown_symbol_and_bad_settings() {
        let sim = || {
            MarketSimulator::with_scenario(
                vec![Asset::bitcoin()],
                Scenario::Tutorial,
                SeededRandom::new(0),
            )
            .unwrap()
        };
        let eth = SessionSettings { symbol: "ETH".into(), ..SessionSettings::default() };
        assert_eq!(
            TradingSession::new(SessionId(1), sim(), eth).unwrap_err(),
            SessionError::UnknownSymbol("ETH".into())
        );
        let broke = SessionSettings { initial_balance: 0.0, ..SessionSettings::default() };
        assert_eq!(
            TradingSession::new(SessionId(1), sim(), broke).unwrap_err(),
            SessionError::InvalidBalance(0.0)
        );
        let instant = SessionSettings { duration_ticks: 0, ..SessionSettings::default() };
        assert_eq!(
            TradingSession::new(SessionId(1), sim(), instant).unwrap_err(),
            SessionError::ZeroDuration
        );
    }
}
