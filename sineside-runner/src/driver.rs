//! Fixed-cadence tick driver.
//!
//! The game UI calls `step()` from a one-second timer. `TickDriver` plays that
//! role outside a UI: it steps a session (or a bare simulator) at a fixed
//! interval and hands each tick to an observer. Deadlines are computed from
//! the start instant, so slow observers do not make the clock drift.

use std::thread;
use std::time::{Duration, Instant};

use sineside_core::{
    MarketSimulator, MarketTick, RandomSource, SessionError, SessionRecord, TradingSession,
};
use tracing::debug;

/// Observer verdict after each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Stop,
}

/// What a driven session did.
#[derive(Debug, Clone, PartialEq)]
pub struct DriveSummary {
    pub ticks: u64,
    pub stopped_early: bool,
    pub record: SessionRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickDriver {
    interval: Option<Duration>,
    max_ticks: Option<u64>,
}

impl TickDriver {
    /// One tick every `interval`.
    pub fn paced(interval: Duration) -> Self {
        Self { interval: Some(interval), max_ticks: None }
    }

    /// As fast as possible.
    pub fn unpaced() -> Self {
        Self { interval: None, max_ticks: None }
    }

    /// Paced when `interval` is `Some`, otherwise unpaced.
    pub fn from_interval(interval: Option<Duration>) -> Self {
        Self { interval, max_ticks: None }
    }

    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Drive a session until its countdown runs out, the observer stops it,
    /// or `max_ticks` is reached. The session is always ended on return.
    pub fn run_session<R, F>(
        &self,
        session: &mut TradingSession<R>,
        mut observer: F,
    ) -> Result<DriveSummary, SessionError>
    where
        R: RandomSource,
        F: FnMut(&mut TradingSession<R>, &MarketTick) -> Control,
    {
        let start = Instant::now();
        let mut ticks = 0u64;
        let mut stopped_early = false;

        while !session.is_finished() {
            if self.max_ticks.is_some_and(|max| ticks >= max) {
                stopped_early = true;
                break;
            }
            self.wait_for(start, ticks);
            let tick = session.tick()?;
            ticks += 1;
            if observer(session, &tick) == Control::Stop {
                stopped_early = !session.is_finished();
                break;
            }
        }

        let record = session.end();
        debug!(ticks, stopped_early, "session drive finished");
        Ok(DriveSummary { ticks, stopped_early, record })
    }

    /// Step a bare simulator up to `ticks` times (further capped by
    /// `max_ticks`). Returns the number of steps taken.
    pub fn run_simulator<R, F>(&self, simulator: &mut MarketSimulator<R>, ticks: u64, mut observer: F) -> u64
    where
        R: RandomSource,
        F: FnMut(&MarketTick) -> Control,
    {
        let limit = self.max_ticks.map_or(ticks, |max| max.min(ticks));
        let start = Instant::now();
        let mut taken = 0u64;
        while taken < limit {
            self.wait_for(start, taken);
            let tick = simulator.step();
            taken += 1;
            if observer(&tick) == Control::Stop {
                break;
            }
        }
        taken
    }

    /// Sleep until tick `index` is due. The first tick fires one interval
    /// after `start`, matching a repeating timer.
    fn wait_for(&self, start: Instant, index: u64) {
        let Some(interval) = self.interval else {
            return;
        };
        let factor = u32::try_from(index + 1).unwrap_or(u32::MAX);
        let due = start + interval.saturating_mul(factor);
        let now = Instant::now();
        if due > now {
            thread::sleep(due - now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sineside_core::{Asset, Scenario, SeededRandom, SessionId, SessionSettings};

    fn session(duration_ticks: u32) -> TradingSession {
        let sim = MarketSimulator::with_scenario(
            vec![Asset::bitcoin()],
            Scenario::Tutorial,
            SeededRandom::new(1),
        )
        .unwrap();
        let settings = SessionSettings { duration_ticks, ..SessionSettings::default() };
        TradingSession::new(SessionId(1), sim, settings).unwrap()
    }

    #[test]
    fn runs_session_to_countdown() {
        let mut s = session(10);
        let mut seen = 0;
        let summary = TickDriver::unpaced()
            .run_session(&mut s, |_, _| {
                seen += 1;
                Control::Continue
            })
            .unwrap();
        assert_eq!(summary.ticks, 10);
        assert_eq!(seen, 10);
        assert!(!summary.stopped_early);
        assert!(summary.record.is_finished());
    }

    #[test]
    fn observer_can_trade_and_stop() {
        let mut s = session(100);
        let summary = TickDriver::unpaced()
            .run_session(&mut s, |session, tick| {
                if tick.tick == 1 {
                    session.buy(1_000.0).unwrap();
                }
                if tick.tick == 5 {
                    Control::Stop
                } else {
                    Control::Continue
                }
            })
            .unwrap();
        assert_eq!(summary.ticks, 5);
        assert!(summary.stopped_early);
        // the open position is liquidated on end
        assert_eq!(s.trades().len(), 2);
        assert_eq!(s.quantity(), 0.0);
    }

    #[test]
    fn max_ticks_caps_session() {
        let mut s = session(100);
        let summary = TickDriver::unpaced()
            .with_max_ticks(3)
            .run_session(&mut s, |_, _| Control::Continue)
            .unwrap();
        assert_eq!(summary.ticks, 3);
        assert!(summary.stopped_early);
        assert!(s.is_finished());
    }

    #[test]
    fn paced_driver_waits_between_ticks() {
        let mut sim = MarketSimulator::with_scenario(
            vec![Asset::bitcoin()],
            Scenario::Tutorial,
            SeededRandom::new(2),
        )
        .unwrap();
        let started = Instant::now();
        let taken = TickDriver::paced(Duration::from_millis(10))
            .run_simulator(&mut sim, 3, |_| Control::Continue);
        assert_eq!(taken, 3);
        assert!(started.elapsed() >= Duration::from_millis(30));
        assert_eq!(sim.history_len("BTC"), Some(4));
    }

    #[test]
    fn simulator_observer_stop() {
        let mut sim = MarketSimulator::with_scenario(
            vec![Asset::bitcoin()],
            Scenario::BullMarket,
            SeededRandom::new(2),
        )
        .unwrap();
        let taken = TickDriver::unpaced().run_simulator(&mut sim, 50, |tick| {
            if tick.tick == 7 {
                Control::Stop
            } else {
                Control::Continue
            }
        });
        assert_eq!(taken, 7);
        assert_eq!(sim.tick_count(), 7);
    }
}
