//! Serializable run configuration.
//!
//! A run is fully described by its TOML config: the assets, the scenario, the
//! session settings, the tick cadence and an optional seed. Two identical
//! configs share a `run_id`, which names their export artifacts.
//!
//! ```toml
//! scenario = "Bull Market"
//! seed = 42
//! tick_interval_ms = 1000
//!
//! [[assets]]
//! symbol = "BTC"
//! name = "Bitcoin"
//! base_price = 50000.0
//! volatility = 0.02
//!
//! [session]
//! symbol = "BTC"
//! initial_balance = 10000.0
//! duration_ticks = 120
//! chart_points = 100
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use sineside_core::{
    Asset, MarketSimulator, RandomSource, Scenario, SeededRandom, SessionError, SessionId,
    SessionSettings, SimulatorError, TradingSession,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("hash config: {0}")]
    Hash(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Simulator(#[from] SimulatorError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    /// Scenario name; unknown names fall back to Tutorial.
    pub scenario: String,

    /// Seed for reproducible runs. `None` draws from OS entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Milliseconds between ticks when paced. Zero runs unpaced.
    pub tick_interval_ms: u64,

    /// Cap on retained prices per asset. `None` keeps the whole session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_capacity: Option<usize>,

    pub assets: Vec<Asset>,

    pub session: SessionSettings,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::Tutorial.display_name().to_string(),
            seed: None,
            tick_interval_ms: 1_000,
            history_capacity: None,
            assets: vec![Asset::bitcoin()],
            session: SessionSettings::default(),
        }
    }
}

impl RunConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml(&content)
    }

    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assets.is_empty() {
            return Err(ConfigError::Invalid("at least one asset is required".into()));
        }
        let mut seen = HashSet::new();
        for asset in &self.assets {
            asset.validate().map_err(SimulatorError::from)?;
            if !seen.insert(asset.symbol.as_str()) {
                return Err(SimulatorError::DuplicateSymbol(asset.symbol.clone()).into());
            }
        }
        if !seen.contains(self.session.symbol.as_str()) {
            return Err(SessionError::UnknownSymbol(self.session.symbol.clone()).into());
        }
        if !self.session.initial_balance.is_finite() || self.session.initial_balance <= 0.0 {
            return Err(SessionError::InvalidBalance(self.session.initial_balance).into());
        }
        if self.session.duration_ticks == 0 {
            return Err(SessionError::ZeroDuration.into());
        }
        match self.history_capacity {
            Some(0) => return Err(SimulatorError::ZeroHistoryCapacity.into()),
            Some(cap) if cap < self.session.chart_points => {
                return Err(ConfigError::Invalid(format!(
                    "history_capacity {cap} is smaller than chart_points {}",
                    self.session.chart_points
                )));
            }
            _ => {}
        }
        Ok(())
    }

    /// Scenario this config resolves to.
    pub fn scenario(&self) -> Scenario {
        Scenario::resolve(&self.scenario)
    }

    /// Tick cadence, or `None` for unpaced runs.
    pub fn tick_interval(&self) -> Option<Duration> {
        (self.tick_interval_ms > 0).then(|| Duration::from_millis(self.tick_interval_ms))
    }

    /// Fix the seed, drawing one from OS entropy when none is configured, and
    /// return it. A pinned config replays exactly and hashes to its own
    /// `run_id`.
    pub fn pin_seed(&mut self) -> u64 {
        *self.seed.get_or_insert_with(rand::random::<u64>)
    }

    /// Random source for this run: seeded when a seed is configured.
    pub fn random_source(&self) -> SeededRandom {
        match self.seed {
            Some(seed) => SeededRandom::new(seed),
            None => SeededRandom::from_entropy(),
        }
    }

    pub fn build_simulator<R: RandomSource>(&self, rng: R) -> Result<MarketSimulator<R>, ConfigError> {
        Ok(MarketSimulator::with_history_capacity(
            self.assets.clone(),
            self.scenario(),
            rng,
            self.history_capacity,
        )?)
    }

    pub fn build_session<R: RandomSource>(
        &self,
        session_id: SessionId,
        rng: R,
    ) -> Result<TradingSession<R>, ConfigError> {
        let simulator = self.build_simulator(rng)?;
        Ok(TradingSession::new(session_id, simulator, self.session.clone())?)
    }

    /// Deterministic content hash of this configuration (first 16 hex chars
    /// of BLAKE3 over the canonical JSON).
    pub fn run_id(&self) -> Result<String, ConfigError> {
        content_id(self)
    }
}

/// First 16 hex chars of BLAKE3 over the canonical JSON of `value`.
pub(crate) fn content_id<T: Serialize + ?Sized>(value: &T) -> Result<String, ConfigError> {
    let json = serde_json::to_string(value)?;
    let hash = blake3::hash(json.as_bytes());
    Ok(hash.to_hex()[..16].to_string())
}
