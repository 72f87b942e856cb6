//! Market scenarios: the "mood" a trading session is played in.
//!
//! A [`Scenario`] is chosen before play and fixes how the price process
//! feels: the initial drift, how strongly asset volatility is scaled, and
//! whether the drift itself wanders from tick to tick.
//!
//! | scenario        | initial drift            | vol multiplier | drift walks |
//! |-----------------|--------------------------|----------------|-------------|
//! | Tutorial        | U(-0.0001, 0.0001)       | 0.5            | yes         |
//! | Bull Market     | U(0.0005, 0.001)         | 0.8            | no          |
//! | Sudden Crash    | U(-0.0001, 0.0001)       | 0.5            | no          |
//! | High Volatility | 0                        | 2.5            | yes         |
//!
//! Sudden Crash deliberately carries Tutorial's parameters; it does not model
//! a price shock.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::rng::RandomSource;

/// Largest per-tick change of a walking drift.
pub const DRIFT_STEP: f64 = 0.000_05;

/// Walking drift is clamped to `[-DRIFT_BOUND, DRIFT_BOUND]`.
pub const DRIFT_BOUND: f64 = 0.001;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scenario {
    #[default]
    Tutorial,
    BullMarket,
    SuddenCrash,
    HighVolatility,
}

/// How the drift is seeded at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InitialDrift {
    Fixed(f64),
    Uniform { low: f64, high: f64 },
}

/// Static per-scenario parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioParams {
    pub initial_drift: InitialDrift,
    pub volatility_multiplier: f64,
    pub drift_walks: bool,
}

impl Scenario {
    pub const ALL: [Scenario; 4] =
        [Scenario::Tutorial, Scenario::BullMarket, Scenario::SuddenCrash, Scenario::HighVolatility];

    pub fn params(&self) -> ScenarioParams {
        match self {
            Self::Tutorial | Self::SuddenCrash => ScenarioParams {
                initial_drift: InitialDrift::Uniform { low: -0.000_1, high: 0.000_1 },
                volatility_multiplier: 0.5,
                drift_walks: *self == Self::Tutorial,
            },
            Self::BullMarket => ScenarioParams {
                initial_drift: InitialDrift::Uniform { low: 0.000_5, high: 0.001 },
                volatility_multiplier: 0.8,
                drift_walks: false,
            },
            Self::HighVolatility => ScenarioParams {
                initial_drift: InitialDrift::Fixed(0.0),
                volatility_multiplier: 2.5,
                drift_walks: true,
            },
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Tutorial => "Tutorial",
            Self::BullMarket => "Bull Market",
            Self::SuddenCrash => "Sudden Crash",
            Self::HighVolatility => "High Volatility",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Tutorial => "Learn the basics in a calm, stable market.",
            Self::BullMarket => "Ride a clear upward trend.",
            Self::SuddenCrash => "React quickly to an unexpected market drop.",
            Self::HighVolatility => "Keep your nerve in a chaotic, unpredictable market.",
        }
    }

    /// Difficulty on a 1-4 star scale.
    pub fn difficulty(&self) -> u8 {
        match self {
            Self::Tutorial => 1,
            Self::BullMarket => 2,
            Self::SuddenCrash => 3,
            Self::HighVolatility => 4,
        }
    }

    /// Stars for menus, e.g. `★★☆☆`.
    pub fn difficulty_stars(&self) -> String {
        let filled = self.difficulty() as usize;
        format!("{}{}", "★".repeat(filled), "☆".repeat(4 - filled))
    }

    /// Recognize a scenario by display name, identifier, or the game's
    /// French menu label. Case, `_`/`-` and extra whitespace are ignored.
    pub fn parse(name: &str) -> Option<Self> {
        let normalized = name
            .replace(['_', '-'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        match normalized.as_str() {
            "tutorial" | "tutoriel" | "tutoriel facile" => Some(Self::Tutorial),
            "bull market" | "bull" | "bullish" | "marché haussier" | "marche haussier" => {
                Some(Self::BullMarket)
            }
            "sudden crash" | "crash" | "krach soudain" => Some(Self::SuddenCrash),
            "high volatility" | "volatile" | "haute volatilité" | "haute volatilite" => {
                Some(Self::HighVolatility)
            }
            _ => None,
        }
    }

    /// Like [`Scenario::parse`], falling back to Tutorial for unknown names.
    pub fn resolve(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            warn!(scenario = name, "unrecognized scenario, falling back to Tutorial");
            Self::Tutorial
        })
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Live scenario configuration owned by a simulator.
///
/// Built once at construction; afterwards only `drift` changes, and only for
/// scenarios whose drift walks.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    scenario: Scenario,
    drift: f64,
    volatility_multiplier: f64,
    drift_walks: bool,
}

impl ScenarioConfig {
    pub fn new<R: RandomSource + ?Sized>(scenario: Scenario, rng: &mut R) -> Self {
        let params = scenario.params();
        let drift = match params.initial_drift {
            InitialDrift::Fixed(value) => value,
            InitialDrift::Uniform { low, high } => rng.uniform(low, high),
        };
        Self {
            scenario,
            drift,
            volatility_multiplier: params.volatility_multiplier,
            drift_walks: params.drift_walks,
        }
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    pub fn drift(&self) -> f64 {
        self.drift
    }

    pub fn volatility_multiplier(&self) -> f64 {
        self.volatility_multiplier
    }

    pub fn drift_walks(&self) -> bool {
        self.drift_walks
    }

    /// Advance the drift by one tick. No-op for fixed-drift scenarios.
    pub fn advance_drift<R: RandomSource + ?Sized>(&mut self, rng: &mut R) {
        if !self.drift_walks {
            return;
        }
        let delta = rng.uniform(-DRIFT_STEP, DRIFT_STEP);
        self.drift = (self.drift + delta).clamp(-DRIFT_BOUND, DRIFT_BOUND);
    }
}
