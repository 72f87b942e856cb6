//! Multi-seed batch runs.
//!
//! Runs many independent simulators for the same config, each with its own
//! seed derived from a master seed, and summarizes how the scenario behaves
//! across them. Every run owns its simulator outright, so runs fan out over
//! rayon with no shared state.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use sineside_core::{Scenario, SeedHierarchy, SeededRandom};

use crate::config::{content_id, ConfigError, RunConfig};
use crate::stats::ReturnStats;

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub run: RunConfig,
    pub runs: usize,
    pub ticks: u64,
    pub master_seed: u64,
    pub parallel: bool,
}

impl BatchConfig {
    pub fn new(run: RunConfig, runs: usize, ticks: u64, master_seed: u64) -> Self {
        Self { run, runs, ticks, master_seed, parallel: true }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Content hash of everything that shapes the result: the run config,
    /// run count, tick count and master seed. Parallelism is left out.
    pub fn batch_id(&self) -> Result<String, ConfigError> {
        content_id(&(&self.run, self.runs, self.ticks, self.master_seed))
    }
}

/// One simulated path of the session symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub index: u64,
    pub seed: u64,
    pub ending_price: f64,
    pub returns: Option<ReturnStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub scenario: Scenario,
    pub symbol: String,
    pub runs: usize,
    pub ticks: u64,
    pub master_seed: u64,
    pub base_price: f64,
    pub mean_ending_price: f64,
    pub min_ending_price: f64,
    pub max_ending_price: f64,
    /// Share of runs that ended above the base price.
    pub fraction_above_base: f64,
    /// Mean over runs of the per-tick return variance.
    pub mean_return_variance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub summary: BatchSummary,
    pub outcomes: Vec<RunOutcome>,
}

/// Run `config.runs` seeded simulations of `config.ticks` ticks each.
pub fn run_batch(config: &BatchConfig) -> Result<BatchResult, ConfigError> {
    config.run.validate()?;
    if config.runs == 0 {
        return Err(ConfigError::Invalid("batch needs at least one run".into()));
    }

    let scenario = config.run.scenario();
    let symbol = config.run.session.symbol.clone();
    let base_price = config
        .run
        .assets
        .iter()
        .find(|a| a.symbol == symbol)
        .map(|a| a.base_price)
        .ok_or_else(|| ConfigError::Invalid(format!("no asset for symbol {symbol}")))?;
    let seeds = SeedHierarchy::new(config.master_seed);
    let label = scenario.display_name();

    let run_one = |index: u64| -> Result<RunOutcome, ConfigError> {
        let seed = seeds.sub_seed(label, index);
        let mut sim = config.run.build_simulator(SeededRandom::new(seed))?;
        for _ in 0..config.ticks {
            sim.step();
        }
        let prices = sim.get_history(&symbol, usize::MAX);
        let ending_price = prices.last().copied().unwrap_or(base_price);
        Ok(RunOutcome { index, seed, ending_price, returns: ReturnStats::from_prices(&prices) })
    };

    let indices: Vec<u64> = (0..config.runs as u64).collect();
    let outcomes: Vec<RunOutcome> = if config.parallel {
        indices.par_iter().map(|&i| run_one(i)).collect::<Result<Vec<_>, _>>()?
    } else {
        indices.iter().map(|&i| run_one(i)).collect::<Result<Vec<_>, _>>()?
    };

    let summary = summarize(scenario, &symbol, config, base_price, &outcomes);
    info!(
        scenario = %scenario,
        runs = summary.runs,
        mean_ending_price = summary.mean_ending_price,
        fraction_above_base = summary.fraction_above_base,
        "batch complete"
    );
    Ok(BatchResult { summary, outcomes })
}

fn summarize(
    scenario: Scenario,
    symbol: &str,
    config: &BatchConfig,
    base_price: f64,
    outcomes: &[RunOutcome],
) -> BatchSummary {
    let n = outcomes.len().max(1) as f64;
    let endings = outcomes.iter().map(|o| o.ending_price);
    let mean_ending_price = endings.clone().sum::<f64>() / n;
    let min_ending_price = endings.clone().fold(f64::INFINITY, f64::min);
    let max_ending_price = endings.clone().fold(f64::NEG_INFINITY, f64::max);
    let above = endings.filter(|&p| p > base_price).count();

    let variances: Vec<f64> = outcomes.iter().filter_map(|o| o.returns.map(|r| r.variance)).collect();
    let mean_return_variance = if variances.is_empty() {
        0.0
    } else {
        variances.iter().sum::<f64>() / variances.len() as f64
    };

    BatchSummary {
        scenario,
        symbol: symbol.to_string(),
        runs: outcomes.len(),
        ticks: config.ticks,
        master_seed: config.master_seed,
        base_price,
        mean_ending_price,
        min_ending_price,
        max_ending_price,
        fraction_above_base: above as f64 / n,
        mean_return_variance,
    }
}
