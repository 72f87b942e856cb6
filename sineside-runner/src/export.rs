//! Export of run artifacts: CSV price history, JSON-lines tick tape, and
//! JSON session / batch reports.
//!
//! Artifacts land in `{output_dir}/{id}/`, where `id` hashes everything that
//! shapes the result: `run_id` for single runs, `batch_id` for batches.
//! Re-running the same inputs overwrites its own files and never another
//! run's. Single runs must carry a pinned seed so the saved `config.toml`
//! replays them.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use sineside_core::{MarketSimulator, MarketTick, SessionRecord, SessionStatus, TradeRecord, TradingSession};

use crate::batch::{BatchConfig, BatchResult};
use crate::config::RunConfig;

// ─── CSV export ─────────────────────────────────────────────────────

/// Retained price history of every asset as CSV.
///
/// Columns: tick, symbol, price. Tick 0 is the base price; a capped history
/// starts at the first tick still retained.
pub fn export_history_csv<R>(simulator: &MarketSimulator<R>) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["tick", "symbol", "price"])?;

    let last_tick = simulator.tick_count();
    for asset in simulator.assets() {
        let prices = simulator.get_history(&asset.symbol, usize::MAX);
        let first_tick = (last_tick + 1).saturating_sub(prices.len() as u64);
        for (offset, price) in prices.iter().enumerate() {
            wtr.write_record([
                &(first_tick + offset as u64).to_string(),
                &asset.symbol,
                &format!("{price:.6}"),
            ])?;
        }
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── JSON export ────────────────────────────────────────────────────

/// One JSON object per line, one line per tick.
pub fn export_ticks_jsonl(ticks: &[MarketTick]) -> Result<String> {
    let mut out = String::new();
    for tick in ticks {
        let line = serde_json::to_string(tick)
            .with_context(|| format!("failed to serialize tick {}", tick.tick))?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

/// Final state of a trading session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub run_id: String,
    pub scenario: String,
    pub symbol: String,
    pub record: SessionRecord,
    pub status: SessionStatus,
    pub trades: Vec<TradeRecord>,
}

impl SessionReport {
    pub fn new<R>(run_id: impl Into<String>, session: &TradingSession<R>) -> Self {
        Self {
            run_id: run_id.into(),
            scenario: session.simulator().scenario().display_name().to_string(),
            symbol: session.settings().symbol.clone(),
            record: session.record().clone(),
            status: session.status(),
            trades: session.trades().to_vec(),
        }
    }
}

pub fn export_session_json(report: &SessionReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize SessionReport to JSON")
}

pub fn import_session_json(json: &str) -> Result<SessionReport> {
    serde_json::from_str(json).context("failed to deserialize SessionReport from JSON")
}

pub fn export_batch_json(result: &BatchResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BatchResult to JSON")
}

// ─── Artifact bundles ───────────────────────────────────────────────

fn artifact_dir(output_dir: &Path, id: &str, config: &RunConfig) -> Result<PathBuf> {
    let dir = output_dir.join(id);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create artifact dir: {}", dir.display()))?;
    write(&dir, "config.toml", &config.to_toml()?)?;
    Ok(dir)
}

fn run_dir(config: &RunConfig, output_dir: &Path) -> Result<PathBuf> {
    if config.seed.is_none() {
        bail!("refusing to save an unseeded run: pin the seed before running so it can be replayed");
    }
    artifact_dir(output_dir, &config.run_id()?, config)
}

fn write(dir: &Path, name: &str, contents: &str) -> Result<()> {
    let path = dir.join(name);
    std::fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))
}

/// Save a simulation run: `config.toml`, `history.csv` and `ticks.jsonl`.
///
/// Returns the path to the run directory.
pub fn save_simulation<R>(
    config: &RunConfig,
    simulator: &MarketSimulator<R>,
    ticks: &[MarketTick],
    output_dir: &Path,
) -> Result<PathBuf> {
    let dir = run_dir(config, output_dir)?;
    write(&dir, "history.csv", &export_history_csv(simulator)?)?;
    write(&dir, "ticks.jsonl", &export_ticks_jsonl(ticks)?)?;
    Ok(dir)
}

/// Save a finished session: `config.toml`, `session.json` and `history.csv`.
pub fn save_session<R>(
    config: &RunConfig,
    session: &TradingSession<R>,
    output_dir: &Path,
) -> Result<PathBuf> {
    let dir = run_dir(config, output_dir)?;
    let report = SessionReport::new(config.run_id()?, session);
    write(&dir, "session.json", &export_session_json(&report)?)?;
    write(&dir, "history.csv", &export_history_csv(session.simulator())?)?;
    Ok(dir)
}

/// Save a batch: `config.toml` and `batch.json`, under the batch's own id.
pub fn save_batch(batch: &BatchConfig, result: &BatchResult, output_dir: &Path) -> Result<PathBuf> {
    let dir = artifact_dir(output_dir, &batch.batch_id()?, &batch.run)?;
    write(&dir, "batch.json", &export_batch_json(result)?)?;
    Ok(dir)
}

/// Load a session report from a run directory.
pub fn load_session(dir: &Path) -> Result<SessionReport> {
    let path = dir.join("session.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_session_json(&json)
}
