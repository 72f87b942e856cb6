//! Sineside CLI: list scenarios, run the market, play a session, batch runs.
//!
//! Commands:
//! - `scenarios`: list the market scenarios with difficulty and description
//! - `simulate`: step the market unpaced and report per-asset results
//! - `play`: interactive timed trading session driven from stdin
//! - `batch`: many seeded runs of one scenario, summarized

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use sineside_core::{
    MarketTick, RandomSource, Scenario, SessionId, SessionStatus, TradingSession,
};
use sineside_runner::{
    run_batch, save_batch, save_session, save_simulation, BatchConfig, Control, ReturnStats,
    RunConfig, TickDriver,
};

#[derive(Parser)]
#[command(name = "sineside", about = "Sineside: synthetic market simulator for trading practice")]
struct Cli {
    /// Log debug output (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available market scenarios.
    Scenarios,
    /// Step the market as fast as possible and report the outcome.
    Simulate {
        /// Path to a TOML run config.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Scenario name, overriding the config.
        #[arg(long)]
        scenario: Option<String>,

        /// Seed, overriding the config.
        #[arg(long)]
        seed: Option<u64>,

        /// Number of ticks. Defaults to the session duration.
        #[arg(long)]
        ticks: Option<u64>,

        /// Write history.csv and ticks.jsonl under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Play a timed trading session. Reads commands from stdin:
    /// `buy <amount>`, `sell <quantity>`, `sell all`, `status`, `quit`.
    Play {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        scenario: Option<String>,

        #[arg(long)]
        seed: Option<u64>,

        /// Write session.json and history.csv under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Run many seeded simulations of one scenario and summarize them.
    Batch {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        scenario: Option<String>,

        /// Number of independent runs.
        #[arg(long, default_value_t = 100)]
        runs: usize,

        /// Ticks per run.
        #[arg(long, default_value_t = 500)]
        ticks: u64,

        /// Master seed the per-run seeds derive from.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Run on one thread.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Write batch.json under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Scenarios => run_scenarios(),
        Commands::Simulate { config, scenario, seed, ticks, output_dir } => {
            let mut run = load_config(config.as_deref(), scenario, seed)?;
            run.pin_seed();
            run_simulate(&run, ticks, output_dir.as_deref())
        }
        Commands::Play { config, scenario, seed, output_dir } => {
            let mut run = load_config(config.as_deref(), scenario, seed)?;
            run.pin_seed();
            run_play(&run, output_dir.as_deref())
        }
        Commands::Batch { config, scenario, runs, ticks, seed, sequential, output_dir } => {
            let run = load_config(config.as_deref(), scenario, None)?;
            run_batch_cmd(run, runs, ticks, seed, sequential, output_dir.as_deref())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>, scenario: Option<String>, seed: Option<u64>) -> Result<RunConfig> {
    let mut config = match path {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };
    if let Some(name) = scenario {
        config.scenario = name;
    }
    if seed.is_some() {
        config.seed = seed;
    }
    config.validate()?;
    Ok(config)
}

// ─── scenarios ──────────────────────────────────────────────────────

fn run_scenarios() -> Result<()> {
    for scenario in Scenario::ALL {
        println!(
            "{:<16} {:<5} {}",
            scenario.display_name(),
            scenario.difficulty_stars(),
            scenario.description()
        );
    }
    Ok(())
}

// ─── simulate ───────────────────────────────────────────────────────

fn run_simulate(config: &RunConfig, ticks: Option<u64>, output_dir: Option<&Path>) -> Result<()> {
    let ticks = ticks.unwrap_or(u64::from(config.session.duration_ticks));
    let mut sim = config.build_simulator(config.random_source())?;

    let mut tape: Vec<MarketTick> = Vec::new();
    let taken = TickDriver::unpaced().run_simulator(&mut sim, ticks, |tick| {
        tape.push(tick.clone());
        Control::Continue
    });

    println!("Scenario: {} ({} ticks)", sim.scenario(), taken);
    println!();
    println!(
        "{:<8} {:>14} {:>14} {:>10} {:>12}",
        "Symbol", "Base", "Last", "Return", "Tick stdev"
    );
    for asset in sim.assets() {
        let prices = sim.get_history(&asset.symbol, usize::MAX);
        let last = sim.current_price(&asset.symbol).unwrap_or(asset.base_price);
        let std_dev = ReturnStats::from_prices(&prices).map_or(0.0, |s| s.std_dev);
        println!(
            "{:<8} {:>14.2} {:>14.2} {:>9.2}% {:>12.6}",
            asset.symbol,
            asset.base_price,
            last,
            (last / asset.base_price - 1.0) * 100.0,
            std_dev
        );
    }

    if let Some(dir) = output_dir {
        let run_dir = save_simulation(config, &sim, &tape, dir)?;
        println!();
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

// ─── play ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum PlayCommand {
    Buy(f64),
    Sell(f64),
    SellAll,
    Status,
    Quit,
}

fn parse_command(line: &str) -> Result<PlayCommand> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let amount = |s: &str| s.parse::<f64>().with_context(|| format!("not a number: '{s}'"));
    match words.as_slice() {
        ["buy", amt] => Ok(PlayCommand::Buy(amount(*amt)?)),
        ["sell", "all"] => Ok(PlayCommand::SellAll),
        ["sell", qty] => Ok(PlayCommand::Sell(amount(*qty)?)),
        ["status"] => Ok(PlayCommand::Status),
        ["quit"] | ["q"] => Ok(PlayCommand::Quit),
        _ => bail!("unknown command '{line}'. Valid: buy <amount>, sell <quantity>, sell all, status, quit"),
    }
}

/// Forward stdin lines to the session loop. The thread ends with stdin.
fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
        debug!("stdin closed");
    });
    rx
}

fn status_line(s: &SessionStatus) -> String {
    format!(
        "[{:>3} ticks left] price {:>12.2} | cash {:>10.2} | qty {:>10.6} | value {:>10.2}",
        s.ticks_remaining, s.price, s.balance, s.quantity, s.portfolio_value
    )
}

fn print_status<R>(session: &TradingSession<R>) {
    println!("{}", status_line(&session.status()));
}

/// Apply queued commands. Returns `Control::Stop` on `quit`.
fn apply_commands<R: RandomSource>(session: &mut TradingSession<R>, commands: &Receiver<String>) -> Control {
    loop {
        let line = match commands.try_recv() {
            Ok(line) => line,
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return Control::Continue,
        };
        if line.trim().is_empty() {
            continue;
        }
        let outcome = match parse_command(line.trim()) {
            Ok(PlayCommand::Buy(amount)) => session.buy(amount).map(Some),
            Ok(PlayCommand::Sell(qty)) => session.sell(qty).map(Some),
            Ok(PlayCommand::SellAll) => session.sell_all().map(Some),
            Ok(PlayCommand::Status) => {
                print_status(session);
                Ok(None)
            }
            Ok(PlayCommand::Quit) => return Control::Stop,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        match outcome {
            Ok(Some(trade)) => println!(
                "{} {:.6} @ {:.2} ({:.2})",
                trade.action,
                trade.quantity,
                trade.price,
                trade.notional()
            ),
            Ok(None) => {}
            Err(e) => eprintln!("rejected: {e}"),
        }
    }
}

fn run_play(config: &RunConfig, output_dir: Option<&Path>) -> Result<()> {
    let mut session = config.build_session(SessionId(1), config.random_source())?;
    println!(
        "{} | {} | {} ticks | balance {:.2}",
        session.simulator().scenario(),
        config.session.symbol,
        config.session.duration_ticks,
        session.balance()
    );
    println!("Commands: buy <amount>, sell <quantity>, sell all, status, quit");
    print_status(&session);

    let commands = spawn_stdin_reader();
    let driver = TickDriver::from_interval(config.tick_interval());
    let summary = driver.run_session(&mut session, |session, _tick| {
        let control = apply_commands(session, &commands);
        print_status(session);
        control
    })?;

    println!();
    println!("Result: {} ({:+.2})", summary.record.result, summary.record.profit);
    println!("{}", serde_json::to_string_pretty(&summary.record)?);

    if let Some(dir) = output_dir {
        let run_dir = save_session(config, &session, dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

// ─── batch ──────────────────────────────────────────────────────────

fn run_batch_cmd(
    run: RunConfig,
    runs: usize,
    ticks: u64,
    seed: u64,
    sequential: bool,
    output_dir: Option<&Path>,
) -> Result<()> {
    let batch = BatchConfig::new(run, runs, ticks, seed).with_parallelism(!sequential);
    let result = run_batch(&batch)?;
    let s = &result.summary;

    println!("Scenario:          {}", s.scenario);
    println!("Symbol:            {}", s.symbol);
    println!("Runs x ticks:      {} x {}", s.runs, s.ticks);
    println!("Master seed:       {}", s.master_seed);
    println!("Base price:        {:.2}", s.base_price);
    println!("Mean ending price: {:.2}", s.mean_ending_price);
    println!("Range:             {:.2} .. {:.2}", s.min_ending_price, s.max_ending_price);
    println!("Above base:        {:.1}%", s.fraction_above_base * 100.0);
    println!("Mean tick var:     {:.3e}", s.mean_return_variance);

    if let Some(dir) = output_dir {
        let run_dir = save_batch(&batch, &result, dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}
