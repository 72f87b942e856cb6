//! Sineside Runner: everything around the simulator that is not the price
//! model itself.
//!
//! This crate builds on `sineside-core` to provide:
//! - TOML run configuration with content-addressed run ids
//! - A fixed-cadence tick driver for sessions and bare simulators
//! - Multi-seed batch runs over rayon
//! - Return statistics
//! - CSV / JSON artifact export

pub mod batch;
pub mod config;
pub mod driver;
pub mod export;
pub mod stats;

pub use batch::{run_batch, BatchConfig, BatchResult, BatchSummary, RunOutcome};
pub use config::{ConfigError, RunConfig};
pub use driver::{Control, DriveSummary, TickDriver};
pub use export::{
    export_batch_json, export_history_csv, export_session_json, export_ticks_jsonl, load_session,
    save_batch, save_session, save_simulation, SessionReport,
};
pub use stats::{simple_returns, total_return, ReturnStats};
