// 8.0: trade ingestion. takes a challenge snapshot and a trade, runs the rule chain,
// returns the next snapshot with its events. pure: no I/O, no clock, no shared state.

mod config;
mod core;
mod results;
mod trades;

pub use config::EngineConfig;
pub use core::{apply_trade, create_challenge, Engine};
pub use results::{EngineError, ErrorKind, TradeOutcome};
