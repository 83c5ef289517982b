// challenge-core: prop-trading challenge evaluation engine.
// risk-first: drawdown limits are checked before the profit target on every trade.
// all computation is deterministic with no external I/O and no wall-clock reads.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: identifiers and value objects: Money, Percentage, PnL
//   3.x  rules.rs: fixed-priority rule chain: daily dd, total dd, profit target
//   4.x  challenge.rs: challenge snapshot, status, trades, equity history
//   5.x  concurrency.rs: version guard and reference compare-and-swap slot
//   7.x  config.rs: challenge parameters and tier presets
//   8.x  engine/: trade ingestion, results, error taxonomy
//   11.x events.rs: domain events and per-trade event batches
//   12.x replay.rs: rebuild and audit a challenge from its event stream

pub mod challenge;
pub mod concurrency;
pub mod config;
pub mod engine;
pub mod events;
pub mod replay;
pub mod rules;
pub mod types;

// re exports for convenience
pub use challenge::*;
pub use concurrency::*;
pub use config::*;
pub use engine::*;
pub use events::*;
pub use replay::*;
pub use rules::*;
pub use types::*;
