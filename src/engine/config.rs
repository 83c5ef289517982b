//! Engine configuration options.

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of equity points a challenge snapshot retains.
    pub max_equity_history: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_equity_history: 10_000,
        }
    }
}
