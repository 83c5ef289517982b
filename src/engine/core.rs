// 8.0 engine/core.rs: the engine holds configuration only. challenges are passed in
// and handed back, so any number of them can be evaluated in parallel.

use super::config::EngineConfig;
use super::results::{EngineError, TradeOutcome};
use crate::challenge::{Challenge, Trade};
use crate::config::ChallengeParams;
use crate::types::{ChallengeId, TraderId};
use chrono::{DateTime, Utc};
use tracing::debug;

/** 8.1: stateless evaluator */
#[derive(Debug, Clone, Default)]
pub struct Engine {
    pub(super) config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn create_challenge(
        &self,
        id: ChallengeId,
        trader_id: TraderId,
        params: ChallengeParams,
        created_at: DateTime<Utc>,
    ) -> Challenge {
        debug!(
            challenge_id = %id,
            trader_id = %trader_id,
            initial_balance = %params.initial_balance(),
            "challenge created"
        );
        Challenge::new(id, trader_id, params, created_at)
    }
}

/// `Engine::create_challenge` with the default configuration.
pub fn create_challenge(
    id: ChallengeId,
    trader_id: TraderId,
    params: ChallengeParams,
    created_at: DateTime<Utc>,
) -> Challenge {
    Engine::default().create_challenge(id, trader_id, params, created_at)
}

/// `Engine::apply_trade` with the default configuration.
pub fn apply_trade(
    challenge: &Challenge,
    trade: &Trade,
    expected_version: u64,
) -> Result<TradeOutcome, EngineError> {
    Engine::default().apply_trade(challenge, trade, expected_version)
}
