// 8.0.2: result types and errors for trade ingestion.

use crate::challenge::{Challenge, ChallengeStatus};
use crate::events::EventBatch;
use crate::rules::RuleError;
use crate::types::{ChallengeId, Money, PnL, TradeId, ValueError};
use chrono::{DateTime, Utc};

/// Next snapshot plus the events that produced it, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeOutcome {
    pub challenge: Challenge,
    pub events: EventBatch,
}

/// Error taxonomy callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    ConcurrencyConflict,
    TerminalChallenge,
    OutOfOrderTrade,
    InvalidCalculation,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Challenge {challenge_id} version conflict: expected {expected}, found {actual}")]
    ConcurrencyConflict {
        challenge_id: ChallengeId,
        expected: u64,
        actual: u64,
    },

    #[error("Challenge {challenge_id} is {status} and accepts no further trades")]
    TerminalChallenge {
        challenge_id: ChallengeId,
        status: ChallengeStatus,
    },

    #[error("Trade {trade_id} at {timestamp} is not after the last accepted trade at {last}")]
    OutOfOrderTrade {
        trade_id: TradeId,
        timestamp: DateTime<Utc>,
        last: DateTime<Utc>,
    },

    #[error("Trade pnl {pnl} would take equity {equity} below zero")]
    InsufficientEquity { equity: Money, pnl: PnL },

    #[error("Invalid value: {0}")]
    Validation(#[from] ValueError),

    #[error("Invalid calculation: {0}")]
    InvalidCalculation(#[from] RuleError),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::ConcurrencyConflict { .. } => ErrorKind::ConcurrencyConflict,
            EngineError::TerminalChallenge { .. } => ErrorKind::TerminalChallenge,
            EngineError::OutOfOrderTrade { .. } => ErrorKind::OutOfOrderTrade,
            EngineError::InsufficientEquity { .. } | EngineError::Validation(_) => {
                ErrorKind::Validation
            }
            EngineError::InvalidCalculation(_) => ErrorKind::InvalidCalculation,
        }
    }

    /// Only a version conflict is worth retrying, after re-reading the snapshot.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::ConcurrencyConflict
    }
}
