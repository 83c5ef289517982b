//! Event stream replay.
//!
//! Rebuilds a challenge from its creation snapshot and the events it emitted,
//! re-running every trade through the engine and checking that each regenerated
//! batch matches the recorded one exactly. A passing replay proves the stored
//! stream and the current rules agree; a failing one pinpoints the version.

use crate::challenge::{Challenge, Trade};
use crate::engine::{Engine, EngineError};
use crate::events::{Event, EventPayload};
use crate::types::ChallengeId;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    #[error("event for {found} in stream of {expected}")]
    ForeignEvent {
        expected: ChallengeId,
        found: ChallengeId,
    },

    #[error("stream gap: expected version {expected}, found {found}")]
    Gap { expected: u64, found: u64 },

    #[error("batch for version {version} has no trade_applied event")]
    MissingTrade { version: u64 },

    #[error("recorded events for version {version} differ from re-evaluation")]
    Mismatch { version: u64 },

    #[error("re-evaluation of version {version} failed: {source}")]
    Engine {
        version: u64,
        #[source]
        source: EngineError,
    },
}

/// Replays `events` on top of `genesis` with the default engine configuration.
pub fn replay(genesis: &Challenge, events: &[Event]) -> Result<Challenge, ReplayError> {
    replay_with(&Engine::default(), genesis, events)
}

pub fn replay_with(
    engine: &Engine,
    genesis: &Challenge,
    events: &[Event],
) -> Result<Challenge, ReplayError> {
    let mut state = genesis.clone();
    let mut rest = events;

    while let Some(head) = rest.first() {
        if head.challenge_id != state.id() {
            return Err(ReplayError::ForeignEvent {
                expected: state.id(),
                found: head.challenge_id,
            });
        }

        let version = head.version;
        let expected = state.version() + 1;
        if version != expected {
            return Err(ReplayError::Gap {
                expected,
                found: version,
            });
        }

        let len = rest.iter().take_while(|e| e.version == version).count();
        let (batch, tail) = rest.split_at(len);

        let trade = recorded_trade(batch).ok_or(ReplayError::MissingTrade { version })?;
        let outcome = engine
            .apply_trade(&state, &trade, state.version())
            .map_err(|source| ReplayError::Engine { version, source })?;

        if outcome.events.as_slice() != batch {
            return Err(ReplayError::Mismatch { version });
        }

        state = outcome.challenge;
        rest = tail;
    }

    debug!(
        challenge_id = %state.id(),
        version = state.version(),
        status = %state.status(),
        "replay complete"
    );
    Ok(state)
}

fn recorded_trade(batch: &[Event]) -> Option<Trade> {
    batch.iter().find_map(|event| match &event.payload {
        EventPayload::TradeApplied(applied) => Some(Trade {
            trade_id: applied.trade_id,
            symbol: applied.symbol.clone(),
            pnl: applied.pnl,
            timestamp: applied.at,
        }),
        _ => None,
    })
}
