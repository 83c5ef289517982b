//! Trade ingestion.

use super::core::Engine;
use super::results::{EngineError, TradeOutcome};
use crate::challenge::{Challenge, ChallengeStatus, EquityPoint, Trade};
use crate::concurrency::ensure_version;
use crate::events::{
    ChallengeFailedEvent, ChallengeFundedEvent, EventCollector, EventPayload, StatusChangeReason,
    StatusChangedEvent, TradeAppliedEvent,
};
use crate::rules::{evaluate_chain, RuleContext, Verdict};
use crate::types::{Money, ValueError};
use tracing::{debug, info, warn};

impl Engine {
    /// Apply one trade to a challenge snapshot.
    ///
    /// Guards run before any computation, in this order: version, terminal status,
    /// trade shape, timestamp ordering, resulting equity. A rejected trade leaves
    /// `challenge` untouched; the caller keeps using it as-is.
    pub fn apply_trade(
        &self,
        challenge: &Challenge,
        trade: &Trade,
        expected_version: u64,
    ) -> Result<TradeOutcome, EngineError> {
        let result = self.evaluate_trade(challenge, trade, expected_version);

        if let Err(err) = &result {
            warn!(
                challenge_id = %challenge.id,
                trade_id = %trade.trade_id,
                version = challenge.version,
                kind = ?err.kind(),
                error = %err,
                "trade rejected"
            );
        }

        result
    }

    fn evaluate_trade(
        &self,
        challenge: &Challenge,
        trade: &Trade,
        expected_version: u64,
    ) -> Result<TradeOutcome, EngineError> {
        ensure_version(expected_version, challenge.version).map_err(|conflict| {
            EngineError::ConcurrencyConflict {
                challenge_id: challenge.id,
                expected: conflict.expected,
                actual: conflict.actual,
            }
        })?;

        if challenge.status.is_terminal() {
            return Err(EngineError::TerminalChallenge {
                challenge_id: challenge.id,
                status: challenge.status,
            });
        }

        trade.validate()?;

        if let Some(last) = challenge.last_trade_timestamp {
            if trade.timestamp <= last {
                return Err(EngineError::OutOfOrderTrade {
                    trade_id: trade.trade_id,
                    timestamp: trade.timestamp,
                    last,
                });
            }
        }

        let equity_after = resulting_equity(challenge.current_equity, trade)?;

        let mut next = challenge.clone();
        let version = challenge.version + 1;
        let mut events = EventCollector::new(challenge.id, version);

        let trade_day = trade.timestamp.date_naive();
        if trade_day != next.current_day_utc {
            debug!(
                challenge_id = %next.id,
                from = %next.current_day_utc,
                to = %trade_day,
                baseline = %next.current_equity,
                "daily window reset"
            );
            next.roll_day(trade_day);
        }

        next.max_equity_ever = next.max_equity_ever.max(equity_after);

        if next.status == ChallengeStatus::Pending {
            next.status = ChallengeStatus::Active;
            events.emit(EventPayload::StatusChanged(StatusChangedEvent {
                from: ChallengeStatus::Pending,
                to: ChallengeStatus::Active,
                reason: StatusChangeReason::FirstTradeAccepted,
                at: trade.timestamp,
            }));
        }

        events.emit(EventPayload::TradeApplied(TradeAppliedEvent {
            trade_id: trade.trade_id,
            symbol: trade.symbol.clone(),
            equity_after,
            pnl: trade.pnl,
            at: trade.timestamp,
        }));

        let ctx = RuleContext {
            params: &next.params,
            daily_start_equity: next.daily_start_equity,
            max_equity_ever: next.max_equity_ever,
            equity_after,
        };

        match evaluate_chain(&ctx)? {
            Some(Verdict::Fail {
                rule_id,
                metric_value,
                limit_value,
            }) => {
                next.status = ChallengeStatus::Failed;
                info!(
                    challenge_id = %next.id,
                    rule = %rule_id,
                    metric = %metric_value,
                    limit = %limit_value,
                    "challenge failed"
                );
                events.emit(EventPayload::Failed(ChallengeFailedEvent {
                    rule_id,
                    metric_value,
                    limit_value,
                    at: trade.timestamp,
                }));
            }
            Some(Verdict::Fund {
                metric_value,
                target,
            }) => {
                next.status = ChallengeStatus::Funded;
                info!(
                    challenge_id = %next.id,
                    profit = %metric_value,
                    target = %target,
                    "challenge funded"
                );
                events.emit(EventPayload::Funded(ChallengeFundedEvent {
                    metric_value,
                    at: trade.timestamp,
                }));
            }
            None => {}
        }

        next.daily_max_equity = next.daily_max_equity.max(equity_after);
        next.daily_min_equity = next.daily_min_equity.min(equity_after);
        next.current_equity = equity_after;
        next.last_trade_timestamp = Some(trade.timestamp);
        next.record_equity(
            EquityPoint {
                trade_id: trade.trade_id,
                equity: equity_after,
                at: trade.timestamp,
            },
            self.config.max_equity_history,
        );
        next.version = version;

        debug!(
            challenge_id = %next.id,
            trade_id = %trade.trade_id,
            pnl = %trade.pnl,
            equity = %equity_after,
            status = %next.status,
            version,
            "trade applied"
        );

        Ok(TradeOutcome {
            challenge: next,
            events: events.finish(),
        })
    }
}

// losses larger than the equity are rejected, never floored
fn resulting_equity(equity: Money, trade: &Trade) -> Result<Money, EngineError> {
    equity.apply_pnl(trade.pnl).map_err(|err| match err {
        ValueError::Negative { .. } => EngineError::InsufficientEquity {
            equity,
            pnl: trade.pnl,
        },
        other => EngineError::Validation(other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChallengeTier;
    use crate::engine::{EngineConfig, ErrorKind};
    use crate::rules::RuleId;
    use crate::types::{ChallengeId, PnL, TradeId, TraderId};
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn day1(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, hour, 0, 0).unwrap()
    }

    fn starter() -> Challenge {
        Challenge::new(
            ChallengeId(1),
            TraderId(1),
            ChallengeTier::Starter.params(),
            day1(8),
        )
    }

    fn trade(id: u64, pnl: Decimal, at: DateTime<Utc>) -> Trade {
        Trade::new(TradeId(id), "EURUSD", PnL::new(pnl).unwrap(), at).unwrap()
    }

    #[test]
    fn first_trade_activates() {
        let engine = Engine::default();
        let out = engine
            .apply_trade(&starter(), &trade(1, dec!(150), day1(10)), 0)
            .unwrap();

        assert_eq!(out.challenge.status(), ChallengeStatus::Active);
        assert_eq!(out.challenge.version(), 1);
        assert_eq!(out.challenge.current_equity().value(), dec!(10150));
        assert_eq!(out.challenge.max_equity_ever().value(), dec!(10150));
        assert_eq!(out.challenge.daily_max_equity().value(), dec!(10150));
        assert_eq!(out.challenge.daily_min_equity().value(), dec!(10000));
        assert_eq!(out.challenge.last_trade_timestamp(), Some(day1(10)));

        let types: Vec<_> = out.events.iter().map(|e| e.event_type()).collect();
        assert_eq!(types, ["challenge_status_changed", "trade_applied"]);
        assert!(out.events.iter().all(|e| e.version == 1));
    }

    #[test]
    fn second_trade_emits_only_trade_applied() {
        let engine = Engine::default();
        let first = engine
            .apply_trade(&starter(), &trade(1, dec!(100), day1(10)), 0)
            .unwrap();
        let second = engine
            .apply_trade(&first.challenge, &trade(2, dec!(-50), day1(11)), 1)
            .unwrap();

        assert_eq!(second.events.len(), 1);
        assert_eq!(second.events[0].event_type(), "trade_applied");
        assert_eq!(second.challenge.version(), 2);
        assert_eq!(second.challenge.max_equity_ever().value(), dec!(10100));
    }

    #[test]
    fn stale_version_rejected() {
        let engine = Engine::default();
        let err = engine
            .apply_trade(&starter(), &trade(1, dec!(1), day1(10)), 5)
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::ConcurrencyConflict {
                challenge_id: ChallengeId(1),
                expected: 5,
                actual: 0,
            }
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn equal_timestamp_is_out_of_order() {
        let engine = Engine::default();
        let first = engine
            .apply_trade(&starter(), &trade(1, dec!(10), day1(10)), 0)
            .unwrap();
        let err = engine
            .apply_trade(&first.challenge, &trade(2, dec!(10), day1(10)), 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfOrderTrade);
        assert!(!err.is_retryable());
    }

    #[test]
    fn loss_beyond_equity_rejected() {
        let engine = Engine::default();
        let err = engine
            .apply_trade(&starter(), &trade(1, dec!(-10000.01), day1(10)), 0)
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientEquity { .. }));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn empty_symbol_rejected() {
        let engine = Engine::default();
        let mut bad = trade(1, dec!(10), day1(10));
        bad.symbol = String::new();
        let err = engine.apply_trade(&starter(), &bad, 0).unwrap_err();
        assert_eq!(err, EngineError::Validation(ValueError::EmptySymbol));
    }

    #[test]
    fn wipeout_fails_on_daily_rule() {
        let engine = Engine::default();
        let out = engine
            .apply_trade(&starter(), &trade(1, dec!(-10000), day1(10)), 0)
            .unwrap();
        assert!(out.challenge.current_equity().is_zero());
        assert_eq!(out.challenge.status(), ChallengeStatus::Failed);
        match &out.events[2].payload {
            EventPayload::Failed(e) => {
                assert_eq!(e.rule_id, RuleId::MaxDailyDrawdown);
                assert_eq!(e.metric_value.value(), dec!(100));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn drawdown_and_target_together_fail() {
        // a stored snapshot whose day opened at 12,000: one trade to 11,100 is
        // 7.5% down on the day and 11% up overall
        let mut loaded = starter();
        loaded.status = ChallengeStatus::Active;
        loaded.current_equity = Money::from_whole(12_000);
        loaded.max_equity_ever = Money::from_whole(12_000);
        loaded.daily_start_equity = Money::from_whole(12_000);
        loaded.daily_max_equity = Money::from_whole(12_000);
        loaded.daily_min_equity = Money::from_whole(12_000);

        let out = Engine::default()
            .apply_trade(&loaded, &trade(1, dec!(-900), day1(12)), 0)
            .unwrap();

        assert_eq!(out.challenge.status(), ChallengeStatus::Failed);
        let kinds: Vec<_> = out.events.iter().map(|e| e.event_type()).collect();
        assert_eq!(kinds, ["trade_applied", "challenge_failed"]);
    }

    #[test]
    fn corrupted_snapshot_is_invalid_calculation() {
        let engine = Engine::default();
        let mut broken = engine
            .apply_trade(&starter(), &trade(1, dec!(10), day1(10)), 0)
            .unwrap()
            .challenge;
        broken.daily_start_equity = Money::zero();

        let err = engine
            .apply_trade(&broken, &trade(2, dec!(10), day1(11)), 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCalculation);
    }

    #[test]
    fn history_follows_config() {
        let engine = Engine::new(EngineConfig {
            max_equity_history: 2,
        });
        let mut c = starter();
        for i in 0..4u32 {
            let out = engine
                .apply_trade(&c, &trade(u64::from(i), dec!(1), day1(10 + i)), c.version())
                .unwrap();
            c = out.challenge;
        }
        assert_eq!(c.equity_history().len(), 2);
        assert_eq!(c.equity_history()[1].equity.value(), dec!(10004));
    }
}
