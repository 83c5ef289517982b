//! Property-based tests for the challenge invariants.
//!
//! These tests verify invariants hold under random trade sequences.

use challenge_core::*;
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn origin() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

// Strategies for generating test data
fn pnl_strategy() -> impl Strategy<Value = Decimal> {
    (-80_000i64..=80_000i64).prop_map(|cents| Decimal::new(cents, 2)) // -$800 to +$800
}

fn gap_strategy() -> impl Strategy<Value = i64> {
    1i64..=36 * 60 // one minute to a day and a half, in minutes
}

fn trades_strategy() -> impl Strategy<Value = Vec<(Decimal, i64)>> {
    proptest::collection::vec((pnl_strategy(), gap_strategy()), 1..40)
}

fn build_trades(raw: &[(Decimal, i64)]) -> Vec<Trade> {
    let mut ts = origin();
    raw.iter()
        .enumerate()
        .map(|(i, (pnl, gap))| {
            ts += Duration::minutes(*gap);
            Trade {
                trade_id: TradeId(i as u64),
                symbol: "BTCUSD".to_string(),
                pnl: PnL::new(*pnl).unwrap(),
                timestamp: ts,
            }
        })
        .collect()
}

fn genesis() -> Challenge {
    create_challenge(
        ChallengeId(1),
        TraderId(1),
        ChallengeTier::Starter.params(),
        origin(),
    )
}

proptest! {
    /// Same snapshot and trade always give the same snapshot and events.
    #[test]
    fn apply_trade_is_deterministic(raw in trades_strategy()) {
        let mut state = genesis();
        for trade in build_trades(&raw) {
            let a = apply_trade(&state, &trade, state.version());
            let b = apply_trade(&state, &trade, state.version());
            prop_assert_eq!(&a, &b);
            match a {
                Ok(out) => state = out.challenge,
                Err(_) => break,
            }
        }
    }

    /// Accepted trades add exactly one version; rejected ones change nothing.
    #[test]
    fn version_moves_by_one(raw in trades_strategy()) {
        let mut state = genesis();
        for trade in build_trades(&raw) {
            let before = state.clone();
            match apply_trade(&state, &trade, state.version()) {
                Ok(out) => {
                    prop_assert_eq!(out.challenge.version(), before.version() + 1);
                    prop_assert!(out.events.iter().all(|e| e.version == out.challenge.version()));
                    state = out.challenge;
                }
                Err(_) => prop_assert_eq!(&state, &before),
            }
        }
    }

    /// Once FAILED or FUNDED, every later trade is refused and the snapshot is frozen.
    #[test]
    fn terminal_states_are_immutable(raw in trades_strategy(), extra in pnl_strategy()) {
        let mut state = genesis();
        let trades = build_trades(&raw);
        for trade in &trades {
            if state.status().is_terminal() {
                break;
            }
            state = apply_trade(&state, trade, state.version()).unwrap().challenge;
        }

        if state.status().is_terminal() {
            let late = Trade {
                trade_id: TradeId(9_999),
                symbol: "BTCUSD".to_string(),
                pnl: PnL::new(extra).unwrap(),
                timestamp: trades.last().unwrap().timestamp + Duration::days(1),
            };
            let frozen = state.clone();
            let err = apply_trade(&state, &late, state.version()).unwrap_err();
            prop_assert_eq!(err.kind(), ErrorKind::TerminalChallenge);
            prop_assert_eq!(&state, &frozen);
        }
    }

    /// Equity never goes negative and the high-water mark never drops.
    #[test]
    fn equity_floor_and_high_water_mark(raw in proptest::collection::vec(
        ((-2_000_000i64..=200_000i64).prop_map(|c| Decimal::new(c, 2)), gap_strategy()),
        1..40,
    )) {
        let mut state = genesis();
        for trade in build_trades(&raw) {
            let peak = state.max_equity_ever();
            match apply_trade(&state, &trade, state.version()) {
                Ok(out) => {
                    prop_assert!(out.challenge.current_equity().value() >= Decimal::ZERO);
                    prop_assert!(out.challenge.max_equity_ever() >= peak);
                    state = out.challenge;
                }
                Err(EngineError::InsufficientEquity { .. }) => {
                    prop_assert!(state.current_equity().value() + trade.pnl.value() < Decimal::ZERO);
                }
                Err(_) => prop_assert!(state.status().is_terminal()),
            }
        }
    }

    /// A post-trade state past a drawdown limit and past the target is a failure.
    #[test]
    fn drawdown_beats_profit_target(
        profit_cents in 100_000i64..500_000i64,
        decline_bps in 501i64..2_000i64,
    ) {
        let params = ChallengeTier::Starter.params();
        let initial = params.initial_balance().value();

        // equity_after sits 10-50% above the initial balance
        let equity_after = initial + Decimal::new(profit_cents, 2);
        // and the day started high enough that the drop exceeds 5%
        let daily_start = (equity_after * Decimal::new(10_000, 0)
            / Decimal::new(10_000 - decline_bps, 0))
            .round_dp(2);

        let ctx = RuleContext {
            params: &params,
            daily_start_equity: Money::new(daily_start).unwrap(),
            max_equity_ever: Money::new(daily_start).unwrap(),
            equity_after: Money::new(equity_after).unwrap(),
        };

        prop_assert!(RuleId::ProfitTarget.evaluate(&ctx).unwrap().is_some());
        let verdict = evaluate_chain(&ctx).unwrap();
        prop_assert!(
            matches!(verdict, Some(Verdict::Fail { rule_id: RuleId::MaxDailyDrawdown, .. })),
            "got {:?}", verdict
        );
    }
}
