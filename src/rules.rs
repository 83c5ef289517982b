//! Rule chain.
//!
//! Three rules inspect every accepted trade in a fixed order: daily drawdown,
//! total drawdown, profit target. The first one that triggers decides the
//! outcome and the rest are skipped, so a trade that breaches a drawdown limit
//! while also reaching the target is always a failure.

use crate::config::ChallengeParams;
use crate::types::{CalcError, Money, Percentage, Rounding};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    MaxDailyDrawdown,
    MaxTotalDrawdown,
    ProfitTarget,
}

/// Evaluation order. Drawdowns first.
pub const RULE_CHAIN: [RuleId; 3] = [
    RuleId::MaxDailyDrawdown,
    RuleId::MaxTotalDrawdown,
    RuleId::ProfitTarget,
];

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::MaxDailyDrawdown => "max_daily_drawdown",
            RuleId::MaxTotalDrawdown => "max_total_drawdown",
            RuleId::ProfitTarget => "profit_target",
        }
    }

    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Option<Verdict>, RuleError> {
        let wrap = |source| RuleError {
            rule_id: *self,
            source,
        };

        match self {
            RuleId::MaxDailyDrawdown => {
                let metric = daily_drawdown(ctx.daily_start_equity, ctx.equity_after).map_err(wrap)?;
                let limit = ctx.params.max_daily_drawdown();
                Ok((metric > limit).then_some(Verdict::Fail {
                    rule_id: *self,
                    metric_value: metric,
                    limit_value: limit,
                }))
            }
            RuleId::MaxTotalDrawdown => {
                let metric = total_drawdown(ctx.max_equity_ever, ctx.equity_after).map_err(wrap)?;
                let limit = ctx.params.max_total_drawdown();
                Ok((metric > limit).then_some(Verdict::Fail {
                    rule_id: *self,
                    metric_value: metric,
                    limit_value: limit,
                }))
            }
            RuleId::ProfitTarget => {
                let metric =
                    profit(ctx.params.initial_balance(), ctx.equity_after).map_err(wrap)?;
                let target = ctx.params.profit_target();
                Ok((metric >= target).then_some(Verdict::Fund {
                    metric_value: metric,
                    target,
                }))
            }
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Post-trade figures the rules read. `max_equity_ever` already includes the trade.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub params: &'a ChallengeParams,
    pub daily_start_equity: Money,
    pub max_equity_ever: Money,
    pub equity_after: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Fail {
        rule_id: RuleId,
        metric_value: Percentage,
        limit_value: Percentage,
    },
    Fund {
        metric_value: Percentage,
        target: Percentage,
    },
}

/// A rule formula could not be computed. Fatal for the evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{rule_id} could not be evaluated: {source}")]
pub struct RuleError {
    pub rule_id: RuleId,
    #[source]
    pub source: CalcError,
}

/// Runs `RULE_CHAIN` in order and returns the first verdict.
pub fn evaluate_chain(ctx: &RuleContext<'_>) -> Result<Option<Verdict>, RuleError> {
    for rule in RULE_CHAIN {
        if let Some(verdict) = rule.evaluate(ctx)? {
            return Ok(Some(verdict));
        }
    }
    Ok(None)
}

/// `(daily_start - equity) / daily_start × 100`, floored at 0%.
pub fn daily_drawdown(daily_start: Money, equity: Money) -> Result<Percentage, CalcError> {
    drawdown(daily_start, equity)
}

/// `(max_equity_ever - equity) / max_equity_ever × 100`, floored at 0%.
pub fn total_drawdown(max_equity_ever: Money, equity: Money) -> Result<Percentage, CalcError> {
    drawdown(max_equity_ever, equity)
}

/// `(equity - initial) / initial × 100`. Negative while the account is under water.
pub fn profit(initial_balance: Money, equity: Money) -> Result<Percentage, CalcError> {
    Percentage::ratio(
        equity.diff(initial_balance).value(),
        initial_balance.value(),
        Rounding::Down,
    )
}

fn drawdown(reference: Money, equity: Money) -> Result<Percentage, CalcError> {
    let decline = reference.diff(equity).value().max(Decimal::ZERO);
    Percentage::ratio(decline, reference.value(), Rounding::Up)
}
