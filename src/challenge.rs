//! Challenge aggregate state.
//!
//! A `Challenge` is an immutable snapshot: trade ingestion in `engine` reads one
//! snapshot and returns the next. Fields are crate-private so the only way to
//! move a challenge forward is through `Engine::apply_trade`.

use crate::config::ChallengeParams;
use crate::rules::{self, RuleError, RuleId};
use crate::types::{ChallengeId, Money, Percentage, PnL, TradeId, TraderId, ValueError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChallengeStatus {
    Pending,
    Active,
    Failed,
    Funded,
}

impl ChallengeStatus {
    /// FAILED and FUNDED accept no further trades.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChallengeStatus::Failed | ChallengeStatus::Funded)
    }
}

impl fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChallengeStatus::Pending => "PENDING",
            ChallengeStatus::Active => "ACTIVE",
            ChallengeStatus::Failed => "FAILED",
            ChallengeStatus::Funded => "FUNDED",
        };
        f.write_str(name)
    }
}

/// A closed trade reported against a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub symbol: String,
    pub pnl: PnL,
    pub timestamp: DateTime<Utc>,
}

impl Trade {
    pub fn new(
        trade_id: TradeId,
        symbol: impl Into<String>,
        pnl: PnL,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, ValueError> {
        let trade = Self {
            trade_id,
            symbol: symbol.into(),
            pnl,
            timestamp,
        };
        trade.validate()?;
        Ok(trade)
    }

    pub fn validate(&self) -> Result<(), ValueError> {
        if self.symbol.trim().is_empty() {
            return Err(ValueError::EmptySymbol);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub trade_id: TradeId,
    pub equity: Money,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub(crate) id: ChallengeId,
    pub(crate) trader_id: TraderId,
    pub(crate) status: ChallengeStatus,
    pub(crate) params: ChallengeParams,

    pub(crate) current_equity: Money,
    pub(crate) max_equity_ever: Money,

    // daily window, reset lazily by the first trade of a new UTC date
    pub(crate) daily_start_equity: Money,
    pub(crate) daily_max_equity: Money,
    pub(crate) daily_min_equity: Money,
    pub(crate) current_day_utc: NaiveDate,

    pub(crate) last_trade_timestamp: Option<DateTime<Utc>>,
    pub(crate) version: u64,
    pub(crate) created_at: DateTime<Utc>,

    pub(crate) equity_history: VecDeque<EquityPoint>,
}

impl Challenge {
    /// New PENDING challenge at version 0, every equity figure at the initial balance.
    pub fn new(
        id: ChallengeId,
        trader_id: TraderId,
        params: ChallengeParams,
        created_at: DateTime<Utc>,
    ) -> Self {
        let balance = params.initial_balance();
        Self {
            id,
            trader_id,
            status: ChallengeStatus::Pending,
            params,
            current_equity: balance,
            max_equity_ever: balance,
            daily_start_equity: balance,
            daily_max_equity: balance,
            daily_min_equity: balance,
            current_day_utc: created_at.date_naive(),
            last_trade_timestamp: None,
            version: 0,
            created_at,
            equity_history: VecDeque::new(),
        }
    }

    pub fn id(&self) -> ChallengeId {
        self.id
    }

    pub fn trader_id(&self) -> TraderId {
        self.trader_id
    }

    pub fn status(&self) -> ChallengeStatus {
        self.status
    }

    pub fn params(&self) -> &ChallengeParams {
        &self.params
    }

    pub fn current_equity(&self) -> Money {
        self.current_equity
    }

    pub fn max_equity_ever(&self) -> Money {
        self.max_equity_ever
    }

    pub fn daily_start_equity(&self) -> Money {
        self.daily_start_equity
    }

    pub fn daily_max_equity(&self) -> Money {
        self.daily_max_equity
    }

    pub fn daily_min_equity(&self) -> Money {
        self.daily_min_equity
    }

    pub fn current_day_utc(&self) -> NaiveDate {
        self.current_day_utc
    }

    pub fn last_trade_timestamp(&self) -> Option<DateTime<Utc>> {
        self.last_trade_timestamp
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Equity after each accepted trade, oldest first. Bounded by `EngineConfig`.
    pub fn equity_history(&self) -> &VecDeque<EquityPoint> {
        &self.equity_history
    }

    /// Read-side figures for dashboards. Same formulas as the rule chain.
    pub fn metrics(&self) -> Result<ChallengeMetrics, RuleError> {
        let daily_drawdown = rules::daily_drawdown(self.daily_start_equity, self.current_equity)
            .map_err(|source| RuleError {
                rule_id: RuleId::MaxDailyDrawdown,
                source,
            })?;
        let total_drawdown = rules::total_drawdown(self.max_equity_ever, self.current_equity)
            .map_err(|source| RuleError {
                rule_id: RuleId::MaxTotalDrawdown,
                source,
            })?;
        let profit = rules::profit(self.params.initial_balance(), self.current_equity)
            .map_err(|source| RuleError {
                rule_id: RuleId::ProfitTarget,
                source,
            })?;

        let target_remaining = self.params.profit_target().minus(profit).max(Percentage::zero());

        Ok(ChallengeMetrics {
            daily_drawdown,
            total_drawdown,
            profit,
            daily_headroom: self.params.max_daily_drawdown().minus(daily_drawdown),
            total_headroom: self.params.max_total_drawdown().minus(total_drawdown),
            target_remaining,
        })
    }

    // 4.1: new UTC date. the day's baseline is the equity carried into it.
    pub(crate) fn roll_day(&mut self, day: NaiveDate) {
        self.current_day_utc = day;
        self.daily_start_equity = self.current_equity;
        self.daily_max_equity = self.current_equity;
        self.daily_min_equity = self.current_equity;
    }

    pub(crate) fn record_equity(&mut self, point: EquityPoint, max_history: usize) {
        if max_history == 0 {
            return;
        }
        while self.equity_history.len() >= max_history {
            self.equity_history.pop_front();
        }
        self.equity_history.push_back(point);
    }
}

/// Snapshot metrics. Headroom goes negative once a limit is breached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeMetrics {
    pub daily_drawdown: Percentage,
    pub total_drawdown: Percentage,
    pub profit: Percentage,
    pub daily_headroom: Percentage,
    pub total_headroom: Percentage,
    pub target_remaining: Percentage,
}
