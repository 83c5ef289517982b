// 1.0: primitives. identifiers and the three value objects every calculation runs through.
// Money, Percentage and PnL are fixed-point newtypes over Decimal. construction validates
// magnitude and scale, so nothing downstream ever sees an out-of-range or over-precise value.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChallengeId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TraderId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TradeId(pub u64);

impl fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "challenge-{}", self.0)
    }
}

impl fmt::Display for TraderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trader-{}", self.0)
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trade-{}", self.0)
    }
}

/// Rejected value object construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("{kind} cannot be negative: {value}")]
    Negative { kind: &'static str, value: Decimal },

    #[error("{kind} allows at most {max} decimal places, got {scale}: {value}")]
    Scale {
        kind: &'static str,
        value: Decimal,
        scale: u32,
        max: u32,
    },

    #[error("{kind} magnitude out of range: {value}")]
    OutOfRange { kind: &'static str, value: Decimal },

    #[error("{kind} must be a finite number")]
    NonFinite { kind: &'static str },

    #[error("cannot parse {kind} from {input:?}")]
    Parse { kind: &'static str, input: String },

    #[error("trade symbol must not be empty")]
    EmptySymbol,
}

/// A formula that cannot produce a defined result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CalcError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("arithmetic overflow")]
    Overflow,
}

// 1.1: magnitude cap shared by all value objects. a quadrillion in account currency
// leaves headroom for ×100 percentage math inside Decimal's 96-bit mantissa.
fn max_magnitude() -> Decimal {
    Decimal::new(1_000_000_000_000_000, 0)
}

fn fixed_point(kind: &'static str, value: Decimal, max_scale: u32) -> Result<Decimal, ValueError> {
    if value.abs() > max_magnitude() {
        return Err(ValueError::OutOfRange { kind, value });
    }

    let scale = value.normalize().scale();
    if scale > max_scale {
        return Err(ValueError::Scale {
            kind,
            value,
            scale,
            max: max_scale,
        });
    }

    let mut fixed = value;
    fixed.rescale(max_scale);
    if fixed.is_zero() {
        // -0.00 and 0.00 must compare and serialize identically
        fixed.set_sign_positive(true);
    }
    Ok(fixed)
}

fn parse_decimal(kind: &'static str, input: &str) -> Result<Decimal, ValueError> {
    Decimal::from_str(input.trim()).map_err(|_| ValueError::Parse {
        kind,
        input: input.to_string(),
    })
}

fn decimal_from_f64(kind: &'static str, value: f64) -> Result<Decimal, ValueError> {
    if !value.is_finite() {
        return Err(ValueError::NonFinite { kind });
    }
    Decimal::try_from(value).map_err(|_| ValueError::OutOfRange {
        kind,
        value: Decimal::MAX,
    })
}

// 1.2: account currency amount. equity, balances, high-water marks. never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const SCALE: u32 = 2;

    /// Validating factory. Rejects negative amounts and sub-cent precision.
    pub fn new(value: Decimal) -> Result<Self, ValueError> {
        if value < Decimal::ZERO {
            return Err(ValueError::Negative {
                kind: "money",
                value,
            });
        }
        fixed_point("money", value, Self::SCALE).map(Self)
    }

    pub fn zero() -> Self {
        Self(Decimal::new(0, Self::SCALE))
    }

    /// Whole currency units. Always in range.
    pub fn from_whole(units: u32) -> Self {
        Self(Decimal::new(i64::from(units) * 100, Self::SCALE))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Equity after realizing `pnl`. Fails with `ValueError::Negative` when the loss
    /// exceeds the balance.
    pub fn apply_pnl(&self, pnl: PnL) -> Result<Money, ValueError> {
        let sum = self.0.checked_add(pnl.0).ok_or(ValueError::OutOfRange {
            kind: "money",
            value: self.0,
        })?;
        Money::new(sum)
    }

    /// Signed difference `self - other`.
    pub fn diff(&self, other: Money) -> PnL {
        // both operands are within [0, max], so the difference is within [-max, max]
        PnL(self.0 - other.0)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = ValueError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Money::new(value)
    }
}

impl TryFrom<f64> for Money {
    type Error = ValueError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Money::new(decimal_from_f64("money", value)?)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl FromStr for Money {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::new(parse_decimal("money", s)?)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.3: realized profit or loss of a single trade. signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct PnL(Decimal);

impl PnL {
    pub const SCALE: u32 = 2;

    pub fn new(value: Decimal) -> Result<Self, ValueError> {
        fixed_point("pnl", value, Self::SCALE).map(Self)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_loss(&self) -> bool {
        self.0 < Decimal::ZERO
    }
}

impl TryFrom<Decimal> for PnL {
    type Error = ValueError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        PnL::new(value)
    }
}

impl TryFrom<f64> for PnL {
    type Error = ValueError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        PnL::new(decimal_from_f64("pnl", value)?)
    }
}

impl From<PnL> for Decimal {
    fn from(pnl: PnL) -> Self {
        pnl.0
    }
}

impl FromStr for PnL {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PnL::new(parse_decimal("pnl", s)?)
    }
}

impl fmt::Display for PnL {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction used when a computed percentage is cut to `Percentage::SCALE` places.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Away from zero. Drawdowns round up, so a breach is never hidden.
    Up,
    /// Toward zero. Profit rounds down, so a target is never granted early.
    Down,
}

impl Rounding {
    fn strategy(self) -> RoundingStrategy {
        match self {
            Rounding::Up => RoundingStrategy::AwayFromZero,
            Rounding::Down => RoundingStrategy::ToZero,
        }
    }
}

// 1.4: percent value, 5 = 5%. limits, drawdowns, profit. signed so a losing
// challenge can report negative profit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Percentage(Decimal);

impl Percentage {
    pub const SCALE: u32 = 4;

    pub fn new(value: Decimal) -> Result<Self, ValueError> {
        fixed_point("percentage", value, Self::SCALE).map(Self)
    }

    pub fn zero() -> Self {
        Self(Decimal::new(0, Self::SCALE))
    }

    pub fn from_whole(percent: u32) -> Self {
        Self(Decimal::new(i64::from(percent) * 10_000, Self::SCALE))
    }

    /// `numerator / denominator × 100`, cut to four places in the given direction.
    pub fn ratio(
        numerator: Decimal,
        denominator: Decimal,
        rounding: Rounding,
    ) -> Result<Self, CalcError> {
        if denominator.is_zero() {
            return Err(CalcError::DivisionByZero);
        }

        let raw = numerator
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|scaled| scaled.checked_div(denominator))
            .ok_or(CalcError::Overflow)?;

        let mut fixed = raw.round_dp_with_strategy(Self::SCALE, rounding.strategy());
        fixed.rescale(Self::SCALE);
        if fixed.is_zero() {
            fixed.set_sign_positive(true);
        }
        Ok(Self(fixed))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// `self - other`, both already at four places so the result is too.
    pub fn minus(&self, other: Percentage) -> Percentage {
        Self(self.0 - other.0)
    }
}

impl TryFrom<Decimal> for Percentage {
    type Error = ValueError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Percentage::new(value)
    }
}

impl TryFrom<f64> for Percentage {
    type Error = ValueError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Percentage::new(decimal_from_f64("percentage", value)?)
    }
}

impl From<Percentage> for Decimal {
    fn from(pct: Percentage) -> Self {
        pct.0
    }
}

impl FromStr for Percentage {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_suffix('%').unwrap_or(trimmed);
        Percentage::new(parse_decimal("percentage", digits)?)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
