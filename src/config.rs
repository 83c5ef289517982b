// 7.0 config.rs: challenge parameters. supplied by the caller as a value object,
// validated once at construction and again whenever they are deserialized.
// 7.1 ChallengeTier gives named presets the way a firm would publish its programs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Percentage};

/// Immutable risk parameters of one challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawChallengeParams")]
pub struct ChallengeParams {
    initial_balance: Money,
    max_daily_drawdown: Percentage,
    max_total_drawdown: Percentage,
    profit_target: Percentage,
}

// unvalidated wire shape, only used as the serde source for ChallengeParams
#[derive(Deserialize)]
struct RawChallengeParams {
    initial_balance: Money,
    max_daily_drawdown: Percentage,
    max_total_drawdown: Percentage,
    profit_target: Percentage,
}

impl TryFrom<RawChallengeParams> for ChallengeParams {
    type Error = ConfigError;

    fn try_from(raw: RawChallengeParams) -> Result<Self, Self::Error> {
        ChallengeParams::new(
            raw.initial_balance,
            raw.max_daily_drawdown,
            raw.max_total_drawdown,
            raw.profit_target,
        )
    }
}

impl ChallengeParams {
    pub fn new(
        initial_balance: Money,
        max_daily_drawdown: Percentage,
        max_total_drawdown: Percentage,
        profit_target: Percentage,
    ) -> Result<Self, ConfigError> {
        let params = Self {
            initial_balance,
            max_daily_drawdown,
            max_total_drawdown,
            profit_target,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn initial_balance(&self) -> Money {
        self.initial_balance
    }

    pub fn max_daily_drawdown(&self) -> Percentage {
        self.max_daily_drawdown
    }

    pub fn max_total_drawdown(&self) -> Percentage {
        self.max_total_drawdown
    }

    pub fn profit_target(&self) -> Percentage {
        self.profit_target
    }

    /// Balance must be positive. Every limit must lie strictly between 0% and 100%.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_balance.is_zero() {
            return Err(ConfigError::InvalidBalance {
                reason: "initial balance must be positive".to_string(),
            });
        }

        check_limit("max_daily_drawdown", self.max_daily_drawdown)?;
        check_limit("max_total_drawdown", self.max_total_drawdown)?;
        check_limit("profit_target", self.profit_target)?;

        Ok(())
    }
}

fn check_limit(field: &'static str, value: Percentage) -> Result<(), ConfigError> {
    if value.value() <= Decimal::ZERO || value.value() >= Decimal::ONE_HUNDRED {
        return Err(ConfigError::InvalidLimit {
            field,
            reason: format!("{value} is outside (0%, 100%)"),
        });
    }
    Ok(())
}

/// Parameter validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid balance: {reason}")]
    InvalidBalance { reason: String },

    #[error("invalid {field}: {reason}")]
    InvalidLimit { field: &'static str, reason: String },
}

// Published challenge programs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeTier {
    Starter,
    Standard,
    Pro,
}

impl ChallengeTier {
    pub fn params(&self) -> ChallengeParams {
        match self {
            // $10k, 5% daily, 10% total, 10% target
            ChallengeTier::Starter => ChallengeParams {
                initial_balance: Money::from_whole(10_000),
                max_daily_drawdown: Percentage::from_whole(5),
                max_total_drawdown: Percentage::from_whole(10),
                profit_target: Percentage::from_whole(10),
            },
            ChallengeTier::Standard => ChallengeParams {
                initial_balance: Money::from_whole(50_000),
                max_daily_drawdown: Percentage::from_whole(5),
                max_total_drawdown: Percentage::from_whole(10),
                profit_target: Percentage::from_whole(8),
            },
            // tighter risk, larger account
            ChallengeTier::Pro => ChallengeParams {
                initial_balance: Money::from_whole(200_000),
                max_daily_drawdown: Percentage::from_whole(4),
                max_total_drawdown: Percentage::from_whole(8),
                profit_target: Percentage::from_whole(10),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tier_presets_valid() {
        for tier in [ChallengeTier::Starter, ChallengeTier::Standard, ChallengeTier::Pro] {
            assert!(tier.params().validate().is_ok(), "{tier:?}");
        }
        assert_eq!(
            ChallengeTier::Starter.params().initial_balance(),
            Money::from_whole(10_000)
        );
    }

    #[test]
    fn test_zero_balance_rejected() {
        let result = ChallengeParams::new(
            Money::zero(),
            Percentage::from_whole(5),
            Percentage::from_whole(10),
            Percentage::from_whole(10),
        );
        assert!(matches!(result, Err(ConfigError::InvalidBalance { .. })));
    }

    #[test]
    fn test_limit_bounds() {
        let balance = Money::from_whole(10_000);
        let zero_daily = ChallengeParams::new(
            balance,
            Percentage::zero(),
            Percentage::from_whole(10),
            Percentage::from_whole(10),
        );
        assert!(matches!(
            zero_daily,
            Err(ConfigError::InvalidLimit { field: "max_daily_drawdown", .. })
        ));

        let full_total = ChallengeParams::new(
            balance,
            Percentage::from_whole(5),
            Percentage::from_whole(100),
            Percentage::from_whole(10),
        );
        assert!(matches!(
            full_total,
            Err(ConfigError::InvalidLimit { field: "max_total_drawdown", .. })
        ));

        let negative_target = ChallengeParams::new(
            balance,
            Percentage::from_whole(5),
            Percentage::from_whole(10),
            Percentage::new(dec!(-1)).unwrap(),
        );
        assert!(negative_target.is_err());
    }

    #[test]
    fn test_params_serialization() {
        let params = ChallengeTier::Standard.params();
        let json = serde_json::to_string(&params).unwrap();
        let back: ChallengeParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn test_deserialization_validates() {
        let json = r#"{
            "initial_balance": "10000",
            "max_daily_drawdown": "5",
            "max_total_drawdown": "150",
            "profit_target": "10"
        }"#;
        let result: Result<ChallengeParams, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
