use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places monetary results are rounded to.
pub const MONEY_DP: u32 = 2;

/// Midpoint handling when rounding tax amounts to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Commercial rounding: 0.005 → 0.01.
    #[default]
    HalfUp,
    /// Banker's rounding: 0.005 → 0.00, 0.015 → 0.02.
    HalfEven,
}

impl RoundingMode {
    fn strategy(self) -> RoundingStrategy {
        match self {
            Self::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            Self::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }

    /// Round `value` to [`MONEY_DP`] places.
    pub fn round_money(self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(MONEY_DP, self.strategy())
    }
}
