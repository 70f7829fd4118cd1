//! Edge gate types

use std::collections::BTreeSet;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of the position on the YES outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy YES
    #[default]
    Back,
    /// Bet against YES (buy NO)
    Lay,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Back => Side::Lay,
            Side::Lay => Side::Back,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Back => write!(f, "back"),
            Side::Lay => write!(f, "lay"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "back" | "yes" => Ok(Side::Back),
            "lay" | "no" => Ok(Side::Lay),
            other => Err(format!("unknown side '{other}', expected back or lay")),
        }
    }
}

/// Why a decision was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReasonCode {
    /// Expected value below the minimum
    EvTooLow,
    /// Market liquidity below the minimum
    LiquidityTooLow,
    /// Spread wider than the maximum, or unknown
    SpreadTooWide,
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReasonCode::EvTooLow => write!(f, "EV too low"),
            ReasonCode::LiquidityTooLow => write!(f, "liquidity too low"),
            ReasonCode::SpreadTooWide => write!(f, "spread too wide"),
        }
    }
}

/// Result of running the edge gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDecision {
    pub side: Side,
    /// Fair probability of the chosen side winning
    pub fair_probability: Decimal,
    /// Market price of the chosen side
    pub market_implied: Decimal,
    /// Price of the chosen side including fees
    pub breakeven: Decimal,
    /// Fair probability minus market price (signed)
    pub edge: Decimal,
    /// Profit per unit stake, net of fees
    pub expected_value: Decimal,
    /// Fair probability needed to clear the EV threshold
    pub required_probability: Decimal,
    /// Highest side price that still clears the EV threshold
    pub max_price: Decimal,
    pub approved: bool,
    pub reject_reasons: BTreeSet<ReasonCode>,
}

impl EdgeDecision {
    /// Whether a given reason is among the rejections
    pub fn rejected_for(&self, reason: ReasonCode) -> bool {
        self.reject_reasons.contains(&reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_parse() {
        assert_eq!("back".parse::<Side>().unwrap(), Side::Back);
        assert_eq!("LAY".parse::<Side>().unwrap(), Side::Lay);
        assert_eq!("no".parse::<Side>().unwrap(), Side::Lay);
        assert!("sideways".parse::<Side>().is_err());
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Back.opposite(), Side::Lay);
        assert_eq!(Side::Lay.opposite(), Side::Back);
    }

    #[test]
    fn test_reason_order_is_stable() {
        let reasons: BTreeSet<ReasonCode> = [
            ReasonCode::SpreadTooWide,
            ReasonCode::EvTooLow,
            ReasonCode::LiquidityTooLow,
        ]
        .into_iter()
        .collect();
        let ordered: Vec<ReasonCode> = reasons.into_iter().collect();
        assert_eq!(
            ordered,
            vec![
                ReasonCode::EvTooLow,
                ReasonCode::LiquidityTooLow,
                ReasonCode::SpreadTooWide
            ]
        );
    }
}
