//! Execution cost estimates

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::market::MarketSnapshot;

/// Half-spread assumed when the book is one-sided or empty
const DEFAULT_HALF_SPREAD: Decimal = dec!(0.01);

/// Estimated cost of crossing the book, per unit price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Half of the bid/ask spread
    pub half_spread: Decimal,
    /// Exchange fee rate
    pub fee: Decimal,
    /// Slippage estimated from liquidity
    pub slippage: Decimal,
}

impl CostBreakdown {
    /// Estimate costs for a snapshot
    pub fn estimate(snapshot: &MarketSnapshot) -> Self {
        Self {
            half_spread: snapshot
                .spread()
                .map(|s| s / dec!(2))
                .unwrap_or(DEFAULT_HALF_SPREAD),
            fee: snapshot.fee_rate().unwrap_or(Decimal::ZERO),
            slippage: slippage_heuristic(snapshot.liquidity()),
        }
    }

    pub fn total(&self) -> Decimal {
        self.half_spread + self.fee + self.slippage
    }
}

/// Slippage tiers by market liquidity (USD)
pub fn slippage_heuristic(liquidity: Decimal) -> Decimal {
    if liquidity < dec!(2000) {
        dec!(0.03)
    } else if liquidity < dec!(10000) {
        dec!(0.015)
    } else {
        dec!(0.0075)
    }
}
