//! Edge and EV gate
//!
//! For the chosen side with price `c` and fee rate `f`:
//! - breakeven = c * (1 + f)
//! - edge = p - c
//! - EV per unit stake = (p - breakeven) / breakeven
//!
//! Every failing threshold adds a reason code; edge and EV are always
//! reported so a rejection can still be explained.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{EdgeDecision, ReasonCode, Side};
use crate::config::GateConfig;
use crate::market::MarketSnapshot;
use crate::pricing::FairProbabilityResult;

/// Named thresholds for the gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateThresholds {
    pub ev_min: Decimal,
    pub liq_min: Decimal,
    pub spread_max: Decimal,
}

impl GateThresholds {
    pub fn from_config(config: &GateConfig) -> Self {
        Self {
            ev_min: config.ev_min,
            liq_min: config.liq_min,
            spread_max: config.spread_max,
        }
    }
}

/// Approves or rejects a position
#[derive(Debug, Clone)]
pub struct EdgeGate {
    thresholds: GateThresholds,
}

impl EdgeGate {
    pub fn new(thresholds: GateThresholds) -> Self {
        Self { thresholds }
    }

    /// Create from GateConfig
    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(GateThresholds::from_config(config))
    }

    pub fn thresholds(&self) -> &GateThresholds {
        &self.thresholds
    }

    /// Evaluate edge, EV and thresholds for one side
    pub fn evaluate(
        &self,
        snapshot: &MarketSnapshot,
        fair: &FairProbabilityResult,
        side: Side,
    ) -> EdgeDecision {
        let (fair_probability, market_implied) = match side {
            Side::Back => (fair.blended, fair.mid_implied),
            Side::Lay => (
                Decimal::ONE - fair.blended,
                Decimal::ONE - fair.mid_implied,
            ),
        };

        let fee_rate = snapshot.fee_rate().unwrap_or(Decimal::ZERO);
        let breakeven = market_implied * (Decimal::ONE + fee_rate);

        let edge = fair_probability - market_implied;
        // mid is inside (0, 1), so breakeven is positive
        let expected_value = (fair_probability - breakeven) / breakeven;
        let required_probability = breakeven * (Decimal::ONE + self.thresholds.ev_min);
        let max_price = fair_probability
            .checked_div((Decimal::ONE + fee_rate) * (Decimal::ONE + self.thresholds.ev_min))
            .unwrap_or(Decimal::ZERO);

        let mut reject_reasons = BTreeSet::new();
        if expected_value < self.thresholds.ev_min {
            reject_reasons.insert(ReasonCode::EvTooLow);
        }
        if snapshot.liquidity() < self.thresholds.liq_min {
            reject_reasons.insert(ReasonCode::LiquidityTooLow);
        }
        match snapshot.spread() {
            Some(spread) if spread <= self.thresholds.spread_max => {}
            _ => {
                reject_reasons.insert(ReasonCode::SpreadTooWide);
            }
        }

        let approved = reject_reasons.is_empty();

        tracing::debug!(
            market = snapshot.market_id(),
            %side,
            %edge,
            %expected_value,
            approved,
            reasons = ?reject_reasons,
            "Evaluated edge gate"
        );

        EdgeDecision {
            side,
            fair_probability,
            market_implied,
            breakeven,
            edge,
            expected_value,
            required_probability,
            max_price,
            approved,
            reject_reasons,
        }
    }
}
