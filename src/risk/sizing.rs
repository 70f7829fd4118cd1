//! Fractional Kelly position sizing with hard caps
//!
//! The stake is the smallest of the Kelly stake, the per-bet maximum and the
//! remaining daily exposure. Exact ties are attributed in the order
//! max bet, daily exposure, Kelly fraction.

use rust_decimal::Decimal;

use super::kelly::full_kelly;
use super::{CappedBy, SizingResult, StakeLimits};
use crate::config::SizingConfig;
use crate::error::AnalysisError;
use crate::gate::EdgeDecision;

/// Fractional Kelly position sizer
#[derive(Debug, Clone)]
pub struct PositionSizer {
    kelly_scale: Decimal,
}

impl PositionSizer {
    /// Create a sizer; `kelly_scale` must be in (0, 1]
    pub fn new(kelly_scale: Decimal) -> Result<Self, AnalysisError> {
        if kelly_scale <= Decimal::ZERO || kelly_scale > Decimal::ONE {
            return Err(AnalysisError::Configuration(format!(
                "kelly scale {kelly_scale} outside (0, 1]"
            )));
        }
        Ok(Self { kelly_scale })
    }

    /// Create from SizingConfig
    pub fn from_config(config: &SizingConfig) -> Result<Self, AnalysisError> {
        Self::new(config.kelly_scale)
    }

    pub fn kelly_scale(&self) -> Decimal {
        self.kelly_scale
    }

    /// Recommend a stake for a gated decision
    ///
    /// Rejected decisions get a zero stake.
    pub fn size(&self, decision: &EdgeDecision, limits: &StakeLimits) -> SizingResult {
        if !decision.approved {
            return SizingResult::none();
        }

        let full = full_kelly(decision.fair_probability, decision.breakeven);
        let kelly_fraction = full * self.kelly_scale;
        if kelly_fraction <= Decimal::ZERO {
            return SizingResult {
                full_kelly: full,
                ..SizingResult::none()
            };
        }

        let kelly_stake = (kelly_fraction * limits.bankroll()).min(limits.bankroll());

        // First strictly smaller bound wins, so ties keep the earlier entry
        let bounds = [
            (limits.max_bet(), CappedBy::MaxBet),
            (limits.daily_exposure_remaining(), CappedBy::DailyExposure),
            (kelly_stake, CappedBy::KellyFraction),
        ];
        let (recommended_stake, capped_by) = bounds
            .into_iter()
            .fold(None, |best: Option<(Decimal, CappedBy)>, (value, cap)| match best {
                Some((current, _)) if current <= value => best,
                _ => Some((value, cap)),
            })
            .unwrap_or((Decimal::ZERO, CappedBy::None));

        tracing::debug!(
            %full,
            %kelly_fraction,
            %recommended_stake,
            %capped_by,
            "Sized position"
        );

        SizingResult {
            full_kelly: full,
            kelly_fraction,
            recommended_stake,
            capped_by,
        }
    }
}
