//! Risk management types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::SizingConfig;
use crate::error::AnalysisError;

/// Which bound determined the recommended stake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CappedBy {
    /// No stake recommended
    None,
    /// Per-bet maximum
    MaxBet,
    /// Remaining daily exposure
    DailyExposure,
    /// The fractional Kelly stake itself
    KellyFraction,
}

impl std::fmt::Display for CappedBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CappedBy::None => write!(f, "none"),
            CappedBy::MaxBet => write!(f, "max bet"),
            CappedBy::DailyExposure => write!(f, "daily exposure"),
            CappedBy::KellyFraction => write!(f, "kelly fraction"),
        }
    }
}

/// Stake recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingResult {
    /// Full Kelly fraction before scaling
    pub full_kelly: Decimal,
    /// Fraction of bankroll after fractional Kelly
    pub kelly_fraction: Decimal,
    /// Stake in USD
    pub recommended_stake: Decimal,
    pub capped_by: CappedBy,
}

impl SizingResult {
    /// Zero stake
    pub fn none() -> Self {
        Self {
            full_kelly: Decimal::ZERO,
            kelly_fraction: Decimal::ZERO,
            recommended_stake: Decimal::ZERO,
            capped_by: CappedBy::None,
        }
    }
}

/// Bankroll and hard caps for one sizing call
#[derive(Debug, Clone, PartialEq)]
pub struct StakeLimits {
    bankroll: Decimal,
    max_bet: Decimal,
    daily_exposure_remaining: Decimal,
}

impl StakeLimits {
    /// Validate and create limits
    pub fn new(
        bankroll: Decimal,
        max_bet: Decimal,
        daily_exposure_remaining: Decimal,
    ) -> Result<Self, AnalysisError> {
        if bankroll <= Decimal::ZERO {
            return Err(AnalysisError::Configuration(format!(
                "bankroll must be > 0, got {bankroll}"
            )));
        }
        if max_bet <= Decimal::ZERO {
            return Err(AnalysisError::Configuration(format!(
                "max bet must be > 0, got {max_bet}"
            )));
        }
        if daily_exposure_remaining < Decimal::ZERO {
            return Err(AnalysisError::Configuration(format!(
                "daily exposure remaining must be >= 0, got {daily_exposure_remaining}"
            )));
        }
        Ok(Self {
            bankroll,
            max_bet,
            daily_exposure_remaining,
        })
    }

    /// Derive limits from bankroll percentages
    ///
    /// `exposure_used` is what has already been staked today; the remaining
    /// daily exposure never goes below zero.
    pub fn from_config(
        config: &SizingConfig,
        bankroll: Decimal,
        exposure_used: Decimal,
    ) -> Result<Self, AnalysisError> {
        let daily_cap = bankroll * config.max_daily_exposure_pct;
        Self::new(
            bankroll,
            bankroll * config.max_bet_pct,
            (daily_cap - exposure_used).max(Decimal::ZERO),
        )
    }

    pub fn bankroll(&self) -> Decimal {
        self.bankroll
    }

    pub fn max_bet(&self) -> Decimal {
        self.max_bet
    }

    pub fn daily_exposure_remaining(&self) -> Decimal {
        self.daily_exposure_remaining
    }
}
