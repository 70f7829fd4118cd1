//! Fair probability engine
//!
//! Pipeline for the YES outcome:
//! - mid = (bid + ask) / 2, or the single quoted side
//! - de-vig = bid / (bid + (1 - ask)), falling back to mid when degenerate
//! - blend with the reference through a [`BlendStrategy`]
//! - grade confidence from spread and liquidity

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{create_blender, BlendStrategy, Confidence, FairProbabilityResult};
use crate::config::PricingConfig;
use crate::error::AnalysisError;
use crate::market::MarketSnapshot;

/// Thresholds for confidence grading
#[derive(Debug, Clone)]
pub struct ConfidenceThresholds {
    /// Spread at or below which quotes count as tight
    pub spread_max: Decimal,
    /// Liquidity at or above which the book counts as deep
    pub liquidity_min: Decimal,
}

impl ConfidenceThresholds {
    pub fn from_config(config: &PricingConfig) -> Self {
        Self {
            spread_max: config.confidence_spread_max,
            liquidity_min: config.confidence_liquidity_min,
        }
    }

    /// Grade a spread/liquidity pair; unknown spread is never tight
    pub fn grade(&self, spread: Option<Decimal>, liquidity: Decimal) -> Confidence {
        let tight = spread.is_some_and(|s| s <= self.spread_max);
        let deep = liquidity >= self.liquidity_min;
        match (tight, deep) {
            (true, true) => Confidence::High,
            (true, false) | (false, true) => Confidence::Medium,
            (false, false) => Confidence::Low,
        }
    }
}

/// Converts quotes into a fair probability
pub struct FairProbabilityEngine {
    blender: Box<dyn BlendStrategy>,
    thresholds: ConfidenceThresholds,
}

impl FairProbabilityEngine {
    /// Create an engine with an explicit blend strategy
    pub fn new(blender: Box<dyn BlendStrategy>, thresholds: ConfidenceThresholds) -> Self {
        Self {
            blender,
            thresholds,
        }
    }

    /// Create from PricingConfig
    pub fn from_config(config: &PricingConfig) -> Result<Self, AnalysisError> {
        Ok(Self::new(
            create_blender(config)?,
            ConfidenceThresholds::from_config(config),
        ))
    }

    /// Name of the configured blend strategy
    pub fn blend_method(&self) -> &'static str {
        self.blender.name()
    }

    /// Estimate the fair YES probability for a snapshot
    pub fn estimate(
        &self,
        snapshot: &MarketSnapshot,
    ) -> Result<FairProbabilityResult, AnalysisError> {
        let bid = snapshot.best_bid();
        let ask = snapshot.best_ask();

        let mid = mid_implied(bid, ask)
            .ok_or_else(|| AnalysisError::InsufficientQuotes(snapshot.market_id().to_string()))?;
        let mid = ensure_open_unit("mid_implied", mid)?;

        let (de_vigged, devig_fallback) = match de_vig(bid, ask) {
            Some(p) => (p, false),
            None => (mid, true),
        };
        let de_vigged = ensure_open_unit("de_vig", de_vigged)?;

        let reference = snapshot.reference_probability();
        let blended = ensure_open_unit("blend", self.blender.blend(de_vigged, reference))?;

        let confidence = self
            .thresholds
            .grade(snapshot.spread(), snapshot.liquidity());

        tracing::debug!(
            market = snapshot.market_id(),
            %mid,
            %de_vigged,
            %blended,
            devig_fallback,
            %confidence,
            "Estimated fair probability"
        );

        Ok(FairProbabilityResult {
            mid_implied: mid,
            de_vigged,
            blended,
            confidence,
            reference_probability: reference,
            devig_fallback,
            blend_method: self.blender.name().to_string(),
        })
    }
}

/// Midpoint of the quotes, or the single side that is quoted
pub fn mid_implied(bid: Option<Decimal>, ask: Option<Decimal>) -> Option<Decimal> {
    match (bid, ask) {
        (Some(b), Some(a)) => Some((b + a) / dec!(2)),
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    }
}

/// Remove the overround from a two-sided quote
///
/// The NO side is implied at `1 - ask`, so the quoted book sums to
/// `bid + (1 - ask)`; normalizing by that sum removes the margin.
/// Returns `None` when the result is degenerate.
pub fn de_vig(bid: Option<Decimal>, ask: Option<Decimal>) -> Option<Decimal> {
    let (bid, ask) = (bid?, ask?);
    if ask >= Decimal::ONE {
        return None;
    }
    let denominator = bid + (Decimal::ONE - ask);
    if denominator <= Decimal::ZERO {
        return None;
    }
    let p = bid / denominator;
    (p > Decimal::ZERO && p < Decimal::ONE).then_some(p)
}

fn ensure_open_unit(stage: &'static str, value: Decimal) -> Result<Decimal, AnalysisError> {
    if value > Decimal::ZERO && value < Decimal::ONE {
        Ok(value)
    } else {
        Err(AnalysisError::DegenerateProbability { stage, value })
    }
}
