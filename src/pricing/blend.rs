//! Blend strategies for market and reference probabilities

use rust_decimal::Decimal;

use crate::config::{BlendMode, PricingConfig};
use crate::error::AnalysisError;

/// Combines the de-vigged market probability with an optional reference
pub trait BlendStrategy: Send + Sync {
    /// Produce the blended probability
    fn blend(&self, de_vigged: Decimal, reference: Option<Decimal>) -> Decimal;

    /// Strategy name for reports
    fn name(&self) -> &'static str;
}

/// Fixed-weight linear blend
///
/// `blended = w * de_vigged + (1 - w) * reference`
#[derive(Debug, Clone)]
pub struct WeightedBlend {
    market_weight: Decimal,
}

impl WeightedBlend {
    /// Create a blend with the given weight on the market price
    pub fn new(market_weight: Decimal) -> Result<Self, AnalysisError> {
        if market_weight < Decimal::ZERO || market_weight > Decimal::ONE {
            return Err(AnalysisError::Configuration(format!(
                "blend weight {market_weight} outside [0, 1]"
            )));
        }
        Ok(Self { market_weight })
    }

    pub fn market_weight(&self) -> Decimal {
        self.market_weight
    }
}

impl BlendStrategy for WeightedBlend {
    fn blend(&self, de_vigged: Decimal, reference: Option<Decimal>) -> Decimal {
        match reference {
            Some(r) => self.market_weight * de_vigged + (Decimal::ONE - self.market_weight) * r,
            None => de_vigged,
        }
    }

    fn name(&self) -> &'static str {
        "weighted"
    }
}

/// Ignores the reference entirely
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketOnly;

impl BlendStrategy for MarketOnly {
    fn blend(&self, de_vigged: Decimal, _reference: Option<Decimal>) -> Decimal {
        de_vigged
    }

    fn name(&self) -> &'static str {
        "market_only"
    }
}

/// Create a blend strategy based on configuration
pub fn create_blender(config: &PricingConfig) -> Result<Box<dyn BlendStrategy>, AnalysisError> {
    match config.blend_mode {
        BlendMode::Weighted => Ok(Box::new(WeightedBlend::new(config.blend_weight)?)),
        BlendMode::MarketOnly => Ok(Box::new(MarketOnly)),
    }
}
