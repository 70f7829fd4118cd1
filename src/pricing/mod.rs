//! Fair probability module
//!
//! De-vigs observed quotes and blends them with an optional reference

mod blend;
mod fair;
mod reference;

pub use blend::{create_blender, BlendStrategy, MarketOnly, WeightedBlend};
pub use fair::{de_vig, mid_implied, ConfidenceThresholds, FairProbabilityEngine};
pub use reference::{
    consensus_probability, devig_decimal_odds, match_reference, parse_reference_odds,
};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Confidence in a fair probability estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Tight spread and deep book
    High,
    /// Exactly one of the two
    Medium,
    /// Neither
    Low,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
        }
    }
}

/// Fair probability estimate for the YES outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairProbabilityResult {
    /// Midpoint of bid and ask (or the single quoted side)
    pub mid_implied: Decimal,
    /// Quote with the embedded margin removed
    pub de_vigged: Decimal,
    /// De-vigged price blended with the reference
    pub blended: Decimal,
    pub confidence: Confidence,
    /// Reference probability that went into the blend
    pub reference_probability: Option<Decimal>,
    /// De-vig was degenerate and fell back to the mid
    pub devig_fallback: bool,
    /// Name of the blend strategy
    pub blend_method: String,
}
