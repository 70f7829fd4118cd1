//! Analysis error taxonomy
//!
//! Every failure of the decision engine is terminal for the single analysis
//! call that produced it. Fetch-layer failures stay in `anyhow` and wrap
//! these where the cause is known.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors produced by the decision engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// Selection found nothing active and open
    #[error("No active candidate market for {0:?}")]
    NoActiveCandidate(String),
    /// A URL or slug resolved to no market at all
    #[error("Market not found: {0}")]
    MarketNotFound(String),
    /// Neither bid nor ask is available
    #[error("Insufficient quotes for market {0}")]
    InsufficientQuotes(String),
    /// A probability left the open unit interval
    #[error("Degenerate probability {value} at {stage}")]
    DegenerateProbability { stage: &'static str, value: Decimal },
    /// Snapshot data violates its invariants
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
    /// Missing or out-of-range configuration value
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AnalysisError {
    /// Plain-language explanation for end users
    pub fn user_message(&self) -> &'static str {
        match self {
            AnalysisError::NoActiveCandidate(_) => {
                "No tradable market found: every match candidate is closed or inactive."
            }
            AnalysisError::MarketNotFound(_) => {
                "No market found for that link or description."
            }
            AnalysisError::InsufficientQuotes(_) => {
                "Quotes unavailable: the market has no bid or ask, so it cannot be priced."
            }
            AnalysisError::DegenerateProbability { .. } => {
                "The market data produced an impossible probability; the quotes look broken."
            }
            AnalysisError::InvalidSnapshot(_) => {
                "The market data is inconsistent (for example a bid above the ask)."
            }
            AnalysisError::Configuration(_) => {
                "The analyzer is misconfigured; check the threshold settings."
            }
        }
    }

    /// Short stable label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::NoActiveCandidate(_) => "no_active_candidate",
            AnalysisError::MarketNotFound(_) => "market_not_found",
            AnalysisError::InsufficientQuotes(_) => "insufficient_quotes",
            AnalysisError::DegenerateProbability { .. } => "degenerate_probability",
            AnalysisError::InvalidSnapshot(_) => "invalid_snapshot",
            AnalysisError::Configuration(_) => "configuration",
        }
    }
}
