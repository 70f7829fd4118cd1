//! Analysis report module
//!
//! Bundles snapshot, fair probability, gate decision, sizing, costs and
//! quality into one serializable report and renders it as markdown.

mod assembler;
mod quality;
mod render;

pub use assembler::ReportAssembler;
pub use quality::{MarketQuality, QualityGrade};
pub use render::render_markdown;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gate::{CostBreakdown, EdgeDecision, GateThresholds};
use crate::market::MarketSnapshot;
use crate::pricing::FairProbabilityResult;
use crate::risk::SizingResult;
use crate::selection::CandidateList;

/// Complete result of one analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Free-text query, absent for direct URL lookups
    pub query: Option<String>,
    pub snapshot: MarketSnapshot,
    /// Runner-up candidates, only when there were any
    pub candidates: Option<CandidateList>,
    pub fair: FairProbabilityResult,
    pub decision: EdgeDecision,
    pub sizing: SizingResult,
    pub costs: CostBreakdown,
    pub quality: MarketQuality,
    /// Gate thresholds the decision was made against
    pub thresholds: GateThresholds,
}

impl AnalysisReport {
    pub fn to_markdown(&self) -> String {
        render_markdown(self)
    }
}
