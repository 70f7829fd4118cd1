//! Report assembly

use chrono::Utc;
use uuid::Uuid;

use super::{AnalysisReport, MarketQuality};
use crate::gate::{CostBreakdown, EdgeDecision, GateThresholds};
use crate::market::MarketSnapshot;
use crate::pricing::FairProbabilityResult;
use crate::risk::SizingResult;
use crate::selection::CandidateList;

/// Bundles the pipeline outputs into an [`AnalysisReport`]
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    thresholds: GateThresholds,
}

impl ReportAssembler {
    /// `thresholds` are echoed into the report for the what-would-change section
    pub fn new(thresholds: GateThresholds) -> Self {
        Self { thresholds }
    }

    pub fn assemble(
        &self,
        query: Option<String>,
        snapshot: MarketSnapshot,
        candidates: Option<CandidateList>,
        fair: FairProbabilityResult,
        decision: EdgeDecision,
        sizing: SizingResult,
    ) -> AnalysisReport {
        let costs = CostBreakdown::estimate(&snapshot);
        let quality = MarketQuality::assess(&snapshot);

        AnalysisReport {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            query,
            snapshot,
            candidates: candidates.filter(|c| !c.is_empty()),
            fair,
            decision,
            sizing,
            costs,
            quality,
            thresholds: self.thresholds.clone(),
        }
    }
}
