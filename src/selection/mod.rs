//! Candidate selection module
//!
//! Picks one tradable market out of search or event results

mod selector;

pub use selector::{CandidateSelector, Selection, MAX_OTHERS};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::market::MarketSnapshot;

/// Ranked summary of a candidate market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    /// 1-based rank, the chosen market is rank 1
    pub rank: usize,
    pub market_id: String,
    pub slug: String,
    pub question: String,
    pub liquidity: Decimal,
    pub volume_24hr: Decimal,
    pub start_date: Option<DateTime<Utc>>,
}

impl CandidateSummary {
    fn from_snapshot(rank: usize, snapshot: &MarketSnapshot) -> Self {
        Self {
            rank,
            market_id: snapshot.market_id().to_string(),
            slug: snapshot.slug().to_string(),
            question: snapshot.question().to_string(),
            liquidity: snapshot.liquidity(),
            volume_24hr: snapshot.volume_24hr(),
            start_date: snapshot.start_date(),
        }
    }
}

/// Runner-up markets shown for transparency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateList {
    /// Query the candidates were selected for
    pub query: String,
    /// Candidates ranked 2 and below
    pub entries: Vec<CandidateSummary>,
}

impl CandidateList {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
