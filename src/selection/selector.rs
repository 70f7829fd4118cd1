//! Deterministic candidate ranking
//!
//! Ranking keys, strictly in order:
//! 1. sports-related markets first
//! 2. active and open
//! 3. higher liquidity
//! 4. higher 24h volume
//! 5. start date closest to `now` (unknown start dates last)
//!
//! Full ties keep their search order.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use super::{CandidateList, CandidateSummary};
use crate::error::AnalysisError;
use crate::market::MarketSnapshot;

/// Maximum number of runner-up candidates reported
pub const MAX_OTHERS: usize = 5;

/// Outcome of candidate selection
#[derive(Debug, Clone)]
pub struct Selection {
    /// Query the selection was made for
    pub query: String,
    /// Top-ranked market
    pub chosen: MarketSnapshot,
    /// Next best markets, at most [`MAX_OTHERS`]
    pub others: Vec<MarketSnapshot>,
}

impl Selection {
    /// Build the transparency list (ranks start at 2)
    pub fn candidate_list(&self) -> CandidateList {
        CandidateList {
            query: self.query.clone(),
            entries: self
                .others
                .iter()
                .enumerate()
                .map(|(i, snap)| CandidateSummary::from_snapshot(i + 2, snap))
                .collect(),
        }
    }
}

/// Picks the best active sports market
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateSelector;

impl CandidateSelector {
    pub fn new() -> Self {
        Self
    }

    /// Rank candidates and split into chosen + runners-up
    pub fn select(
        &self,
        candidates: Vec<MarketSnapshot>,
        query: &str,
        now: DateTime<Utc>,
    ) -> Result<Selection, AnalysisError> {
        let total = candidates.len();
        let mut pool: Vec<MarketSnapshot> =
            candidates.into_iter().filter(|c| c.is_tradable()).collect();

        if pool.is_empty() {
            tracing::info!(query, total, "No active candidates after filtering");
            return Err(AnalysisError::NoActiveCandidate(query.to_string()));
        }

        // sort_by is stable, so full ties keep search order
        pool.sort_by(|a, b| compare(a, b, now));

        let mut ranked = pool.into_iter();
        let chosen = ranked
            .next()
            .ok_or_else(|| AnalysisError::NoActiveCandidate(query.to_string()))?;
        let others: Vec<MarketSnapshot> = ranked.take(MAX_OTHERS).collect();

        tracing::debug!(
            query,
            total,
            chosen = chosen.slug(),
            others = others.len(),
            "Selected candidate market"
        );

        Ok(Selection {
            query: query.to_string(),
            chosen,
            others,
        })
    }
}

fn compare(a: &MarketSnapshot, b: &MarketSnapshot, now: DateTime<Utc>) -> Ordering {
    b.sports_related()
        .cmp(&a.sports_related())
        .then_with(|| b.is_tradable().cmp(&a.is_tradable()))
        .then_with(|| b.liquidity().cmp(&a.liquidity()))
        .then_with(|| b.volume_24hr().cmp(&a.volume_24hr()))
        .then_with(|| start_distance(a, now).cmp(&start_distance(b, now)))
}

/// Seconds between start date and now; unknown sorts last
fn start_distance(snapshot: &MarketSnapshot, now: DateTime<Utc>) -> i64 {
    snapshot
        .start_date()
        .map(|start| (start - now).num_seconds().abs())
        .unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 18, 0, 0).unwrap()
    }

    fn candidate(
        slug: &str,
        liquidity: Decimal,
        volume: Decimal,
        hours_out: Option<i64>,
    ) -> MarketSnapshot {
        MarketSnapshot::builder(slug, format!("Question {slug}"))
            .slug(slug)
            .liquidity(liquidity)
            .volume_24hr(volume)
            .start_date(hours_out.map(|h| now() + Duration::hours(h)))
            .build()
            .unwrap()
    }

    fn closed(slug: &str) -> MarketSnapshot {
        MarketSnapshot::builder(slug, "closed")
            .slug(slug)
            .closed(true)
            .liquidity(dec!(99999))
            .build()
            .unwrap()
    }

    #[test]
    fn test_liquidity_then_volume_then_time() {
        let cands = vec![
            candidate("a", dec!(1000), dec!(500), Some(5)),
            candidate("b", dec!(2000), dec!(100), Some(10)),
            candidate("c", dec!(2000), dec!(300), Some(20)),
        ];
        let sel = CandidateSelector::new().select(cands, "q", now()).unwrap();
        assert_eq!(sel.chosen.slug(), "c");
        let others: Vec<&str> = sel.others.iter().map(|s| s.slug()).collect();
        assert_eq!(others, vec!["b", "a"]);
    }

    #[test]
    fn test_start_date_breaks_tie() {
        let cands = vec![
            candidate("far", dec!(1000), dec!(100), Some(48)),
            candidate("past", dec!(1000), dec!(100), Some(-2)),
            candidate("unknown", dec!(1000), dec!(100), None),
        ];
        let sel = CandidateSelector::new().select(cands, "q", now()).unwrap();
        assert_eq!(sel.chosen.slug(), "past");
        assert_eq!(sel.others[0].slug(), "far");
        assert_eq!(sel.others[1].slug(), "unknown");
    }

    #[test]
    fn test_two_closed_one_active() {
        let cands = vec![
            closed("x"),
            candidate("live", dec!(10), dec!(1), Some(1)),
            closed("y"),
        ];
        let sel = CandidateSelector::new().select(cands, "q", now()).unwrap();
        assert_eq!(sel.chosen.slug(), "live");
        assert!(sel.others.is_empty());
        assert!(sel.candidate_list().is_empty());
    }

    #[test]
    fn test_inactive_filtered() {
        let inactive = MarketSnapshot::builder("i", "q")
            .active(false)
            .liquidity(dec!(50000))
            .build()
            .unwrap();
        let cands = vec![inactive, candidate("ok", dec!(1), dec!(1), None)];
        let sel = CandidateSelector::new().select(cands, "q", now()).unwrap();
        assert_eq!(sel.chosen.market_id(), "ok");
    }

    #[test]
    fn test_no_active_candidate() {
        let result = CandidateSelector::new().select(vec![closed("x"), closed("y")], "lakers", now());
        assert_eq!(
            result.unwrap_err(),
            AnalysisError::NoActiveCandidate("lakers".to_string())
        );
    }

    #[test]
    fn test_empty_input() {
        let result = CandidateSelector::new().select(vec![], "q", now());
        assert!(matches!(result, Err(AnalysisError::NoActiveCandidate(_))));
    }

    #[test]
    fn test_others_capped_at_five() {
        let cands: Vec<MarketSnapshot> = (0..9)
            .map(|i| candidate(&format!("m{i}"), Decimal::from(i * 100), dec!(0), None))
            .collect();
        let sel = CandidateSelector::new().select(cands, "q", now()).unwrap();
        assert_eq!(sel.chosen.slug(), "m8");
        assert_eq!(sel.others.len(), MAX_OTHERS);
        assert_eq!(sel.others[4].slug(), "m3");
    }

    #[test]
    fn test_chosen_is_permutation_invariant() {
        let base = vec![
            candidate("a", dec!(500), dec!(50), Some(3)),
            candidate("b", dec!(800), dec!(10), Some(30)),
            candidate("c", dec!(800), dec!(20), Some(40)),
            candidate("d", dec!(800), dec!(20), Some(2)),
            closed("e"),
        ];
        let selector = CandidateSelector::new();
        let expected = selector.select(base.clone(), "q", now()).unwrap();
        assert_eq!(expected.chosen.slug(), "d");

        let mut rotated = base.clone();
        for _ in 0..base.len() {
            rotated.rotate_left(1);
            let sel = selector.select(rotated.clone(), "q", now()).unwrap();
            assert_eq!(sel.chosen.slug(), expected.chosen.slug());
        }
        let mut reversed = base;
        reversed.reverse();
        let sel = selector.select(reversed, "q", now()).unwrap();
        assert_eq!(sel.chosen.slug(), "d");
    }

    #[test]
    fn test_exact_ties_keep_search_order() {
        let cands = vec![
            candidate("first", dec!(100), dec!(10), Some(1)),
            candidate("second", dec!(100), dec!(10), Some(1)),
        ];
        let sel = CandidateSelector::new().select(cands, "q", now()).unwrap();
        assert_eq!(sel.chosen.slug(), "first");
        assert_eq!(sel.others[0].slug(), "second");
    }

    #[test]
    fn test_sports_markets_preferred() {
        let crypto = MarketSnapshot::builder("btc", "Will BTC hit 200k?")
            .liquidity(dec!(50000))
            .sports_related(false)
            .build()
            .unwrap();
        let nba = candidate("nba", dec!(1000), dec!(0), None);
        let sel = CandidateSelector::new().select(vec![crypto, nba], "q", now()).unwrap();
        assert_eq!(sel.chosen.market_id(), "nba");
        assert_eq!(sel.others.len(), 1);
    }

    #[test]
    fn test_candidate_list_ranks() {
        let cands = vec![
            candidate("a", dec!(3), dec!(0), None),
            candidate("b", dec!(2), dec!(0), None),
            candidate("c", dec!(1), dec!(0), None),
        ];
        let list = CandidateSelector::new()
            .select(cands, "lakers celtics", now())
            .unwrap()
            .candidate_list();
        assert_eq!(list.query, "lakers celtics");
        assert_eq!(list.len(), 2);
        assert_eq!(list.entries[0].rank, 2);
        assert_eq!(list.entries[1].rank, 3);
        assert_eq!(list.entries[1].slug, "c");
    }
}
