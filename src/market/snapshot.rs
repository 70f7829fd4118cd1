//! Normalized point-in-time view of one market
//!
//! Snapshots are built once from fetch results and never mutated. Quote
//! hydration and reference attachment consume the snapshot and return a
//! new validated one.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Immutable market snapshot consumed by the decision engine
///
/// Deserialization runs the same validation as the builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SnapshotFields")]
pub struct MarketSnapshot {
    market_id: String,
    slug: String,
    question: String,
    active: bool,
    closed: bool,
    liquidity: Decimal,
    volume_24hr: Decimal,
    start_date: Option<DateTime<Utc>>,
    best_bid: Option<Decimal>,
    best_ask: Option<Decimal>,
    fee_rate: Option<Decimal>,
    reference_probability: Option<Decimal>,
    token_id: Option<String>,
    sports_related: bool,
    fetched_at: DateTime<Utc>,
}

impl MarketSnapshot {
    /// Start building a snapshot
    pub fn builder(market_id: impl Into<String>, question: impl Into<String>) -> SnapshotBuilder {
        SnapshotBuilder::new(market_id, question)
    }

    pub fn market_id(&self) -> &str {
        &self.market_id
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn closed(&self) -> bool {
        self.closed
    }

    /// Open for trading: active and not closed
    pub fn is_tradable(&self) -> bool {
        self.active && !self.closed
    }

    pub fn liquidity(&self) -> Decimal {
        self.liquidity
    }

    pub fn volume_24hr(&self) -> Decimal {
        self.volume_24hr
    }

    pub fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.best_bid
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.best_ask
    }

    /// Fee as a fraction of notional
    pub fn fee_rate(&self) -> Option<Decimal> {
        self.fee_rate
    }

    pub fn reference_probability(&self) -> Option<Decimal> {
        self.reference_probability
    }

    /// YES token id, used for CLOB reads
    pub fn token_id(&self) -> Option<&str> {
        self.token_id.as_deref()
    }

    pub fn sports_related(&self) -> bool {
        self.sports_related
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Whether at least one side of the book is quoted
    pub fn has_quotes(&self) -> bool {
        self.best_bid.is_some() || self.best_ask.is_some()
    }

    /// Ask minus bid, only when both sides are quoted
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid, self.best_ask) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Replace the quotes with fresher ones (e.g. from the CLOB)
    pub fn with_quotes(
        self,
        best_bid: Option<Decimal>,
        best_ask: Option<Decimal>,
    ) -> Result<Self, AnalysisError> {
        SnapshotBuilder { inner: self }
            .quotes(best_bid, best_ask)
            .build()
    }

    /// Attach a fee rate
    pub fn with_fee_rate(self, fee_rate: Decimal) -> Result<Self, AnalysisError> {
        SnapshotBuilder { inner: self }.fee_rate(fee_rate).build()
    }

    /// Attach an externally supplied reference probability
    pub fn with_reference_probability(self, probability: Decimal) -> Result<Self, AnalysisError> {
        SnapshotBuilder { inner: self }
            .reference_probability(probability)
            .build()
    }

    fn validate(&self) -> Result<(), AnalysisError> {
        let unit = |name: &str, value: Option<Decimal>| -> Result<(), AnalysisError> {
            match value {
                Some(v) if v < Decimal::ZERO || v > Decimal::ONE => Err(
                    AnalysisError::InvalidSnapshot(format!("{name} {v} outside [0, 1]")),
                ),
                _ => Ok(()),
            }
        };
        unit("best_bid", self.best_bid)?;
        unit("best_ask", self.best_ask)?;

        if let (Some(bid), Some(ask)) = (self.best_bid, self.best_ask) {
            if bid > ask {
                return Err(AnalysisError::InvalidSnapshot(format!(
                    "crossed book: bid {bid} > ask {ask}"
                )));
            }
        }

        if self.liquidity < Decimal::ZERO {
            return Err(AnalysisError::InvalidSnapshot(format!(
                "negative liquidity {}",
                self.liquidity
            )));
        }
        if self.volume_24hr < Decimal::ZERO {
            return Err(AnalysisError::InvalidSnapshot(format!(
                "negative volume {}",
                self.volume_24hr
            )));
        }
        if let Some(fee) = self.fee_rate {
            if fee < Decimal::ZERO {
                return Err(AnalysisError::InvalidSnapshot(format!(
                    "negative fee rate {fee}"
                )));
            }
        }
        if let Some(p) = self.reference_probability {
            if p <= Decimal::ZERO || p >= Decimal::ONE {
                return Err(AnalysisError::InvalidSnapshot(format!(
                    "reference probability {p} outside (0, 1)"
                )));
            }
        }
        Ok(())
    }
}

/// Wire form of a snapshot before validation
#[derive(Deserialize)]
struct SnapshotFields {
    market_id: String,
    slug: String,
    question: String,
    active: bool,
    closed: bool,
    liquidity: Decimal,
    volume_24hr: Decimal,
    start_date: Option<DateTime<Utc>>,
    best_bid: Option<Decimal>,
    best_ask: Option<Decimal>,
    fee_rate: Option<Decimal>,
    reference_probability: Option<Decimal>,
    token_id: Option<String>,
    sports_related: bool,
    fetched_at: DateTime<Utc>,
}

impl TryFrom<SnapshotFields> for MarketSnapshot {
    type Error = AnalysisError;

    fn try_from(f: SnapshotFields) -> Result<Self, Self::Error> {
        let snapshot = MarketSnapshot {
            market_id: f.market_id,
            slug: f.slug,
            question: f.question,
            active: f.active,
            closed: f.closed,
            liquidity: f.liquidity,
            volume_24hr: f.volume_24hr,
            start_date: f.start_date,
            best_bid: f.best_bid,
            best_ask: f.best_ask,
            fee_rate: f.fee_rate,
            reference_probability: f.reference_probability,
            token_id: f.token_id,
            sports_related: f.sports_related,
            fetched_at: f.fetched_at,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }
}

/// Builder for [`MarketSnapshot`]
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    inner: MarketSnapshot,
}

impl SnapshotBuilder {
    fn new(market_id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            inner: MarketSnapshot {
                market_id: market_id.into(),
                slug: String::new(),
                question: question.into(),
                active: true,
                closed: false,
                liquidity: Decimal::ZERO,
                volume_24hr: Decimal::ZERO,
                start_date: None,
                best_bid: None,
                best_ask: None,
                fee_rate: None,
                reference_probability: None,
                token_id: None,
                sports_related: true,
                fetched_at: Utc::now(),
            },
        }
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.inner.slug = slug.into();
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.inner.active = active;
        self
    }

    pub fn closed(mut self, closed: bool) -> Self {
        self.inner.closed = closed;
        self
    }

    pub fn liquidity(mut self, liquidity: Decimal) -> Self {
        self.inner.liquidity = liquidity;
        self
    }

    pub fn volume_24hr(mut self, volume: Decimal) -> Self {
        self.inner.volume_24hr = volume;
        self
    }

    pub fn start_date(mut self, start_date: Option<DateTime<Utc>>) -> Self {
        self.inner.start_date = start_date;
        self
    }

    pub fn quotes(mut self, best_bid: Option<Decimal>, best_ask: Option<Decimal>) -> Self {
        self.inner.best_bid = best_bid;
        self.inner.best_ask = best_ask;
        self
    }

    pub fn fee_rate(mut self, fee_rate: Decimal) -> Self {
        self.inner.fee_rate = Some(fee_rate);
        self
    }

    pub fn reference_probability(mut self, probability: Decimal) -> Self {
        self.inner.reference_probability = Some(probability);
        self
    }

    pub fn token_id(mut self, token_id: Option<String>) -> Self {
        self.inner.token_id = token_id;
        self
    }

    pub fn sports_related(mut self, sports_related: bool) -> Self {
        self.inner.sports_related = sports_related;
        self
    }

    pub fn fetched_at(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.inner.fetched_at = fetched_at;
        self
    }

    /// Validate invariants and produce the snapshot
    pub fn build(self) -> Result<MarketSnapshot, AnalysisError> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_builder_defaults() {
        let snap = MarketSnapshot::builder("1", "Lakers vs Celtics").build().unwrap();
        assert!(snap.is_tradable());
        assert!(!snap.has_quotes());
        assert_eq!(snap.liquidity(), dec!(0));
        assert!(snap.spread().is_none());
    }

    #[test]
    fn test_spread() {
        let snap = MarketSnapshot::builder("1", "q")
            .quotes(Some(dec!(0.45)), Some(dec!(0.55)))
            .build()
            .unwrap();
        assert_eq!(snap.spread(), Some(dec!(0.10)));
    }

    #[test]
    fn test_deserialize_validates() {
        let snap = MarketSnapshot::builder("1", "q")
            .quotes(Some(dec!(0.45)), Some(dec!(0.55)))
            .build()
            .unwrap();
        let mut value = serde_json::to_value(&snap).unwrap();
        let back: MarketSnapshot = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(back, snap);

        value["best_bid"] = serde_json::json!("0.9");
        let err = serde_json::from_value::<MarketSnapshot>(value).unwrap_err();
        assert!(err.to_string().contains("crossed book"));
    }

    #[test]
    fn test_crossed_book_rejected() {
        let result = MarketSnapshot::builder("1", "q")
            .quotes(Some(dec!(0.60)), Some(dec!(0.55)))
            .build();
        assert!(matches!(result, Err(AnalysisError::InvalidSnapshot(_))));
    }

    #[test]
    fn test_quote_out_of_range_rejected() {
        let result = MarketSnapshot::builder("1", "q")
            .quotes(None, Some(dec!(1.2)))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_reference_bounds() {
        let snap = MarketSnapshot::builder("1", "q").build().unwrap();
        assert!(snap.clone().with_reference_probability(dec!(0)).is_err());
        assert!(snap.clone().with_reference_probability(dec!(1)).is_err());
        let snap = snap.with_reference_probability(dec!(0.52)).unwrap();
        assert_eq!(snap.reference_probability(), Some(dec!(0.52)));
    }

    #[test]
    fn test_with_quotes_keeps_metadata() {
        let snap = MarketSnapshot::builder("42", "q")
            .slug("nba-lal-bos")
            .liquidity(dec!(1500))
            .build()
            .unwrap()
            .with_quotes(Some(dec!(0.40)), Some(dec!(0.42)))
            .unwrap();
        assert_eq!(snap.slug(), "nba-lal-bos");
        assert_eq!(snap.liquidity(), dec!(1500));
        assert_eq!(snap.best_bid(), Some(dec!(0.40)));
    }

    #[test]
    fn test_negative_fee_rejected() {
        let snap = MarketSnapshot::builder("1", "q").build().unwrap();
        assert!(snap.with_fee_rate(dec!(-0.01)).is_err());
    }
}
