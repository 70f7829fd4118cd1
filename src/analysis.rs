//! Analysis pipeline
//!
//! [`AnalysisEngine`] is the synchronous core: snapshot in, report out.
//! [`Analyzer`] wraps it with market resolution, optional CLOB hydration and
//! reference attachment over the [`MarketSource`], [`QuoteSource`] and
//! [`ReferenceSource`] seams.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::config::{Config, SizingConfig};
use crate::error::AnalysisError;
use crate::gate::{EdgeGate, GateThresholds, Side};
use crate::market::{
    parse_input, MarketInput, MarketSnapshot, MarketSource, NoReferenceSource, QuoteSource,
    ReferenceSource, SlugKind,
};
use crate::pricing::{
    consensus_probability, devig_decimal_odds, match_reference, parse_reference_odds,
    FairProbabilityEngine,
};
use crate::report::{AnalysisReport, ReportAssembler};
use crate::risk::{PositionSizer, StakeLimits};
use crate::selection::{CandidateList, CandidateSelector, Selection};
use crate::telemetry;

/// Core decision pipeline built from configuration
pub struct AnalysisEngine {
    selector: CandidateSelector,
    fair: FairProbabilityEngine,
    gate: EdgeGate,
    sizer: PositionSizer,
    assembler: ReportAssembler,
    sizing_config: SizingConfig,
}

impl AnalysisEngine {
    /// Build every component from a validated config
    pub fn from_config(config: &Config) -> Result<Self, AnalysisError> {
        config.validate()?;

        Ok(Self {
            selector: CandidateSelector::new(),
            fair: FairProbabilityEngine::from_config(&config.pricing)?,
            gate: EdgeGate::from_config(&config.gate),
            sizer: PositionSizer::from_config(&config.sizing)?,
            assembler: ReportAssembler::new(GateThresholds::from_config(&config.gate)),
            sizing_config: config.sizing.clone(),
        })
    }

    /// Stake limits for a bankroll (config default when absent)
    pub fn limits(
        &self,
        bankroll: Option<Decimal>,
        exposure_used: Decimal,
    ) -> Result<StakeLimits, AnalysisError> {
        let bankroll = bankroll.unwrap_or(self.sizing_config.default_bankroll);
        StakeLimits::from_config(&self.sizing_config, bankroll, exposure_used)
    }

    /// Rank candidates for a query
    pub fn select(
        &self,
        candidates: Vec<MarketSnapshot>,
        query: &str,
        now: DateTime<Utc>,
    ) -> Result<Selection, AnalysisError> {
        self.selector.select(candidates, query, now)
    }

    /// Price, gate, size and assemble a report for one snapshot
    pub fn run(
        &self,
        snapshot: MarketSnapshot,
        side: Side,
        limits: &StakeLimits,
        candidates: Option<CandidateList>,
        query: Option<String>,
    ) -> Result<AnalysisReport, AnalysisError> {
        let fair = self.fair.estimate(&snapshot)?;
        let decision = self.gate.evaluate(&snapshot, &fair, side);
        let sizing = self.sizer.size(&decision, limits);

        telemetry::record_analysis(&decision);
        tracing::info!(
            market = snapshot.market_id(),
            %side,
            fair = %fair.blended,
            ev = %decision.expected_value,
            approved = decision.approved,
            stake = %sizing.recommended_stake,
            capped_by = %sizing.capped_by,
            "Analysis complete"
        );

        Ok(self
            .assembler
            .assemble(query, snapshot, candidates, fair, decision, sizing))
    }
}

/// One user request
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    /// Polymarket URL or free-text match description
    pub text: String,
    pub side: Side,
    /// Bankroll in USD, config default when absent
    pub bankroll: Option<Decimal>,
    /// Amount already staked today
    pub exposure_used: Decimal,
    /// `Name: decimal_odds` lines from an outside bookmaker
    pub reference_odds: Option<String>,
    /// Explicit reference probability for YES, wins over `reference_odds`
    pub reference_probability: Option<Decimal>,
}

impl AnalysisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Reference probability for a market question, if any was supplied
    pub fn reference_for(&self, question: &str) -> Option<Decimal> {
        if self.reference_probability.is_some() {
            return self.reference_probability;
        }

        let odds = parse_reference_odds(self.reference_odds.as_deref()?);
        let probabilities = if odds.len() > 1 {
            devig_decimal_odds(&odds)
        } else {
            odds.iter()
                .map(|(name, o)| (name.clone(), Decimal::ONE / *o))
                .collect()
        };
        match_reference(&probabilities, question)
    }

    /// Whether the user supplied any reference, matched or not
    pub fn has_reference(&self) -> bool {
        self.reference_probability.is_some() || self.reference_odds.is_some()
    }
}

/// Market chosen for analysis plus how it was found
struct Resolved {
    chosen: MarketSnapshot,
    candidates: Option<CandidateList>,
    query: Option<String>,
}

impl Resolved {
    fn single(snapshot: MarketSnapshot) -> Self {
        Self {
            chosen: snapshot,
            candidates: None,
            query: None,
        }
    }

    fn from_selection(selection: Selection, query: Option<String>) -> Self {
        let candidates = Some(selection.candidate_list());
        Self {
            chosen: selection.chosen,
            candidates,
            query,
        }
    }
}

/// Async front of the pipeline
pub struct Analyzer<M, Q, R = NoReferenceSource> {
    engine: AnalysisEngine,
    markets: M,
    quotes: Option<Q>,
    references: Option<R>,
}

impl<M: MarketSource, Q: QuoteSource> Analyzer<M, Q> {
    /// `quotes` is optional; without it Gamma quotes are used as-is
    pub fn new(engine: AnalysisEngine, markets: M, quotes: Option<Q>) -> Self {
        Self {
            engine,
            markets,
            quotes,
            references: None,
        }
    }
}

impl<M: MarketSource, Q: QuoteSource, R: ReferenceSource> Analyzer<M, Q, R> {
    /// Fall back to bookmaker odds when a request carries no reference
    pub fn with_reference_source<S: ReferenceSource>(self, references: Option<S>) -> Analyzer<M, Q, S> {
        Analyzer {
            engine: self.engine,
            markets: self.markets,
            quotes: self.quotes,
            references,
        }
    }

    pub fn engine(&self) -> &AnalysisEngine {
        &self.engine
    }

    /// Resolve, hydrate and analyze
    ///
    /// Typed failures come back as [`AnalysisError`] inside the `anyhow` error.
    pub async fn analyze(&self, request: &AnalysisRequest) -> anyhow::Result<AnalysisReport> {
        let result = self.analyze_inner(request).await;
        if let Err(e) = &result {
            let kind = e
                .downcast_ref::<AnalysisError>()
                .map(AnalysisError::kind)
                .unwrap_or("fetch");
            telemetry::record_failure(kind);
        }
        result
    }

    async fn analyze_inner(&self, request: &AnalysisRequest) -> anyhow::Result<AnalysisReport> {
        let limits = self
            .engine
            .limits(request.bankroll, request.exposure_used)?;

        let resolved = self.resolve(&request.text, Utc::now()).await?;
        let snapshot = self.refresh(resolved.chosen).await?;
        let snapshot = self.hydrate(snapshot).await;

        let snapshot = match request.reference_for(snapshot.question()) {
            Some(p) => snapshot.with_reference_probability(p)?,
            None if !request.has_reference() => self.attach_external_reference(snapshot).await,
            None => snapshot,
        };

        Ok(self.engine.run(
            snapshot,
            request.side,
            &limits,
            resolved.candidates,
            resolved.query,
        )?)
    }

    async fn resolve(&self, text: &str, now: DateTime<Utc>) -> anyhow::Result<Resolved> {
        match parse_input(text) {
            MarketInput::Url { kind, slug } => self.resolve_slug(kind, &slug, now).await,
            MarketInput::Query(query) => {
                if query.is_empty() {
                    return Err(AnalysisError::MarketNotFound(query).into());
                }
                let selection = self.search_and_select(&query, now).await?;
                Ok(Resolved::from_selection(selection, Some(query)))
            }
        }
    }

    /// Event, then market (or the reverse for market links), then search
    async fn resolve_slug(
        &self,
        kind: SlugKind,
        slug: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Resolved> {
        let lookups = match kind {
            SlugKind::Event => [SlugKind::Event, SlugKind::Market],
            SlugKind::Market => [SlugKind::Market, SlugKind::Event],
        };

        for lookup in lookups {
            let found = match lookup {
                SlugKind::Event => self.from_event(slug, now).await,
                SlugKind::Market => self.from_market(slug).await,
            };
            match found {
                Ok(Some(resolved)) => return Ok(resolved),
                Ok(None) => {}
                Err(e) => {
                    // typed failures are final, fetch errors fall through
                    if e.downcast_ref::<AnalysisError>().is_some() {
                        return Err(e);
                    }
                    tracing::warn!(slug, error = %e, "Slug lookup failed");
                }
            }
        }

        let query = slug.replace('-', " ");
        tracing::info!(slug, query = %query, "Slug not found, falling back to search");
        let selection = self.search_and_select(&query, now).await.map_err(|e| {
            match e.downcast_ref::<AnalysisError>() {
                Some(AnalysisError::MarketNotFound(_)) => {
                    AnalysisError::MarketNotFound(slug.to_string()).into()
                }
                _ => e,
            }
        })?;
        Ok(Resolved::from_selection(selection, Some(query)))
    }

    async fn from_event(&self, slug: &str, now: DateTime<Utc>) -> anyhow::Result<Option<Resolved>> {
        let markets = self.markets.event_markets(slug).await?;
        match markets.len() {
            0 => Ok(None),
            1 => {
                let only = markets.into_iter().next().ok_or_else(|| {
                    AnalysisError::MarketNotFound(slug.to_string())
                })?;
                Ok(Some(Resolved::single(ensure_tradable(only)?)))
            }
            _ => {
                let selection = self.engine.select(markets, slug, now)?;
                Ok(Some(Resolved::from_selection(selection, None)))
            }
        }
    }

    async fn from_market(&self, slug: &str) -> anyhow::Result<Option<Resolved>> {
        match self.markets.market_by_slug(slug).await? {
            Some(snapshot) => Ok(Some(Resolved::single(ensure_tradable(snapshot)?))),
            None => Ok(None),
        }
    }

    async fn search_and_select(&self, query: &str, now: DateTime<Utc>) -> anyhow::Result<Selection> {
        let candidates = self.markets.search(query).await?;
        if candidates.is_empty() {
            return Err(AnalysisError::MarketNotFound(query.to_string()).into());
        }
        Ok(self.engine.select(candidates, query, now)?)
    }

    /// Re-fetch a quoteless search hit by slug
    ///
    /// A market that closed since the search fails with `NoActiveCandidate`.
    async fn refresh(&self, snapshot: MarketSnapshot) -> Result<MarketSnapshot, AnalysisError> {
        if snapshot.has_quotes() || snapshot.slug().is_empty() {
            return Ok(snapshot);
        }
        match self.markets.market_by_slug(snapshot.slug()).await {
            Ok(Some(fresh)) if fresh.has_quotes() => {
                tracing::debug!(slug = snapshot.slug(), "Refreshed quotes by slug");
                ensure_tradable(fresh)
            }
            Ok(Some(fresh)) if !fresh.is_tradable() => ensure_tradable(fresh),
            Ok(_) => Ok(snapshot),
            Err(e) => {
                tracing::warn!(slug = snapshot.slug(), error = %e, "Quote refresh failed");
                Ok(snapshot)
            }
        }
    }

    /// Overlay CLOB book and fee; any failure keeps the Gamma values
    async fn hydrate(&self, snapshot: MarketSnapshot) -> MarketSnapshot {
        let Some(quotes) = &self.quotes else {
            return snapshot;
        };
        let Some(token) = snapshot.token_id().map(str::to_string) else {
            return snapshot;
        };
        let token_id = token.as_str();

        let (book, fee) = tokio::join!(quotes.top_of_book(token_id), quotes.fee_rate(token_id));

        let mut snapshot = snapshot;
        match book {
            Ok(top) if top.best_bid.is_some() || top.best_ask.is_some() => {
                match snapshot.clone().with_quotes(top.best_bid, top.best_ask) {
                    Ok(updated) => snapshot = updated,
                    Err(e) => {
                        tracing::warn!(token_id, error = %e, "Rejected CLOB quotes");
                        telemetry::record_quote_fallback("book");
                    }
                }
            }
            Ok(_) => tracing::debug!(token_id, "Empty CLOB book, keeping Gamma quotes"),
            Err(e) => {
                tracing::warn!(token_id, error = %e, "CLOB book fetch failed, keeping Gamma quotes");
                telemetry::record_quote_fallback("book");
            }
        }

        match fee {
            Ok(Some(rate)) => match snapshot.clone().with_fee_rate(rate) {
                Ok(updated) => snapshot = updated,
                Err(e) => tracing::warn!(token_id, error = %e, "Rejected CLOB fee rate"),
            },
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(token_id, error = %e, "CLOB fee fetch failed");
                telemetry::record_quote_fallback("fee");
            }
        }

        snapshot
    }

    /// Consensus bookmaker probability; any failure leaves the snapshot as-is
    async fn attach_external_reference(&self, snapshot: MarketSnapshot) -> MarketSnapshot {
        let Some(references) = &self.references else {
            return snapshot;
        };

        let books = match references.bookmaker_odds(snapshot.question()).await {
            Ok(books) => books,
            Err(e) => {
                tracing::warn!(market = snapshot.market_id(), error = %e, "Reference odds fetch failed");
                telemetry::record_quote_fallback("reference");
                return snapshot;
            }
        };
        let outcomes: Vec<Vec<(String, Decimal)>> =
            books.into_iter().map(|book| book.outcomes).collect();

        let Some(probability) = consensus_probability(&outcomes, snapshot.question()) else {
            tracing::debug!(
                market = snapshot.market_id(),
                bookmakers = outcomes.len(),
                "No bookmaker outcome matches the market"
            );
            return snapshot;
        };

        tracing::info!(
            market = snapshot.market_id(),
            bookmakers = outcomes.len(),
            %probability,
            "Using bookmaker consensus as reference"
        );
        match snapshot.clone().with_reference_probability(probability) {
            Ok(updated) => updated,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected bookmaker reference");
                snapshot
            }
        }
    }
}

fn ensure_tradable(snapshot: MarketSnapshot) -> Result<MarketSnapshot, AnalysisError> {
    if snapshot.is_tradable() {
        Ok(snapshot)
    } else {
        Err(AnalysisError::NoActiveCandidate(snapshot.slug().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot(id: &str, liquidity: Decimal) -> MarketSnapshot {
        MarketSnapshot::builder(id, format!("Market {id}"))
            .liquidity(liquidity)
            .quotes(Some(dec!(0.45)), Some(dec!(0.47)))
            .build()
            .unwrap()
    }

    #[test]
    fn test_engine_runs_scenario() {
        let engine = AnalysisEngine::from_config(&Config::default()).unwrap();
        let limits = engine.limits(None, Decimal::ZERO).unwrap();
        let snap = MarketSnapshot::builder("m", "Will the Lakers win?")
            .liquidity(dec!(20000))
            .quotes(Some(dec!(0.45)), Some(dec!(0.55)))
            .reference_probability(dec!(0.52))
            .build()
            .unwrap();

        let report = engine.run(snap, Side::Back, &limits, None, None).unwrap();
        assert_eq!(report.fair.blended, dec!(0.506));
        assert!(report.candidates.is_none());
    }

    #[test]
    fn test_engine_limits_use_default_bankroll() {
        let engine = AnalysisEngine::from_config(&Config::default()).unwrap();
        let limits = engine.limits(None, dec!(100)).unwrap();
        assert_eq!(limits.bankroll(), dec!(5000));
        assert_eq!(limits.max_bet(), dec!(50));
        assert_eq!(limits.daily_exposure_remaining(), dec!(150));
    }

    #[test]
    fn test_engine_rejects_bad_config() {
        let mut config = Config::default();
        config.sizing.kelly_scale = dec!(0);
        assert!(AnalysisEngine::from_config(&config).is_err());
    }

    #[test]
    fn test_engine_select_delegates() {
        let engine = AnalysisEngine::from_config(&Config::default()).unwrap();
        let selection = engine
            .select(
                vec![snapshot("a", dec!(10)), snapshot("b", dec!(20))],
                "q",
                Utc::now(),
            )
            .unwrap();
        assert_eq!(selection.chosen.market_id(), "b");
        assert_eq!(selection.others.len(), 1);
    }

    #[test]
    fn test_reference_explicit_wins() {
        let request = AnalysisRequest {
            reference_probability: Some(dec!(0.6)),
            reference_odds: Some("Lakers: 1.5".to_string()),
            ..AnalysisRequest::new("x")
        };
        assert_eq!(request.reference_for("Lakers vs Celtics"), Some(dec!(0.6)));
    }

    #[test]
    fn test_reference_from_odds() {
        let request = AnalysisRequest {
            reference_odds: Some("Lakers: 2.0\nCeltics: 2.0".to_string()),
            ..AnalysisRequest::new("x")
        };
        assert_eq!(request.reference_for("Will the Lakers win?"), Some(dec!(0.5)));
        assert_eq!(request.reference_for("Will the Knicks win?"), None);
    }

    #[test]
    fn test_reference_single_line_not_normalized() {
        let request = AnalysisRequest {
            reference_odds: Some("Lakers: 2.5".to_string()),
            ..AnalysisRequest::new("x")
        };
        assert_eq!(request.reference_for("Lakers vs Celtics"), Some(dec!(0.4)));
    }

    #[test]
    fn test_ensure_tradable() {
        let closed = MarketSnapshot::builder("m", "q")
            .slug("s")
            .closed(true)
            .build()
            .unwrap();
        assert_eq!(
            ensure_tradable(closed),
            Err(AnalysisError::NoActiveCandidate("s".to_string()))
        );
    }
}
