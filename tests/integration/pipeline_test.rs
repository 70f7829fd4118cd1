//! End-to-end analysis over in-memory market and quote sources

use std::collections::HashMap;

use async_trait::async_trait;
use polybet::analysis::{AnalysisEngine, AnalysisRequest, Analyzer};
use polybet::config::Config;
use polybet::error::AnalysisError;
use polybet::gate::{ReasonCode, Side};
use polybet::market::{
    BookmakerOdds, MarketSnapshot, MarketSource, QuoteSource, ReferenceSource, TopOfBook,
};
use polybet::risk::CappedBy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[derive(Default)]
struct FakeMarkets {
    events: HashMap<String, Vec<MarketSnapshot>>,
    markets: HashMap<String, MarketSnapshot>,
    search: Vec<MarketSnapshot>,
}

#[async_trait]
impl MarketSource for FakeMarkets {
    async fn event_markets(&self, slug: &str) -> anyhow::Result<Vec<MarketSnapshot>> {
        Ok(self.events.get(slug).cloned().unwrap_or_default())
    }

    async fn market_by_slug(&self, slug: &str) -> anyhow::Result<Option<MarketSnapshot>> {
        Ok(self.markets.get(slug).cloned())
    }

    async fn search(&self, _query: &str) -> anyhow::Result<Vec<MarketSnapshot>> {
        Ok(self.search.clone())
    }
}

struct FakeQuotes {
    top: TopOfBook,
    fee: Option<Decimal>,
    fail: bool,
}

#[async_trait]
impl QuoteSource for FakeQuotes {
    async fn top_of_book(&self, _token_id: &str) -> anyhow::Result<TopOfBook> {
        if self.fail {
            anyhow::bail!("book unavailable");
        }
        Ok(self.top)
    }

    async fn fee_rate(&self, _token_id: &str) -> anyhow::Result<Option<Decimal>> {
        if self.fail {
            anyhow::bail!("fee unavailable");
        }
        Ok(self.fee)
    }
}

struct FakeReferences {
    books: Vec<BookmakerOdds>,
    fail: bool,
}

#[async_trait]
impl ReferenceSource for FakeReferences {
    async fn bookmaker_odds(&self, _title: &str) -> anyhow::Result<Vec<BookmakerOdds>> {
        if self.fail {
            anyhow::bail!("odds feed down");
        }
        Ok(self.books.clone())
    }
}

fn lakers_celtics_books() -> FakeReferences {
    FakeReferences {
        books: vec![BookmakerOdds {
            bookmaker: "Pinnacle".to_string(),
            outcomes: vec![
                ("Los Angeles Lakers".to_string(), dec!(1.25)),
                ("Boston Celtics".to_string(), dec!(5.0)),
            ],
        }],
        fail: false,
    }
}

fn market(slug: &str, liquidity: Decimal, bid: Option<Decimal>, ask: Option<Decimal>) -> MarketSnapshot {
    MarketSnapshot::builder(slug, format!("Will {slug} win?"))
        .slug(slug)
        .liquidity(liquidity)
        .volume_24hr(dec!(1000))
        .quotes(bid, ask)
        .build()
        .unwrap()
}

fn analyzer(markets: FakeMarkets, quotes: Option<FakeQuotes>) -> Analyzer<FakeMarkets, FakeQuotes> {
    let engine = AnalysisEngine::from_config(&Config::default()).unwrap();
    Analyzer::new(engine, markets, quotes)
}

fn analysis_error(err: &anyhow::Error) -> &AnalysisError {
    err.downcast_ref::<AnalysisError>()
        .expect("expected a typed analysis error")
}

#[tokio::test]
async fn test_free_text_selects_deepest_market() {
    let markets = FakeMarkets {
        search: vec![
            market("lakers", dec!(5000), Some(dec!(0.45)), Some(dec!(0.47))),
            market("celtics", dec!(30000), Some(dec!(0.50)), Some(dec!(0.51))),
            MarketSnapshot::builder("old", "Old")
                .slug("old")
                .liquidity(dec!(100000))
                .closed(true)
                .build()
                .unwrap(),
        ],
        ..FakeMarkets::default()
    };

    let report = analyzer(markets, None)
        .analyze(&AnalysisRequest::new("Lakers vs Celtics"))
        .await
        .unwrap();

    assert_eq!(report.snapshot.slug(), "celtics");
    assert_eq!(report.query.as_deref(), Some("Lakers vs Celtics"));
    let candidates = report.candidates.unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates.entries[0].slug, "lakers");
    assert_eq!(candidates.entries[0].rank, 2);

    // tight market without reference: no edge
    assert!(report.decision.rejected_for(ReasonCode::EvTooLow));
    assert_eq!(report.sizing.recommended_stake, Decimal::ZERO);
    assert_eq!(report.sizing.capped_by, CappedBy::None);
}

#[tokio::test]
async fn test_reference_edge_is_approved_and_capped() {
    let markets = FakeMarkets {
        search: vec![market("lakers", dec!(30000), Some(dec!(0.45)), Some(dec!(0.47)))],
        ..FakeMarkets::default()
    };
    let request = AnalysisRequest {
        reference_probability: Some(dec!(0.60)),
        ..AnalysisRequest::new("lakers")
    };

    let report = analyzer(markets, None).analyze(&request).await.unwrap();

    assert_eq!(report.fair.reference_probability, Some(dec!(0.60)));
    assert!(report.decision.approved);
    assert!(report.decision.expected_value >= dec!(0.02));
    // quarter Kelly on 5000 is above the 1% max bet
    assert_eq!(report.sizing.recommended_stake, dec!(50));
    assert_eq!(report.sizing.capped_by, CappedBy::MaxBet);
    assert!(report.to_markdown().contains("**APPROVED**"));
}

#[tokio::test]
async fn test_reference_odds_matched_by_name() {
    let markets = FakeMarkets {
        search: vec![market("lakers", dec!(30000), Some(dec!(0.45)), Some(dec!(0.47)))],
        ..FakeMarkets::default()
    };
    let request = AnalysisRequest {
        reference_odds: Some("Lakers: 1.25\nCeltics: 5.0".to_string()),
        ..AnalysisRequest::new("lakers")
    };

    let report = analyzer(markets, None).analyze(&request).await.unwrap();
    assert_eq!(report.fair.reference_probability, Some(dec!(0.8)));
}

#[tokio::test]
async fn test_event_url_runs_selector() {
    let mut events = HashMap::new();
    events.insert(
        "nba-finals".to_string(),
        vec![
            market("game-1", dec!(1000), Some(dec!(0.40)), Some(dec!(0.42))),
            market("game-2", dec!(9000), Some(dec!(0.60)), Some(dec!(0.62))),
        ],
    );
    let markets = FakeMarkets {
        events,
        ..FakeMarkets::default()
    };

    let report = analyzer(markets, None)
        .analyze(&AnalysisRequest::new("https://polymarket.com/event/nba-finals"))
        .await
        .unwrap();

    assert_eq!(report.snapshot.slug(), "game-2");
    assert!(report.query.is_none());
    assert_eq!(report.candidates.unwrap().query, "nba-finals");
}

#[tokio::test]
async fn test_closed_market_link_is_not_tradable() {
    let mut markets = HashMap::new();
    markets.insert(
        "old".to_string(),
        MarketSnapshot::builder("1", "Old")
            .slug("old")
            .closed(true)
            .build()
            .unwrap(),
    );
    let source = FakeMarkets {
        markets,
        ..FakeMarkets::default()
    };

    let err = analyzer(source, None)
        .analyze(&AnalysisRequest::new("https://polymarket.com/market/old"))
        .await
        .unwrap_err();
    assert_eq!(
        analysis_error(&err),
        &AnalysisError::NoActiveCandidate("old".to_string())
    );
}

#[tokio::test]
async fn test_unknown_slug_not_found() {
    let err = analyzer(FakeMarkets::default(), None)
        .analyze(&AnalysisRequest::new("https://polymarket.com/event/missing"))
        .await
        .unwrap_err();
    assert_eq!(
        analysis_error(&err),
        &AnalysisError::MarketNotFound("missing".to_string())
    );
}

#[tokio::test]
async fn test_quoteless_market_fails_with_insufficient_quotes() {
    let markets = FakeMarkets {
        search: vec![market("lakers", dec!(30000), None, None)],
        ..FakeMarkets::default()
    };

    let err = analyzer(markets, None)
        .analyze(&AnalysisRequest::new("lakers"))
        .await
        .unwrap_err();
    assert!(matches!(
        analysis_error(&err),
        AnalysisError::InsufficientQuotes(_)
    ));
}

#[tokio::test]
async fn test_quoteless_search_hit_refreshed_by_slug() {
    let mut by_slug = HashMap::new();
    by_slug.insert(
        "lakers".to_string(),
        market("lakers", dec!(30000), Some(dec!(0.45)), Some(dec!(0.47))),
    );
    let markets = FakeMarkets {
        markets: by_slug,
        search: vec![market("lakers", dec!(30000), None, None)],
        ..FakeMarkets::default()
    };

    let report = analyzer(markets, None)
        .analyze(&AnalysisRequest::new("lakers"))
        .await
        .unwrap();
    assert_eq!(report.snapshot.best_bid(), Some(dec!(0.45)));
}

#[tokio::test]
async fn test_market_closed_since_search_is_not_analyzed() {
    let mut by_slug = HashMap::new();
    by_slug.insert(
        "lakers".to_string(),
        MarketSnapshot::builder("lakers", "Will lakers win?")
            .slug("lakers")
            .liquidity(dec!(30000))
            .quotes(Some(dec!(0.45)), Some(dec!(0.47)))
            .closed(true)
            .build()
            .unwrap(),
    );
    let markets = FakeMarkets {
        markets: by_slug,
        search: vec![market("lakers", dec!(30000), None, None)],
        ..FakeMarkets::default()
    };

    let err = analyzer(markets, None)
        .analyze(&AnalysisRequest::new("lakers"))
        .await
        .unwrap_err();
    assert_eq!(
        analysis_error(&err),
        &AnalysisError::NoActiveCandidate("lakers".to_string())
    );
}

fn tokenized(slug: &str) -> MarketSnapshot {
    MarketSnapshot::builder(slug, "Will the Lakers win?")
        .slug(slug)
        .liquidity(dec!(30000))
        .quotes(Some(dec!(0.30)), Some(dec!(0.40)))
        .token_id(Some("tok".to_string()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_clob_quotes_and_fee_override_gamma() {
    let markets = FakeMarkets {
        search: vec![tokenized("lakers")],
        ..FakeMarkets::default()
    };
    let quotes = FakeQuotes {
        top: TopOfBook {
            best_bid: Some(dec!(0.45)),
            best_ask: Some(dec!(0.47)),
        },
        fee: Some(dec!(0.01)),
        fail: false,
    };

    let report = analyzer(markets, Some(quotes))
        .analyze(&AnalysisRequest::new("lakers"))
        .await
        .unwrap();

    assert_eq!(report.snapshot.best_bid(), Some(dec!(0.45)));
    assert_eq!(report.snapshot.best_ask(), Some(dec!(0.47)));
    assert_eq!(report.snapshot.fee_rate(), Some(dec!(0.01)));
    assert_eq!(report.costs.fee, dec!(0.01));
    assert!(report.decision.breakeven > report.decision.market_implied);
}

#[tokio::test]
async fn test_clob_failure_keeps_gamma_quotes() {
    let markets = FakeMarkets {
        search: vec![tokenized("lakers")],
        ..FakeMarkets::default()
    };
    let quotes = FakeQuotes {
        top: TopOfBook {
            best_bid: None,
            best_ask: None,
        },
        fee: None,
        fail: true,
    };

    let report = analyzer(markets, Some(quotes))
        .analyze(&AnalysisRequest::new("lakers"))
        .await
        .unwrap();

    assert_eq!(report.snapshot.best_bid(), Some(dec!(0.30)));
    assert_eq!(report.snapshot.best_ask(), Some(dec!(0.40)));
    assert!(report.snapshot.fee_rate().is_none());
    // 0.10 spread is above the 0.05 ceiling
    assert!(report.decision.rejected_for(ReasonCode::SpreadTooWide));
}

#[tokio::test]
async fn test_lay_side_flips_edge() {
    let build = || FakeMarkets {
        search: vec![market("lakers", dec!(30000), Some(dec!(0.45)), Some(dec!(0.47)))],
        ..FakeMarkets::default()
    };
    let back = AnalysisRequest {
        reference_probability: Some(dec!(0.60)),
        ..AnalysisRequest::new("lakers")
    };
    let lay = AnalysisRequest {
        side: Side::Lay,
        ..back.clone()
    };

    let back_report = analyzer(build(), None).analyze(&back).await.unwrap();
    let lay_report = analyzer(build(), None).analyze(&lay).await.unwrap();

    assert_eq!(lay_report.decision.edge, -back_report.decision.edge);
    assert!(!lay_report.decision.approved);
    assert_eq!(lay_report.sizing.recommended_stake, Decimal::ZERO);
}

#[tokio::test]
async fn test_report_serializes_to_json() {
    let markets = FakeMarkets {
        search: vec![market("lakers", dec!(30000), Some(dec!(0.45)), Some(dec!(0.47)))],
        ..FakeMarkets::default()
    };
    let report = analyzer(markets, None)
        .analyze(&AnalysisRequest::new("lakers"))
        .await
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["decision"]["side"], "back");
    assert_eq!(json["sizing"]["capped_by"], "none");
    assert!(json["id"].is_string());
}

fn lakers_search() -> FakeMarkets {
    FakeMarkets {
        search: vec![market("lakers", dec!(30000), Some(dec!(0.45)), Some(dec!(0.47)))],
        ..FakeMarkets::default()
    }
}

#[tokio::test]
async fn test_bookmaker_consensus_used_without_user_reference() {
    let report = analyzer(lakers_search(), None)
        .with_reference_source(Some(lakers_celtics_books()))
        .analyze(&AnalysisRequest::new("lakers"))
        .await
        .unwrap();

    // "Will lakers win?" matches the Lakers outcome by name word
    assert_eq!(report.fair.reference_probability, Some(dec!(0.8)));
    assert!(report.decision.approved);
}

#[tokio::test]
async fn test_user_odds_suppress_bookmaker_lookup() {
    let request = AnalysisRequest {
        reference_odds: Some("Knicks: 2.0\nNets: 2.0".to_string()),
        ..AnalysisRequest::new("lakers")
    };
    let report = analyzer(lakers_search(), None)
        .with_reference_source(Some(lakers_celtics_books()))
        .analyze(&request)
        .await
        .unwrap();

    assert_eq!(report.fair.reference_probability, None);
}

#[tokio::test]
async fn test_bookmaker_failure_falls_back_to_market() {
    let references = FakeReferences {
        books: vec![],
        fail: true,
    };
    let report = analyzer(lakers_search(), None)
        .with_reference_source(Some(references))
        .analyze(&AnalysisRequest::new("lakers"))
        .await
        .unwrap();

    assert_eq!(report.fair.reference_probability, None);
    assert!(report.decision.rejected_for(ReasonCode::EvTooLow));
}

