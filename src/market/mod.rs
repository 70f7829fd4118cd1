//! Market retrieval module
//!
//! Fetches Polymarket sports markets from the Gamma API and, optionally,
//! top-of-book quotes from the CLOB, and normalizes them into snapshots.
//! Bookmaker odds from The Odds API can serve as the reference.

mod clob;
mod gamma;
mod http;
mod link;
mod odds_api;
mod snapshot;

pub use clob::ClobClient;
pub use gamma::{parse_market_payload, parse_search_payload, GammaClient};
pub use http::RetryPolicy;
pub use link::{parse_input, MarketInput, SlugKind};
pub use odds_api::{detect_sport, OddsApiClient};
pub use snapshot::{MarketSnapshot, SnapshotBuilder};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Best bid and ask for one token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopOfBook {
    pub best_bid: Option<Decimal>,
    pub best_ask: Option<Decimal>,
}

/// Source of market metadata and search results
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// All markets of an event, empty if the slug is not an event
    async fn event_markets(&self, slug: &str) -> anyhow::Result<Vec<MarketSnapshot>>;
    /// A single market by slug
    async fn market_by_slug(&self, slug: &str) -> anyhow::Result<Option<MarketSnapshot>>;
    /// Free-text search, in search order
    async fn search(&self, query: &str) -> anyhow::Result<Vec<MarketSnapshot>>;
}

/// Source of live order book quotes
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Best bid/ask for a token
    async fn top_of_book(&self, token_id: &str) -> anyhow::Result<TopOfBook>;
    /// Fee rate as a fraction of notional, if published
    async fn fee_rate(&self, token_id: &str) -> anyhow::Result<Option<Decimal>>;
}

/// Head-to-head decimal odds quoted by one bookmaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmakerOdds {
    pub bookmaker: String,
    /// Outcome name and decimal odds, in feed order
    pub outcomes: Vec<(String, Decimal)>,
}

/// Source of outside bookmaker odds
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    /// Odds per bookmaker for the event best matching `title`, empty if none
    async fn bookmaker_odds(&self, title: &str) -> anyhow::Result<Vec<BookmakerOdds>>;
}

/// Reference source that never has odds
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReferenceSource;

#[async_trait]
impl ReferenceSource for NoReferenceSource {
    async fn bookmaker_odds(&self, _title: &str) -> anyhow::Result<Vec<BookmakerOdds>> {
        Ok(vec![])
    }
}
