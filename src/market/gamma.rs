//! Gamma API client for sports market discovery
//!
//! Resolves event slugs, market slugs and free-text searches into
//! [`MarketSnapshot`]s. Gamma returns many numeric fields as strings and
//! list fields as JSON-encoded strings, so parsing is lenient.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::http::{get_json, RetryPolicy};
use super::{MarketSnapshot, MarketSource};
use crate::config::GammaConfig;

/// Words that mark an item as sports-related
const SPORT_HINTS: &[&str] = &[
    "sport", "nba", "nfl", "nhl", "mlb", "soccer", "football", "tennis", "ufc", "mma",
    "basketball", "baseball", "hockey", "cricket", "epl", "premier league", "champions league",
];

/// Client for Polymarket's Gamma API
pub struct GammaClient {
    base_url: String,
    search_limit: u32,
    retry: RetryPolicy,
    client: Client,
}

impl GammaClient {
    /// Create a client with default configuration
    pub fn new() -> anyhow::Result<Self> {
        Self::from_config(&GammaConfig::default())
    }

    /// Create a client from GammaConfig
    pub fn from_config(config: &GammaConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            search_limit: config.search_limit,
            retry: RetryPolicy::new(config.max_attempts),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> anyhow::Result<Option<Value>> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "Fetching from Gamma API");
        get_json(&self.client, &url, query, &self.retry).await
    }
}

#[async_trait]
impl MarketSource for GammaClient {
    async fn event_markets(&self, slug: &str) -> anyhow::Result<Vec<MarketSnapshot>> {
        let Some(payload) = self.get(&format!("/events/slug/{slug}"), &[]).await? else {
            return Ok(vec![]);
        };
        let event: GammaEvent = serde_json::from_value(payload)?;
        let markets = event.into_snapshots();

        tracing::info!(slug, markets = markets.len(), "Fetched event markets");
        Ok(markets)
    }

    async fn market_by_slug(&self, slug: &str) -> anyhow::Result<Option<MarketSnapshot>> {
        match self.get(&format!("/markets/slug/{slug}"), &[]).await? {
            Some(payload) => parse_market_payload(payload).map(Some),
            None => Ok(None),
        }
    }

    async fn search(&self, query: &str) -> anyhow::Result<Vec<MarketSnapshot>> {
        let params = [
            ("q", query.to_string()),
            ("events_status", "active".to_string()),
            ("limit_per_type", self.search_limit.to_string()),
            ("keep_closed_markets", "0".to_string()),
            ("optimized", "true".to_string()),
        ];
        let Some(payload) = self.get("/public-search", &params).await? else {
            return Ok(vec![]);
        };
        let candidates = parse_search_payload(payload)?;

        tracing::info!(query, candidates = candidates.len(), "Searched Gamma markets");
        Ok(candidates)
    }
}

/// Parse a single Gamma market object
pub fn parse_market_payload(payload: Value) -> anyhow::Result<MarketSnapshot> {
    let market: GammaMarket = serde_json::from_value(payload)?;
    market.into_snapshot(None)
}

/// Parse a /public-search response into candidates, in search order
///
/// Top-level markets come first, then markets nested in events.
pub fn parse_search_payload(payload: Value) -> anyhow::Result<Vec<MarketSnapshot>> {
    let response: GammaSearchResponse = serde_json::from_value(payload)?;

    let mut out = Vec::new();
    for market in response.markets {
        match market.into_snapshot(None) {
            Ok(snap) => out.push(snap),
            Err(e) => tracing::warn!(error = %e, "Skipping unparseable search market"),
        }
    }
    for event in response.events {
        out.extend(event.into_snapshots());
    }
    Ok(out)
}

/// Search response from /public-search
#[derive(Debug, Default, Deserialize)]
struct GammaSearchResponse {
    #[serde(default)]
    events: Vec<GammaEvent>,
    #[serde(default)]
    markets: Vec<GammaMarket>,
}

/// Event object (a match with one or more markets)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GammaEvent {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    active: Option<bool>,
    #[serde(default)]
    closed: Option<bool>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    tags: Option<Value>,
    #[serde(default)]
    markets: Vec<GammaMarket>,
}

impl GammaEvent {
    fn into_snapshots(self) -> Vec<MarketSnapshot> {
        let context = EventContext {
            active: self.active,
            closed: self.closed,
            start_date: self.start_date.as_deref().and_then(parse_timestamp),
            sports_related: is_sports_related(&[
                self.title.as_deref(),
                self.slug.as_deref(),
                self.category.as_deref(),
            ], self.tags.as_ref()),
        };

        self.markets
            .into_iter()
            .filter_map(|m| match m.into_snapshot(Some(&context)) {
                Ok(snap) => Some(snap),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unparseable event market");
                    None
                }
            })
            .collect()
    }
}

/// Fields a nested market inherits from its event
#[derive(Debug, Clone)]
struct EventContext {
    active: Option<bool>,
    closed: Option<bool>,
    start_date: Option<DateTime<Utc>>,
    sports_related: bool,
}

/// Raw market object
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GammaMarket {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    condition_id: Option<String>,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    active: Option<bool>,
    #[serde(default)]
    closed: Option<bool>,
    #[serde(default)]
    liquidity: Option<Value>,
    #[serde(default)]
    liquidity_num: Option<Value>,
    #[serde(default)]
    volume24hr: Option<Value>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    game_start_time: Option<String>,
    #[serde(default)]
    best_bid: Option<Value>,
    #[serde(default)]
    best_ask: Option<Value>,
    /// JSON-encoded list, first entry is the YES token
    #[serde(default)]
    clob_token_ids: Option<Value>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    group_item_title: Option<String>,
    #[serde(default)]
    sports_market_type: Option<String>,
    #[serde(default)]
    tags: Option<Value>,
}

impl GammaMarket {
    fn into_snapshot(self, event: Option<&EventContext>) -> anyhow::Result<MarketSnapshot> {
        let market_id = self
            .id
            .as_ref()
            .and_then(value_to_string)
            .or_else(|| self.condition_id.clone())
            .or_else(|| self.slug.clone())
            .ok_or_else(|| anyhow::anyhow!("Gamma market has no id, conditionId or slug"))?;

        let question = self
            .question
            .clone()
            .or_else(|| self.title.clone())
            .unwrap_or_else(|| "Unknown".to_string());

        let active = self
            .active
            .or_else(|| event.and_then(|e| e.active))
            .unwrap_or(false);
        let closed = self
            .closed
            .or_else(|| event.and_then(|e| e.closed))
            .unwrap_or(true);

        let liquidity = self
            .liquidity_num
            .as_ref()
            .or(self.liquidity.as_ref())
            .and_then(value_to_decimal)
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO);
        let volume = self
            .volume24hr
            .as_ref()
            .and_then(value_to_decimal)
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO);

        let start_date = self
            .game_start_time
            .as_deref()
            .and_then(parse_timestamp)
            .or_else(|| self.start_date.as_deref().and_then(parse_timestamp))
            .or_else(|| event.and_then(|e| e.start_date));

        let sports_related = event.is_some_and(|e| e.sports_related)
            || self.sports_market_type.is_some()
            || is_sports_related(
                &[
                    self.question.as_deref(),
                    self.category.as_deref(),
                    self.group_item_title.as_deref(),
                    self.slug.as_deref(),
                ],
                self.tags.as_ref(),
            );

        let token_id = self
            .clob_token_ids
            .as_ref()
            .map(string_list)
            .and_then(|ids| ids.into_iter().next());

        let (best_bid, best_ask) = sanitize_quotes(
            &market_id,
            self.best_bid.as_ref().and_then(value_to_decimal),
            self.best_ask.as_ref().and_then(value_to_decimal),
        );

        Ok(MarketSnapshot::builder(market_id, question)
            .slug(self.slug.unwrap_or_default())
            .active(active)
            .closed(closed)
            .liquidity(liquidity)
            .volume_24hr(volume)
            .start_date(start_date)
            .quotes(best_bid, best_ask)
            .token_id(token_id)
            .sports_related(sports_related)
            .build()?)
    }
}

/// Drop quotes that would violate snapshot invariants
fn sanitize_quotes(
    market_id: &str,
    bid: Option<Decimal>,
    ask: Option<Decimal>,
) -> (Option<Decimal>, Option<Decimal>) {
    let in_unit = |v: Option<Decimal>| v.filter(|p| *p >= Decimal::ZERO && *p <= Decimal::ONE);
    let (bid, ask) = (in_unit(bid), in_unit(ask));

    match (bid, ask) {
        (Some(b), Some(a)) if b > a => {
            tracing::warn!(market = market_id, bid = %b, ask = %a, "Dropping crossed Gamma quotes");
            (None, None)
        }
        quotes => quotes,
    }
}

fn is_sports_related(fields: &[Option<&str>], tags: Option<&Value>) -> bool {
    let mut text: String = fields
        .iter()
        .flatten()
        .map(|s| s.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    if let Some(Value::Array(tags)) = tags {
        for tag in tags {
            match tag {
                Value::String(s) => text.push_str(&format!(" {}", s.to_lowercase())),
                Value::Object(obj) => {
                    for key in ["label", "slug"] {
                        if let Some(Value::String(s)) = obj.get(key) {
                            text.push_str(&format!(" {}", s.to_lowercase()));
                        }
                    }
                }
                _ => {}
            }
        }
    }

    SPORT_HINTS.iter().any(|hint| text.contains(hint))
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_to_decimal(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok()
}

/// A list given either as a JSON array or as a JSON-encoded string
fn string_list(value: &Value) -> Vec<String> {
    let items = match value {
        Value::Array(items) => items.clone(),
        Value::String(s) => serde_json::from_str::<Vec<Value>>(s).unwrap_or_default(),
        _ => vec![],
    };
    items.iter().filter_map(value_to_string).collect()
}

/// RFC 3339, Gamma's `YYYY-MM-DD HH:MM:SS+00`, or a bare date
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%#z") {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
